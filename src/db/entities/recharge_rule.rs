// 充值套餐实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 充值套餐
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recharge_rules")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "String(Some(64))")]
    pub label: String,

    /// 到账算力
    pub power: i64,

    /// 赠送算力
    pub given_power: i64,

    /// 售价（分）
    pub sell_price: i64,

    pub sort: i32,

    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
