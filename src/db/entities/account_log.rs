// 账户流水实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 变动类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "lowercase")]
pub enum AccountChangeType {
    #[sea_orm(string_value = "recharge")]
    Recharge,
    #[sea_orm(string_value = "refund")]
    Refund,
    #[sea_orm(string_value = "adjust")]
    Adjust,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "account_logs")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    #[sea_orm(nullable)]
    pub order_id: Option<Uuid>,

    pub change_type: AccountChangeType,

    /// 变动值，扣减为负数
    pub amount: i64,

    /// 变动后余额
    pub balance_after: i64,

    #[sea_orm(column_type = "String(Some(255))", nullable)]
    pub remark: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
