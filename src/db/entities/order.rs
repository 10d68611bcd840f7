// 充值订单实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 支付状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "lowercase")]
pub enum PayStatus {
    #[sea_orm(string_value = "unpaid")]
    Unpaid,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

/// 充值订单，套餐信息在下单时快照
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recharge_orders")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// 订单号
    #[sea_orm(column_type = "String(Some(32))", unique)]
    pub order_no: String,

    pub user_id: Uuid,

    pub rule_id: Uuid,

    pub power: i64,

    pub given_power: i64,

    /// 订单金额（分）
    pub sell_price: i64,

    pub pay_status: PayStatus,

    #[sea_orm(column_type = "String(Some(32))")]
    pub pay_type: String,

    #[sea_orm(nullable)]
    pub paid_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub refunded_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
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

impl Model {
    /// 支付后到账的总算力
    pub fn total_power(&self) -> i64 {
        self.power + self.given_power
    }
}
