// 财务服务

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agentdock_common::{PaginatedResponse, PaginationParams};

use crate::db::entities::{
    account_log, account_log::AccountChangeType, order, order::PayStatus, prelude::*, user,
};
use crate::errors::PlatformResult;
use crate::services::fetch_page;

/// 财务中心统计
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FinanceCenter {
    pub user_count: u64,
    pub paid_order_count: u64,
    /// 已支付订单金额（分）
    pub revenue: i64,
    pub refunded_order_count: u64,
    /// 已退款订单金额（分）
    pub refunded_amount: i64,
    /// 已支付订单发放的算力
    pub total_power_issued: i64,
}

/// 流水筛选
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountLogQuery {
    pub user_id: Option<Uuid>,
    pub change_type: Option<AccountChangeType>,
}

/// 财务服务
pub struct FinanceService {
    db: DatabaseConnection,
}

impl FinanceService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn center(&self) -> PlatformResult<FinanceCenter> {
        let user_count = User::find()
            .filter(user::Column::DeletedAt.is_null())
            .count(&self.db)
            .await?;

        // 金额在内存中累加，避免不同数据库 SUM 返回类型不一致
        let paid: Vec<(i64, i64, i64)> = Order::find()
            .select_only()
            .column(order::Column::SellPrice)
            .column(order::Column::Power)
            .column(order::Column::GivenPower)
            .filter(order::Column::PayStatus.eq(PayStatus::Paid))
            .into_tuple()
            .all(&self.db)
            .await?;
        let refunded: Vec<i64> = Order::find()
            .select_only()
            .column(order::Column::SellPrice)
            .filter(order::Column::PayStatus.eq(PayStatus::Refunded))
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(FinanceCenter {
            user_count,
            paid_order_count: paid.len() as u64,
            revenue: paid.iter().map(|(price, _, _)| price).sum(),
            refunded_order_count: refunded.len() as u64,
            refunded_amount: refunded.iter().sum(),
            total_power_issued: paid.iter().map(|(_, power, given)| power + given).sum(),
        })
    }

    pub async fn account_logs(
        &self,
        query: AccountLogQuery,
        params: PaginationParams,
    ) -> PlatformResult<PaginatedResponse<account_log::Model>> {
        let mut select = AccountLog::find();
        if let Some(user_id) = query.user_id {
            select = select.filter(account_log::Column::UserId.eq(user_id));
        }
        if let Some(change_type) = query.change_type {
            select = select.filter(account_log::Column::ChangeType.eq(change_type));
        }
        fetch_page(
            &self.db,
            select.order_by_desc(account_log::Column::CreatedAt),
            params,
        )
        .await
    }
}
