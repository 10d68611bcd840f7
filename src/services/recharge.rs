// 充值服务
// 充值套餐、订单，以及确认支付和退款时的算力变动

use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::{
    prelude::DateTimeWithTimeZone, sea_query::Expr, ActiveModelTrait, ColumnTrait,
    ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use agentdock_common::{PaginatedResponse, PaginationParams};

use crate::api::extractors::{rules, Validate};
use crate::db::entities::{
    account_log, account_log::AccountChangeType, order, order::PayStatus, prelude::*,
    recharge_rule, user,
};
use crate::db::UserRepository;
use crate::errors::{PlatformError, PlatformResult};
use crate::services::fetch_page;

/// 订单号前缀
pub const ORDER_NO_PREFIX: &str = "RC";

/// 默认支付方式，由后台确认到账
pub const DEFAULT_PAY_TYPE: &str = "manual";

/// 订单号：`RC` + 下单时间 `yyyymmddHHMMSS` + 6 位随机数
pub fn generate_order_no(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{}{}{:06}", ORDER_NO_PREFIX, now.format("%Y%m%d%H%M%S"), suffix)
}

/// 创建或更新充值套餐
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RechargeRuleRequest {
    pub label: String,
    pub power: i64,
    #[serde(default)]
    pub given_power: i64,
    /// 售价（分）
    pub sell_price: i64,
    #[serde(default)]
    pub sort: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Validate for RechargeRuleRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::length("label", &self.label, 1, 64)?;
        rules::range("power", self.power, 1, i64::from(i32::MAX))?;
        rules::range("givenPower", self.given_power, 0, i64::from(i32::MAX))?;
        rules::range("sellPrice", self.sell_price, 0, 100_000_000)?;
        Ok(())
    }
}

/// Web 端下单
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub rule_id: Uuid,
    pub pay_type: Option<String>,
}

impl Validate for CreateOrderRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::max_length("payType", self.pay_type.as_deref(), 32)
    }
}

/// 订单筛选
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub order_no: Option<String>,
    pub user_id: Option<Uuid>,
    pub pay_status: Option<PayStatus>,
}

/// 充值服务
pub struct RechargeService {
    db: DatabaseConnection,
}

impl RechargeService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_rules(&self) -> PlatformResult<Vec<recharge_rule::Model>> {
        let rules = RechargeRule::find()
            .filter(recharge_rule::Column::DeletedAt.is_null())
            .order_by_asc(recharge_rule::Column::Sort)
            .order_by_asc(recharge_rule::Column::SellPrice)
            .all(&self.db)
            .await?;
        Ok(rules)
    }

    /// Web 端可购买的套餐
    pub async fn list_active_rules(&self) -> PlatformResult<Vec<recharge_rule::Model>> {
        Ok(self
            .list_rules()
            .await?
            .into_iter()
            .filter(|rule| rule.is_active)
            .collect())
    }

    #[instrument(skip(self, request), fields(label = %request.label))]
    pub async fn create_rule(
        &self,
        request: RechargeRuleRequest,
    ) -> PlatformResult<recharge_rule::Model> {
        let now = Utc::now();
        let rule = recharge_rule::ActiveModel {
            id: Set(Uuid::new_v4()),
            label: Set(request.label.trim().to_string()),
            power: Set(request.power),
            given_power: Set(request.given_power),
            sell_price: Set(request.sell_price),
            sort: Set(request.sort),
            is_active: Set(request.is_active),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            deleted_at: Set(None),
        }
        .insert(&self.db)
        .await?;

        info!(rule_id = %rule.id, "充值套餐已创建");
        Ok(rule)
    }

    /// 已下单的订单保留下单时的快照，不受套餐修改影响
    #[instrument(skip(self, request))]
    pub async fn update_rule(
        &self,
        id: Uuid,
        request: RechargeRuleRequest,
    ) -> PlatformResult<recharge_rule::Model> {
        let rule = self.get_rule(id).await?;
        let mut active: recharge_rule::ActiveModel = rule.into();
        active.label = Set(request.label.trim().to_string());
        active.power = Set(request.power);
        active.given_power = Set(request.given_power);
        active.sell_price = Set(request.sell_price);
        active.sort = Set(request.sort);
        active.is_active = Set(request.is_active);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_rule(&self, id: Uuid) -> PlatformResult<()> {
        let rule = self.get_rule(id).await?;
        let now = Utc::now();
        let mut active: recharge_rule::ActiveModel = rule.into();
        active.deleted_at = Set(Some(now.into()));
        active.is_active = Set(false);
        active.updated_at = Set(now.into());
        active.update(&self.db).await?;
        Ok(())
    }

    /// 按启用的套餐创建待支付订单
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn create_order(
        &self,
        user_id: Uuid,
        request: CreateOrderRequest,
    ) -> PlatformResult<order::Model> {
        let rule = self.get_rule(request.rule_id).await?;
        if !rule.is_active {
            return Err(PlatformError::business("该充值套餐已下架"));
        }

        let now = Utc::now();
        let order = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_no: Set(generate_order_no(now)),
            user_id: Set(user_id),
            rule_id: Set(rule.id),
            power: Set(rule.power),
            given_power: Set(rule.given_power),
            sell_price: Set(rule.sell_price),
            pay_status: Set(PayStatus::Unpaid),
            pay_type: Set(request
                .pay_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PAY_TYPE.to_string())),
            paid_at: Set(None),
            refunded_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;

        info!(order_no = %order.order_no, "充值订单已创建");
        Ok(order)
    }

    pub async fn list_orders(
        &self,
        query: OrderQuery,
        params: PaginationParams,
    ) -> PlatformResult<PaginatedResponse<order::Model>> {
        let mut select = Order::find();
        if let Some(order_no) = query.order_no.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            select = select.filter(order::Column::OrderNo.contains(order_no));
        }
        if let Some(user_id) = query.user_id {
            select = select.filter(order::Column::UserId.eq(user_id));
        }
        if let Some(status) = query.pay_status {
            select = select.filter(order::Column::PayStatus.eq(status));
        }
        fetch_page(&self.db, select.order_by_desc(order::Column::CreatedAt), params).await
    }

    /// 当前用户的订单
    pub async fn user_orders(
        &self,
        user_id: Uuid,
        params: PaginationParams,
    ) -> PlatformResult<PaginatedResponse<order::Model>> {
        self.list_orders(
            OrderQuery {
                user_id: Some(user_id),
                ..OrderQuery::default()
            },
            params,
        )
        .await
    }

    /// 确认到账：在同一事务内标记已支付、增加算力并记录流水
    #[instrument(skip(self))]
    pub async fn confirm_paid(&self, id: Uuid) -> PlatformResult<order::Model> {
        let txn = self.db.begin().await?;
        let now: DateTimeWithTimeZone = Utc::now().into();

        // 带状态条件的更新，并发确认时只有一个事务能命中
        let updated = Order::update_many()
            .col_expr(order::Column::PayStatus, Expr::value(PayStatus::Paid))
            .col_expr(order::Column::PaidAt, Expr::value(Some(now)))
            .col_expr(order::Column::UpdatedAt, Expr::value(now))
            .filter(order::Column::Id.eq(id))
            .filter(order::Column::PayStatus.eq(PayStatus::Unpaid))
            .exec(&txn)
            .await?;
        let order = get_order(&txn, id).await?;
        if updated.rows_affected == 0 {
            return Err(match order.pay_status {
                PayStatus::Refunded => PlatformError::conflict("订单已退款"),
                _ => PlatformError::conflict("订单已支付，不能重复确认"),
            });
        }

        let amount = order.total_power();
        let balance = change_power(&txn, order.user_id, amount).await?;
        account_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(order.user_id),
            order_id: Set(Some(order.id)),
            change_type: Set(AccountChangeType::Recharge),
            amount: Set(amount),
            balance_after: Set(balance),
            remark: Set(Some(format!("充值订单 {}", order.order_no))),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(order_no = %order.order_no, amount, balance, "订单已确认支付");
        Ok(order)
    }

    /// 退款：扣回到账的算力，余额不足时拒绝
    #[instrument(skip(self))]
    pub async fn refund(&self, id: Uuid) -> PlatformResult<order::Model> {
        let txn = self.db.begin().await?;
        let now: DateTimeWithTimeZone = Utc::now().into();

        let updated = Order::update_many()
            .col_expr(order::Column::PayStatus, Expr::value(PayStatus::Refunded))
            .col_expr(order::Column::RefundedAt, Expr::value(Some(now)))
            .col_expr(order::Column::UpdatedAt, Expr::value(now))
            .filter(order::Column::Id.eq(id))
            .filter(order::Column::PayStatus.eq(PayStatus::Paid))
            .exec(&txn)
            .await?;
        let order = get_order(&txn, id).await?;
        if updated.rows_affected == 0 {
            return Err(PlatformError::conflict("只有已支付的订单可以退款"));
        }

        let amount = order.total_power();
        let balance = change_power(&txn, order.user_id, -amount).await?;
        account_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(order.user_id),
            order_id: Set(Some(order.id)),
            change_type: Set(AccountChangeType::Refund),
            amount: Set(-amount),
            balance_after: Set(balance),
            remark: Set(Some(format!("订单退款 {}", order.order_no))),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(order_no = %order.order_no, amount, balance, "订单已退款");
        Ok(order)
    }

    async fn get_rule(&self, id: Uuid) -> PlatformResult<recharge_rule::Model> {
        RechargeRule::find_by_id(id)
            .filter(recharge_rule::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or_else(|| PlatformError::not_found(format!("充值套餐 {}", id)))
    }
}

async fn get_order<C: ConnectionTrait>(db: &C, id: Uuid) -> PlatformResult<order::Model> {
    Order::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| PlatformError::not_found(format!("订单 {}", id)))
}

/// 调整用户算力，返回变动后的余额
///
/// 余额在数据库中原子增减；扣减时要求余额足够，否则不做任何修改。
async fn change_power<C: ConnectionTrait>(db: &C, user_id: Uuid, delta: i64) -> PlatformResult<i64> {
    let mut update = User::update_many()
        .col_expr(user::Column::Power, Expr::col(user::Column::Power).add(delta))
        .col_expr(user::Column::UpdatedAt, Expr::value(DateTimeWithTimeZone::from(Utc::now())))
        .filter(user::Column::Id.eq(user_id));
    if delta < 0 {
        update = update.filter(user::Column::Power.gte(-delta));
    }
    let updated = update.exec(db).await?;

    let user = UserRepository::get_by_id(db, user_id).await?;
    if updated.rows_affected == 0 {
        warn!(user_id = %user_id, power = user.power, delta, "算力余额不足");
        return Err(PlatformError::business("用户算力余额不足，无法退款"));
    }
    Ok(user.power)
}
