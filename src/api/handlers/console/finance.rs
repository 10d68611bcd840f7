// 控制台充值套餐、订单与财务

use actix_web::web;
use uuid::Uuid;

use crate::api::extractors::{AuthUser, Pagination, ValidatedJson};
use crate::api::responses::{ok, ok_message, paginated, ApiResult};
use crate::api::state::AppState;
use crate::services::finance::AccountLogQuery;
use crate::services::recharge::{OrderQuery, RechargeRuleRequest};
use crate::services::{FinanceService, RechargeService};

pub async fn list_rules(state: web::Data<AppState>, user: AuthUser) -> ApiResult {
    user.require_permission("console:recharge-rule:list")?;
    ok(RechargeService::new(state.db.clone()).list_rules().await?)
}

pub async fn create_rule(
    state: web::Data<AppState>,
    user: AuthUser,
    body: ValidatedJson<RechargeRuleRequest>,
) -> ApiResult {
    user.require_permission("console:recharge-rule:create")?;
    ok(RechargeService::new(state.db.clone())
        .create_rule(body.into_inner())
        .await?)
}

pub async fn update_rule(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: ValidatedJson<RechargeRuleRequest>,
) -> ApiResult {
    user.require_permission("console:recharge-rule:update")?;
    ok(RechargeService::new(state.db.clone())
        .update_rule(path.into_inner(), body.into_inner())
        .await?)
}

pub async fn delete_rule(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    user.require_permission("console:recharge-rule:delete")?;
    RechargeService::new(state.db.clone())
        .delete_rule(path.into_inner())
        .await?;
    ok_message("充值套餐已删除")
}

pub async fn list_orders(
    state: web::Data<AppState>,
    user: AuthUser,
    page: Pagination,
    query: web::Query<OrderQuery>,
) -> ApiResult {
    user.require_permission("console:order:list")?;
    paginated(
        RechargeService::new(state.db.clone())
            .list_orders(query.into_inner(), *page)
            .await?,
    )
}

/// 人工确认到账
pub async fn confirm_paid(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    user.require_permission("console:order:confirm")?;
    ok(RechargeService::new(state.db.clone())
        .confirm_paid(path.into_inner())
        .await?)
}

pub async fn refund(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    user.require_permission("console:order:refund")?;
    ok(RechargeService::new(state.db.clone())
        .refund(path.into_inner())
        .await?)
}

pub async fn center(state: web::Data<AppState>, user: AuthUser) -> ApiResult {
    user.require_permission("console:finance:center")?;
    ok(FinanceService::new(state.db.clone()).center().await?)
}

pub async fn account_logs(
    state: web::Data<AppState>,
    user: AuthUser,
    page: Pagination,
    query: web::Query<AccountLogQuery>,
) -> ApiResult {
    user.require_permission("console:finance:account-log")?;
    paginated(
        FinanceService::new(state.db.clone())
            .account_logs(query.into_inner(), *page)
            .await?,
    )
}

pub fn configure_finance_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/recharge-rules")
            .route("", web::get().to(list_rules))
            .route("", web::post().to(create_rule))
            .route("/{id}", web::put().to(update_rule))
            .route("/{id}", web::delete().to(delete_rule)),
    )
    .service(
        web::scope("/orders")
            .route("", web::get().to(list_orders))
            .route("/{id}/confirm-paid", web::post().to(confirm_paid))
            .route("/{id}/refund", web::post().to(refund)),
    )
    .service(
        web::scope("/finance")
            .route("/center", web::get().to(center))
            .route("/account-logs", web::get().to(account_logs)),
    );
}
