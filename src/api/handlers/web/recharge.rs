// Web 端充值

use actix_web::web;

use crate::api::extractors::{AuthUser, Pagination, ValidatedJson};
use crate::api::responses::{ok, paginated, ApiResult, Envelope};
use crate::api::state::AppState;
use crate::services::recharge::CreateOrderRequest;
use crate::services::RechargeService;

#[utoipa::path(
    get,
    path = "/api/recharge/rules",
    tag = "Recharge",
    responses((status = 200, description = "上架中的充值套餐", body = Envelope))
)]
pub async fn rules(state: web::Data<AppState>) -> ApiResult {
    ok(RechargeService::new(state.db.clone()).list_active_rules().await?)
}

/// 按套餐下单，订单金额和算力取下单时的套餐快照
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Recharge",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "待支付订单", body = Envelope),
        (status = 404, description = "套餐不存在"),
        (status = 400, description = "套餐已下架")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_order(
    state: web::Data<AppState>,
    user: AuthUser,
    body: ValidatedJson<CreateOrderRequest>,
) -> ApiResult {
    ok(RechargeService::new(state.db.clone())
        .create_order(user.id(), body.into_inner())
        .await?)
}

#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Recharge",
    params(
        ("page" = Option<u64>, Query, description = "页码，从 1 开始"),
        ("pageSize" = Option<u64>, Query, description = "每页数量")
    ),
    responses((status = 200, description = "当前用户的订单", body = Envelope)),
    security(("bearer_auth" = []))
)]
pub async fn orders(state: web::Data<AppState>, user: AuthUser, page: Pagination) -> ApiResult {
    paginated(
        RechargeService::new(state.db.clone())
            .user_orders(user.id(), *page)
            .await?,
    )
}

pub fn configure_order_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::get().to(orders))
            .route("", web::post().to(create_order)),
    );
}
