// 控制台登录

use actix_web::web;
use tracing::info;

use crate::api::extractors::{AuthUser, ValidatedJson};
use crate::api::responses::{ok, ApiResult, Envelope};
use crate::api::state::AppState;
use crate::services::auth::LoginRequest;
use crate::services::AuthService;

/// 控制台登录
///
/// 只有超级管理员或拥有至少一项控制台权限的用户可以登录。
#[utoipa::path(
    post,
    path = "/consoleapi/auth/login",
    tag = "Console",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "登录成功", body = Envelope),
        (status = 401, description = "用户名或密码错误"),
        (status = 403, description = "没有控制台访问权限")
    )
)]
pub async fn login(state: web::Data<AppState>, body: ValidatedJson<LoginRequest>) -> ApiResult {
    let service = AuthService::new(state.db.clone(), state.config.clone());
    let response = service.console_login(body.into_inner()).await?;
    info!(user_id = %response.user.id, "控制台登录");
    ok(response)
}

/// 当前管理员资料与权限
pub async fn info(state: web::Data<AppState>, user: AuthUser) -> ApiResult {
    let service = AuthService::new(state.db.clone(), state.config.clone());
    ok(service.profile(user.id()).await?)
}

pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/info", web::get().to(info));
}
