// Web 端注册、登录与个人资料

use actix_multipart::Multipart;
use actix_web::web;
use tracing::info;

use crate::api::extractors::{AuthUser, ValidatedJson};
use crate::api::handlers::files;
use crate::api::responses::{ok, ok_message, ApiResult, Envelope};
use crate::api::state::AppState;
use crate::services::auth::{
    ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
};
use crate::services::AuthService;

fn service(state: &AppState) -> AuthService {
    AuthService::new(state.db.clone(), state.config.clone())
}

/// 用户注册
///
/// 注册成功后直接返回访问令牌。
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "注册成功", body = Envelope),
        (status = 400, description = "参数错误"),
        (status = 409, description = "用户名已存在"),
        (status = 400, description = "注册功能已关闭")
    )
)]
pub async fn register(state: web::Data<AppState>, body: ValidatedJson<RegisterRequest>) -> ApiResult {
    let response = service(&state).register(body.into_inner()).await?;
    info!(user_id = %response.user.id, "新用户注册");
    ok(response)
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "登录成功", body = Envelope),
        (status = 401, description = "用户名或密码错误")
    )
)]
pub async fn login(state: web::Data<AppState>, body: ValidatedJson<LoginRequest>) -> ApiResult {
    ok(service(&state).login(body.into_inner()).await?)
}

#[utoipa::path(
    get,
    path = "/api/user/info",
    tag = "User",
    responses(
        (status = 200, description = "当前用户资料", body = Envelope),
        (status = 401, description = "未登录")
    ),
    security(("bearer_auth" = []))
)]
pub async fn info(state: web::Data<AppState>, user: AuthUser) -> ApiResult {
    ok(service(&state).profile(user.id()).await?)
}

#[utoipa::path(
    put,
    path = "/api/user/info",
    tag = "User",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "更新后的资料", body = Envelope),
        (status = 400, description = "参数错误")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_info(
    state: web::Data<AppState>,
    user: AuthUser,
    body: ValidatedJson<UpdateProfileRequest>,
) -> ApiResult {
    ok(service(&state)
        .update_profile(user.id(), body.into_inner())
        .await?)
}

#[utoipa::path(
    post,
    path = "/api/user/change-password",
    tag = "User",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "修改成功", body = Envelope),
        (status = 400, description = "原密码错误")
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    state: web::Data<AppState>,
    user: AuthUser,
    body: ValidatedJson<ChangePasswordRequest>,
) -> ApiResult {
    service(&state)
        .change_password(user.id(), body.into_inner())
        .await?;
    ok_message("密码已修改")
}

/// 上传文件，表单字段 `file`
#[utoipa::path(
    post,
    path = "/api/upload/file",
    tag = "User",
    request_body(content = String, content_type = "multipart/form-data", description = "字段 file"),
    responses(
        (status = 200, description = "文件记录", body = Envelope),
        (status = 400, description = "文件类型或大小不符合要求")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload(state: web::Data<AppState>, user: AuthUser, payload: Multipart) -> ApiResult {
    ok(files::receive(&state, user.id(), payload).await?)
}

pub fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/user")
            .route("/info", web::get().to(info))
            .route("/info", web::put().to(update_info))
            .route("/change-password", web::post().to(change_password)),
    )
    .route("/upload/file", web::post().to(upload));
}
