// 控制台扩展管理与文件上传

use actix_multipart::Multipart;
use actix_web::web;
use uuid::Uuid;

use crate::api::extractors::{AuthUser, ValidatedJson};
use crate::api::handlers::files;
use crate::api::responses::{ok, ok_message, ApiResult};
use crate::api::state::AppState;
use crate::services::dataset::EnabledRequest;
use crate::services::extension::{ExtensionQuery, InstallExtensionRequest, UpdateExtensionRequest};
use crate::services::ExtensionService;

pub async fn list(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<ExtensionQuery>,
) -> ApiResult {
    user.require_permission("console:extension:list")?;
    ok(ExtensionService::new(state.db.clone())
        .list(query.into_inner())
        .await?)
}

pub async fn marketplace(state: web::Data<AppState>, user: AuthUser) -> ApiResult {
    user.require_permission("console:extension:list")?;
    ok(ExtensionService::new(state.db.clone()).marketplace().await?)
}

pub async fn install(
    state: web::Data<AppState>,
    user: AuthUser,
    body: ValidatedJson<InstallExtensionRequest>,
) -> ApiResult {
    user.require_permission("console:extension:install")?;
    ok(ExtensionService::new(state.db.clone())
        .install(body.into_inner())
        .await?)
}

pub async fn update(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: ValidatedJson<UpdateExtensionRequest>,
) -> ApiResult {
    user.require_permission("console:extension:update")?;
    ok(ExtensionService::new(state.db.clone())
        .update(path.into_inner(), body.into_inner())
        .await?)
}

pub async fn set_enabled(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: ValidatedJson<EnabledRequest>,
) -> ApiResult {
    user.require_permission("console:extension:enable")?;
    ok(ExtensionService::new(state.db.clone())
        .set_enabled(path.into_inner(), body.enabled)
        .await?)
}

pub async fn uninstall(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    user.require_permission("console:extension:delete")?;
    ExtensionService::new(state.db.clone())
        .uninstall(path.into_inner())
        .await?;
    ok_message("扩展已卸载")
}

/// 控制台上传文件，表单字段 `file`
pub async fn upload(state: web::Data<AppState>, user: AuthUser, payload: Multipart) -> ApiResult {
    user.require_permission("console:upload:file")?;
    ok(files::receive(&state, user.id(), payload).await?)
}

pub fn configure_extension_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/extensions")
            .route("", web::get().to(list))
            .route("", web::post().to(install))
            .route("/marketplace", web::get().to(marketplace))
            .route("/{id}", web::put().to(update))
            .route("/{id}", web::delete().to(uninstall))
            .route("/{id}/enabled", web::put().to(set_enabled)),
    )
    .route("/upload/file", web::post().to(upload));
}
