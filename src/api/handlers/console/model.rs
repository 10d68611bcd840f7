// 控制台 AI 提供商与模型管理

use actix_web::web;
use uuid::Uuid;

use crate::api::extractors::{AuthUser, ValidatedJson};
use crate::api::responses::{ok, ok_message, ApiResult};
use crate::api::state::AppState;
use crate::services::ai_provider::{ModelQuery, ModelRequest, ProviderRequest};
use crate::services::AiProviderService;

fn service(state: &AppState) -> AiProviderService {
    AiProviderService::new(state.db.clone(), state.config.clone())
}

pub async fn list_providers(state: web::Data<AppState>, user: AuthUser) -> ApiResult {
    user.require_permission("console:ai-provider:list")?;
    ok(service(&state).list_providers().await?)
}

pub async fn provider_detail(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> ApiResult {
    user.require_permission("console:ai-provider:list")?;
    ok(service(&state).provider_detail(path.into_inner()).await?)
}

pub async fn create_provider(
    state: web::Data<AppState>,
    user: AuthUser,
    body: ValidatedJson<ProviderRequest>,
) -> ApiResult {
    user.require_permission("console:ai-provider:create")?;
    ok(service(&state).create_provider(body.into_inner()).await?)
}

pub async fn update_provider(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: ValidatedJson<ProviderRequest>,
) -> ApiResult {
    user.require_permission("console:ai-provider:update")?;
    ok(service(&state)
        .update_provider(path.into_inner(), body.into_inner())
        .await?)
}

pub async fn toggle_provider(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> ApiResult {
    user.require_permission("console:ai-provider:update")?;
    ok(service(&state).toggle_provider(path.into_inner()).await?)
}

pub async fn delete_provider(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> ApiResult {
    user.require_permission("console:ai-provider:delete")?;
    service(&state).delete_provider(path.into_inner()).await?;
    ok_message("提供商已删除")
}

pub async fn list_models(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<ModelQuery>,
) -> ApiResult {
    user.require_permission("console:ai-model:list")?;
    ok(service(&state).list_models(query.into_inner()).await?)
}

pub async fn create_model(
    state: web::Data<AppState>,
    user: AuthUser,
    body: ValidatedJson<ModelRequest>,
) -> ApiResult {
    user.require_permission("console:ai-model:create")?;
    ok(service(&state).create_model(body.into_inner()).await?)
}

pub async fn update_model(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: ValidatedJson<ModelRequest>,
) -> ApiResult {
    user.require_permission("console:ai-model:update")?;
    ok(service(&state)
        .update_model(path.into_inner(), body.into_inner())
        .await?)
}

pub async fn delete_model(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    user.require_permission("console:ai-model:delete")?;
    service(&state).delete_model(path.into_inner()).await?;
    ok_message("模型已删除")
}

/// 向提供商发起一次真实调用
pub async fn test_model(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    user.require_permission("console:ai-model:test")?;
    ok(service(&state).test_model(path.into_inner()).await?)
}

pub fn configure_model_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/ai-providers")
            .route("", web::get().to(list_providers))
            .route("", web::post().to(create_provider))
            .route("/{id}", web::get().to(provider_detail))
            .route("/{id}", web::put().to(update_provider))
            .route("/{id}", web::delete().to(delete_provider))
            .route("/{id}/toggle", web::post().to(toggle_provider)),
    )
    .service(
        web::scope("/ai-models")
            .route("", web::get().to(list_models))
            .route("", web::post().to(create_model))
            .route("/{id}", web::put().to(update_model))
            .route("/{id}", web::delete().to(delete_model))
            .route("/{id}/test", web::post().to(test_model)),
    );
}
