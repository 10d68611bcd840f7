// 控制台字典、页面装修与标签

use actix_web::web;
use uuid::Uuid;

use crate::api::extractors::{AuthUser, ValidatedJson};
use crate::api::responses::{ok, ok_message, ApiResult};
use crate::api::state::AppState;
use crate::services::decorate::SaveDecorateRequest;
use crate::services::dict::{DictQuery, DictRequest};
use crate::services::tag::{TagQuery, TagRequest};
use crate::services::{DecorateService, DictService, TagService};

pub async fn list_dicts(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<DictQuery>,
) -> ApiResult {
    user.require_permission("console:dict:list")?;
    ok(DictService::new(state.db.clone()).list(query.into_inner()).await?)
}

pub async fn create_dict(
    state: web::Data<AppState>,
    user: AuthUser,
    body: ValidatedJson<DictRequest>,
) -> ApiResult {
    user.require_permission("console:dict:create")?;
    ok(DictService::new(state.db.clone()).create(body.into_inner()).await?)
}

pub async fn update_dict(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: ValidatedJson<DictRequest>,
) -> ApiResult {
    user.require_permission("console:dict:update")?;
    ok(DictService::new(state.db.clone())
        .update(path.into_inner(), body.into_inner())
        .await?)
}

pub async fn delete_dict(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    user.require_permission("console:dict:delete")?;
    DictService::new(state.db.clone()).delete(path.into_inner()).await?;
    ok_message("字典项已删除")
}

pub async fn list_decorates(state: web::Data<AppState>, user: AuthUser) -> ApiResult {
    user.require_permission("console:decorate:list")?;
    ok(DecorateService::new(state.db.clone()).list().await?)
}

/// 按名称保存装修页面，存在则覆盖
pub async fn save_decorate(
    state: web::Data<AppState>,
    user: AuthUser,
    body: ValidatedJson<SaveDecorateRequest>,
) -> ApiResult {
    user.require_permission("console:decorate:save")?;
    ok(DecorateService::new(state.db.clone()).save(body.into_inner()).await?)
}

pub async fn list_tags(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<TagQuery>,
) -> ApiResult {
    user.require_permission("console:tag:list")?;
    ok(TagService::new(state.db.clone()).list(query.into_inner()).await?)
}

pub async fn create_tag(
    state: web::Data<AppState>,
    user: AuthUser,
    body: ValidatedJson<TagRequest>,
) -> ApiResult {
    user.require_permission("console:tag:create")?;
    ok(TagService::new(state.db.clone()).create(body.into_inner()).await?)
}

pub async fn update_tag(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: ValidatedJson<TagRequest>,
) -> ApiResult {
    user.require_permission("console:tag:update")?;
    ok(TagService::new(state.db.clone())
        .update(path.into_inner(), body.into_inner())
        .await?)
}

pub async fn delete_tag(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    user.require_permission("console:tag:delete")?;
    TagService::new(state.db.clone()).delete(path.into_inner()).await?;
    ok_message("标签已删除")
}

pub fn configure_setting_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/dicts")
            .route("", web::get().to(list_dicts))
            .route("", web::post().to(create_dict))
            .route("/{id}", web::put().to(update_dict))
            .route("/{id}", web::delete().to(delete_dict)),
    )
    .service(
        web::scope("/decorates")
            .route("", web::get().to(list_decorates))
            .route("", web::post().to(save_decorate)),
    )
    .service(
        web::scope("/tags")
            .route("", web::get().to(list_tags))
            .route("", web::post().to(create_tag))
            .route("/{id}", web::put().to(update_tag))
            .route("/{id}", web::delete().to(delete_tag)),
    );
}
