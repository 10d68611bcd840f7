// 控制台智能体管理

use actix_web::web;
use uuid::Uuid;

use crate::api::extractors::{AuthUser, Pagination, ValidatedJson};
use crate::api::responses::{ok, ok_message, paginated, ApiResult};
use crate::api::state::AppState;
use crate::services::agent::{AgentQuery, AgentRequest};
use crate::services::AgentService;

pub async fn list(
    state: web::Data<AppState>,
    user: AuthUser,
    page: Pagination,
    query: web::Query<AgentQuery>,
) -> ApiResult {
    user.require_permission("console:agent:list")?;
    paginated(
        AgentService::new(state.db.clone())
            .list(query.into_inner(), *page)
            .await?,
    )
}

pub async fn detail(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    user.require_permission("console:agent:detail")?;
    ok(AgentService::new(state.db.clone()).detail(path.into_inner()).await?)
}

pub async fn create(
    state: web::Data<AppState>,
    user: AuthUser,
    body: ValidatedJson<AgentRequest>,
) -> ApiResult {
    user.require_permission("console:agent:create")?;
    ok(AgentService::new(state.db.clone())
        .create(user.id(), body.into_inner())
        .await?)
}

pub async fn update(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: ValidatedJson<AgentRequest>,
) -> ApiResult {
    user.require_permission("console:agent:update")?;
    ok(AgentService::new(state.db.clone())
        .update(path.into_inner(), body.into_inner())
        .await?)
}

pub async fn publish(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    user.require_permission("console:agent:publish")?;
    ok(AgentService::new(state.db.clone())
        .set_public(path.into_inner(), true)
        .await?)
}

pub async fn unpublish(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    user.require_permission("console:agent:publish")?;
    ok(AgentService::new(state.db.clone())
        .set_public(path.into_inner(), false)
        .await?)
}

pub async fn delete(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    user.require_permission("console:agent:delete")?;
    AgentService::new(state.db.clone()).delete(path.into_inner()).await?;
    ok_message("智能体已删除")
}

pub fn configure_agent_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/agents")
            .route("", web::get().to(list))
            .route("", web::post().to(create))
            .route("/{id}", web::get().to(detail))
            .route("/{id}", web::put().to(update))
            .route("/{id}", web::delete().to(delete))
            .route("/{id}/publish", web::post().to(publish))
            .route("/{id}/unpublish", web::post().to(unpublish)),
    );
}
