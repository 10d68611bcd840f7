// Web 端模型与智能体

use actix_web::web;
use uuid::Uuid;

use crate::api::extractors::Pagination;
use crate::api::responses::{ok, paginated, ApiResult, Envelope};
use crate::api::state::AppState;
use crate::services::agent::AgentQuery;
use crate::services::{AgentService, AiProviderService};

/// 可用的对话模型，默认模型排在最前
#[utoipa::path(
    get,
    path = "/api/ai-models",
    tag = "Agent",
    responses((status = 200, description = "对话模型列表", body = Envelope))
)]
pub async fn chat_models(state: web::Data<AppState>) -> ApiResult {
    let service = AiProviderService::new(state.db.clone(), state.config.clone());
    ok(service.web_chat_models().await?)
}

/// 已发布的智能体
#[utoipa::path(
    get,
    path = "/api/agents",
    tag = "Agent",
    params(
        AgentQuery,
        ("page" = Option<u64>, Query, description = "页码，从 1 开始"),
        ("pageSize" = Option<u64>, Query, description = "每页数量")
    ),
    responses((status = 200, description = "智能体分页列表", body = Envelope))
)]
pub async fn list(
    state: web::Data<AppState>,
    page: Pagination,
    query: web::Query<AgentQuery>,
) -> ApiResult {
    paginated(
        AgentService::new(state.db.clone())
            .list_public(query.into_inner(), *page)
            .await?,
    )
}

#[utoipa::path(
    get,
    path = "/api/agents/{id}",
    tag = "Agent",
    params(("id" = Uuid, Path, description = "智能体 ID")),
    responses(
        (status = 200, description = "智能体详情", body = Envelope),
        (status = 404, description = "不存在或未发布")
    )
)]
pub async fn detail(state: web::Data<AppState>, path: web::Path<Uuid>) -> ApiResult {
    ok(AgentService::new(state.db.clone())
        .public_detail(path.into_inner())
        .await?)
}

pub fn configure_agent_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ai-models", web::get().to(chat_models)).service(
        web::scope("/agents")
            .route("", web::get().to(list))
            .route("/{id}", web::get().to(detail)),
    );
}
