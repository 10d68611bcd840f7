// Web 端会话与对话

use actix_web::{web, HttpRequest, Responder};
use actix_web_lab::sse::{self, Sse};
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use uuid::Uuid;

use crate::api::extractors::{AuthUser, Pagination, ValidatedJson};
use crate::api::responses::{ok, ok_message, paginated, ApiResult, Envelope};
use crate::api::state::AppState;
use crate::errors::PlatformResult;
use crate::log_with_context;
use crate::logging::RequestContext;
use crate::services::conversation::{ChatOutcome, ChatRequest, RenameRequest};
use crate::services::ConversationService;

/// 流式推送时每个 `chunk` 事件携带的字符数
pub const STREAM_CHUNK_CHARS: usize = 8;

const KEEP_ALIVE: Duration = Duration::from_secs(15);

fn service(state: &AppState) -> ConversationService {
    ConversationService::new(state.db.clone(), state.config.clone())
}

fn json_event<T: Serialize>(name: &'static str, data: &T) -> PlatformResult<sse::Event> {
    Ok(sse::Event::Data(sse::Data::new_json(data)?.event(name)))
}

/// 把一轮对话拆成 `start`、若干 `chunk` 和 `done` 事件
pub fn chat_events(outcome: &ChatOutcome) -> PlatformResult<Vec<sse::Event>> {
    let mut events = vec![json_event(
        "start",
        &json!({
            "conversationId": outcome.conversation_id,
            "messageId": outcome.message_id,
        }),
    )?];

    let chars: Vec<char> = outcome.answer.answer.chars().collect();
    for piece in chars.chunks(STREAM_CHUNK_CHARS) {
        let content: String = piece.iter().collect();
        events.push(json_event("chunk", &json!({ "content": content }))?);
    }

    events.push(json_event("done", outcome)?);
    Ok(events)
}

/// 发送消息
///
/// 未指定会话时创建新会话；`stream` 为 true 时以 SSE 推送回答。
#[utoipa::path(
    post,
    path = "/api/conversations/chat",
    tag = "Conversation",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "对话结果，流式请求返回 text/event-stream", body = Envelope),
        (status = 404, description = "会话或智能体不存在")
    ),
    security(("bearer_auth" = []))
)]
pub async fn chat(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: AuthUser,
    body: ValidatedJson<ChatRequest>,
) -> ApiResult {
    let request = body.into_inner();
    let stream = request.stream;
    let context = RequestContext::from_http_request(&req, &state.config.server).with_user_id(user.id());

    let outcome = service(&state).chat(&state.rag, user.id(), request).await?;
    log_with_context!(
        info,
        context,
        conversation_id = %outcome.conversation_id,
        stream,
        "对话请求完成"
    );

    if !stream {
        return ok(outcome);
    }

    let events = chat_events(&outcome)?;
    let sse = Sse::from_stream(tokio_stream::iter(events.into_iter().map(Ok::<_, Infallible>)))
        .with_keep_alive(KEEP_ALIVE);
    Ok(sse.respond_to(&req).map_into_boxed_body())
}

#[utoipa::path(
    get,
    path = "/api/conversations",
    tag = "Conversation",
    params(
        ("page" = Option<u64>, Query, description = "页码，从 1 开始"),
        ("pageSize" = Option<u64>, Query, description = "每页数量")
    ),
    responses((status = 200, description = "会话分页列表，按最近更新排序", body = Envelope)),
    security(("bearer_auth" = []))
)]
pub async fn list(state: web::Data<AppState>, user: AuthUser, page: Pagination) -> ApiResult {
    paginated(service(&state).list(user.id(), *page).await?)
}

#[utoipa::path(
    get,
    path = "/api/conversations/{id}/messages",
    tag = "Conversation",
    params(
        ("id" = Uuid, Path, description = "会话 ID"),
        ("page" = Option<u64>, Query, description = "页码，从 1 开始"),
        ("pageSize" = Option<u64>, Query, description = "每页数量")
    ),
    responses(
        (status = 200, description = "消息分页列表，按时间正序", body = Envelope),
        (status = 404, description = "会话不存在")
    ),
    security(("bearer_auth" = []))
)]
pub async fn messages(
    state: web::Data<AppState>,
    user: AuthUser,
    page: Pagination,
    path: web::Path<Uuid>,
) -> ApiResult {
    paginated(
        service(&state)
            .messages(user.id(), path.into_inner(), *page)
            .await?,
    )
}

#[utoipa::path(
    put,
    path = "/api/conversations/{id}",
    tag = "Conversation",
    params(("id" = Uuid, Path, description = "会话 ID")),
    request_body = RenameRequest,
    responses(
        (status = 200, description = "重命名后的会话", body = Envelope),
        (status = 404, description = "会话不存在")
    ),
    security(("bearer_auth" = []))
)]
pub async fn rename(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: ValidatedJson<RenameRequest>,
) -> ApiResult {
    ok(service(&state)
        .rename(user.id(), path.into_inner(), body.into_inner())
        .await?)
}

#[utoipa::path(
    delete,
    path = "/api/conversations/{id}",
    tag = "Conversation",
    params(("id" = Uuid, Path, description = "会话 ID")),
    responses(
        (status = 200, description = "删除成功", body = Envelope),
        (status = 404, description = "会话不存在")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    service(&state).delete(user.id(), path.into_inner()).await?;
    ok_message("会话已删除")
}

pub fn configure_conversation_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/conversations")
            .route("", web::get().to(list))
            .route("/chat", web::post().to(chat))
            .route("/{id}", web::put().to(rename))
            .route("/{id}", web::delete().to(delete))
            .route("/{id}/messages", web::get().to(messages)),
    );
}
