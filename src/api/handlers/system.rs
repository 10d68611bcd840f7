// 系统端点：服务信息与健康检查

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::error;

use crate::api::responses::{ok, ApiResult, Envelope};
use crate::api::state::AppState;
use crate::db::ping;

/// 服务信息
pub async fn index(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "name": "AgentDock",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment.name,
        "consoleApi": state.config.server.console_prefix,
        "webApi": state.config.server.web_prefix,
        "docs": "/docs/",
        "timestamp": chrono::Utc::now(),
    }))
}

/// 健康检查，数据库不可用时返回 500
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    responses(
        (status = 200, description = "服务正常", body = Envelope),
        (status = 500, description = "数据库不可用")
    )
)]
pub async fn health(state: web::Data<AppState>) -> ApiResult {
    ping(&state.db).await.inspect_err(|e| {
        error!(error = %e, "健康检查失败");
    })?;

    ok(json!({
        "status": "healthy",
        "database": "up",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn configure_system_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/health", web::get().to(health));
}
