// 请求日志上下文
// 记录请求来自控制台还是 Web 端，以及发起请求的用户

use actix_web::{http::header, HttpRequest};
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::errors::get_request_id_from_http;

/// 请求所属的接口端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiSurface {
    Console,
    Web,
    /// 健康检查、上传文件、接口文档等
    System,
}

impl ApiSurface {
    /// 按路由前缀判断接口端
    pub fn from_path(path: &str, server: &ServerConfig) -> Self {
        if under_prefix(path, &server.console_prefix) {
            Self::Console
        } else if under_prefix(path, &server.web_prefix) {
            Self::Web
        } else {
            Self::System
        }
    }
}

impl fmt::Display for ApiSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Console => "console",
            Self::Web => "web",
            Self::System => "system",
        };
        f.write_str(name)
    }
}

fn under_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    !prefix.is_empty()
        && path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// 单个请求的日志上下文
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub surface: ApiSurface,
    pub user_id: Option<Uuid>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub method: String,
    pub path: String,
    started_at: Instant,
}

impl RequestContext {
    /// 从 HTTP 请求构建，沿用错误处理中间件分配的请求 ID
    pub fn from_http_request(req: &HttpRequest, server: &ServerConfig) -> Self {
        let request_id = get_request_id_from_http(req)
            .or_else(|| {
                req.headers()
                    .get("X-Request-ID")
                    .and_then(|h| h.to_str().ok())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            request_id,
            surface: ApiSurface::from_path(req.path(), server),
            user_id: None,
            client_ip: req
                .connection_info()
                .realip_remote_addr()
                .map(str::to_string),
            user_agent: req
                .headers()
                .get(header::USER_AGENT)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string),
            method: req.method().to_string(),
            path: req.path().to_string(),
            started_at: Instant::now(),
        }
    }

    pub fn with_user_id(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// 自上下文创建以来的毫秒数
    pub fn elapsed_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }
}

/// 携带请求上下文输出日志
///
/// ```ignore
/// log_with_context!(info, context, conversation_id = %id, "对话请求完成");
/// ```
#[macro_export]
macro_rules! log_with_context {
    ($level:ident, $context:expr, $($arg:tt)*) => {
        tracing::$level!(
            request_id = %$context.request_id,
            surface = %$context.surface,
            user_id = ?$context.user_id,
            elapsed_ms = $context.elapsed_ms() as u64,
            $($arg)*
        );
    };
}
