// 请求 ID 中间件与提取器错误处理

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{JsonPayloadError, PathError, QueryPayloadError},
    http::{
        header::{HeaderName, HeaderValue},
        Method, StatusCode,
    },
    Error, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    time::Instant,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::PlatformError;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// 请求 ID，保存在请求扩展中
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// 沿用客户端传入的 `X-Request-ID`，否则生成新的
fn request_id_of(req: &ServiceRequest) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn log_completion(request_id: &str, method: &Method, path: &str, status: StatusCode, started: Instant) {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let status = status.as_u16();
    match status {
        500.. => error!(request_id, %method, path, status, elapsed_ms, "服务器错误"),
        400..=499 => warn!(request_id, %method, path, status, elapsed_ms, "客户端错误"),
        _ => info!(request_id, %method, path, status, elapsed_ms, "请求完成"),
    }
}

/// 为每个请求分配请求 ID，记录状态与耗时，并在响应头回写 `X-Request-ID`
pub struct ErrorHandlerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for ErrorHandlerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ErrorHandlerMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ErrorHandlerMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct ErrorHandlerMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ErrorHandlerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let request_id = request_id_of(&req);
            req.extensions_mut().insert(RequestId(request_id.clone()));

            let method = req.method().clone();
            let path = req.path().to_string();
            let started = Instant::now();

            let mut response = service.call(req).await.inspect_err(|err| {
                error!(request_id = %request_id, %method, path = %path, error = %err, "请求处理失败");
            })?;

            log_completion(&request_id, &method, &path, response.status(), started);
            if let Ok(value) = HeaderValue::from_str(&request_id) {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }
            Ok(response)
        })
    }
}

/// 从请求扩展中读取请求 ID
pub fn get_request_id_from_http(req: &HttpRequest) -> Option<String> {
    req.extensions().get::<RequestId>().map(|id| id.0.clone())
}

/// JSON 请求体解析失败时返回统一信封
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> Error {
    let message = match &err {
        JsonPayloadError::ContentType => "请求内容类型必须为 application/json".to_string(),
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            "请求体过大".to_string()
        }
        other => format!("请求体格式错误: {}", other),
    };
    PlatformError::validation("body", message).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> Error {
    PlatformError::validation("query", format!("查询参数错误: {}", err)).into()
}

pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> Error {
    PlatformError::validation("path", format!("路径参数错误: {}", err)).into()
}
