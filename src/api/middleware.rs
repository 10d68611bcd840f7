// HTTP 中间件配置

use actix_cors::Cors;
use actix_web::http::{header, Method};

use crate::config::SecurityConfig;

/// 根据 `security.cors_origins` 构建 CORS 中间件，`*` 表示允许任意来源
pub fn build_cors(config: &SecurityConfig) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
        .allowed_header("x-request-id")
        .expose_headers(vec!["x-request-id", "x-error-code"])
        .max_age(3600);

    if config.cors_origins.iter().any(|origin| origin == "*") {
        return cors.allow_any_origin();
    }

    config
        .cors_origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}
