// 错误响应信封

use actix_web::{http::StatusCode, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::PlatformError;

/// 错误响应，与成功响应共用 `{code, message, data, timestamp}` 信封
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    /// 只写入 `X-Error-Code` 响应头
    #[serde(skip)]
    pub error_code: &'static str,
}

impl ErrorResponse {
    pub fn from_error(error: &PlatformError) -> Self {
        Self {
            code: i32::from(error.status_code()),
            message: error.to_string(),
            data: None,
            timestamp: Utc::now(),
            error_code: error.error_code(),
        }
    }

    pub fn into_http_response(self) -> HttpResponse {
        let status = u16::try_from(self.code)
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        HttpResponse::build(status)
            .insert_header(("X-Error-Code", self.error_code))
            .json(self)
    }
}
