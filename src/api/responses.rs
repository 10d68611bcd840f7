// 响应辅助函数
// 所有成功响应都包装为 `{code, message, data, timestamp}`

use actix_web::HttpResponse;
use agentdock_common::{ApiResponse, PaginatedResponse};
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::PlatformError;

/// 处理器返回类型
pub type ApiResult = Result<HttpResponse, PlatformError>;

pub fn ok<T: Serialize>(data: T) -> ApiResult {
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> ApiResult {
    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(data, message)))
}

/// 无数据的成功响应，`data` 为 null
pub fn ok_message(message: impl Into<String>) -> ApiResult {
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_with_message((), message)))
}

pub fn paginated<T: Serialize>(page: PaginatedResponse<T>) -> ApiResult {
    ok(page)
}

/// 文档中使用的统一响应结构
#[derive(Debug, Serialize, ToSchema)]
pub struct Envelope {
    /// 200 表示成功，其它值与 HTTP 状态码一致
    pub code: i32,
    pub message: String,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
