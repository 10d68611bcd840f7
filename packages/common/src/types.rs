// 通用类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 成功响应码
pub const SUCCESS_CODE: i32 = 200;

/// 统一 API 响应结构 `{code, message, data, timestamp}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::success_with_message(data, "success")
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            code: SUCCESS_CODE,
            message: message.into(),
            data: Some(data),
            timestamp: Utc::now(),
        }
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

/// 默认页码
pub const DEFAULT_PAGE: u64 = 1;
/// 默认每页条数
pub const DEFAULT_PAGE_SIZE: u64 = 15;
/// 每页条数上限
pub const MAX_PAGE_SIZE: u64 = 100;
/// 页码上限，保证偏移量不超出 `i64` 范围
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PAGE_SIZE;

/// 分页参数（查询字符串 `page` / `pageSize`）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

fn default_page() -> u64 {
    DEFAULT_PAGE
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationParams {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self { page, page_size }.normalized()
    }

    /// 修正越界参数：页码限制在 1..=MAX_PAGE，每页条数限制在 1..=100
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.clamp(1, MAX_PAGE),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// 数据库分页使用的零基页索引
    pub fn page_index(&self) -> u64 {
        self.page.saturating_sub(1)
    }

    pub fn offset(&self) -> u64 {
        self.page_index().saturating_mul(self.page_size)
    }
}

/// 分页响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, params: PaginationParams) -> Self {
        let total_pages = if params.page_size == 0 {
            0
        } else {
            total.div_ceil(params.page_size)
        };
        Self {
            items,
            total,
            page: params.page,
            page_size: params.page_size,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}

/// 用户 ID 类型
pub type UserId = Uuid;

/// 请求 ID 类型
pub type RequestId = String;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_normalized() {
        let params = PaginationParams { page: 0, page_size: 500 }.normalized();
        assert_eq!(params.page, 1);
        assert_eq!(params.page_size, MAX_PAGE_SIZE);
        assert_eq!(params.offset(), 0);

        let params = PaginationParams::new(3, 10);
        assert_eq!(params.offset(), 20);
        assert_eq!(params.page_index(), 2);
    }

    #[test]
    fn test_pagination_huge_page_is_capped() {
        let params = PaginationParams::new(u64::MAX, MAX_PAGE_SIZE);
        assert_eq!(params.page, MAX_PAGE);
        assert!(params.offset() <= i64::MAX as u64);

        let raw = PaginationParams { page: u64::MAX, page_size: u64::MAX };
        assert_eq!(raw.offset(), u64::MAX);
    }

    #[test]
    fn test_pagination_query_names() {
        let params: PaginationParams =
            serde_json::from_str(r#"{"page": 2, "pageSize": 30}"#).unwrap();
        assert_eq!(params, PaginationParams::new(2, 30));

        let params: PaginationParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params, PaginationParams::default());
    }

    #[test]
    fn test_paginated_response_pages() {
        let response = PaginatedResponse::new(vec![1, 2, 3], 31, PaginationParams::new(1, 15));
        assert_eq!(response.total_pages, 3);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["pageSize"], 15);
        assert_eq!(json["totalPages"], 3);
    }

    #[test]
    fn test_api_response_envelope() {
        let response = ApiResponse::success(42);
        assert!(response.is_success());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["code"], 200);
        assert_eq!(json["data"], 42);
        assert!(json.get("timestamp").is_some());

        let error: ApiResponse<()> = ApiResponse::error(404, "missing");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["code"], 404);
        assert!(json["data"].is_null());
    }
}
