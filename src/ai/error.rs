// AI SDK 错误类型

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// AI 错误代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AIErrorCode {
    /// 提供商配置无效（缺少密钥、地址格式错误等）
    InvalidConfig,
    /// 请求发送失败
    Request,
    /// 响应状态异常或无法解析
    Response,
    /// 请求超时
    Timeout,
    /// 提供商不支持该能力
    Unsupported,
}

impl AIErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::Request => "REQUEST",
            Self::Response => "RESPONSE",
            Self::Timeout => "TIMEOUT",
            Self::Unsupported => "UNSUPPORTED",
        }
    }
}

impl fmt::Display for AIErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// AI 调用错误
#[derive(Debug, Error)]
#[error("[{code}] {message}")]
pub struct AIError {
    pub code: AIErrorCode,
    pub message: String,
    #[source]
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AIError {
    pub fn new(code: AIErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    /// 附带底层错误
    pub fn with_cause(
        code: AIErrorCode,
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(AIErrorCode::InvalidConfig, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(AIErrorCode::Unsupported, message)
    }

    pub fn response(message: impl Into<String>) -> Self {
        Self::new(AIErrorCode::Response, message)
    }

    /// 将 reqwest 错误归类为超时或请求错误
    pub fn from_reqwest(context: &str, err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            AIErrorCode::Timeout
        } else if err.is_decode() {
            AIErrorCode::Response
        } else {
            AIErrorCode::Request
        };
        Self::with_cause(code, format!("{}: {}", context, err), err)
    }
}
