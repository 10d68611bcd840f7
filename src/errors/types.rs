// 平台错误类型
// 每个变体对应一个 HTTP 状态码，状态码同时作为响应信封中的 code

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use agentdock_common::CommonError;
use thiserror::Error;
use tracing::error;

use crate::ai::{AIError, AIErrorCode};

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("配置错误: {message}")]
    Configuration { message: String },

    #[error("数据库错误: {message}")]
    Database { message: String },

    /// 模型供应商调用失败
    #[error("AI 服务错误: {message}")]
    AiService { message: String },

    /// 未登录、令牌无效或密码错误
    #[error("认证错误: {message}")]
    Authentication { message: String },

    /// 已登录但缺少权限，或访问他人资源
    #[error("授权错误: {message}")]
    Authorization { message: String },

    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("资源未找到: {resource}")]
    NotFound { resource: String },

    /// 唯一约束或状态冲突，如重复用户名、订单重复确认
    #[error("{message}")]
    Conflict { message: String },

    #[error("文件处理错误: {message}")]
    FileProcessing {
        message: String,
        file_name: Option<String>,
    },

    /// 业务规则不满足，如注册关闭、余额不足
    #[error("{message}")]
    Business { message: String },

    #[error("外部服务错误: {service} - {message}")]
    ExternalService { service: String, message: String },

    #[error("内部服务器错误: {message}")]
    Internal { message: String },

    #[error("请求超时: {operation}")]
    Timeout { operation: String },
}

pub type PlatformResult<T> = Result<T, PlatformError>;

/// 只携带 `message` 的变体构造函数
macro_rules! message_constructors {
    ($($name:ident => $variant:ident),* $(,)?) => {
        $(
            pub fn $name(message: impl Into<String>) -> Self {
                Self::$variant { message: message.into() }
            }
        )*
    };
}

impl PlatformError {
    message_constructors! {
        configuration => Configuration,
        database => Database,
        ai_service => AiService,
        authentication => Authentication,
        authorization => Authorization,
        conflict => Conflict,
        business => Business,
        internal => Internal,
    }

    /// 写入 `X-Error-Code` 响应头的错误代码
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Database { .. } => "DATABASE_ERROR",
            Self::AiService { .. } => "AI_SERVICE_ERROR",
            Self::Authentication { .. } => "AUTHENTICATION_ERROR",
            Self::Authorization { .. } => "AUTHORIZATION_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::FileProcessing { .. } => "FILE_PROCESSING_ERROR",
            Self::Business { .. } => "BUSINESS_ERROR",
            Self::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
            Self::Timeout { .. } => "TIMEOUT_ERROR",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } | Self::FileProcessing { .. } | Self::Business { .. } => 400,
            Self::Authentication { .. } => 401,
            Self::Authorization { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::Timeout { .. } => 408,
            Self::Conflict { .. } => 409,
            Self::AiService { .. } | Self::ExternalService { .. } => 502,
            Self::Configuration { .. } | Self::Database { .. } | Self::Internal { .. } => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// 常见的客户端错误不写错误日志
    pub fn should_log(&self) -> bool {
        !matches!(
            self,
            Self::Validation { .. }
                | Self::NotFound { .. }
                | Self::Authentication { .. }
                | Self::Business { .. }
        )
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn file_processing(message: impl Into<String>) -> Self {
        Self::FileProcessing {
            message: message.into(),
            file_name: None,
        }
    }

    pub fn file_processing_with_name(
        message: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self::FileProcessing {
            message: message.into(),
            file_name: Some(file_name.into()),
        }
    }

    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// 未登录或令牌失效
    pub fn unauthorized() -> Self {
        Self::authentication("请先登录")
    }

    /// 缺少权限码
    pub fn forbidden(permission: impl AsRef<str>) -> Self {
        Self::authorization(format!("缺少权限: {}", permission.as_ref()))
    }
}

impl ResponseError for PlatformError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(PlatformError::status_code(self))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        if self.should_log() {
            error!(
                error_code = %self.error_code(),
                error_message = %self,
                "处理请求时发生错误"
            );
        }

        crate::errors::ErrorResponse::from_error(self).into_http_response()
    }
}

impl From<CommonError> for PlatformError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::Validation { message } => Self::validation("general", message),
            CommonError::Permission { message } => Self::authorization(message),
            CommonError::NotFound { resource } => Self::not_found(resource),
            CommonError::Configuration { message } => Self::configuration(message),
            CommonError::ExternalService { service, message } => {
                Self::external_service(service, message)
            }
            CommonError::Internal { message } => Self::internal(message),
        }
    }
}

impl From<sea_orm::DbErr> for PlatformError {
    fn from(err: sea_orm::DbErr) -> Self {
        use sea_orm::DbErr;

        match err {
            DbErr::RecordNotFound(resource) => Self::not_found(resource),
            DbErr::ConnectionAcquire(_) => Self::database("无法获取数据库连接"),
            DbErr::Conn(msg) => Self::database(format!("数据库连接错误: {}", msg)),
            DbErr::Exec(msg) => Self::database(format!("数据库执行错误: {}", msg)),
            DbErr::Query(msg) => Self::database(format!("数据库查询错误: {}", msg)),
            other => Self::database(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for PlatformError {
    fn from(err: config::ConfigError) -> Self {
        Self::configuration(format!("配置加载错误: {}", err))
    }
}

impl From<std::io::Error> for PlatformError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::NotFound => Self::not_found("文件"),
            ErrorKind::PermissionDenied => Self::internal("上传目录没有读写权限"),
            ErrorKind::TimedOut => Self::timeout("文件读写"),
            _ => Self::internal(format!("IO 错误: {}", err)),
        }
    }
}

impl From<serde_json::Error> for PlatformError {
    fn from(err: serde_json::Error) -> Self {
        Self::validation("json", format!("JSON 解析错误: {}", err))
    }
}

impl From<uuid::Error> for PlatformError {
    fn from(err: uuid::Error) -> Self {
        Self::validation("id", format!("ID 格式错误: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for PlatformError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::authentication("登录已过期"),
            ErrorKind::InvalidKeyFormat | ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidEcdsaKey => {
                Self::internal(format!("令牌密钥配置错误: {}", err))
            }
            _ => Self::authentication("无效的访问令牌"),
        }
    }
}

impl From<bcrypt::BcryptError> for PlatformError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::internal(format!("密码处理失败: {}", err))
    }
}

impl From<AIError> for PlatformError {
    fn from(err: AIError) -> Self {
        let message = err.to_string();
        match err.code {
            AIErrorCode::InvalidConfig => Self::validation("provider", message),
            AIErrorCode::Unsupported => Self::business(message),
            AIErrorCode::Timeout => Self::timeout(message),
            AIErrorCode::Request | AIErrorCode::Response => Self::ai_service(message),
        }
    }
}
