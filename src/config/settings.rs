// 应用程序设置和配置
// 定义配置结构体和加载逻辑

use agentdock_common::CommonError;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 应用程序配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub ai: AiConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub rag: RagConfig,
    pub environment: EnvironmentConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// 长连接保持时间（秒）
    pub keep_alive: u64,
    /// 读取请求头的超时时间（毫秒）
    pub client_timeout: u64,
    /// 控制台接口前缀
    pub console_prefix: String,
    /// Web 端接口前缀
    pub web_prefix: String,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// 以下超时均为秒
    pub connect_timeout: u64,
    pub idle_timeout: u64,
    pub max_lifetime: u64,
    /// 启动时根据实体定义同步表结构
    pub synchronize: bool,
    /// 启动时写入初始数据
    pub seed: bool,
}

/// AI 服务调用配置（各供应商适配器共用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// 请求超时（秒）
    pub timeout: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    /// 模型连通性测试使用的提示词
    pub test_prompt: String,
}

/// 安全配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    /// 令牌有效期（秒）
    pub jwt_expiration: u64,
    pub jwt_issuer: String,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
    /// 初始超级管理员账号
    pub root_username: String,
    pub root_password: String,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 上传文件根目录
    pub path: String,
    pub public_url_prefix: String,
    /// 单个文件大小上限（字节）
    pub max_file_size: u64,
    pub allowed_extensions: Vec<String>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_enabled: bool,
    pub file_path: Option<String>,
    pub rotation: String,
}

/// RAG 引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// 单次对话最多装载的知识库分段数
    pub max_context_segments: u64,
    /// 默认分段长度（字符）
    pub chunk_size: usize,
    /// 默认分段重叠（字符）
    pub chunk_overlap: usize,
}

/// 环境配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub name: String,
    pub debug: bool,
    pub version: String,
}

impl AppConfig {
    /// 从环境变量和配置文件加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Config::builder();

        // 1. 加载默认配置
        config = config.add_source(Config::try_from(&AppConfig::default())?);

        // 2. 尝试加载配置文件
        if Path::new("config.toml").exists() {
            config = config.add_source(File::with_name("config"));
        }

        // 3. 加载环境变量（优先级最高）
        config = config.add_source(
            Environment::with_prefix("AGENTDOCK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("security.cors_origins")
                .with_list_parse_key("storage.allowed_extensions"),
        );

        let mut app_config: AppConfig = config.build()?.try_deserialize()?;
        app_config.environment.version = env!("CARGO_PKG_VERSION").to_string();
        Ok(app_config)
    }

    /// 验证配置
    pub fn validate(&self) -> Result<(), CommonError> {
        use crate::config::ConfigValidator;

        ConfigValidator::validate_all(self).map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            CommonError::configuration(format!("配置验证失败: {}", messages.join("; ")))
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment.name == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment.name == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            ai: AiConfig::default(),
            security: SecurityConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            rag: RagConfig::default(),
            environment: EnvironmentConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4090,
            workers: None,
            keep_alive: 75,
            client_timeout: 5000,
            console_prefix: "/consoleapi".to_string(),
            web_prefix: "/api".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/agentdock".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: 30,
            idle_timeout: 600,
            max_lifetime: 1800,
            synchronize: true,
            seed: true,
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            timeout: 60,
            max_tokens: 2048,
            temperature: 0.7,
            test_prompt: "Hello".to_string(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-this-agentdock-jwt-secret-in-production".to_string(),
            jwt_expiration: 86400,
            jwt_issuer: "agentdock".to_string(),
            bcrypt_cost: 10,
            cors_origins: vec!["*".to_string()],
            root_username: "admin".to_string(),
            root_password: "admin123456".to_string(),
        }
    }
}

/// 默认允许上传的扩展名
const DEFAULT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "txt", "md", "pdf", "docx"];

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "./storage/uploads".to_string(),
            public_url_prefix: "/uploads".to_string(),
            max_file_size: 10 * 1024 * 1024,
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
            file_enabled: false,
            file_path: None,
            rotation: "daily".to_string(),
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            max_context_segments: 50,
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            name: "development".to_string(),
            debug: true,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
