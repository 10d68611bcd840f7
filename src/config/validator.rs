// 配置校验
// 启动时逐段检查配置，汇总全部错误后一次性报告

use agentdock_common::CommonError;
use url::Url;

use crate::config::{
    AiConfig, AppConfig, DatabaseConfig, EnvironmentConfig, LoggingConfig, RagConfig,
    SecurityConfig, ServerConfig, StorageConfig,
};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["json", "pretty", "compact"];
const LOG_ROTATIONS: &[&str] = &["minutely", "hourly", "daily", "never"];
const ENVIRONMENTS: &[&str] = &["development", "staging", "production", "test"];

/// 条件不成立时返回校验错误
fn ensure(condition: bool, message: impl Into<String>) -> Result<(), CommonError> {
    if condition {
        Ok(())
    } else {
        Err(CommonError::validation(message))
    }
}

fn one_of(kind: &str, value: &str, allowed: &[&str]) -> Result<(), CommonError> {
    ensure(
        allowed.contains(&value),
        format!("无效的{}: {}，有效值: {:?}", kind, value, allowed),
    )
}

/// 配置验证器
pub struct ConfigValidator;

impl ConfigValidator {
    /// 验证完整配置，返回全部分段的错误
    pub fn validate_all(config: &AppConfig) -> Result<(), Vec<CommonError>> {
        let errors: Vec<CommonError> = [
            Self::validate_server(&config.server),
            Self::validate_database(&config.database),
            Self::validate_ai(&config.ai),
            Self::validate_security(&config.security),
            Self::validate_storage(&config.storage),
            Self::validate_logging(&config.logging),
            Self::validate_rag(&config.rag),
            Self::validate_environment(&config.environment),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// 端口、线程数以及两套路由前缀
    pub fn validate_server(config: &ServerConfig) -> Result<(), CommonError> {
        ensure(config.port != 0, "服务器端口不能为 0")?;
        ensure(!config.host.is_empty(), "服务器主机地址不能为空")?;
        if let Some(workers) = config.workers {
            ensure((1..=64).contains(&workers), "工作线程数必须在 1-64 之间")?;
        }

        for prefix in [&config.console_prefix, &config.web_prefix] {
            ensure(
                prefix.len() >= 2 && prefix.starts_with('/') && !prefix.ends_with('/'),
                format!("路由前缀必须以 / 开头且不能以 / 结尾: {}", prefix),
            )?;
        }
        ensure(
            config.console_prefix != config.web_prefix,
            "控制台前缀与 Web 前缀不能相同",
        )
    }

    pub fn validate_database(config: &DatabaseConfig) -> Result<(), CommonError> {
        ensure(Url::parse(&config.url).is_ok(), "数据库 URL 格式无效")?;
        ensure(config.max_connections > 0, "数据库最大连接数不能为 0")?;
        ensure(
            config.min_connections <= config.max_connections,
            "数据库最小连接数不能大于最大连接数",
        )?;
        ensure(config.connect_timeout > 0, "数据库连接超时不能为 0")
    }

    pub fn validate_ai(config: &AiConfig) -> Result<(), CommonError> {
        ensure(config.timeout > 0, "AI 请求超时不能为 0")?;
        ensure(config.max_tokens > 0, "AI 最大 token 数不能为 0")?;
        ensure(
            (0.0..=2.0).contains(&config.temperature),
            "AI 温度参数必须在 0.0-2.0 之间",
        )?;
        ensure(!config.test_prompt.trim().is_empty(), "模型测试提示词不能为空")
    }

    /// JWT、bcrypt 与初始超级管理员
    pub fn validate_security(config: &SecurityConfig) -> Result<(), CommonError> {
        ensure(config.jwt_secret.len() >= 32, "JWT 密钥长度不能少于 32 个字符")?;
        ensure(
            (1..=86400 * 30).contains(&config.jwt_expiration),
            "JWT 有效期必须在 1 秒到 30 天之间",
        )?;
        ensure((4..=31).contains(&config.bcrypt_cost), "bcrypt 成本参数必须在 4-31 之间")?;
        ensure(!config.root_username.trim().is_empty(), "超级管理员用户名不能为空")?;
        ensure(config.root_password.len() >= 6, "超级管理员密码长度不能少于 6 位")
    }

    /// 存储目录在首次上传时创建，这里只检查取值
    pub fn validate_storage(config: &StorageConfig) -> Result<(), CommonError> {
        ensure(!config.path.trim().is_empty(), "存储路径不能为空")?;
        ensure(
            config.public_url_prefix.starts_with('/'),
            "文件访问前缀必须以 / 开头",
        )?;
        ensure(
            (1..=1024 * 1024 * 1024).contains(&config.max_file_size),
            "单个文件大小上限必须在 1 字节到 1GB 之间",
        )?;
        ensure(!config.allowed_extensions.is_empty(), "允许的文件扩展名列表不能为空")
    }

    pub fn validate_logging(config: &LoggingConfig) -> Result<(), CommonError> {
        one_of("日志级别", &config.level, LOG_LEVELS)?;
        one_of("日志格式", &config.format, LOG_FORMATS)?;
        one_of("日志滚动策略", &config.rotation, LOG_ROTATIONS)?;
        ensure(
            !config.file_enabled || config.file_path.is_some(),
            "启用文件日志时必须指定日志文件路径",
        )
    }

    pub fn validate_rag(config: &RagConfig) -> Result<(), CommonError> {
        ensure(config.max_context_segments > 0, "RAG 上下文分段数不能为 0")?;
        ensure(config.chunk_size >= 50, "分段长度不能小于 50 个字符")?;
        ensure(config.chunk_overlap < config.chunk_size, "分段重叠必须小于分段长度")
    }

    pub fn validate_environment(config: &EnvironmentConfig) -> Result<(), CommonError> {
        one_of("环境名称", &config.name, ENVIRONMENTS)?;
        ensure(!config.version.is_empty(), "版本信息不能为空")
    }
}
