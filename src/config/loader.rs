// 配置加载
// 进程内只加载一次，之后通过 `ConfigLoader::get` 读取

use agentdock_common::CommonError;
use config::ConfigError;
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::config::AppConfig;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// 全局配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 读取 `.env`、加载并校验配置
    ///
    /// 重复调用返回配置错误。
    pub fn init() -> Result<&'static AppConfig, CommonError> {
        if let Err(e) = dotenvy::dotenv() {
            warn!("未加载 .env 文件: {}", e);
        }

        let config = AppConfig::load().map_err(convert_config_error)?;
        config.validate()?;

        CONFIG
            .set(config)
            .map_err(|_| CommonError::configuration("配置已经初始化"))?;
        let config = Self::get()?;

        info!(
            environment = %config.environment.name,
            version = %config.environment.version,
            host = %config.server.host,
            port = config.server.port,
            "配置加载成功"
        );
        Ok(config)
    }

    /// 已加载的配置
    pub fn get() -> Result<&'static AppConfig, CommonError> {
        CONFIG
            .get()
            .ok_or_else(|| CommonError::internal("配置未初始化，请先调用 ConfigLoader::init()"))
    }

    /// 配置摘要，开发环境启动时打印
    pub fn summary(config: &AppConfig) -> String {
        [
            "=== AgentDock 配置摘要 ===".to_string(),
            format!("环境: {} (debug: {})", config.environment.name, config.environment.debug),
            format!("服务器: {}:{}", config.server.host, config.server.port),
            format!("工作线程: {:?}", config.server.workers),
            format!(
                "接口前缀: 控制台 {} / Web {}",
                config.server.console_prefix, config.server.web_prefix
            ),
            format!(
                "数据库连接池: {}-{}，同步表结构: {}，初始数据: {}",
                config.database.min_connections,
                config.database.max_connections,
                config.database.synchronize,
                config.database.seed
            ),
            format!(
                "上传目录: {} ({} 字节以内)",
                config.storage.path, config.storage.max_file_size
            ),
            format!("日志: {} / {}", config.logging.level, config.logging.format),
        ]
        .join("\n")
    }
}

/// config 库的错误转换为通用配置错误
pub fn convert_config_error(err: ConfigError) -> CommonError {
    CommonError::configuration(format!("配置错误: {}", err))
}
