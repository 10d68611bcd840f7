// 日志系统设置

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// 日志系统初始化器
pub struct LoggingSetup;

impl LoggingSetup {
    /// 初始化日志系统
    ///
    /// 启用文件日志时返回后台写线程的守卫，调用方需要持有到进程退出。
    pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let console_layer = match config.format.as_str() {
            "json" => fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
            "pretty" => fmt::layer()
                .pretty()
                .with_target(true)
                .with_thread_names(true)
                .boxed(),
            _ => fmt::layer().compact().with_target(true).boxed(),
        };

        let (file_layer, guard) = match (config.file_enabled, config.file_path.as_deref()) {
            (true, Some(path)) => {
                let appender = Self::file_appender(path, &config.rotation)?;
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed();
                (Some(layer), Some(guard))
            }
            _ => (None, None),
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .context("日志系统已经初始化")?;

        tracing::info!("日志系统初始化完成");
        tracing::info!("日志级别: {}", config.level);
        tracing::info!("日志格式: {}", config.format);

        if config.file_enabled {
            tracing::info!("文件日志已启用: {:?}", config.file_path);
        }

        Ok(guard)
    }

    /// 根据文件路径和滚动策略创建文件输出
    fn file_appender(path: &str, rotation: &str) -> Result<RollingFileAppender> {
        let path = Path::new(path);
        let directory = path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("agentdock.log");

        std::fs::create_dir_all(directory)
            .with_context(|| format!("无法创建日志目录: {}", directory.display()))?;

        Ok(RollingFileAppender::new(
            Self::parse_rotation(rotation),
            directory,
            file_name,
        ))
    }

    /// 解析日志滚动策略
    pub fn parse_rotation(rotation: &str) -> Rotation {
        match rotation {
            "minutely" => Rotation::MINUTELY,
            "hourly" => Rotation::HOURLY,
            "never" => Rotation::NEVER,
            _ => Rotation::DAILY,
        }
    }

    /// 解析日志级别
    pub fn parse_level(level: &str) -> Level {
        match level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// 创建开发环境日志配置
    pub fn development_config() -> LoggingConfig {
        LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
            file_enabled: false,
            file_path: None,
            rotation: "never".to_string(),
        }
    }

    /// 创建生产环境日志配置
    pub fn production_config() -> LoggingConfig {
        LoggingConfig {
            level: "info".to_string(),
            format: "json".to_string(),
            file_enabled: true,
            file_path: Some("./logs/agentdock.log".to_string()),
            rotation: "daily".to_string(),
        }
    }
}
