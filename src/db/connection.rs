// 数据库连接池

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::time::Duration;
use tracing::{error, info, instrument};

use crate::config::DatabaseConfig;
use crate::errors::PlatformError;

/// 按配置建立的连接池
pub struct DatabaseManager {
    connection: DatabaseConnection,
}

impl DatabaseManager {
    /// 建立连接池并确认数据库可用
    #[instrument(skip(config))]
    pub async fn init(config: DatabaseConfig) -> Result<Self, PlatformError> {
        let manager = Self::connect(&config).await?;
        ping(&manager.connection).await?;
        info!("数据库连接初始化完成");
        Ok(manager)
    }

    async fn connect(config: &DatabaseConfig) -> Result<Self, PlatformError> {
        let mut opt = ConnectOptions::new(config.url.clone());
        opt.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .idle_timeout(Duration::from_secs(config.idle_timeout))
            .max_lifetime(Duration::from_secs(config.max_lifetime))
            .sqlx_logging(true)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        info!(
            url = %Self::mask_password(&config.url),
            pool = %format!("{}-{}", config.min_connections, config.max_connections),
            "连接数据库"
        );

        let connection = Database::connect(opt)
            .await
            .map_err(|e| PlatformError::database(format!("数据库连接失败: {}", e)))?;
        Ok(Self { connection })
    }

    pub fn get_connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// 日志中隐藏连接串里的密码，无法解析时整体隐藏
    pub fn mask_password(url: &str) -> String {
        match url::Url::parse(url) {
            Ok(mut parsed) => {
                if parsed.password().is_some() {
                    let _ = parsed.set_password(Some("***"));
                }
                parsed.to_string()
            }
            Err(_) => "***".to_string(),
        }
    }
}

/// 执行 `SELECT 1` 检查连接是否可用
pub async fn ping(db: &DatabaseConnection) -> Result<(), PlatformError> {
    let backend = db.get_database_backend();
    db.execute(Statement::from_string(backend, "SELECT 1".to_string()))
        .await
        .map(|_| ())
        .map_err(|e| {
            error!(error = %e, "数据库健康检查失败");
            PlatformError::database(format!("数据库健康检查失败: {}", e))
        })
}
