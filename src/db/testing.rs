// 测试用内存数据库

use crate::config::AppConfig;
use crate::db::SchemaSynchronizer;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// 创建已同步表结构的内存 SQLite 连接
pub async fn memory_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    // 内存库每个连接各自独立，必须固定为单连接
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt).await.expect("连接内存数据库失败");
    SchemaSynchronizer::sync(&db).await.expect("同步表结构失败");
    db
}

/// 测试配置，降低 bcrypt 成本以加快测试
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.security.bcrypt_cost = 4;
    config.environment.name = "test".to_string();
    config
}
