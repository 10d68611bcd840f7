// 应用共享状态

use crate::ai::RagEngine;
use crate::config::AppConfig;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// 注入到 actix `web::Data` 的共享状态
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub rag: RagEngine,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
            rag: RagEngine,
        }
    }
}
