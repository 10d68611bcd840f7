// 服务层测试
// 每个用例使用独立的内存数据库

mod auth;
mod billing;
mod console;
mod models;
mod system;

use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::testing::{memory_db, test_config};
use crate::db::SeedData;
use crate::services::user::CreateUserRequest;
use crate::services::UserService;

/// 已写入初始数据的数据库
async fn seeded() -> (DatabaseConnection, Arc<AppConfig>) {
    let db = memory_db().await;
    let config = Arc::new(test_config());
    SeedData::run(&db, &config).await.unwrap();
    (db, config)
}

/// 创建一个没有角色的普通用户
async fn create_user(db: &DatabaseConnection, config: &Arc<AppConfig>, username: &str) -> Uuid {
    UserService::new(db.clone(), config.clone())
        .create(CreateUserRequest {
            username: username.to_string(),
            password: "secret123".to_string(),
            nickname: None,
            email: None,
            role_ids: Vec::new(),
        })
        .await
        .unwrap()
        .user
        .id
}
