// 认证服务测试

use super::{create_user, seeded};
use crate::api::auth::JwtUtils;
use crate::db::entities::{dict, prelude::*};
use crate::db::{SeedData, UserRepository, ADMIN_ROLE, USER_ROLE};
use crate::errors::PlatformError;
use crate::services::auth::{
    ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
};
use crate::services::dict::DictRequest;
use crate::services::permission::{PermissionDef, PermissionService};
use crate::services::user::UpdateUserRequest;
use crate::services::{AuthService, DictService, UserService};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

fn register_request(username: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        password: "secret123".to_string(),
        nickname: None,
        email: Some("alice@example.com".to_string()),
    }
}

fn login(username: &str, password: &str) -> LoginRequest {
    LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_register_assigns_default_role_and_issues_token() {
    let (db, config) = seeded().await;
    let service = AuthService::new(db.clone(), config.clone());

    let response = service.register(register_request("alice")).await.unwrap();
    assert_eq!(response.token_type, "Bearer");
    assert_eq!(response.expires_in, config.security.jwt_expiration);
    assert_eq!(response.user.username, "alice");
    assert_eq!(response.user.nickname, "alice");
    assert_eq!(response.user.roles, vec![USER_ROLE.to_string()]);
    assert!(!response.user.is_root);

    let claims = JwtUtils::verify_token(&response.token, &config.security).unwrap();
    assert_eq!(claims.sub, response.user.id.to_string());
    assert_eq!(claims.username, "alice");
    assert!(!claims.is_root);

    let stored = UserRepository::find_by_username(&db, "alice")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.password_hash, "secret123");
}

#[tokio::test]
async fn test_register_rejects_duplicate_username() {
    let (db, config) = seeded().await;
    let service = AuthService::new(db, config);

    service.register(register_request("alice")).await.unwrap();
    let err = service.register(register_request("alice")).await.unwrap_err();
    assert!(matches!(err, PlatformError::Conflict { .. }));
}

#[tokio::test]
async fn test_register_closed_by_dict() {
    let (db, config) = seeded().await;
    let entry = Dict::find()
        .filter(dict::Column::Group.eq("register"))
        .filter(dict::Column::Key.eq("enabled"))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    DictService::new(db.clone())
        .update(
            entry.id,
            DictRequest {
                group: "register".to_string(),
                key: "enabled".to_string(),
                value: "false".to_string(),
                remark: None,
                sort: 0,
                is_enabled: true,
            },
        )
        .await
        .unwrap();

    let err = AuthService::new(db, config)
        .register(register_request("bob"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Business { .. }));
}

#[tokio::test]
async fn test_login_checks_password_and_status() {
    let (db, config) = seeded().await;
    let user_id = create_user(&db, &config, "carol").await;
    let service = AuthService::new(db.clone(), config.clone());

    let err = service.login(login("carol", "wrong-password")).await.unwrap_err();
    assert!(matches!(err, PlatformError::Authentication { .. }));

    let err = service.login(login("nobody", "secret123")).await.unwrap_err();
    assert!(matches!(err, PlatformError::Authentication { .. }));

    let response = service.login(login("carol", "secret123")).await.unwrap();
    assert!(response.user.last_login_at.is_some());

    UserService::new(db.clone(), config.clone())
        .update(
            user_id,
            UpdateUserRequest {
                status: Some(crate::db::entities::user::UserStatus::Disabled),
                ..UpdateUserRequest::default()
            },
        )
        .await
        .unwrap();
    let err = service.login(login("carol", "secret123")).await.unwrap_err();
    assert!(matches!(err, PlatformError::Authentication { .. }));
}

#[tokio::test]
async fn test_soft_deleted_user_cannot_login() {
    let (db, config) = seeded().await;
    let user_id = create_user(&db, &config, "dave").await;
    UserService::new(db.clone(), config.clone())
        .delete(user_id)
        .await
        .unwrap();

    let err = AuthService::new(db, config)
        .login(login("dave", "secret123"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Authentication { .. }));
}

#[tokio::test]
async fn test_console_login_requires_permission() {
    let (db, config) = seeded().await;
    PermissionService::new(db.clone())
        .sync(&[PermissionDef::new("console:user:list", "用户列表", "用户管理")])
        .await
        .unwrap();
    let service = AuthService::new(db.clone(), config.clone());

    // 注册用户的默认角色没有控制台权限
    service.register(register_request("erin")).await.unwrap();
    let err = service.console_login(login("erin", "secret123")).await.unwrap_err();
    assert!(matches!(err, PlatformError::Authorization { .. }));

    let admin = SeedData::find_role(&db, ADMIN_ROLE).await.unwrap().unwrap();
    let erin = UserRepository::find_by_username(&db, "erin").await.unwrap().unwrap();
    UserRepository::replace_roles(&db, erin.id, &[admin.id]).await.unwrap();

    let response = service.console_login(login("erin", "secret123")).await.unwrap();
    assert_eq!(response.user.permissions, vec!["console:user:list".to_string()]);

    let root = service
        .console_login(login(&config.security.root_username, &config.security.root_password))
        .await
        .unwrap();
    assert!(root.user.is_root);
    assert!(root.user.permissions.contains(&"console:user:list".to_string()));
}

#[tokio::test]
async fn test_update_profile_and_change_password() {
    let (db, config) = seeded().await;
    let user_id = create_user(&db, &config, "frank").await;
    let service = AuthService::new(db, config);

    let profile = service
        .update_profile(
            user_id,
            UpdateProfileRequest {
                nickname: Some(" 弗兰克 ".to_string()),
                avatar: Some("/uploads/a.png".to_string()),
                email: Some(String::new()),
            },
        )
        .await
        .unwrap();
    assert_eq!(profile.nickname, "弗兰克");
    assert_eq!(profile.avatar.as_deref(), Some("/uploads/a.png"));
    assert_eq!(profile.email, None);

    let err = service
        .change_password(
            user_id,
            ChangePasswordRequest {
                old_password: "not-it".to_string(),
                new_password: "newsecret".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Validation { ref field, .. } if field == "oldPassword"));

    service
        .change_password(
            user_id,
            ChangePasswordRequest {
                old_password: "secret123".to_string(),
                new_password: "newsecret".to_string(),
            },
        )
        .await
        .unwrap();
    assert!(service.login(login("frank", "secret123")).await.is_err());
    assert!(service.login(login("frank", "newsecret")).await.is_ok());
}
