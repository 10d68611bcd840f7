// 控制台用户、角色、权限、菜单测试

use chrono::Utc;
use uuid::Uuid;

use super::{create_user, seeded};
use crate::api::auth::AuthenticatedUser;
use crate::db::entities::{menu, menu::MenuType, user::UserStatus};
use crate::db::{UserRepository, ADMIN_ROLE};
use crate::errors::PlatformError;
use crate::services::menu::{build_tree, MenuRequest};
use crate::services::permission::{PermissionDef, PermissionService, SyncReport};
use crate::services::role::{AssignPermissionsRequest, RoleRequest};
use crate::services::user::{CreateUserRequest, ResetPasswordRequest, UpdateUserRequest, UserQuery};
use crate::services::{MenuService, RoleService, UserService};
use agentdock_common::PaginationParams;

const CATALOGUE: &[PermissionDef] = &[
    PermissionDef::new("console:user:list", "用户列表", "用户管理"),
    PermissionDef::new("console:user:create", "创建用户", "用户管理"),
    PermissionDef::new("console:role:list", "角色列表", "角色管理"),
];

fn menu_request(name: &str, parent_id: Option<Uuid>, code: Option<&str>, menu_type: MenuType) -> MenuRequest {
    MenuRequest {
        parent_id,
        name: name.to_string(),
        path: None,
        icon: None,
        component: None,
        permission_code: code.map(str::to_string),
        menu_type,
        sort: 0,
        is_visible: true,
    }
}

fn operator(permissions: &[&str]) -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: Uuid::new_v4(),
        username: "operator".to_string(),
        is_root: false,
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        authenticated_at: Utc::now(),
    }
}

fn role_request(name: &str) -> RoleRequest {
    RoleRequest {
        name: name.to_string(),
        description: None,
        sort: 10,
    }
}

#[tokio::test]
async fn test_user_list_filters_and_paginates() {
    let (db, config) = seeded().await;
    for name in ["alice", "alina", "bob"] {
        create_user(&db, &config, name).await;
    }
    let service = UserService::new(db, config);

    let page = service
        .list(
            UserQuery {
                keyword: Some("ali".to_string()),
                status: None,
            },
            PaginationParams::new(1, 1),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total_pages, 2);

    let all = service
        .list(UserQuery::default(), PaginationParams::default())
        .await
        .unwrap();
    // 三个新用户加上超级管理员
    assert_eq!(all.total, 4);

    let beyond = service
        .list(
            UserQuery::default(),
            PaginationParams {
                page: u64::MAX,
                page_size: 10,
            },
        )
        .await
        .unwrap();
    assert_eq!(beyond.total, 4);
    assert!(beyond.items.is_empty());
}

#[tokio::test]
async fn test_user_create_update_and_delete() {
    let (db, config) = seeded().await;
    let role = RoleService::new(db.clone())
        .create(role_request("editor"))
        .await
        .unwrap();
    let service = UserService::new(db.clone(), config);

    let detail = service
        .create(CreateUserRequest {
            username: "grace".to_string(),
            password: "secret123".to_string(),
            nickname: Some("Grace".to_string()),
            email: None,
            role_ids: vec![role.id, role.id],
        })
        .await
        .unwrap();
    assert_eq!(detail.roles.len(), 1);
    assert_eq!(detail.user.nickname, "Grace");

    let err = service
        .create(CreateUserRequest {
            username: "grace".to_string(),
            password: "secret123".to_string(),
            nickname: None,
            email: None,
            role_ids: Vec::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Conflict { .. }));

    let updated = service
        .update(
            detail.user.id,
            UpdateUserRequest {
                status: Some(UserStatus::Disabled),
                role_ids: Some(Vec::new()),
                ..UpdateUserRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.user.status, UserStatus::Disabled);
    assert!(updated.roles.is_empty());

    let err = service
        .update(
            detail.user.id,
            UpdateUserRequest {
                role_ids: Some(vec![Uuid::new_v4()]),
                ..UpdateUserRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Validation { .. }));

    service.delete(detail.user.id).await.unwrap();
    let err = service.detail(detail.user.id).await.unwrap_err();
    assert!(matches!(err, PlatformError::NotFound { .. }));
}

#[tokio::test]
async fn test_root_user_is_protected() {
    let (db, config) = seeded().await;
    let root = UserRepository::find_by_username(&db, &config.security.root_username)
        .await
        .unwrap()
        .unwrap();
    let service = UserService::new(db, config);

    let err = service.delete(root.id).await.unwrap_err();
    assert!(matches!(err, PlatformError::Business { .. }));

    let err = service
        .update(
            root.id,
            UpdateUserRequest {
                status: Some(UserStatus::Disabled),
                ..UpdateUserRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Business { .. }));
}

#[tokio::test]
async fn test_root_password_reset_requires_root() {
    let (db, config) = seeded().await;
    let root = UserRepository::find_by_username(&db, &config.security.root_username)
        .await
        .unwrap()
        .unwrap();
    let original_hash = root.password_hash.clone();
    let service = UserService::new(db.clone(), config.clone());
    let reset = |password: &str| ResetPasswordRequest {
        password: password.to_string(),
    };

    let err = service
        .reset_password(&operator(&["console:user:reset-password"]), root.id, reset("hijacked1"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Authorization { .. }));
    let unchanged = UserRepository::get_by_id(&db, root.id).await.unwrap();
    assert_eq!(unchanged.password_hash, original_hash);

    let mut root_operator = operator(&[]);
    root_operator.user_id = root.id;
    root_operator.is_root = true;
    service
        .reset_password(&root_operator, root.id, reset("rotated123"))
        .await
        .unwrap();
    let rotated = UserRepository::get_by_id(&db, root.id).await.unwrap();
    assert!(bcrypt::verify("rotated123", &rotated.password_hash).unwrap());

    let member = create_user(&db, &config, "member").await;
    service
        .reset_password(&operator(&["console:user:reset-password"]), member, reset("newpass123"))
        .await
        .unwrap();
    let member = UserRepository::get_by_id(&db, member).await.unwrap();
    assert!(bcrypt::verify("newpass123", &member.password_hash).unwrap());
}

#[tokio::test]
async fn test_permission_sync_reconciles_catalogue() {
    let (db, _config) = seeded().await;
    let service = PermissionService::new(db.clone());

    let report = service.sync(CATALOGUE).await.unwrap();
    assert_eq!(
        report,
        SyncReport {
            added: 3,
            updated: 0,
            removed: 0
        }
    );

    // 重复同步没有变化
    assert_eq!(service.sync(CATALOGUE).await.unwrap(), SyncReport::default());

    let renamed = [
        PermissionDef::new("console:user:list", "用户查询", "用户管理"),
        PermissionDef::new("console:role:list", "角色列表", "角色管理"),
    ];
    let report = service.sync(&renamed).await.unwrap();
    assert_eq!(
        report,
        SyncReport {
            added: 0,
            updated: 1,
            removed: 1
        }
    );

    let groups = service.list_grouped().await.unwrap();
    assert_eq!(groups.len(), 2);
    let codes: Vec<_> = groups
        .iter()
        .flat_map(|g| g.permissions.iter().map(|p| p.code.as_str()))
        .collect();
    assert!(!codes.contains(&"console:user:create"));

    // 新增的权限自动授予管理员角色
    let admin = crate::db::SeedData::find_role(&db, ADMIN_ROLE)
        .await
        .unwrap()
        .unwrap();
    let detail = RoleService::new(db).detail(admin.id).await.unwrap();
    assert_eq!(detail.permissions.len(), 2);
}

#[tokio::test]
async fn test_role_lifecycle() {
    let (db, config) = seeded().await;
    let permissions = PermissionService::new(db.clone());
    permissions.sync(CATALOGUE).await.unwrap();
    let service = RoleService::new(db.clone());

    let role = service.create(role_request("auditor")).await.unwrap();
    let err = service.create(role_request("auditor")).await.unwrap_err();
    assert!(matches!(err, PlatformError::Conflict { .. }));

    let ids: Vec<Uuid> = permissions
        .list_grouped()
        .await
        .unwrap()
        .into_iter()
        .flat_map(|g| g.permissions)
        .filter(|p| p.code.ends_with(":list"))
        .map(|p| p.id)
        .collect();
    let codes = service
        .assign_permissions(
            role.id,
            AssignPermissionsRequest {
                permission_ids: ids.clone(),
            },
        )
        .await
        .unwrap();
    assert_eq!(codes.len(), 2);

    let err = service
        .assign_permissions(
            role.id,
            AssignPermissionsRequest {
                permission_ids: vec![Uuid::new_v4()],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Validation { .. }));

    let user_id = create_user(&db, &config, "henry").await;
    UserRepository::replace_roles(&db, user_id, &[role.id]).await.unwrap();
    assert_eq!(service.detail(role.id).await.unwrap().user_count, 1);

    let err = service.delete(role.id).await.unwrap_err();
    assert!(matches!(err, PlatformError::Business { .. }));

    UserRepository::replace_roles(&db, user_id, &[]).await.unwrap();
    service.delete(role.id).await.unwrap();
    assert!(service.detail(role.id).await.is_err());
}

#[test]
fn test_build_tree_orders_by_sort_and_keeps_orphans() {
    let now = Utc::now();
    let make = |name: &str, parent_id: Option<Uuid>, sort: i32| menu::Model {
        id: Uuid::new_v4(),
        parent_id,
        name: name.to_string(),
        path: None,
        icon: None,
        component: None,
        permission_code: None,
        menu_type: MenuType::Menu,
        sort,
        is_visible: true,
        created_at: now.into(),
        updated_at: now.into(),
    };

    let root = make("系统", None, 2);
    let first = make("用户", Some(root.id), 1);
    let second = make("角色", Some(root.id), 0);
    let orphan = make("孤儿", Some(Uuid::new_v4()), 1);

    let tree = build_tree(vec![first.clone(), root.clone(), orphan.clone(), second.clone()]);
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].menu.id, orphan.id);
    assert_eq!(tree[1].menu.id, root.id);
    let children: Vec<_> = tree[1].children.iter().map(|n| n.menu.id).collect();
    assert_eq!(children, vec![second.id, first.id]);
}

#[tokio::test]
async fn test_user_menu_tree_filters_by_permission() {
    let db = crate::db::testing::memory_db().await;
    let service = MenuService::new(db);

    let system = service
        .create(menu_request("系统管理", None, None, MenuType::Directory))
        .await
        .unwrap();
    service
        .create(menu_request("用户管理", Some(system.id), Some("console:user:list"), MenuType::Menu))
        .await
        .unwrap();
    service
        .create(menu_request("角色管理", Some(system.id), Some("console:role:list"), MenuType::Menu))
        .await
        .unwrap();
    let empty_dir = service
        .create(menu_request("空目录", None, None, MenuType::Directory))
        .await
        .unwrap();
    service
        .create(menu_request("工作台", None, None, MenuType::Menu))
        .await
        .unwrap();

    let tree = service.user_tree(&operator(&["console:user:list"])).await.unwrap();
    let names: Vec<_> = tree.iter().map(|n| n.menu.name.as_str()).collect();
    assert!(names.contains(&"系统管理"));
    assert!(names.contains(&"工作台"));
    assert!(!names.contains(&"空目录"));
    let system_node = tree.iter().find(|n| n.menu.id == system.id).unwrap();
    assert_eq!(system_node.children.len(), 1);
    assert_eq!(system_node.children[0].menu.name, "用户管理");

    let nothing = service.user_tree(&operator(&[])).await.unwrap();
    assert_eq!(nothing.len(), 1);
    assert_eq!(nothing[0].menu.name, "工作台");

    let mut root = operator(&[]);
    root.is_root = true;
    let full = service.user_tree(&root).await.unwrap();
    assert_eq!(full.len(), 3);
    assert!(full.iter().any(|n| n.menu.id == empty_dir.id));
}

#[tokio::test]
async fn test_menu_delete_and_parent_checks() {
    let db = crate::db::testing::memory_db().await;
    let service = MenuService::new(db);

    let parent = service
        .create(menu_request("系统", None, None, MenuType::Directory))
        .await
        .unwrap();
    let child = service
        .create(menu_request("用户", Some(parent.id), None, MenuType::Menu))
        .await
        .unwrap();

    let err = service
        .create(menu_request("无效", Some(Uuid::new_v4()), None, MenuType::Menu))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::NotFound { .. }));

    let err = service
        .update(parent.id, menu_request("系统", Some(parent.id), None, MenuType::Directory))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Validation { .. }));

    let err = service.delete(parent.id).await.unwrap_err();
    assert!(matches!(err, PlatformError::Business { .. }));

    service.delete(child.id).await.unwrap();
    service.delete(parent.id).await.unwrap();
    assert!(service.list().await.unwrap().is_empty());
}
