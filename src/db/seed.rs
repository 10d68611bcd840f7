// 初始数据
// 超级管理员、内置角色、默认菜单、字典和模型提供商目录

use crate::ai::ProviderKind;
use crate::config::AppConfig;
use crate::db::entities::{
    ai_provider, dict, menu, menu::MenuType, prelude::*, role, user, user::UserStatus,
};
use crate::db::repositories::{PermissionRepository, UserRepository};
use crate::errors::PlatformError;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

/// 管理员角色名
pub const ADMIN_ROLE: &str = "admin";
/// 注册用户默认角色名
pub const USER_ROLE: &str = "user";

/// 默认菜单：(名称, 路径, 图标, 权限代码, 子菜单)
type MenuSeed = (
    &'static str,
    &'static str,
    &'static str,
    Option<&'static str>,
    &'static [(&'static str, &'static str, &'static str)],
);

const DEFAULT_MENUS: &[MenuSeed] = &[
    ("工作台", "/dashboard", "dashboard", None, &[]),
    (
        "用户管理",
        "/user",
        "user",
        None,
        &[
            ("用户列表", "/user/list", "console:user:list"),
            ("角色管理", "/user/role", "console:role:list"),
            ("权限管理", "/user/permission", "console:permission:list"),
            ("菜单管理", "/user/menu", "console:menu:list"),
        ],
    ),
    (
        "AI 配置",
        "/ai",
        "robot",
        None,
        &[
            ("模型提供商", "/ai/provider", "console:ai-provider:list"),
            ("模型管理", "/ai/model", "console:ai-model:list"),
        ],
    ),
    ("知识库", "/dataset", "book", Some("console:dataset:list"), &[]),
    ("智能体", "/agent", "bot", Some("console:agent:list"), &[]),
    (
        "财务管理",
        "/finance",
        "wallet",
        None,
        &[
            ("财务中心", "/finance/center", "console:finance:center"),
            ("充值套餐", "/finance/recharge-rule", "console:recharge-rule:list"),
            ("充值订单", "/finance/order", "console:order:list"),
            ("账户流水", "/finance/account-log", "console:finance:account-log"),
        ],
    ),
    (
        "系统设置",
        "/system",
        "setting",
        None,
        &[
            ("字典配置", "/system/dict", "console:dict:list"),
            ("页面装修", "/system/decorate", "console:decorate:list"),
            ("标签管理", "/system/tag", "console:tag:list"),
            ("扩展管理", "/system/extension", "console:extension:list"),
        ],
    ),
];

/// 默认字典：(分组, 键, 值, 备注)
const DEFAULT_DICTS: &[(&str, &str, &str, &str)] = &[
    ("website", "name", "AgentDock", "站点名称"),
    ("website", "description", "AI 智能体平台", "站点描述"),
    ("website", "logo", "", "站点 Logo"),
    ("register", "enabled", "true", "是否开放注册"),
    ("payment", "currency", "CNY", "结算币种"),
];

/// 初始数据
pub struct SeedData;

impl SeedData {
    /// 写入缺失的初始数据，可重复执行
    #[instrument(skip(db, config))]
    pub async fn run(db: &DatabaseConnection, config: &AppConfig) -> Result<(), PlatformError> {
        info!("检查初始数据");

        Self::ensure_root_user(db, config).await?;
        Self::ensure_roles(db).await?;
        Self::ensure_menus(db).await?;
        Self::ensure_dicts(db).await?;
        Self::ensure_providers(db).await?;

        info!("初始数据检查完成");
        Ok(())
    }

    async fn ensure_root_user(
        db: &DatabaseConnection,
        config: &AppConfig,
    ) -> Result<(), PlatformError> {
        let has_root = User::find()
            .filter(user::Column::IsRoot.eq(true))
            .count(db)
            .await?
            > 0;
        if has_root {
            return Ok(());
        }

        let username = &config.security.root_username;
        if UserRepository::exists_by_username(db, username).await? {
            return Err(PlatformError::configuration(format!(
                "用户名 {} 已被普通用户占用，无法创建超级管理员",
                username
            )));
        }

        let password_hash =
            bcrypt::hash(&config.security.root_password, config.security.bcrypt_cost)?;
        let now = chrono::Utc::now();

        user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.clone()),
            password_hash: Set(password_hash),
            nickname: Set("超级管理员".to_string()),
            email: Set(None),
            avatar: Set(None),
            is_root: Set(true),
            status: Set(UserStatus::Active),
            power: Set(0),
            last_login_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            deleted_at: Set(None),
        }
        .insert(db)
        .await?;

        info!(username = %username, "已创建超级管理员");
        Ok(())
    }

    async fn ensure_roles(db: &DatabaseConnection) -> Result<(), PlatformError> {
        if Self::find_role(db, ADMIN_ROLE).await?.is_none() {
            let admin = Self::insert_role(db, ADMIN_ROLE, "系统管理员", 0).await?;
            let permission_ids: Vec<Uuid> = PermissionRepository::find_all(db)
                .await?
                .into_iter()
                .map(|p| p.id)
                .collect();
            PermissionRepository::replace_role_permissions(db, admin.id, &permission_ids).await?;
            info!(count = permission_ids.len(), "已创建管理员角色");
        }

        if Self::find_role(db, USER_ROLE).await?.is_none() {
            Self::insert_role(db, USER_ROLE, "注册用户", 100).await?;
        }

        Ok(())
    }

    /// 按名称查找角色
    pub async fn find_role(
        db: &DatabaseConnection,
        name: &str,
    ) -> Result<Option<role::Model>, PlatformError> {
        let role = Role::find()
            .filter(role::Column::Name.eq(name))
            .one(db)
            .await?;
        Ok(role)
    }

    async fn insert_role(
        db: &DatabaseConnection,
        name: &str,
        description: &str,
        sort: i32,
    ) -> Result<role::Model, PlatformError> {
        let now = chrono::Utc::now();
        let role = role::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            sort: Set(sort),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(db)
        .await?;
        Ok(role)
    }

    async fn ensure_menus(db: &DatabaseConnection) -> Result<(), PlatformError> {
        if Menu::find().count(db).await? > 0 {
            return Ok(());
        }

        for (index, (name, path, icon, permission_code, children)) in
            DEFAULT_MENUS.iter().enumerate()
        {
            let menu_type = if children.is_empty() {
                MenuType::Menu
            } else {
                MenuType::Directory
            };
            let parent = Self::insert_menu(
                db,
                None,
                name,
                path,
                Some(*icon),
                *permission_code,
                menu_type,
                index as i32,
            )
            .await?;

            for (child_index, (child_name, child_path, child_code)) in children.iter().enumerate() {
                Self::insert_menu(
                    db,
                    Some(parent.id),
                    child_name,
                    child_path,
                    None,
                    Some(*child_code),
                    MenuType::Menu,
                    child_index as i32,
                )
                .await?;
            }
        }

        info!("已创建默认菜单");
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_menu(
        db: &DatabaseConnection,
        parent_id: Option<Uuid>,
        name: &str,
        path: &str,
        icon: Option<&str>,
        permission_code: Option<&str>,
        menu_type: MenuType,
        sort: i32,
    ) -> Result<menu::Model, PlatformError> {
        let now = chrono::Utc::now();
        let menu = menu::ActiveModel {
            id: Set(Uuid::new_v4()),
            parent_id: Set(parent_id),
            name: Set(name.to_string()),
            path: Set(Some(path.to_string())),
            icon: Set(icon.map(str::to_string)),
            component: Set(None),
            permission_code: Set(permission_code.map(str::to_string)),
            menu_type: Set(menu_type),
            sort: Set(sort),
            is_visible: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(db)
        .await?;
        Ok(menu)
    }

    async fn ensure_dicts(db: &DatabaseConnection) -> Result<(), PlatformError> {
        for (sort, (group, key, value, remark)) in DEFAULT_DICTS.iter().enumerate() {
            let exists = Dict::find()
                .filter(dict::Column::Group.eq(*group))
                .filter(dict::Column::Key.eq(*key))
                .count(db)
                .await?
                > 0;
            if exists {
                continue;
            }

            let now = chrono::Utc::now();
            dict::ActiveModel {
                id: Set(Uuid::new_v4()),
                group: Set(group.to_string()),
                key: Set(key.to_string()),
                value: Set(value.to_string()),
                remark: Set(Some(remark.to_string())),
                sort: Set(sort as i32),
                is_enabled: Set(true),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            }
            .insert(db)
            .await?;
        }
        Ok(())
    }

    async fn ensure_providers(db: &DatabaseConnection) -> Result<(), PlatformError> {
        for (sort, kind) in ProviderKind::ALL
            .into_iter()
            .filter(|kind| *kind != ProviderKind::Custom)
            .enumerate()
        {
            let exists = AiProvider::find()
                .filter(ai_provider::Column::Provider.eq(kind.as_str()))
                .count(db)
                .await?
                > 0;
            if exists {
                continue;
            }

            let now = chrono::Utc::now();
            ai_provider::ActiveModel {
                id: Set(Uuid::new_v4()),
                provider: Set(kind.as_str().to_string()),
                name: Set(kind.display_name().to_string()),
                base_url: Set(None),
                api_key: Set(None),
                is_active: Set(false),
                sort: Set(sort as i32),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
                deleted_at: Set(None),
            }
            .insert(db)
            .await?;
        }
        Ok(())
    }
}
