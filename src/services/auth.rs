// 认证服务
// 处理注册、登录、个人资料和密码修改

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::auth::JwtUtils;
use crate::api::extractors::{rules, Validate};
use crate::config::AppConfig;
use crate::db::entities::{dict, prelude::*, role, user, user::UserStatus};
use crate::db::{PermissionRepository, UserRepository, USER_ROLE};
use crate::errors::{PlatformError, PlatformResult};

/// 注册请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// 用户名（3-32 个字符）
    pub username: String,
    /// 密码（6-64 个字符）
    pub password: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::length("username", &self.username, 3, 32)?;
        rules::length("password", &self.password, 6, 64)?;
        rules::max_length("nickname", self.nickname.as_deref(), 64)?;
        rules::email("email", self.email.as_deref())?;
        Ok(())
    }
}

/// 登录请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::not_blank("username", &self.username)?;
        rules::not_blank("password", &self.password)?;
        Ok(())
    }
}

/// 登录响应
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// 访问令牌
    pub token: String,
    /// 令牌类型
    pub token_type: String,
    /// 过期时间（秒）
    pub expires_in: u64,
    pub user: UserProfile,
}

/// 用户资料
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub nickname: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub is_root: bool,
    /// 算力余额
    pub power: i64,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub last_login_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
}

/// 更新个人资料请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    pub email: Option<String>,
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> PlatformResult<()> {
        if let Some(nickname) = &self.nickname {
            rules::length("nickname", nickname, 1, 64)?;
        }
        rules::max_length("avatar", self.avatar.as_deref(), 500)?;
        rules::email("email", self.email.as_deref())?;
        Ok(())
    }
}

/// 修改密码请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

impl Validate for ChangePasswordRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::not_blank("oldPassword", &self.old_password)?;
        rules::length("newPassword", &self.new_password, 6, 64)?;
        Ok(())
    }
}

/// 认证服务
pub struct AuthService {
    db: DatabaseConnection,
    config: Arc<AppConfig>,
}

impl AuthService {
    pub fn new(db: DatabaseConnection, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    /// Web 端注册，默认授予注册用户角色
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> PlatformResult<LoginResponse> {
        if !self.registration_enabled().await? {
            return Err(PlatformError::business("注册功能已关闭"));
        }

        let username = request.username.trim().to_string();
        if UserRepository::exists_by_username(&self.db, &username).await? {
            return Err(PlatformError::conflict(format!("用户名 {} 已存在", username)));
        }

        let password_hash = bcrypt::hash(&request.password, self.config.security.bcrypt_cost)?;
        let now = Utc::now();
        let nickname = request
            .nickname
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| username.clone());

        let txn = self.db.begin().await?;
        let user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username),
            password_hash: Set(password_hash),
            nickname: Set(nickname),
            email: Set(request.email.filter(|e| !e.is_empty())),
            avatar: Set(None),
            is_root: Set(false),
            status: Set(UserStatus::Active),
            power: Set(0),
            last_login_at: Set(Some(now.into())),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await?;

        if let Some(default_role) = Role::find()
            .filter(role::Column::Name.eq(USER_ROLE))
            .one(&txn)
            .await?
        {
            UserRepository::replace_roles(&txn, user.id, &[default_role.id]).await?;
        } else {
            warn!("默认角色 {} 不存在，新用户未分配角色", USER_ROLE);
        }
        txn.commit().await?;

        info!(user_id = %user.id, "用户注册成功");
        self.issue(user).await
    }

    /// Web 端登录
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: LoginRequest) -> PlatformResult<LoginResponse> {
        let user = self.verify_credentials(&request).await?;
        let user = self.touch_last_login(user).await?;
        info!(user_id = %user.id, "用户登录成功");
        self.issue(user).await
    }

    /// 控制台登录，要求超级管理员或至少拥有一项控制台权限
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn console_login(&self, request: LoginRequest) -> PlatformResult<LoginResponse> {
        let user = self.verify_credentials(&request).await?;

        if !user.is_root {
            let permissions = PermissionRepository::codes_for_user(&self.db, user.id).await?;
            if permissions.is_empty() {
                warn!(user_id = %user.id, "无控制台权限的用户尝试登录控制台");
                return Err(PlatformError::authorization("当前账号无权访问控制台"));
            }
        }

        let user = self.touch_last_login(user).await?;
        info!(user_id = %user.id, "控制台登录成功");
        self.issue(user).await
    }

    /// 当前用户资料
    pub async fn profile(&self, user_id: Uuid) -> PlatformResult<UserProfile> {
        let user = UserRepository::get_by_id(&self.db, user_id).await?;
        self.build_profile(user).await
    }

    /// 更新昵称、头像和邮箱
    #[instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> PlatformResult<UserProfile> {
        let user = UserRepository::get_by_id(&self.db, user_id).await?;
        let mut active: user::ActiveModel = user.into();

        if let Some(nickname) = request.nickname {
            active.nickname = Set(nickname.trim().to_string());
        }
        if let Some(avatar) = request.avatar {
            active.avatar = Set(Some(avatar).filter(|a| !a.is_empty()));
        }
        if let Some(email) = request.email {
            active.email = Set(Some(email).filter(|e| !e.is_empty()));
        }
        active.updated_at = Set(Utc::now().into());

        let user = active.update(&self.db).await?;
        self.build_profile(user).await
    }

    /// 修改密码，需要校验旧密码
    #[instrument(skip(self, request))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> PlatformResult<()> {
        let user = UserRepository::get_by_id(&self.db, user_id).await?;

        if !bcrypt::verify(&request.old_password, &user.password_hash)? {
            return Err(PlatformError::validation("oldPassword", "原密码不正确"));
        }

        let password_hash = bcrypt::hash(&request.new_password, self.config.security.bcrypt_cost)?;
        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await?;

        info!(user_id = %user_id, "密码已修改");
        Ok(())
    }

    /// 组装用户资料，超级管理员返回全部权限代码
    pub async fn build_profile(&self, user: user::Model) -> PlatformResult<UserProfile> {
        let role_ids = UserRepository::role_ids(&self.db, user.id).await?;
        let roles = if role_ids.is_empty() {
            Vec::new()
        } else {
            Role::find()
                .filter(role::Column::Id.is_in(role_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|r| r.name)
                .collect()
        };

        let permissions = if user.is_root {
            PermissionRepository::find_all(&self.db)
                .await?
                .into_iter()
                .map(|p| p.code)
                .collect()
        } else {
            PermissionRepository::codes_for_user(&self.db, user.id).await?
        };

        Ok(UserProfile {
            id: user.id,
            username: user.username,
            nickname: user.nickname,
            email: user.email,
            avatar: user.avatar,
            is_root: user.is_root,
            power: user.power,
            roles,
            permissions,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        })
    }

    async fn verify_credentials(&self, request: &LoginRequest) -> PlatformResult<user::Model> {
        let user = UserRepository::find_by_username(&self.db, request.username.trim())
            .await?
            .ok_or_else(|| PlatformError::authentication("用户名或密码错误"))?;

        if !bcrypt::verify(&request.password, &user.password_hash)? {
            warn!(username = %request.username, "密码验证失败");
            return Err(PlatformError::authentication("用户名或密码错误"));
        }

        if !user.is_active() {
            return Err(PlatformError::authentication("账号已被禁用"));
        }

        Ok(user)
    }

    async fn touch_last_login(&self, user: user::Model) -> PlatformResult<user::Model> {
        let mut active: user::ActiveModel = user.into();
        active.last_login_at = Set(Some(Utc::now().into()));
        Ok(active.update(&self.db).await?)
    }

    async fn issue(&self, user: user::Model) -> PlatformResult<LoginResponse> {
        let claims_permissions = if user.is_root {
            Vec::new()
        } else {
            PermissionRepository::codes_for_user(&self.db, user.id).await?
        };
        let issued = JwtUtils::generate_token(&user, claims_permissions, &self.config.security)?;
        let profile = self.build_profile(user).await?;

        Ok(LoginResponse {
            token: issued.token,
            token_type: "Bearer".to_string(),
            expires_in: issued.expires_in,
            user: profile,
        })
    }

    /// 字典 `register.enabled` 为 `false` 时关闭注册
    async fn registration_enabled(&self) -> PlatformResult<bool> {
        let entry = Dict::find()
            .filter(dict::Column::Group.eq("register"))
            .filter(dict::Column::Key.eq("enabled"))
            .filter(dict::Column::IsEnabled.eq(true))
            .one(&self.db)
            .await?;
        Ok(entry.map(|d| d.value != "false").unwrap_or(true))
    }
}

