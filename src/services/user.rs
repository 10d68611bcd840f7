// 控制台用户管理服务

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use agentdock_common::{PaginatedResponse, PaginationParams};

use crate::api::auth::AuthenticatedUser;
use crate::api::extractors::{rules, Validate};
use crate::config::AppConfig;
use crate::db::entities::{prelude::*, role, user, user::UserStatus};
use crate::db::UserRepository;
use crate::errors::{PlatformError, PlatformResult};
use crate::services::fetch_page;

/// 用户列表筛选
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    /// 匹配用户名或昵称
    pub keyword: Option<String>,
    pub status: Option<UserStatus>,
}

/// 创建用户
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub role_ids: Vec<Uuid>,
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::length("username", &self.username, 3, 32)?;
        rules::length("password", &self.password, 6, 64)?;
        rules::max_length("nickname", self.nickname.as_deref(), 64)?;
        rules::email("email", self.email.as_deref())?;
        Ok(())
    }
}

/// 更新用户，未提供的字段保持不变
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub status: Option<UserStatus>,
    pub role_ids: Option<Vec<Uuid>>,
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> PlatformResult<()> {
        if let Some(nickname) = &self.nickname {
            rules::length("nickname", nickname, 1, 64)?;
        }
        rules::email("email", self.email.as_deref())?;
        Ok(())
    }
}

/// 重置密码
#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

impl Validate for ResetPasswordRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::length("password", &self.password, 6, 64)
    }
}

/// 用户详情
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: user::Model,
    pub roles: Vec<role::Model>,
}

/// 用户管理服务
pub struct UserService {
    db: DatabaseConnection,
    config: Arc<AppConfig>,
}

impl UserService {
    pub fn new(db: DatabaseConnection, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    pub async fn list(
        &self,
        query: UserQuery,
        params: PaginationParams,
    ) -> PlatformResult<PaginatedResponse<user::Model>> {
        let mut select = User::find().filter(user::Column::DeletedAt.is_null());

        if let Some(keyword) = query.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(user::Column::Username.contains(keyword))
                    .add(user::Column::Nickname.contains(keyword)),
            );
        }
        if let Some(status) = query.status {
            select = select.filter(user::Column::Status.eq(status));
        }

        fetch_page(&self.db, select.order_by_desc(user::Column::CreatedAt), params).await
    }

    pub async fn detail(&self, id: Uuid) -> PlatformResult<UserDetail> {
        let user = UserRepository::get_by_id(&self.db, id).await?;
        let role_ids = UserRepository::role_ids(&self.db, id).await?;
        let roles = if role_ids.is_empty() {
            Vec::new()
        } else {
            Role::find()
                .filter(role::Column::Id.is_in(role_ids))
                .order_by_asc(role::Column::Sort)
                .all(&self.db)
                .await?
        };
        Ok(UserDetail { user, roles })
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn create(&self, request: CreateUserRequest) -> PlatformResult<UserDetail> {
        let username = request.username.trim().to_string();
        if UserRepository::exists_by_username(&self.db, &username).await? {
            return Err(PlatformError::conflict(format!("用户名 {} 已存在", username)));
        }
        let role_ids = self.checked_role_ids(request.role_ids).await?;

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
            last_login_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await?;
        UserRepository::replace_roles(&txn, user.id, &role_ids).await?;
        txn.commit().await?;

        info!(user_id = %user.id, "控制台创建用户");
        self.detail(user.id).await
    }

    /// 超级管理员不能被禁用
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: Uuid, request: UpdateUserRequest) -> PlatformResult<UserDetail> {
        let user = UserRepository::get_by_id(&self.db, id).await?;
        if user.is_root && request.status == Some(UserStatus::Disabled) {
            return Err(PlatformError::business("超级管理员不能被禁用"));
        }
        let role_ids = match request.role_ids {
            Some(ids) => Some(self.checked_role_ids(ids).await?),
            None => None,
        };

        let txn = self.db.begin().await?;
        let mut active: user::ActiveModel = user.into();
        if let Some(nickname) = request.nickname {
            active.nickname = Set(nickname.trim().to_string());
        }
        if let Some(email) = request.email {
            active.email = Set(Some(email).filter(|e| !e.is_empty()));
        }
        if let Some(status) = request.status {
            active.status = Set(status);
        }
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?;

        if let Some(role_ids) = role_ids {
            UserRepository::replace_roles(&txn, id, &role_ids).await?;
        }
        txn.commit().await?;

        self.detail(id).await
    }

    /// 超级管理员的密码只能由超级管理员本人重置
    #[instrument(skip(self, operator, request), fields(operator_id = %operator.user_id))]
    pub async fn reset_password(
        &self,
        operator: &AuthenticatedUser,
        id: Uuid,
        request: ResetPasswordRequest,
    ) -> PlatformResult<()> {
        let user = UserRepository::get_by_id(&self.db, id).await?;
        if user.is_root && !operator.is_root {
            return Err(PlatformError::authorization("无权重置超级管理员密码"));
        }
        let password_hash = bcrypt::hash(&request.password, self.config.security.bcrypt_cost)?;

        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await?;

        info!(user_id = %id, "密码已重置");
        Ok(())
    }

    /// 软删除，超级管理员不能删除
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> PlatformResult<()> {
        let user = UserRepository::get_by_id(&self.db, id).await?;
        if user.is_root {
            return Err(PlatformError::business("超级管理员不能被删除"));
        }

        let now = Utc::now();
        let mut active: user::ActiveModel = user.into();
        active.deleted_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());
        active.update(&self.db).await?;

        info!(user_id = %id, "用户已删除");
        Ok(())
    }

    async fn checked_role_ids(&self, mut ids: Vec<Uuid>) -> PlatformResult<Vec<Uuid>> {
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            return Ok(ids);
        }

        let found = Role::find()
            .filter(role::Column::Id.is_in(ids.clone()))
            .all(&self.db)
            .await?;
        if found.len() != ids.len() {
            return Err(PlatformError::validation("roleIds", "包含不存在的角色"));
        }
        Ok(ids)
    }
}
