// 角色服务

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::extractors::{rules, Validate};
use crate::db::entities::{permission, prelude::*, role};
use crate::db::{PermissionRepository, UserRepository};
use crate::errors::{PlatformError, PlatformResult};

/// 创建或更新角色
#[derive(Debug, Clone, Deserialize)]
pub struct RoleRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub sort: i32,
}

impl Validate for RoleRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::length("name", &self.name, 1, 64)?;
        rules::max_length("description", self.description.as_deref(), 255)?;
        Ok(())
    }
}

/// 分配权限（替换原有集合）
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignPermissionsRequest {
    pub permission_ids: Vec<Uuid>,
}

impl Validate for AssignPermissionsRequest {
    fn validate(&self) -> PlatformResult<()> {
        Ok(())
    }
}

/// 角色详情
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDetail {
    #[serde(flatten)]
    pub role: role::Model,
    pub permissions: Vec<String>,
    pub user_count: u64,
}

/// 角色服务
pub struct RoleService {
    db: DatabaseConnection,
}

impl RoleService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> PlatformResult<Vec<role::Model>> {
        let roles = Role::find()
            .order_by_asc(role::Column::Sort)
            .order_by_asc(role::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(roles)
    }

    pub async fn detail(&self, id: Uuid) -> PlatformResult<RoleDetail> {
        let role = self.get(id).await?;
        let permissions = PermissionRepository::codes_for_role(&self.db, id).await?;
        let user_count = UserRepository::count_by_role(&self.db, id).await?;
        Ok(RoleDetail {
            role,
            permissions,
            user_count,
        })
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, request: RoleRequest) -> PlatformResult<role::Model> {
        let name = request.name.trim().to_string();
        self.ensure_name_available(&name, None).await?;

        let now = Utc::now();
        let role = role::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(request.description),
            sort: Set(request.sort),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;

        info!(role_id = %role.id, "角色已创建");
        Ok(role)
    }

    #[instrument(skip(self, request))]
    pub async fn update(&self, id: Uuid, request: RoleRequest) -> PlatformResult<role::Model> {
        let role = self.get(id).await?;
        let name = request.name.trim().to_string();
        self.ensure_name_available(&name, Some(id)).await?;

        let mut active: role::ActiveModel = role.into();
        active.name = Set(name);
        active.description = Set(request.description);
        active.sort = Set(request.sort);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// 仍有用户持有的角色不能删除
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> PlatformResult<()> {
        let role = self.get(id).await?;
        let holders = UserRepository::count_by_role(&self.db, id).await?;
        if holders > 0 {
            return Err(PlatformError::business(format!(
                "角色 {} 仍有 {} 个用户使用，无法删除",
                role.name, holders
            )));
        }

        let txn = self.db.begin().await?;
        PermissionRepository::replace_role_permissions(&txn, id, &[]).await?;
        role.delete(&txn).await?;
        txn.commit().await?;

        info!(role_id = %id, "角色已删除");
        Ok(())
    }

    /// 替换角色的权限集合，返回新的权限代码
    #[instrument(skip(self, request), fields(count = request.permission_ids.len()))]
    pub async fn assign_permissions(
        &self,
        id: Uuid,
        request: AssignPermissionsRequest,
    ) -> PlatformResult<Vec<String>> {
        self.get(id).await?;

        let mut ids = request.permission_ids;
        ids.sort();
        ids.dedup();

        if !ids.is_empty() {
            let found = Permission::find()
                .filter(permission::Column::Id.is_in(ids.clone()))
                .all(&self.db)
                .await?;
            if found.len() != ids.len() {
                return Err(PlatformError::validation("permissionIds", "包含不存在的权限"));
            }
        }

        let txn = self.db.begin().await?;
        PermissionRepository::replace_role_permissions(&txn, id, &ids).await?;
        txn.commit().await?;

        PermissionRepository::codes_for_role(&self.db, id).await
    }

    async fn get(&self, id: Uuid) -> PlatformResult<role::Model> {
        Role::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| PlatformError::not_found(format!("角色 {}", id)))
    }

    async fn ensure_name_available(&self, name: &str, exclude: Option<Uuid>) -> PlatformResult<()> {
        let mut query = Role::find().filter(role::Column::Name.eq(name));
        if let Some(id) = exclude {
            query = query.filter(role::Column::Id.ne(id));
        }
        if query.one(&self.db).await?.is_some() {
            return Err(PlatformError::conflict(format!("角色名 {} 已存在", name)));
        }
        Ok(())
    }
}
