// 权限仓储实现

use crate::db::entities::{permission, prelude::*, role_permission, user_role};
use crate::errors::PlatformError;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::instrument;
use uuid::Uuid;

/// 权限仓储
pub struct PermissionRepository;

impl PermissionRepository {
    /// 全部权限，按分组和代码排序
    pub async fn find_all<C: ConnectionTrait>(
        db: &C,
    ) -> Result<Vec<permission::Model>, PlatformError> {
        let permissions = Permission::find()
            .order_by_asc(permission::Column::GroupName)
            .order_by_asc(permission::Column::Code)
            .all(db)
            .await?;
        Ok(permissions)
    }

    /// 根据代码查找权限
    pub async fn find_by_codes<C: ConnectionTrait>(
        db: &C,
        codes: &[String],
    ) -> Result<Vec<permission::Model>, PlatformError> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let permissions = Permission::find()
            .filter(permission::Column::Code.is_in(codes.iter().cloned()))
            .all(db)
            .await?;
        Ok(permissions)
    }

    /// 角色拥有的权限代码
    #[instrument(skip(db))]
    pub async fn codes_for_role<C: ConnectionTrait>(
        db: &C,
        role_id: Uuid,
    ) -> Result<Vec<String>, PlatformError> {
        Self::codes_for_roles(db, &[role_id]).await
    }

    /// 多个角色拥有的权限代码（去重）
    #[instrument(skip(db, role_ids))]
    pub async fn codes_for_roles<C: ConnectionTrait>(
        db: &C,
        role_ids: &[Uuid],
    ) -> Result<Vec<String>, PlatformError> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let permission_ids = RolePermission::find()
            .select_only()
            .column(role_permission::Column::PermissionId)
            .filter(role_permission::Column::RoleId.is_in(role_ids.iter().copied()))
            .into_tuple::<Uuid>()
            .all(db)
            .await?;

        if permission_ids.is_empty() {
            return Ok(Vec::new());
        }

        let codes = Permission::find()
            .select_only()
            .column(permission::Column::Code)
            .filter(permission::Column::Id.is_in(permission_ids))
            .order_by_asc(permission::Column::Code)
            .into_tuple::<String>()
            .all(db)
            .await?;
        Ok(codes)
    }

    /// 用户通过角色获得的权限代码
    #[instrument(skip(db))]
    pub async fn codes_for_user<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
    ) -> Result<Vec<String>, PlatformError> {
        let role_ids = UserRole::find()
            .select_only()
            .column(user_role::Column::RoleId)
            .filter(user_role::Column::UserId.eq(user_id))
            .into_tuple::<Uuid>()
            .all(db)
            .await?;
        Self::codes_for_roles(db, &role_ids).await
    }

    /// 替换角色的权限
    #[instrument(skip(db, permission_ids))]
    pub async fn replace_role_permissions<C: ConnectionTrait>(
        db: &C,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<(), PlatformError> {
        RolePermission::delete_many()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .exec(db)
            .await?;

        for permission_id in permission_ids {
            role_permission::ActiveModel {
                role_id: Set(role_id),
                permission_id: Set(*permission_id),
            }
            .insert(db)
            .await?;
        }
        Ok(())
    }
}
