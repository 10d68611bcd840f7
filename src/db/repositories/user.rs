// 用户仓储实现

use crate::db::entities::{prelude::*, user, user_role};
use crate::errors::PlatformError;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

/// 用户仓储
pub struct UserRepository;

impl UserRepository {
    /// 根据 ID 查找未删除的用户
    #[instrument(skip(db))]
    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<user::Model>, PlatformError> {
        let user = User::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .one(db)
            .await?;
        Ok(user)
    }

    /// 查找用户，不存在时返回 NotFound
    pub async fn get_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<user::Model, PlatformError> {
        Self::find_by_id(db, id)
            .await?
            .ok_or_else(|| PlatformError::not_found(format!("用户 {}", id)))
    }

    /// 根据用户名查找未删除的用户
    #[instrument(skip(db))]
    pub async fn find_by_username<C: ConnectionTrait>(
        db: &C,
        username: &str,
    ) -> Result<Option<user::Model>, PlatformError> {
        let user = User::find()
            .filter(user::Column::Username.eq(username))
            .filter(user::Column::DeletedAt.is_null())
            .one(db)
            .await?;
        Ok(user)
    }

    /// 用户名是否已被占用（包括已删除的用户）
    #[instrument(skip(db))]
    pub async fn exists_by_username<C: ConnectionTrait>(
        db: &C,
        username: &str,
    ) -> Result<bool, PlatformError> {
        let count = User::find()
            .filter(user::Column::Username.eq(username))
            .count(db)
            .await?;
        Ok(count > 0)
    }

    /// 用户持有的角色 ID
    #[instrument(skip(db))]
    pub async fn role_ids<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
    ) -> Result<Vec<Uuid>, PlatformError> {
        let ids = UserRole::find()
            .select_only()
            .column(user_role::Column::RoleId)
            .filter(user_role::Column::UserId.eq(user_id))
            .into_tuple::<Uuid>()
            .all(db)
            .await?;
        Ok(ids)
    }

    /// 替换用户的角色
    #[instrument(skip(db, role_ids))]
    pub async fn replace_roles<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<(), PlatformError> {
        UserRole::delete_many()
            .filter(user_role::Column::UserId.eq(user_id))
            .exec(db)
            .await?;

        for role_id in role_ids {
            user_role::ActiveModel {
                user_id: Set(user_id),
                role_id: Set(*role_id),
            }
            .insert(db)
            .await?;
        }

        info!(user_id = %user_id, count = role_ids.len(), "用户角色已更新");
        Ok(())
    }

    /// 持有指定角色的用户数量
    pub async fn count_by_role<C: ConnectionTrait>(
        db: &C,
        role_id: Uuid,
    ) -> Result<u64, PlatformError> {
        let count = UserRole::find()
            .filter(user_role::Column::RoleId.eq(role_id))
            .count(db)
            .await?;
        Ok(count)
    }
}
