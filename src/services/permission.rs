// 权限服务
// 权限目录由控制台路由声明，启动时与数据库同步

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::entities::{permission, prelude::*, role, role_permission};
use crate::db::{PermissionRepository, ADMIN_ROLE};
use crate::errors::PlatformResult;

/// 权限声明
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionDef {
    pub code: &'static str,
    pub name: &'static str,
    pub group: &'static str,
}

impl PermissionDef {
    pub const fn new(code: &'static str, name: &'static str, group: &'static str) -> Self {
        Self { code, name, group }
    }
}

/// 同步结果
#[derive(Debug, Clone, Default, Serialize, ToSchema, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

/// 权限分组
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGroup {
    pub group_name: String,
    pub permissions: Vec<permission::Model>,
}

/// 权限服务
pub struct PermissionService {
    db: DatabaseConnection,
}

impl PermissionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// 按分组列出全部权限
    pub async fn list_grouped(&self) -> PlatformResult<Vec<PermissionGroup>> {
        let mut groups: BTreeMap<String, Vec<permission::Model>> = BTreeMap::new();
        for permission in PermissionRepository::find_all(&self.db).await? {
            groups
                .entry(permission.group_name.clone())
                .or_default()
                .push(permission);
        }

        Ok(groups
            .into_iter()
            .map(|(group_name, permissions)| PermissionGroup {
                group_name,
                permissions,
            })
            .collect())
    }

    /// 将数据库与权限声明对齐
    ///
    /// 新增缺失的代码（并授予管理员角色），更新名称或分组有变化的代码，
    /// 删除不再声明的代码及其角色关联。
    #[instrument(skip(self, catalogue), fields(declared = catalogue.len()))]
    pub async fn sync(&self, catalogue: &[PermissionDef]) -> PlatformResult<SyncReport> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        let existing: HashMap<String, permission::Model> = Permission::find()
            .all(&txn)
            .await?
            .into_iter()
            .map(|p| (p.code.clone(), p))
            .collect();

        let mut report = SyncReport::default();
        let mut added_ids = Vec::new();

        for def in catalogue {
            match existing.get(def.code) {
                None => {
                    let id = Uuid::new_v4();
                    permission::ActiveModel {
                        id: Set(id),
                        code: Set(def.code.to_string()),
                        name: Set(def.name.to_string()),
                        group_name: Set(def.group.to_string()),
                        created_at: Set(now.into()),
                        updated_at: Set(now.into()),
                    }
                    .insert(&txn)
                    .await?;
                    added_ids.push(id);
                    report.added += 1;
                }
                Some(current) if current.name != def.name || current.group_name != def.group => {
                    let mut active: permission::ActiveModel = current.clone().into();
                    active.name = Set(def.name.to_string());
                    active.group_name = Set(def.group.to_string());
                    active.updated_at = Set(now.into());
                    active.update(&txn).await?;
                    report.updated += 1;
                }
                Some(_) => {}
            }
        }

        let stale_ids: Vec<Uuid> = existing
            .values()
            .filter(|p| !catalogue.iter().any(|def| def.code == p.code))
            .map(|p| p.id)
            .collect();

        if !stale_ids.is_empty() {
            RolePermission::delete_many()
                .filter(role_permission::Column::PermissionId.is_in(stale_ids.clone()))
                .exec(&txn)
                .await?;
            let result = Permission::delete_many()
                .filter(permission::Column::Id.is_in(stale_ids))
                .exec(&txn)
                .await?;
            report.removed = result.rows_affected as usize;
        }

        if !added_ids.is_empty() {
            let admin = Role::find()
                .filter(role::Column::Name.eq(ADMIN_ROLE))
                .one(&txn)
                .await?;
            if let Some(admin) = admin {
                for permission_id in &added_ids {
                    role_permission::ActiveModel {
                        role_id: Set(admin.id),
                        permission_id: Set(*permission_id),
                    }
                    .insert(&txn)
                    .await?;
                }
            }
        }

        txn.commit().await?;

        info!(
            added = report.added,
            updated = report.updated,
            removed = report.removed,
            "权限同步完成"
        );
        Ok(report)
    }
}
