// 字典配置服务

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::extractors::{rules, Validate};
use crate::db::entities::{dict, prelude::*};
use crate::errors::{PlatformError, PlatformResult};

/// 字典筛选
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DictQuery {
    pub group: Option<String>,
}

/// 创建或更新字典项
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictRequest {
    pub group: String,
    pub key: String,
    #[serde(default)]
    pub value: String,
    pub remark: Option<String>,
    #[serde(default)]
    pub sort: i32,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Validate for DictRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::length("group", &self.group, 1, 64)?;
        rules::length("key", &self.key, 1, 64)?;
        rules::max_length("value", Some(&self.value), 5000)?;
        rules::max_length("remark", self.remark.as_deref(), 255)?;
        Ok(())
    }
}

/// 字典服务
pub struct DictService {
    db: DatabaseConnection,
}

impl DictService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: DictQuery) -> PlatformResult<Vec<dict::Model>> {
        let mut select = Dict::find();
        if let Some(group) = query.group.filter(|g| !g.is_empty()) {
            select = select.filter(dict::Column::Group.eq(group));
        }
        let dicts = select
            .order_by_asc(dict::Column::Group)
            .order_by_asc(dict::Column::Sort)
            .all(&self.db)
            .await?;
        Ok(dicts)
    }

    /// 分组内启用的键值对
    pub async fn group_map(&self, group: &str) -> PlatformResult<BTreeMap<String, String>> {
        let dicts = Dict::find()
            .filter(dict::Column::Group.eq(group))
            .filter(dict::Column::IsEnabled.eq(true))
            .all(&self.db)
            .await?;
        Ok(dicts.into_iter().map(|d| (d.key, d.value)).collect())
    }

    #[instrument(skip(self, request), fields(group = %request.group, key = %request.key))]
    pub async fn create(&self, request: DictRequest) -> PlatformResult<dict::Model> {
        self.ensure_unique(&request.group, &request.key, None).await?;

        let now = Utc::now();
        let dict = dict::ActiveModel {
            id: Set(Uuid::new_v4()),
            group: Set(request.group.trim().to_string()),
            key: Set(request.key.trim().to_string()),
            value: Set(request.value),
            remark: Set(request.remark),
            sort: Set(request.sort),
            is_enabled: Set(request.is_enabled),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;

        info!(dict_id = %dict.id, "字典项已创建");
        Ok(dict)
    }

    #[instrument(skip(self, request))]
    pub async fn update(&self, id: Uuid, request: DictRequest) -> PlatformResult<dict::Model> {
        let dict = self.get(id).await?;
        self.ensure_unique(&request.group, &request.key, Some(id)).await?;

        let mut active: dict::ActiveModel = dict.into();
        active.group = Set(request.group.trim().to_string());
        active.key = Set(request.key.trim().to_string());
        active.value = Set(request.value);
        active.remark = Set(request.remark);
        active.sort = Set(request.sort);
        active.is_enabled = Set(request.is_enabled);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    pub async fn delete(&self, id: Uuid) -> PlatformResult<()> {
        let dict = self.get(id).await?;
        dict.delete(&self.db).await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> PlatformResult<dict::Model> {
        Dict::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| PlatformError::not_found(format!("字典项 {}", id)))
    }

    async fn ensure_unique(&self, group: &str, key: &str, exclude: Option<Uuid>) -> PlatformResult<()> {
        let mut query = Dict::find()
            .filter(dict::Column::Group.eq(group.trim()))
            .filter(dict::Column::Key.eq(key.trim()));
        if let Some(id) = exclude {
            query = query.filter(dict::Column::Id.ne(id));
        }
        if query.one(&self.db).await?.is_some() {
            return Err(PlatformError::conflict(format!("字典项 {}.{} 已存在", group, key)));
        }
        Ok(())
    }
}
