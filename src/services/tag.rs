// 标签服务

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::extractors::{rules, Validate};
use crate::db::entities::{prelude::*, tag, tag::TagType};
use crate::errors::{PlatformError, PlatformResult};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagQuery {
    pub tag_type: Option<TagType>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRequest {
    pub name: String,
    pub tag_type: TagType,
}

impl Validate for TagRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::length("name", &self.name, 1, 32)
    }
}

/// 标签服务，名称在同一类型内唯一
pub struct TagService {
    db: DatabaseConnection,
}

impl TagService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: TagQuery) -> PlatformResult<Vec<tag::Model>> {
        let mut select = Tag::find();
        if let Some(tag_type) = query.tag_type {
            select = select.filter(tag::Column::TagType.eq(tag_type));
        }
        Ok(select.order_by_asc(tag::Column::Name).all(&self.db).await?)
    }

    pub async fn create(&self, request: TagRequest) -> PlatformResult<tag::Model> {
        let name = request.name.trim().to_string();
        self.ensure_unique(&name, request.tag_type, None).await?;

        let now = Utc::now();
        let tag = tag::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            tag_type: Set(request.tag_type),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;
        Ok(tag)
    }

    pub async fn update(&self, id: Uuid, request: TagRequest) -> PlatformResult<tag::Model> {
        let tag = self.get(id).await?;
        let name = request.name.trim().to_string();
        self.ensure_unique(&name, request.tag_type, Some(id)).await?;

        let mut active: tag::ActiveModel = tag.into();
        active.name = Set(name);
        active.tag_type = Set(request.tag_type);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    pub async fn delete(&self, id: Uuid) -> PlatformResult<()> {
        let tag = self.get(id).await?;
        tag.delete(&self.db).await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> PlatformResult<tag::Model> {
        Tag::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| PlatformError::not_found(format!("标签 {}", id)))
    }

    async fn ensure_unique(&self, name: &str, tag_type: TagType, exclude: Option<Uuid>) -> PlatformResult<()> {
        let mut query = Tag::find()
            .filter(tag::Column::Name.eq(name))
            .filter(tag::Column::TagType.eq(tag_type));
        if let Some(id) = exclude {
            query = query.filter(tag::Column::Id.ne(id));
        }
        if query.one(&self.db).await?.is_some() {
            return Err(PlatformError::conflict(format!("标签 {} 已存在", name)));
        }
        Ok(())
    }
}
