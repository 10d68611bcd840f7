// 页面装修服务

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::extractors::{rules, Validate};
use crate::db::entities::{decorate_page, prelude::*};
use crate::errors::{PlatformError, PlatformResult};

/// 保存装修页面，按名称存在则更新
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SaveDecorateRequest {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

impl Validate for SaveDecorateRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::length("name", &self.name, 1, 64)?;
        rules::max_length("title", Some(&self.title), 128)?;
        if !(self.data.is_object() || self.data.is_array()) {
            return Err(PlatformError::validation("data", "页面数据必须是对象或数组"));
        }
        Ok(())
    }
}

/// 页面装修服务
pub struct DecorateService {
    db: DatabaseConnection,
}

impl DecorateService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> PlatformResult<Vec<decorate_page::Model>> {
        let pages = DecoratePage::find()
            .order_by_asc(decorate_page::Column::Name)
            .all(&self.db)
            .await?;
        Ok(pages)
    }

    pub async fn get(&self, name: &str) -> PlatformResult<decorate_page::Model> {
        self.find(name)
            .await?
            .ok_or_else(|| PlatformError::not_found(format!("装修页面 {}", name)))
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn save(&self, request: SaveDecorateRequest) -> PlatformResult<decorate_page::Model> {
        let name = request.name.trim().to_string();
        let now = Utc::now();

        let page = match self.find(&name).await? {
            Some(page) => {
                let mut active: decorate_page::ActiveModel = page.into();
                active.title = Set(request.title);
                active.data = Set(request.data);
                active.updated_at = Set(now.into());
                active.update(&self.db).await?
            }
            None => {
                decorate_page::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(name),
                    title: Set(request.title),
                    data: Set(request.data),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                }
                .insert(&self.db)
                .await?
            }
        };

        info!(page = %page.name, "装修页面已保存");
        Ok(page)
    }

    async fn find(&self, name: &str) -> PlatformResult<Option<decorate_page::Model>> {
        let page = DecoratePage::find()
            .filter(decorate_page::Column::Name.eq(name))
            .one(&self.db)
            .await?;
        Ok(page)
    }
}
