// 智能体服务

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::IntoParams;
use uuid::Uuid;

use agentdock_common::{PaginatedResponse, PaginationParams};

use crate::api::extractors::{rules, Validate};
use crate::db::entities::{agent, ai_model, dataset, prelude::*, tag, tag::TagType};
use crate::errors::{PlatformError, PlatformResult};
use crate::services::fetch_page;

/// 智能体列表筛选
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AgentQuery {
    pub keyword: Option<String>,
    pub tag_id: Option<Uuid>,
    pub is_public: Option<bool>,
}

/// 创建或更新智能体
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    pub name: String,
    pub description: Option<String>,
    pub avatar: Option<String>,
    pub role_prompt: Option<String>,
    pub opening_statement: Option<String>,
    pub model_id: Option<Uuid>,
    #[serde(default)]
    pub dataset_ids: Vec<Uuid>,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

impl Validate for AgentRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::length("name", &self.name, 1, 64)?;
        rules::max_length("description", self.description.as_deref(), 500)?;
        rules::max_length("avatar", self.avatar.as_deref(), 500)?;
        rules::max_length("rolePrompt", self.role_prompt.as_deref(), 8000)?;
        rules::max_length("openingStatement", self.opening_statement.as_deref(), 1000)?;
        Ok(())
    }
}

/// 智能体服务
pub struct AgentService {
    db: DatabaseConnection,
}

impl AgentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// 控制台列表
    pub async fn list(
        &self,
        query: AgentQuery,
        params: PaginationParams,
    ) -> PlatformResult<PaginatedResponse<agent::Model>> {
        self.search(query, params).await
    }

    /// Web 端只列出已发布的智能体
    pub async fn list_public(
        &self,
        query: AgentQuery,
        params: PaginationParams,
    ) -> PlatformResult<PaginatedResponse<agent::Model>> {
        self.search(
            AgentQuery {
                is_public: Some(true),
                ..query
            },
            params,
        )
        .await
    }

    pub async fn detail(&self, id: Uuid) -> PlatformResult<agent::Model> {
        get_agent(&self.db, id).await
    }

    /// Web 端详情，未发布的智能体视为不存在
    pub async fn public_detail(&self, id: Uuid) -> PlatformResult<agent::Model> {
        let agent = get_agent(&self.db, id).await?;
        if !agent.is_public {
            return Err(PlatformError::not_found(format!("智能体 {}", id)));
        }
        Ok(agent)
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, creator: Uuid, request: AgentRequest) -> PlatformResult<agent::Model> {
        let (dataset_ids, tag_ids) = self.check_references(&request).await?;
        let now = Utc::now();

        let agent = agent::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            description: Set(request.description),
            avatar: Set(request.avatar),
            role_prompt: Set(request.role_prompt),
            opening_statement: Set(request.opening_statement),
            model_id: Set(request.model_id),
            dataset_ids: Set(serde_json::to_value(dataset_ids)?),
            tag_ids: Set(serde_json::to_value(tag_ids)?),
            is_public: Set(false),
            created_by: Set(creator),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            deleted_at: Set(None),
        }
        .insert(&self.db)
        .await?;

        info!(agent_id = %agent.id, "智能体已创建");
        Ok(agent)
    }

    #[instrument(skip(self, request))]
    pub async fn update(&self, id: Uuid, request: AgentRequest) -> PlatformResult<agent::Model> {
        let agent = get_agent(&self.db, id).await?;
        let (dataset_ids, tag_ids) = self.check_references(&request).await?;

        let mut active: agent::ActiveModel = agent.into();
        active.name = Set(request.name.trim().to_string());
        active.description = Set(request.description);
        active.avatar = Set(request.avatar);
        active.role_prompt = Set(request.role_prompt);
        active.opening_statement = Set(request.opening_statement);
        active.model_id = Set(request.model_id);
        active.dataset_ids = Set(serde_json::to_value(dataset_ids)?);
        active.tag_ids = Set(serde_json::to_value(tag_ids)?);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// 发布或取消发布
    #[instrument(skip(self))]
    pub async fn set_public(&self, id: Uuid, is_public: bool) -> PlatformResult<agent::Model> {
        let agent = get_agent(&self.db, id).await?;
        let mut active: agent::ActiveModel = agent.into();
        active.is_public = Set(is_public);
        active.updated_at = Set(Utc::now().into());
        let agent = active.update(&self.db).await?;

        info!(agent_id = %id, is_public, "智能体发布状态已更新");
        Ok(agent)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> PlatformResult<()> {
        let agent = get_agent(&self.db, id).await?;
        let now = Utc::now();
        let mut active: agent::ActiveModel = agent.into();
        active.deleted_at = Set(Some(now.into()));
        active.is_public = Set(false);
        active.updated_at = Set(now.into());
        active.update(&self.db).await?;

        info!(agent_id = %id, "智能体已删除");
        Ok(())
    }

    async fn search(
        &self,
        query: AgentQuery,
        params: PaginationParams,
    ) -> PlatformResult<PaginatedResponse<agent::Model>> {
        let mut select = Agent::find().filter(agent::Column::DeletedAt.is_null());

        if let Some(is_public) = query.is_public {
            select = select.filter(agent::Column::IsPublic.eq(is_public));
        }
        if let Some(keyword) = query.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(agent::Column::Name.contains(keyword))
                    .add(agent::Column::Description.contains(keyword)),
            );
        }
        let select = select.order_by_desc(agent::Column::UpdatedAt);

        // 标签 ID 存放在 JSON 列中，按标签筛选时在内存中过滤后分页
        let Some(tag_id) = query.tag_id else {
            return fetch_page(&self.db, select, params).await;
        };
        let params = params.normalized();
        let matched: Vec<agent::Model> = select
            .all(&self.db)
            .await?
            .into_iter()
            .filter(|agent| agent.tag_id_list().contains(&tag_id))
            .collect();
        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(usize::try_from(params.offset()).unwrap_or(usize::MAX))
            .take(params.page_size as usize)
            .collect();
        Ok(PaginatedResponse::new(items, total, params))
    }

    /// 校验关联的模型、知识库和标签，返回去重后的 ID
    async fn check_references(&self, request: &AgentRequest) -> PlatformResult<(Vec<Uuid>, Vec<Uuid>)> {
        if let Some(model_id) = request.model_id {
            let exists = AiModel::find_by_id(model_id)
                .filter(ai_model::Column::DeletedAt.is_null())
                .count(&self.db)
                .await?
                > 0;
            if !exists {
                return Err(PlatformError::validation("modelId", "模型不存在"));
            }
        }

        let mut dataset_ids = request.dataset_ids.clone();
        dataset_ids.sort();
        dataset_ids.dedup();
        if !dataset_ids.is_empty() {
            let found = Dataset::find()
                .filter(dataset::Column::Id.is_in(dataset_ids.clone()))
                .filter(dataset::Column::DeletedAt.is_null())
                .count(&self.db)
                .await?;
            if found as usize != dataset_ids.len() {
                return Err(PlatformError::validation("datasetIds", "包含不存在的知识库"));
            }
        }

        let mut tag_ids = request.tag_ids.clone();
        tag_ids.sort();
        tag_ids.dedup();
        if !tag_ids.is_empty() {
            let found = Tag::find()
                .filter(tag::Column::Id.is_in(tag_ids.clone()))
                .filter(tag::Column::TagType.eq(TagType::Agent))
                .count(&self.db)
                .await?;
            if found as usize != tag_ids.len() {
                return Err(PlatformError::validation("tagIds", "包含不存在的智能体标签"));
            }
        }

        Ok((dataset_ids, tag_ids))
    }
}

pub(crate) async fn get_agent(db: &DatabaseConnection, id: Uuid) -> PlatformResult<agent::Model> {
    Agent::find_by_id(id)
        .filter(agent::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| PlatformError::not_found(format!("智能体 {}", id)))
}
