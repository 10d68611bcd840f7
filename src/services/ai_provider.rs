// 模型提供商与模型配置服务

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::ai::{build_adapter, AdapterConfig, ChatMessage, ChatRequest, ProviderKind};
use crate::api::extractors::{rules, Validate};
use crate::config::AppConfig;
use crate::db::entities::{ai_model, ai_model::ModelType, ai_provider, prelude::*};
use crate::errors::{PlatformError, PlatformResult};

/// 密钥脱敏：保留前 4 位和后 4 位
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}****{}", head, tail)
}

/// 提供商（密钥已脱敏）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderView {
    #[serde(flatten)]
    pub provider: ai_provider::Model,
    pub api_key: Option<String>,
    /// 实际请求地址（未配置时为默认地址）
    pub effective_base_url: Option<String>,
}

impl From<ai_provider::Model> for ProviderView {
    fn from(provider: ai_provider::Model) -> Self {
        let api_key = provider.api_key.as_deref().map(mask_api_key);
        let effective_base_url = provider.base_url.clone().or_else(|| {
            ProviderKind::from_str(&provider.provider)
                .ok()
                .and_then(|kind| kind.default_base_url())
                .map(str::to_string)
        });
        Self {
            provider,
            api_key,
            effective_base_url,
        }
    }
}

/// 创建或更新提供商
///
/// 更新时 `apiKey` 缺省表示保留原密钥，空字符串表示清除。
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRequest {
    pub provider: String,
    pub name: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub sort: i32,
}

fn default_true() -> bool {
    true
}

impl Validate for ProviderRequest {
    fn validate(&self) -> PlatformResult<()> {
        ProviderKind::from_str(&self.provider)?;
        rules::length("name", &self.name, 1, 64)?;
        rules::url("baseUrl", self.base_url.as_deref())?;
        rules::max_length("apiKey", self.api_key.as_deref(), 500)?;
        Ok(())
    }
}

/// 创建或更新模型
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRequest {
    pub provider_id: Uuid,
    pub name: String,
    pub model: String,
    pub model_type: ModelType,
    #[serde(default = "default_max_context")]
    pub max_context: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub sort: i32,
}

fn default_max_context() -> i32 {
    4096
}

impl Validate for ModelRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::length("name", &self.name, 1, 64)?;
        rules::length("model", &self.model, 1, 128)?;
        rules::range("maxContext", self.max_context, 1, 2_000_000)?;
        Ok(())
    }
}

/// 模型列表筛选
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelQuery {
    pub provider_id: Option<Uuid>,
    pub model_type: Option<ModelType>,
}

/// 模型连通性测试结果
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelTestResult {
    pub model: String,
    pub latency_ms: u64,
    /// 对话模型返回的内容，或向量模型返回的维度说明
    pub output: String,
}

/// Web 端可选的对话模型
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatModelOption {
    pub id: Uuid,
    pub name: String,
    pub model: String,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub max_context: i32,
    pub is_default: bool,
}

/// 模型提供商服务
pub struct AiProviderService {
    db: DatabaseConnection,
    config: Arc<AppConfig>,
}

impl AiProviderService {
    pub fn new(db: DatabaseConnection, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    pub async fn list_providers(&self) -> PlatformResult<Vec<ProviderView>> {
        let providers = AiProvider::find()
            .filter(ai_provider::Column::DeletedAt.is_null())
            .order_by_asc(ai_provider::Column::Sort)
            .order_by_asc(ai_provider::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(providers.into_iter().map(ProviderView::from).collect())
    }

    pub async fn provider_detail(&self, id: Uuid) -> PlatformResult<ProviderView> {
        Ok(self.get_provider(id).await?.into())
    }

    #[instrument(skip(self, request), fields(provider = %request.provider))]
    pub async fn create_provider(&self, request: ProviderRequest) -> PlatformResult<ProviderView> {
        let kind = ProviderKind::from_str(&request.provider)?;
        let now = Utc::now();
        let provider = ai_provider::ActiveModel {
            id: Set(Uuid::new_v4()),
            provider: Set(kind.as_str().to_string()),
            name: Set(request.name.trim().to_string()),
            base_url: Set(request.base_url.filter(|u| !u.is_empty())),
            api_key: Set(request.api_key.filter(|k| !k.is_empty())),
            is_active: Set(request.is_active),
            sort: Set(request.sort),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            deleted_at: Set(None),
        }
        .insert(&self.db)
        .await?;

        info!(provider_id = %provider.id, "模型提供商已创建");
        Ok(provider.into())
    }

    #[instrument(skip(self, request))]
    pub async fn update_provider(
        &self,
        id: Uuid,
        request: ProviderRequest,
    ) -> PlatformResult<ProviderView> {
        let provider = self.get_provider(id).await?;
        let kind = ProviderKind::from_str(&request.provider)?;

        let mut active: ai_provider::ActiveModel = provider.into();
        active.provider = Set(kind.as_str().to_string());
        active.name = Set(request.name.trim().to_string());
        active.base_url = Set(request.base_url.filter(|u| !u.is_empty()));
        if let Some(api_key) = request.api_key {
            active.api_key = Set(Some(api_key).filter(|k| !k.is_empty()));
        }
        active.is_active = Set(request.is_active);
        active.sort = Set(request.sort);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?.into())
    }

    /// 切换启用状态
    #[instrument(skip(self))]
    pub async fn toggle_provider(&self, id: Uuid) -> PlatformResult<ProviderView> {
        let provider = self.get_provider(id).await?;
        let is_active = !provider.is_active;

        let mut active: ai_provider::ActiveModel = provider.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now().into());
        let provider = active.update(&self.db).await?;

        info!(provider_id = %id, is_active, "提供商状态已切换");
        Ok(provider.into())
    }

    /// 软删除提供商及其下的模型
    #[instrument(skip(self))]
    pub async fn delete_provider(&self, id: Uuid) -> PlatformResult<()> {
        let provider = self.get_provider(id).await?;
        let now = Utc::now();

        let txn = self.db.begin().await?;
        AiModel::update_many()
            .col_expr(
                ai_model::Column::DeletedAt,
                sea_orm::sea_query::Expr::value(Some(chrono::DateTime::<chrono::FixedOffset>::from(now))),
            )
            .filter(ai_model::Column::ProviderId.eq(id))
            .filter(ai_model::Column::DeletedAt.is_null())
            .exec(&txn)
            .await?;

        let mut active: ai_provider::ActiveModel = provider.into();
        active.deleted_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());
        active.update(&txn).await?;
        txn.commit().await?;

        info!(provider_id = %id, "提供商已删除");
        Ok(())
    }

    pub async fn list_models(&self, query: ModelQuery) -> PlatformResult<Vec<ai_model::Model>> {
        let mut select = AiModel::find().filter(ai_model::Column::DeletedAt.is_null());
        if let Some(provider_id) = query.provider_id {
            select = select.filter(ai_model::Column::ProviderId.eq(provider_id));
        }
        if let Some(model_type) = query.model_type {
            select = select.filter(ai_model::Column::ModelType.eq(model_type));
        }
        let models = select
            .order_by_asc(ai_model::Column::Sort)
            .order_by_asc(ai_model::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models)
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn create_model(&self, request: ModelRequest) -> PlatformResult<ai_model::Model> {
        self.get_provider(request.provider_id).await?;
        let now = Utc::now();

        let txn = self.db.begin().await?;
        if request.is_default {
            Self::clear_default(&txn, request.model_type, None).await?;
        }
        let model = ai_model::ActiveModel {
            id: Set(Uuid::new_v4()),
            provider_id: Set(request.provider_id),
            name: Set(request.name.trim().to_string()),
            model: Set(request.model.trim().to_string()),
            model_type: Set(request.model_type),
            max_context: Set(request.max_context),
            is_active: Set(request.is_active),
            is_default: Set(request.is_default),
            sort: Set(request.sort),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        info!(model_id = %model.id, "模型已创建");
        Ok(model)
    }

    #[instrument(skip(self, request))]
    pub async fn update_model(
        &self,
        id: Uuid,
        request: ModelRequest,
    ) -> PlatformResult<ai_model::Model> {
        let model = self.get_model(id).await?;
        self.get_provider(request.provider_id).await?;

        let txn = self.db.begin().await?;
        if request.is_default {
            Self::clear_default(&txn, request.model_type, Some(id)).await?;
        }
        let mut active: ai_model::ActiveModel = model.into();
        active.provider_id = Set(request.provider_id);
        active.name = Set(request.name.trim().to_string());
        active.model = Set(request.model.trim().to_string());
        active.model_type = Set(request.model_type);
        active.max_context = Set(request.max_context);
        active.is_active = Set(request.is_active);
        active.is_default = Set(request.is_default);
        active.sort = Set(request.sort);
        active.updated_at = Set(Utc::now().into());
        let model = active.update(&txn).await?;
        txn.commit().await?;

        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn delete_model(&self, id: Uuid) -> PlatformResult<()> {
        let model = self.get_model(id).await?;
        let now = Utc::now();

        let mut active: ai_model::ActiveModel = model.into();
        active.deleted_at = Set(Some(now.into()));
        active.is_default = Set(false);
        active.updated_at = Set(now.into());
        active.update(&self.db).await?;

        info!(model_id = %id, "模型已删除");
        Ok(())
    }

    /// 通过适配器向提供商发起一次请求
    #[instrument(skip(self))]
    pub async fn test_model(&self, id: Uuid) -> PlatformResult<ModelTestResult> {
        let model = self.get_model(id).await?;
        let provider = self.get_provider(model.provider_id).await?;
        let kind = ProviderKind::from_str(&provider.provider)?;

        let adapter = build_adapter(
            kind,
            &AdapterConfig {
                base_url: provider.base_url.clone(),
                api_key: provider.api_key.clone(),
                timeout_secs: self.config.ai.timeout,
            },
        )?;

        let started = Instant::now();
        let prompt = self.config.ai.test_prompt.clone();
        let output = match model.model_type {
            ModelType::Chat => {
                let response = adapter
                    .chat(&ChatRequest {
                        model: model.model.clone(),
                        messages: vec![ChatMessage::user(prompt)],
                        max_tokens: Some(self.config.ai.max_tokens.min(64)),
                        temperature: Some(self.config.ai.temperature),
                    })
                    .await?;
                response.content
            }
            ModelType::Embedding => {
                let response = adapter.embed(&model.model, &[prompt]).await?;
                let dimensions = response.embeddings.first().map(Vec::len).unwrap_or(0);
                format!("向量维度 {}", dimensions)
            }
            ModelType::Rerank => {
                let documents = vec![prompt.clone(), "unrelated".to_string()];
                let results = adapter.rerank(&model.model, &prompt, &documents).await?;
                format!("返回 {} 条排序结果", results.len())
            }
        };
        let latency_ms = started.elapsed().as_millis() as u64;

        if output.is_empty() {
            warn!(model_id = %id, "模型返回空内容");
        }
        info!(model_id = %id, latency_ms, "模型测试完成");

        Ok(ModelTestResult {
            model: model.model,
            latency_ms,
            output,
        })
    }

    /// 启用的提供商下启用的对话模型，默认模型在前
    pub async fn web_chat_models(&self) -> PlatformResult<Vec<ChatModelOption>> {
        let providers = AiProvider::find()
            .filter(ai_provider::Column::DeletedAt.is_null())
            .filter(ai_provider::Column::IsActive.eq(true))
            .all(&self.db)
            .await?;
        if providers.is_empty() {
            return Ok(Vec::new());
        }

        let models = AiModel::find()
            .filter(ai_model::Column::DeletedAt.is_null())
            .filter(ai_model::Column::IsActive.eq(true))
            .filter(ai_model::Column::ModelType.eq(ModelType::Chat))
            .filter(ai_model::Column::ProviderId.is_in(providers.iter().map(|p| p.id)))
            .order_by_desc(ai_model::Column::IsDefault)
            .order_by_asc(ai_model::Column::Sort)
            .all(&self.db)
            .await?;

        Ok(models
            .into_iter()
            .filter_map(|model| {
                let provider = providers.iter().find(|p| p.id == model.provider_id)?;
                Some(ChatModelOption {
                    id: model.id,
                    name: model.name,
                    model: model.model,
                    provider_id: provider.id,
                    provider_name: provider.name.clone(),
                    max_context: model.max_context,
                    is_default: model.is_default,
                })
            })
            .collect())
    }

    async fn get_provider(&self, id: Uuid) -> PlatformResult<ai_provider::Model> {
        AiProvider::find_by_id(id)
            .filter(ai_provider::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or_else(|| PlatformError::not_found(format!("模型提供商 {}", id)))
    }

    async fn get_model(&self, id: Uuid) -> PlatformResult<ai_model::Model> {
        AiModel::find_by_id(id)
            .filter(ai_model::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or_else(|| PlatformError::not_found(format!("模型 {}", id)))
    }

    /// 同一类型只保留一个默认模型
    async fn clear_default<C: sea_orm::ConnectionTrait>(
        db: &C,
        model_type: ModelType,
        except: Option<Uuid>,
    ) -> PlatformResult<()> {
        let mut update = AiModel::update_many()
            .col_expr(ai_model::Column::IsDefault, sea_orm::sea_query::Expr::value(false))
            .filter(ai_model::Column::ModelType.eq(model_type))
            .filter(ai_model::Column::IsDefault.eq(true));
        if let Some(id) = except {
            update = update.filter(ai_model::Column::Id.ne(id));
        }
        update.exec(db).await?;
        Ok(())
    }
}
