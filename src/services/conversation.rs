// 会话服务
// 对话、消息记录以及基于智能体知识库的回答

use chrono::{Duration, Utc};
use sea_orm::{
    prelude::DateTimeWithTimeZone, sea_query::Expr, ActiveModelTrait, ColumnTrait,
    DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use agentdock_common::{PaginatedResponse, PaginationParams};

use crate::ai::{RagAnswer, RagEngine};
use crate::api::extractors::{rules, Validate};
use crate::config::AppConfig;
use crate::db::entities::{conversation, message, message::MessageRole, prelude::*};
use crate::errors::{PlatformError, PlatformResult};
use crate::services::agent::get_agent;
use crate::services::dataset::collect_chunks;
use crate::services::fetch_page;

/// 自动生成标题时截取的字符数
pub const TITLE_MAX_CHARS: usize = 20;

/// 对话请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// 为空时创建新会话
    pub conversation_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
    pub content: String,
    /// 以 SSE 推送回答
    #[serde(default)]
    pub stream: bool,
}

impl Validate for ChatRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::length("content", &self.content, 1, 4000)
    }
}

/// 重命名会话
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RenameRequest {
    pub title: String,
}

impl Validate for RenameRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::length("title", &self.title, 1, 100)
    }
}

/// 一轮对话的结果
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatOutcome {
    pub conversation_id: Uuid,
    pub user_message_id: Uuid,
    pub message_id: Uuid,
    #[schema(value_type = Object)]
    pub answer: RagAnswer,
}

/// 由首条消息生成会话标题
pub fn title_from_content(content: &str) -> String {
    content.trim().chars().take(TITLE_MAX_CHARS).collect()
}

/// 会话服务
pub struct ConversationService {
    db: DatabaseConnection,
    config: Arc<AppConfig>,
}

impl ConversationService {
    pub fn new(db: DatabaseConnection, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    /// 进行一轮对话
    ///
    /// 保存用户消息，使用智能体关联知识库中启用的分段生成回答，再保存助手消息。
    #[instrument(skip(self, rag, request), fields(user_id = %user_id))]
    pub async fn chat(
        &self,
        rag: &RagEngine,
        user_id: Uuid,
        request: ChatRequest,
    ) -> PlatformResult<ChatOutcome> {
        let content = request.content.trim().to_string();
        let conversation = match request.conversation_id {
            Some(id) => self.get_owned(user_id, id).await?,
            None => self.start(user_id, request.agent_id, &content).await?,
        };

        let dataset_ids = match conversation.agent_id {
            Some(agent_id) => get_agent(&self.db, agent_id).await?.dataset_id_list(),
            None => Vec::new(),
        };
        let chunks = collect_chunks(
            &self.db,
            &dataset_ids,
            self.config.rag.max_context_segments,
        )
        .await?;
        let answer = rag.chat(&content, &chunks);

        let now = Utc::now();
        let txn = self.db.begin().await?;

        let user_message = message::ActiveModel {
            id: Set(Uuid::new_v4()),
            conversation_id: Set(conversation.id),
            role: Set(MessageRole::User),
            content: Set(content),
            sources: Set(None),
            timings: Set(None),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        // 助手消息晚于用户消息，保证按时间排序稳定
        let assistant_message = message::ActiveModel {
            id: Set(Uuid::new_v4()),
            conversation_id: Set(conversation.id),
            role: Set(MessageRole::Assistant),
            content: Set(answer.answer.clone()),
            sources: Set(Some(serde_json::to_value(&answer.sources)?)),
            timings: Set(Some(serde_json::to_value(answer.timings)?)),
            created_at: Set((now + Duration::milliseconds(1)).into()),
        }
        .insert(&txn)
        .await?;

        let conversation_id = conversation.id;
        Conversation::update_many()
            .col_expr(
                conversation::Column::MessageCount,
                Expr::col(conversation::Column::MessageCount).add(2),
            )
            .col_expr(
                conversation::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(now)),
            )
            .filter(conversation::Column::Id.eq(conversation_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(
            conversation_id = %conversation_id,
            sources = answer.sources.len(),
            "对话完成"
        );
        Ok(ChatOutcome {
            conversation_id,
            user_message_id: user_message.id,
            message_id: assistant_message.id,
            answer,
        })
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        params: PaginationParams,
    ) -> PlatformResult<PaginatedResponse<conversation::Model>> {
        let select = Conversation::find()
            .filter(conversation::Column::UserId.eq(user_id))
            .filter(conversation::Column::DeletedAt.is_null())
            .order_by_desc(conversation::Column::UpdatedAt);
        fetch_page(&self.db, select, params).await
    }

    /// 会话消息，按时间正序
    pub async fn messages(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        params: PaginationParams,
    ) -> PlatformResult<PaginatedResponse<message::Model>> {
        self.get_owned(user_id, conversation_id).await?;
        let select = Message::find()
            .filter(message::Column::ConversationId.eq(conversation_id))
            .order_by_asc(message::Column::CreatedAt)
            .order_by_asc(message::Column::Id);
        fetch_page(&self.db, select, params).await
    }

    #[instrument(skip(self, request))]
    pub async fn rename(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        request: RenameRequest,
    ) -> PlatformResult<conversation::Model> {
        let conversation = self.get_owned(user_id, conversation_id).await?;
        let mut active: conversation::ActiveModel = conversation.into();
        active.title = Set(request.title.trim().to_string());
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: Uuid, conversation_id: Uuid) -> PlatformResult<()> {
        let conversation = self.get_owned(user_id, conversation_id).await?;
        let now = Utc::now();
        let mut active: conversation::ActiveModel = conversation.into();
        active.deleted_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());
        active.update(&self.db).await?;

        info!(conversation_id = %conversation_id, "会话已删除");
        Ok(())
    }

    async fn start(
        &self,
        user_id: Uuid,
        agent_id: Option<Uuid>,
        content: &str,
    ) -> PlatformResult<conversation::Model> {
        if let Some(agent_id) = agent_id {
            let agent = get_agent(&self.db, agent_id).await?;
            if !agent.is_public && agent.created_by != user_id {
                return Err(PlatformError::not_found(format!("智能体 {}", agent_id)));
            }
        }

        let now = Utc::now();
        let conversation = conversation::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            agent_id: Set(agent_id),
            title: Set(title_from_content(content)),
            message_count: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            deleted_at: Set(None),
        }
        .insert(&self.db)
        .await?;

        info!(conversation_id = %conversation.id, "新会话已创建");
        Ok(conversation)
    }

    /// 只能访问自己的会话，其他用户的会话视为不存在
    async fn get_owned(&self, user_id: Uuid, id: Uuid) -> PlatformResult<conversation::Model> {
        Conversation::find_by_id(id)
            .filter(conversation::Column::UserId.eq(user_id))
            .filter(conversation::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or_else(|| PlatformError::not_found(format!("会话 {}", id)))
    }
}
