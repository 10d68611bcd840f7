// 知识库服务
// 知识库、文档导入与分段维护

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use agentdock_common::{PaginatedResponse, PaginationParams};

use crate::ai::{ChunkerConfig, DocumentChunk, RagAnswer, RagEngine, TextChunker, DEFAULT_SEPARATOR};
use crate::api::extractors::{rules, Validate};
use crate::config::AppConfig;
use crate::db::entities::{
    dataset, document,
    document::{DocumentSource, DocumentStatus},
    prelude::*,
    segment,
};
use crate::errors::{PlatformError, PlatformResult};
use crate::services::fetch_page;
use crate::services::upload::resolve_stored_path;

/// 分段长度上限（字符）
const MAX_CHUNK_SIZE: i32 = 8000;

/// 知识库列表筛选
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetQuery {
    pub keyword: Option<String>,
}

/// 创建或更新知识库，未提供的分段参数使用默认值
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRequest {
    pub name: String,
    pub description: Option<String>,
    pub embedding_model_id: Option<Uuid>,
    pub chunk_size: Option<i32>,
    pub chunk_overlap: Option<i32>,
    pub separator: Option<String>,
}

impl Validate for DatasetRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::length("name", &self.name, 1, 64)?;
        rules::max_length("description", self.description.as_deref(), 500)?;
        if let Some(size) = self.chunk_size {
            rules::range("chunkSize", size, 1, MAX_CHUNK_SIZE)?;
        }
        if let Some(overlap) = self.chunk_overlap {
            rules::range("chunkOverlap", overlap, 0, MAX_CHUNK_SIZE - 1)?;
            if let Some(size) = self.chunk_size {
                if overlap >= size {
                    return Err(PlatformError::validation(
                        "chunkOverlap",
                        "重叠长度必须小于分段长度",
                    ));
                }
            }
        }
        rules::max_length("separator", self.separator.as_deref(), 16)?;
        Ok(())
    }
}

/// 导入文档：`content` 与 `fileId` 二选一
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    pub name: Option<String>,
    pub content: Option<String>,
    pub file_id: Option<Uuid>,
}

impl Validate for CreateDocumentRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::max_length("name", self.name.as_deref(), 255)?;
        match (&self.content, &self.file_id) {
            (Some(content), None) => rules::not_blank("content", content),
            (None, Some(_)) => Ok(()),
            _ => Err(PlatformError::validation(
                "content",
                "必须且只能提供文本内容或文件之一",
            )),
        }
    }
}

/// 修改分段内容
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSegmentRequest {
    pub content: String,
}

impl Validate for UpdateSegmentRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::length("content", &self.content, 1, MAX_CHUNK_SIZE as usize)
    }
}

/// 召回测试
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalTestRequest {
    pub query: String,
}

impl Validate for RetrievalTestRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::length("query", &self.query, 1, 2000)
    }
}

/// 启用状态切换
#[derive(Debug, Clone, Deserialize)]
pub struct EnabledRequest {
    pub enabled: bool,
}

impl Validate for EnabledRequest {
    fn validate(&self) -> PlatformResult<()> {
        Ok(())
    }
}

/// 知识库服务
pub struct DatasetService {
    db: DatabaseConnection,
    config: Arc<AppConfig>,
}

impl DatasetService {
    pub fn new(db: DatabaseConnection, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    pub async fn list(
        &self,
        query: DatasetQuery,
        params: PaginationParams,
    ) -> PlatformResult<PaginatedResponse<dataset::Model>> {
        let mut select = Dataset::find().filter(dataset::Column::DeletedAt.is_null());
        if let Some(keyword) = query.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            select = select.filter(dataset::Column::Name.contains(keyword));
        }
        fetch_page(&self.db, select.order_by_desc(dataset::Column::CreatedAt), params).await
    }

    pub async fn detail(&self, id: Uuid) -> PlatformResult<dataset::Model> {
        get_dataset(&self.db, id).await
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(
        &self,
        creator: Uuid,
        request: DatasetRequest,
    ) -> PlatformResult<dataset::Model> {
        let name = request.name.trim().to_string();
        self.ensure_name_available(creator, &name, None).await?;

        let (chunk_size, chunk_overlap) = self.chunk_settings(&request, None)?;
        let now = Utc::now();
        let dataset = dataset::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(request.description),
            embedding_model_id: Set(request.embedding_model_id),
            chunk_size: Set(chunk_size),
            chunk_overlap: Set(chunk_overlap),
            separator: Set(request
                .separator
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string())),
            document_count: Set(0),
            segment_count: Set(0),
            created_by: Set(creator),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            deleted_at: Set(None),
        }
        .insert(&self.db)
        .await?;

        info!(dataset_id = %dataset.id, "知识库已创建");
        Ok(dataset)
    }

    /// 修改分段参数只影响之后导入的文档
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: Uuid, request: DatasetRequest) -> PlatformResult<dataset::Model> {
        let dataset = get_dataset(&self.db, id).await?;
        let name = request.name.trim().to_string();
        self.ensure_name_available(dataset.created_by, &name, Some(id))
            .await?;
        let (chunk_size, chunk_overlap) = self.chunk_settings(&request, Some(&dataset))?;

        let mut active: dataset::ActiveModel = dataset.into();
        active.name = Set(name);
        active.description = Set(request.description);
        active.embedding_model_id = Set(request.embedding_model_id);
        active.chunk_size = Set(chunk_size);
        active.chunk_overlap = Set(chunk_overlap);
        if let Some(separator) = request.separator.filter(|s| !s.is_empty()) {
            active.separator = Set(separator);
        }
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// 软删除知识库和文档，分段直接删除
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> PlatformResult<()> {
        let dataset = get_dataset(&self.db, id).await?;
        let now = Utc::now();

        let txn = self.db.begin().await?;
        Segment::delete_many()
            .filter(segment::Column::DatasetId.eq(id))
            .exec(&txn)
            .await?;
        for doc in Document::find()
            .filter(document::Column::DatasetId.eq(id))
            .filter(document::Column::DeletedAt.is_null())
            .all(&txn)
            .await?
        {
            let mut active: document::ActiveModel = doc.into();
            active.deleted_at = Set(Some(now.into()));
            active.update(&txn).await?;
        }

        let mut active: dataset::ActiveModel = dataset.into();
        active.deleted_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());
        active.update(&txn).await?;
        txn.commit().await?;

        info!(dataset_id = %id, "知识库已删除");
        Ok(())
    }

    pub async fn list_documents(
        &self,
        dataset_id: Uuid,
        params: PaginationParams,
    ) -> PlatformResult<PaginatedResponse<document::Model>> {
        get_dataset(&self.db, dataset_id).await?;
        let select = Document::find()
            .filter(document::Column::DatasetId.eq(dataset_id))
            .filter(document::Column::DeletedAt.is_null())
            .order_by_desc(document::Column::CreatedAt);
        fetch_page(&self.db, select, params).await
    }

    /// 导入文档
    ///
    /// 按知识库的分段参数切分内容，在同一事务内写入文档、全部分段并更新计数。
    #[instrument(skip(self, request))]
    pub async fn create_document(
        &self,
        dataset_id: Uuid,
        request: CreateDocumentRequest,
    ) -> PlatformResult<document::Model> {
        let dataset = get_dataset(&self.db, dataset_id).await?;

        let (source, file_id, default_name, content) = match (request.content, request.file_id) {
            (Some(content), _) => (DocumentSource::Text, None, "文本导入".to_string(), content),
            (None, Some(file_id)) => {
                let (name, content) = self.read_text_file(file_id).await?;
                (DocumentSource::File, Some(file_id), name, content)
            }
            (None, None) => {
                return Err(PlatformError::validation("content", "缺少文档内容"));
            }
        };

        let chunker = TextChunker::new(&ChunkerConfig {
            chunk_size: dataset.chunk_size.max(1) as usize,
            chunk_overlap: dataset.chunk_overlap.max(0) as usize,
            separator: dataset.separator.clone(),
        });
        let pieces = chunker.split(&content);
        if pieces.is_empty() {
            return Err(PlatformError::business("文档内容为空，无法切分"));
        }

        let now = Utc::now();
        let txn = self.db.begin().await?;

        let doc = document::ActiveModel {
            id: Set(Uuid::new_v4()),
            dataset_id: Set(dataset_id),
            name: Set(request
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(default_name)),
            source: Set(source),
            file_id: Set(file_id),
            char_count: Set(content.chars().count() as i32),
            status: Set(DocumentStatus::Completed),
            error_message: Set(None),
            segment_count: Set(pieces.len() as i32),
            enabled: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let segments: Vec<segment::ActiveModel> = pieces
            .into_iter()
            .enumerate()
            .map(|(position, content)| segment::ActiveModel {
                id: Set(Uuid::new_v4()),
                dataset_id: Set(dataset_id),
                document_id: Set(doc.id),
                position: Set(position as i32),
                char_count: Set(content.chars().count() as i32),
                content: Set(content),
                enabled: Set(true),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            })
            .collect();
        Segment::insert_many(segments).exec(&txn).await?;

        refresh_counters(&txn, dataset_id).await?;
        txn.commit().await?;

        info!(
            dataset_id = %dataset_id,
            document_id = %doc.id,
            segments = doc.segment_count,
            "文档导入完成"
        );
        Ok(doc)
    }

    #[instrument(skip(self))]
    pub async fn set_document_enabled(
        &self,
        dataset_id: Uuid,
        document_id: Uuid,
        enabled: bool,
    ) -> PlatformResult<document::Model> {
        let doc = self.get_document(dataset_id, document_id).await?;
        let mut active: document::ActiveModel = doc.into();
        active.enabled = Set(enabled);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_document(&self, dataset_id: Uuid, document_id: Uuid) -> PlatformResult<()> {
        let doc = self.get_document(dataset_id, document_id).await?;
        let now = Utc::now();

        let txn = self.db.begin().await?;
        Segment::delete_many()
            .filter(segment::Column::DocumentId.eq(document_id))
            .exec(&txn)
            .await?;
        let mut active: document::ActiveModel = doc.into();
        active.deleted_at = Set(Some(now.into()));
        active.segment_count = Set(0);
        active.updated_at = Set(now.into());
        active.update(&txn).await?;
        refresh_counters(&txn, dataset_id).await?;
        txn.commit().await?;

        info!(document_id = %document_id, "文档已删除");
        Ok(())
    }

    pub async fn list_segments(
        &self,
        dataset_id: Uuid,
        document_id: Uuid,
        params: PaginationParams,
    ) -> PlatformResult<PaginatedResponse<segment::Model>> {
        self.get_document(dataset_id, document_id).await?;
        let select = Segment::find()
            .filter(segment::Column::DocumentId.eq(document_id))
            .order_by_asc(segment::Column::Position);
        fetch_page(&self.db, select, params).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_segment(
        &self,
        dataset_id: Uuid,
        segment_id: Uuid,
        request: UpdateSegmentRequest,
    ) -> PlatformResult<segment::Model> {
        let segment = self.get_segment(dataset_id, segment_id).await?;
        let content = request.content.trim().to_string();

        let mut active: segment::ActiveModel = segment.into();
        active.char_count = Set(content.chars().count() as i32);
        active.content = Set(content);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn set_segment_enabled(
        &self,
        dataset_id: Uuid,
        segment_id: Uuid,
        enabled: bool,
    ) -> PlatformResult<segment::Model> {
        let segment = self.get_segment(dataset_id, segment_id).await?;
        let mut active: segment::ActiveModel = segment.into();
        active.enabled = Set(enabled);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_segment(&self, dataset_id: Uuid, segment_id: Uuid) -> PlatformResult<()> {
        let segment = self.get_segment(dataset_id, segment_id).await?;
        let document_id = segment.document_id;

        let txn = self.db.begin().await?;
        Segment::delete_by_id(segment_id).exec(&txn).await?;

        let remaining = Segment::find()
            .filter(segment::Column::DocumentId.eq(document_id))
            .count(&txn)
            .await?;
        if let Some(doc) = Document::find_by_id(document_id).one(&txn).await? {
            let mut active: document::ActiveModel = doc.into();
            active.segment_count = Set(remaining as i32);
            active.updated_at = Set(Utc::now().into());
            active.update(&txn).await?;
        }
        refresh_counters(&txn, dataset_id).await?;
        txn.commit().await?;
        Ok(())
    }

    /// 对知识库启用的分段执行一次问答
    #[instrument(skip(self, rag, request))]
    pub async fn retrieval_test(
        &self,
        rag: &RagEngine,
        dataset_id: Uuid,
        request: RetrievalTestRequest,
    ) -> PlatformResult<RagAnswer> {
        get_dataset(&self.db, dataset_id).await?;
        let chunks =
            collect_chunks(&self.db, &[dataset_id], self.config.rag.max_context_segments).await?;
        Ok(rag.chat(&request.query, &chunks))
    }

    fn chunk_settings(
        &self,
        request: &DatasetRequest,
        current: Option<&dataset::Model>,
    ) -> PlatformResult<(i32, i32)> {
        let chunk_size = request
            .chunk_size
            .or(current.map(|d| d.chunk_size))
            .unwrap_or(self.config.rag.chunk_size as i32);
        let chunk_overlap = request
            .chunk_overlap
            .or(current.map(|d| d.chunk_overlap))
            .unwrap_or(self.config.rag.chunk_overlap as i32);

        if chunk_overlap >= chunk_size {
            return Err(PlatformError::validation(
                "chunkOverlap",
                "重叠长度必须小于分段长度",
            ));
        }
        Ok((chunk_size, chunk_overlap))
    }

    async fn ensure_name_available(
        &self,
        creator: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> PlatformResult<()> {
        let mut query = Dataset::find()
            .filter(dataset::Column::CreatedBy.eq(creator))
            .filter(dataset::Column::Name.eq(name))
            .filter(dataset::Column::DeletedAt.is_null());
        if let Some(id) = exclude {
            query = query.filter(dataset::Column::Id.ne(id));
        }
        if query.count(&self.db).await? > 0 {
            return Err(PlatformError::conflict(format!("知识库 {} 已存在", name)));
        }
        Ok(())
    }

    async fn read_text_file(&self, file_id: Uuid) -> PlatformResult<(String, String)> {
        let file = File::find_by_id(file_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| PlatformError::not_found(format!("文件 {}", file_id)))?;

        let path = resolve_stored_path(&self.config.storage, &file.storage_path)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            PlatformError::file_processing_with_name(
                format!("读取文件失败: {}", e),
                file.original_name.clone(),
            )
        })?;
        let content = String::from_utf8(bytes).map_err(|_| {
            PlatformError::file_processing_with_name(
                "仅支持 UTF-8 编码的文本文件",
                file.original_name.clone(),
            )
        })?;
        Ok((file.original_name, content))
    }

    async fn get_document(
        &self,
        dataset_id: Uuid,
        document_id: Uuid,
    ) -> PlatformResult<document::Model> {
        Document::find_by_id(document_id)
            .filter(document::Column::DatasetId.eq(dataset_id))
            .filter(document::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or_else(|| PlatformError::not_found(format!("文档 {}", document_id)))
    }

    async fn get_segment(&self, dataset_id: Uuid, segment_id: Uuid) -> PlatformResult<segment::Model> {
        Segment::find_by_id(segment_id)
            .filter(segment::Column::DatasetId.eq(dataset_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| PlatformError::not_found(format!("分段 {}", segment_id)))
    }
}

async fn get_dataset<C: ConnectionTrait>(db: &C, id: Uuid) -> PlatformResult<dataset::Model> {
    Dataset::find_by_id(id)
        .filter(dataset::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| PlatformError::not_found(format!("知识库 {}", id)))
}

/// 重新统计知识库的文档数和分段数
async fn refresh_counters<C: ConnectionTrait>(db: &C, dataset_id: Uuid) -> PlatformResult<()> {
    let document_count = Document::find()
        .filter(document::Column::DatasetId.eq(dataset_id))
        .filter(document::Column::DeletedAt.is_null())
        .count(db)
        .await?;
    let segment_count = Segment::find()
        .filter(segment::Column::DatasetId.eq(dataset_id))
        .count(db)
        .await?;

    let dataset = get_dataset(db, dataset_id).await?;
    let mut active: dataset::ActiveModel = dataset.into();
    active.document_count = Set(document_count as i32);
    active.segment_count = Set(segment_count as i32);
    active.updated_at = Set(Utc::now().into());
    active.update(db).await?;
    Ok(())
}

/// 收集知识库中可参与问答的分段，按位置排序
///
/// 文档和分段都必须处于启用状态，最多返回 `limit` 条。
pub async fn collect_chunks<C: ConnectionTrait>(
    db: &C,
    dataset_ids: &[Uuid],
    limit: u64,
) -> PlatformResult<Vec<DocumentChunk>> {
    if dataset_ids.is_empty() {
        return Ok(Vec::new());
    }

    let live_datasets: Vec<Uuid> = Dataset::find()
        .select_only()
        .column(dataset::Column::Id)
        .filter(dataset::Column::Id.is_in(dataset_ids.iter().copied()))
        .filter(dataset::Column::DeletedAt.is_null())
        .into_tuple::<Uuid>()
        .all(db)
        .await?;
    if live_datasets.is_empty() {
        return Ok(Vec::new());
    }

    let document_ids: Vec<Uuid> = Document::find()
        .select_only()
        .column(document::Column::Id)
        .filter(document::Column::DatasetId.is_in(live_datasets))
        .filter(document::Column::Enabled.eq(true))
        .filter(document::Column::Status.eq(DocumentStatus::Completed))
        .filter(document::Column::DeletedAt.is_null())
        .into_tuple::<Uuid>()
        .all(db)
        .await?;
    if document_ids.is_empty() {
        return Ok(Vec::new());
    }

    let segments = Segment::find()
        .filter(segment::Column::DocumentId.is_in(document_ids))
        .filter(segment::Column::Enabled.eq(true))
        .order_by_asc(segment::Column::Position)
        .order_by_asc(segment::Column::CreatedAt)
        .order_by_asc(segment::Column::Id)
        .limit(limit)
        .all(db)
        .await?;

    Ok(segments
        .into_iter()
        .map(|s| DocumentChunk {
            segment_id: s.id,
            document_id: s.document_id,
            dataset_id: s.dataset_id,
            position: s.position,
            content: s.content,
        })
        .collect())
}
