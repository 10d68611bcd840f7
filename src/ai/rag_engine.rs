// RAG (检索增强生成) 引擎

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

/// 固定回答
pub const DEFAULT_ANSWER: &str = "这是基于知识库内容生成的回答。";

/// 默认返回的来源数量
pub const DEFAULT_MAX_SOURCES: usize = 5;

/// 检索耗时（毫秒）
pub const RETRIEVAL_TIME_MS: u64 = 100;
/// 重排序耗时（毫秒）
pub const RERANK_TIME_MS: u64 = 50;
/// 生成耗时（毫秒）
pub const GENERATION_TIME_MS: u64 = 200;

/// 参与回答的文档分段
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentChunk {
    pub segment_id: Uuid,
    pub document_id: Uuid,
    pub dataset_id: Uuid,
    pub position: i32,
    pub content: String,
}

/// 各阶段耗时
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RagTimings {
    pub retrieval_ms: u64,
    pub rerank_ms: u64,
    pub generation_ms: u64,
    pub total_ms: u64,
}

impl Default for RagTimings {
    fn default() -> Self {
        Self {
            retrieval_ms: RETRIEVAL_TIME_MS,
            rerank_ms: RERANK_TIME_MS,
            generation_ms: GENERATION_TIME_MS,
            total_ms: RETRIEVAL_TIME_MS + RERANK_TIME_MS + GENERATION_TIME_MS,
        }
    }
}

/// RAG 回答
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<DocumentChunk>,
    pub timings: RagTimings,
}

/// RAG 引擎
///
/// 目前不做相似度检索、重排序或生成调用：回答固定，来源取输入的前
/// `DEFAULT_MAX_SOURCES` 个分段，耗时为固定值。
#[derive(Debug, Clone, Default)]
pub struct RagEngine;

impl RagEngine {
    /// 基于给定分段回答问题
    #[instrument(skip(self, query, chunks), fields(query_len = query.len(), chunks = chunks.len()))]
    pub fn chat(&self, query: &str, chunks: &[DocumentChunk]) -> RagAnswer {
        let sources: Vec<DocumentChunk> = chunks.iter().take(DEFAULT_MAX_SOURCES).cloned().collect();
        debug!("RAG 回答完成，引用 {} 个分段", sources.len());

        RagAnswer {
            answer: DEFAULT_ANSWER.to_string(),
            sources,
            timings: RagTimings::default(),
        }
    }
}
