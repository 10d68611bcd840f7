// AI 模块
// 模型提供商适配、文本分块与 RAG 引擎

pub mod error;
pub mod adapters;
pub mod chunker;
pub mod rag_engine;

#[cfg(test)]
mod tests;

pub use error::*;
pub use adapters::*;
pub use chunker::*;
pub use rag_engine::*;
