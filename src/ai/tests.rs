// AI 模块测试

use crate::ai::*;
use actix_web::{web, App, HttpResponse, HttpServer};
use uuid::Uuid;

fn chunk(position: i32, content: &str) -> DocumentChunk {
    DocumentChunk {
        segment_id: Uuid::new_v4(),
        document_id: Uuid::new_v4(),
        dataset_id: Uuid::new_v4(),
        position,
        content: content.to_string(),
    }
}

#[test]
fn test_rag_engine_returns_fixed_answer() {
    let engine = RagEngine::default();

    let first = engine.chat("什么是 RAG？", &[]);
    let second = engine.chat("完全不同的问题", &[chunk(0, "内容")]);

    assert_eq!(first.answer, DEFAULT_ANSWER);
    assert_eq!(first.answer, second.answer);
    assert!(first.sources.is_empty());
}

#[test]
fn test_rag_engine_takes_first_five_sources() {
    let engine = RagEngine::default();
    let chunks: Vec<_> = (0..8).map(|i| chunk(i, &format!("分段 {}", i))).collect();

    let answer = engine.chat("问题", &chunks);
    assert_eq!(answer.sources.len(), 5);
    assert_eq!(answer.sources, chunks[..5].to_vec());

    let answer = engine.chat("问题", &chunks[..3]);
    assert_eq!(answer.sources.len(), 3);
}

#[test]
fn test_rag_engine_fixed_timings() {
    let answer = RagEngine::default().chat("问题", &[chunk(0, "a")]);
    assert_eq!(answer.timings.retrieval_ms, 100);
    assert_eq!(answer.timings.rerank_ms, 50);
    assert_eq!(answer.timings.generation_ms, 200);
    assert_eq!(answer.timings.total_ms, 350);

    let json = serde_json::to_value(&answer).unwrap();
    assert_eq!(json["timings"]["retrievalMs"], 100);
}

#[test]
fn test_chunker_merges_small_pieces() {
    let chunker = TextChunker::new(&ChunkerConfig {
        chunk_size: 20,
        chunk_overlap: 0,
        separator: "\n".to_string(),
    });

    let chunks = chunker.split("aaaa\nbbbb\ncccc\n\n\ndddddddddddddddd");
    assert_eq!(chunks, vec!["aaaa\nbbbb\ncccc", "dddddddddddddddd"]);
}

#[test]
fn test_chunker_keeps_overlap_tail() {
    let chunker = TextChunker::new(&ChunkerConfig {
        chunk_size: 10,
        chunk_overlap: 3,
        separator: "|".to_string(),
    });

    let chunks = chunker.split("abcdefgh|ijklmn");
    assert_eq!(chunks, vec!["abcdefgh", "fghijklmn"]);
}

#[test]
fn test_chunker_hard_splits_oversize_piece() {
    let chunker = TextChunker::new(&ChunkerConfig {
        chunk_size: 4,
        chunk_overlap: 1,
        separator: "\\n\\n".to_string(),
    });

    let chunks = chunker.split("一二三四五六七");
    assert_eq!(chunks, vec!["一二三四", "四五六七"]);
    assert!(chunks.iter().all(|c| c.chars().count() <= 4));
}

#[test]
fn test_chunker_unescapes_separator_and_ignores_blank_text() {
    let chunker = TextChunker::new(&ChunkerConfig {
        chunk_size: 5,
        chunk_overlap: 0,
        separator: "\\n".to_string(),
    });

    assert_eq!(chunker.separator(), "\n");
    assert!(chunker.split("  \n \r\n ").is_empty());
    assert_eq!(chunker.split("abc\r\ndef"), vec!["abc", "def"]);
}

#[test]
fn test_provider_kind_parsing() {
    assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
    assert_eq!("SiliconFlow".parse::<ProviderKind>().unwrap(), ProviderKind::SiliconFlow);

    let err = "unknown".parse::<ProviderKind>().unwrap_err();
    assert_eq!(err.code, AIErrorCode::InvalidConfig);

    for kind in ProviderKind::ALL {
        assert_eq!(kind.as_str().parse::<ProviderKind>().unwrap(), kind);
        let json = serde_json::to_value(kind).unwrap();
        assert_eq!(json, kind.as_str());
    }
}

#[test]
fn test_build_adapter_uses_default_base_url() {
    let config = AdapterConfig {
        base_url: None,
        api_key: Some("sk-test".to_string()),
        timeout_secs: 5,
    };

    let adapter = build_adapter(ProviderKind::Zhipu, &config).unwrap();
    assert_eq!(adapter.kind(), ProviderKind::Zhipu);
    assert_eq!(adapter.base_url(), "https://open.bigmodel.cn/api/paas/v4");

    let config = AdapterConfig {
        base_url: Some("http://127.0.0.1:9000/v1/".to_string()),
        ..config
    };
    let adapter = build_adapter(ProviderKind::Hunyuan, &config).unwrap();
    assert_eq!(adapter.base_url(), "http://127.0.0.1:9000/v1");
}

#[test]
fn test_build_adapter_rejects_invalid_config() {
    let missing_key = build_adapter(ProviderKind::OpenAi, &AdapterConfig::default());
    assert_eq!(missing_key.err().unwrap().code, AIErrorCode::InvalidConfig);

    let missing_url = build_adapter(ProviderKind::Custom, &AdapterConfig::default());
    assert_eq!(missing_url.err().unwrap().code, AIErrorCode::InvalidConfig);

    let bad_url = build_adapter(
        ProviderKind::Ollama,
        &AdapterConfig {
            base_url: Some("not a url".to_string()),
            ..Default::default()
        },
    );
    assert_eq!(bad_url.err().unwrap().code, AIErrorCode::InvalidConfig);

    // 本地部署无需密钥
    assert!(build_adapter(ProviderKind::Ollama, &AdapterConfig::default()).is_ok());
}

#[tokio::test]
async fn test_rerank_unsupported_provider() {
    let adapter = OpenAiCompatibleAdapter::ollama(&AdapterConfig::default()).unwrap();
    let err = adapter.rerank("m", "q", &["d".to_string()]).await.unwrap_err();
    assert_eq!(err.code, AIErrorCode::Unsupported);
}

async fn mock_chat() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "model": "mock-chat",
        "choices": [{"message": {"role": "assistant", "content": "你好"}, "finish_reason": "stop"}],
        "usage": {"total_tokens": 12}
    }))
}

async fn mock_embeddings() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "model": "mock-embed",
        "data": [{"embedding": [0.1, 0.2]}, {"embedding": [0.3, 0.4]}],
        "usage": {"total_tokens": 4}
    }))
}

#[actix_web::test]
async fn test_openai_compatible_adapter_round_trip() {
    let server = HttpServer::new(|| {
        App::new()
            .route("/v1/chat/completions", web::post().to(mock_chat))
            .route("/v1/embeddings", web::post().to(mock_embeddings))
            .route(
                "/v1/broken/chat/completions",
                web::post().to(|| async { HttpResponse::InternalServerError().finish() }),
            )
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());

    let config = AdapterConfig {
        base_url: Some(format!("http://{}/v1", addr)),
        api_key: Some("sk-test".to_string()),
        timeout_secs: 5,
    };
    let adapter = build_adapter(ProviderKind::Custom, &config).unwrap();

    let response = adapter
        .chat(&ChatRequest {
            model: "mock-chat".to_string(),
            messages: vec![ChatMessage::user("Hello")],
            max_tokens: Some(16),
            temperature: None,
        })
        .await
        .unwrap();
    assert_eq!(response.content, "你好");
    assert_eq!(response.tokens_used, 12);

    let embeddings = adapter
        .embed("mock-embed", &["a".to_string(), "b".to_string()])
        .await
        .unwrap();
    assert_eq!(embeddings.embeddings.len(), 2);
    assert_eq!(embeddings.embeddings[1], vec![0.3, 0.4]);

    let broken = build_adapter(
        ProviderKind::Custom,
        &AdapterConfig {
            base_url: Some(format!("http://{}/v1/broken", addr)),
            ..config
        },
    )
    .unwrap();
    let err = broken
        .chat(&ChatRequest {
            model: "mock-chat".to_string(),
            messages: vec![ChatMessage::user("Hello")],
            max_tokens: None,
            temperature: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, AIErrorCode::Response);
}
