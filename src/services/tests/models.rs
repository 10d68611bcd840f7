// 模型提供商与模型管理测试

use actix_web::{web, App, HttpResponse, HttpServer};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::entities::ai_model::ModelType;
use crate::db::testing::{memory_db, test_config};
use crate::errors::PlatformError;
use crate::services::ai_provider::{mask_api_key, ModelQuery, ModelRequest, ProviderRequest};
use crate::services::AiProviderService;

fn service(db: DatabaseConnection) -> AiProviderService {
    AiProviderService::new(db, Arc::new(test_config()))
}

fn provider_request(provider: &str, api_key: Option<&str>) -> ProviderRequest {
    ProviderRequest {
        provider: provider.to_string(),
        name: format!("{} 测试", provider),
        base_url: None,
        api_key: api_key.map(str::to_string),
        is_active: true,
        sort: 0,
    }
}

fn model_request(provider_id: Uuid, model: &str, model_type: ModelType, is_default: bool) -> ModelRequest {
    ModelRequest {
        provider_id,
        name: model.to_uppercase(),
        model: model.to_string(),
        model_type,
        max_context: 8192,
        is_active: true,
        is_default,
        sort: 0,
    }
}

#[test]
fn test_mask_api_key() {
    assert_eq!(mask_api_key("sk-1234567890abcd"), "sk-1****abcd");
    assert_eq!(mask_api_key("short"), "****");
    assert_eq!(mask_api_key("12345678"), "****");
    assert_eq!(mask_api_key("123456789"), "1234****6789");
}

#[tokio::test]
async fn test_provider_listing_masks_key() {
    let service = service(memory_db().await);

    let view = service
        .create_provider(provider_request("openai", Some("sk-abcdefghijklmnop")))
        .await
        .unwrap();
    assert_eq!(view.api_key.as_deref(), Some("sk-a****mnop"));
    assert_eq!(view.effective_base_url.as_deref(), Some("https://api.openai.com/v1"));

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["apiKey"], "sk-a****mnop");
    assert!(!json.to_string().contains("sk-abcdefghijklmnop"));

    let listed = service.list_providers().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].api_key.as_deref(), Some("sk-a****mnop"));
}

#[tokio::test]
async fn test_provider_update_keeps_key_when_absent() {
    let service = service(memory_db().await);
    let created = service
        .create_provider(provider_request("zhipu", Some("zhipu-secret-key")))
        .await
        .unwrap();
    let id = created.provider.id;

    let updated = service
        .update_provider(id, provider_request("zhipu", None))
        .await
        .unwrap();
    assert_eq!(updated.provider.api_key.as_deref(), Some("zhipu-secret-key"));

    let cleared = service
        .update_provider(id, provider_request("zhipu", Some("")))
        .await
        .unwrap();
    assert_eq!(cleared.provider.api_key, None);

    let toggled = service.toggle_provider(id).await.unwrap();
    assert!(!toggled.provider.is_active);
    assert!(service.toggle_provider(id).await.unwrap().provider.is_active);
}

#[tokio::test]
async fn test_unknown_provider_kind_rejected() {
    let service = service(memory_db().await);
    let err = service
        .create_provider(provider_request("unknown-vendor", None))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Validation { .. }));
}

#[tokio::test]
async fn test_default_model_is_exclusive_per_type() {
    let service = service(memory_db().await);
    let provider = service
        .create_provider(provider_request("openai", Some("sk-abcdefghijklmnop")))
        .await
        .unwrap()
        .provider;

    let first = service
        .create_model(model_request(provider.id, "gpt-4o", ModelType::Chat, true))
        .await
        .unwrap();
    let embedding = service
        .create_model(model_request(provider.id, "text-embedding-3", ModelType::Embedding, true))
        .await
        .unwrap();
    let second = service
        .create_model(model_request(provider.id, "gpt-4o-mini", ModelType::Chat, true))
        .await
        .unwrap();

    let chat_models = service
        .list_models(ModelQuery {
            provider_id: None,
            model_type: Some(ModelType::Chat),
        })
        .await
        .unwrap();
    let defaults: Vec<_> = chat_models.iter().filter(|m| m.is_default).map(|m| m.id).collect();
    assert_eq!(defaults, vec![second.id]);

    // 其他类型的默认模型不受影响
    let embeddings = service
        .list_models(ModelQuery {
            provider_id: Some(provider.id),
            model_type: Some(ModelType::Embedding),
        })
        .await
        .unwrap();
    assert_eq!(embeddings[0].id, embedding.id);
    assert!(embeddings[0].is_default);

    service
        .update_model(first.id, model_request(provider.id, "gpt-4o", ModelType::Chat, true))
        .await
        .unwrap();
    let options = service.web_chat_models().await.unwrap();
    assert_eq!(options.len(), 2);
    assert_eq!(options[0].id, first.id);
    assert!(options[0].is_default);
    assert!(!options[1].is_default);
}

#[tokio::test]
async fn test_web_chat_models_hide_inactive_and_deleted() {
    let service = service(memory_db().await);
    let active = service
        .create_provider(provider_request("openai", Some("sk-abcdefghijklmnop")))
        .await
        .unwrap()
        .provider;
    let inactive = service
        .create_provider(provider_request("xai", Some("xai-abcdefghijklmnop")))
        .await
        .unwrap()
        .provider;
    service.toggle_provider(inactive.id).await.unwrap();

    let kept = service
        .create_model(model_request(active.id, "gpt-4o", ModelType::Chat, false))
        .await
        .unwrap();
    let removed = service
        .create_model(model_request(active.id, "gpt-3.5", ModelType::Chat, false))
        .await
        .unwrap();
    service
        .create_model(model_request(inactive.id, "grok", ModelType::Chat, false))
        .await
        .unwrap();
    service
        .create_model(model_request(active.id, "embed", ModelType::Embedding, false))
        .await
        .unwrap();
    service.delete_model(removed.id).await.unwrap();

    let options = service.web_chat_models().await.unwrap();
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].id, kept.id);
    assert_eq!(options[0].provider_name, active.name);

    service.delete_provider(active.id).await.unwrap();
    assert!(service.web_chat_models().await.unwrap().is_empty());
    assert!(service
        .list_models(ModelQuery {
            provider_id: Some(active.id),
            model_type: None,
        })
        .await
        .unwrap()
        .is_empty());
}

async fn mock_chat() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "model": "mock-chat",
        "choices": [{"message": {"role": "assistant", "content": "pong"}, "finish_reason": "stop"}],
        "usage": {"total_tokens": 3}
    }))
}

#[actix_web::test]
async fn test_model_test_calls_provider() {
    let server = HttpServer::new(|| {
        App::new()
            .route("/v1/chat/completions", web::post().to(mock_chat))
            .route(
                "/v1/embeddings",
                web::post().to(|| async { HttpResponse::BadGateway().finish() }),
            )
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());

    let config: Arc<AppConfig> = Arc::new(test_config());
    let service = AiProviderService::new(memory_db().await, config);
    let provider = service
        .create_provider(ProviderRequest {
            base_url: Some(format!("http://{}/v1", addr)),
            ..provider_request("custom", Some("sk-local-test-key"))
        })
        .await
        .unwrap()
        .provider;

    let chat = service
        .create_model(model_request(provider.id, "mock-chat", ModelType::Chat, false))
        .await
        .unwrap();
    let result = service.test_model(chat.id).await.unwrap();
    assert_eq!(result.model, "mock-chat");
    assert_eq!(result.output, "pong");

    let embed = service
        .create_model(model_request(provider.id, "mock-embed", ModelType::Embedding, false))
        .await
        .unwrap();
    let err = service.test_model(embed.id).await.unwrap_err();
    assert!(matches!(err, PlatformError::AiService { .. }));
}
