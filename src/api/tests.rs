// HTTP 层测试
// 使用内存数据库搭建完整应用，覆盖认证、信封格式、SSE 和上传

use actix_web::body::{BodySize, MessageBody};
use actix_web::{http::header, test, web, App};
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;

use crate::ai::{DocumentChunk, DEFAULT_MAX_SOURCES};
use crate::api::{configure_routes, AppState, CONSOLE_PERMISSIONS};
use crate::config::AppConfig;
use crate::db::testing::{memory_db, test_config};
use crate::db::SeedData;
use crate::errors::ErrorHandlerMiddleware;
use crate::services::PermissionService;

/// 完成权限同步和初始数据写入的应用状态
async fn app_state(config: AppConfig) -> AppState {
    let db = memory_db().await;
    PermissionService::new(db.clone())
        .sync(CONSOLE_PERMISSIONS)
        .await
        .unwrap();
    SeedData::run(&db, &config).await.unwrap();
    AppState::new(db, config)
}

macro_rules! init_app {
    ($state:expr) => {{
        let state = $state;
        let server = state.config.server.clone();
        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(ErrorHandlerMiddleware)
                .configure(move |cfg| configure_routes(cfg, &server)),
        )
        .await
    }};
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// 注册普通用户并返回令牌
macro_rules! register {
    ($app:expr, $username:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({"username": $username, "password": "secret123"}))
            .to_request();
        let body: Value = test::call_and_read_body_json($app, req).await;
        assert_eq!(body["code"], 200, "{}", body);
        body["data"]["token"].as_str().unwrap().to_string()
    }};
}

#[actix_web::test]
async fn test_health_and_index() {
    let app = init_app!(app_state(test_config()).await);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert!(resp.status().is_success());
    assert!(resp.headers().contains_key("x-request-id"));
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 200);
    assert_eq!(body["data"]["status"], "healthy");

    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(body["name"], "AgentDock");
    assert_eq!(body["consoleApi"], "/consoleapi");
}

#[actix_web::test]
async fn test_register_then_fetch_profile() {
    let app = init_app!(app_state(test_config()).await);
    let token = register!(&app, "alice");

    let req = test::TestRequest::get()
        .uri("/api/user/info")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["isRoot"], false);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/user/info").to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 401);

    let req = test::TestRequest::get()
        .uri("/api/user/info")
        .insert_header(bearer("not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 401);
    assert!(body["data"].is_null());
}

#[actix_web::test]
async fn test_validation_errors_use_envelope() {
    let app = init_app!(app_state(test_config()).await);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({"username": "ab", "password": "secret123"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 400);
    assert!(body["timestamp"].is_string());

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 400);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"username": "nobody", "password": "whatever"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);
}

#[actix_web::test]
async fn test_console_access_control() {
    let app = init_app!(app_state(test_config()).await);

    let req = test::TestRequest::post()
        .uri("/consoleapi/auth/login")
        .set_json(json!({"username": "admin", "password": "admin123456"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["code"], 200, "{}", body);
    let root_token = body["data"]["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/consoleapi/users?page=1&pageSize=10")
        .insert_header(bearer(&root_token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["code"], 200, "{}", body);
    assert_eq!(body["data"]["total"], 1);

    // 普通用户无法登录控制台，Web 端令牌也无权调用控制台接口
    let web_token = register!(&app, "bob");
    let req = test::TestRequest::post()
        .uri("/consoleapi/auth/login")
        .set_json(json!({"username": "bob", "password": "secret123"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 403);

    let req = test::TestRequest::get()
        .uri("/consoleapi/users")
        .insert_header(bearer(&web_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 403);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 403);

    let req = test::TestRequest::get()
        .uri("/consoleapi/menus/user")
        .insert_header(bearer(&web_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn test_site_config_is_public() {
    let app = init_app!(app_state(test_config()).await);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/config/website").to_request(),
    )
    .await;
    assert_eq!(body["data"]["name"], "AgentDock");

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/config/missing").to_request(),
    )
    .await;
    assert_eq!(body["data"], json!({}));

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/decorate/home").to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 404);
}

#[actix_web::test]
async fn test_chat_json_and_stream() {
    let app = init_app!(app_state(test_config()).await);
    let token = register!(&app, "carol");

    let req = test::TestRequest::post()
        .uri("/api/conversations/chat")
        .insert_header(bearer(&token))
        .set_json(json!({"content": "你好"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["code"], 200, "{}", body);
    let conversation_id = body["data"]["conversationId"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/conversations/chat")
        .insert_header(bearer(&token))
        .set_json(json!({
            "conversationId": conversation_id,
            "content": "请介绍一下这个平台",
            "stream": true
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/event-stream"), "{}", content_type);

    let bytes = tokio::time::timeout(Duration::from_secs(5), test::read_body(resp))
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("event: start"));
    assert!(text.contains("event: chunk"));
    assert!(text.contains("event: done"));
    assert!(text.contains(&conversation_id));

    let req = test::TestRequest::get()
        .uri(&format!("/api/conversations/{}/messages", conversation_id))
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total"], 4, "{}", body);
}

#[actix_web::test]
async fn test_upload_then_serve() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.storage.path = dir.path().to_string_lossy().to_string();
    let app = init_app!(app_state(config).await);
    let token = register!(&app, "dave");

    let boundary = "agentdock-boundary";
    let payload = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nignored\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"hello.txt\"\r\n\
         Content-Type: text/plain\r\n\r\nhello agentdock\r\n--{b}--\r\n",
        b = boundary
    );
    let req = test::TestRequest::post()
        .uri("/api/upload/file")
        .insert_header(bearer(&token))
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        ))
        .set_payload(payload)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["code"], 200, "{}", body);
    assert_eq!(body["data"]["originalName"], "hello.txt");
    assert!(body["data"].get("storagePath").is_none());
    let url = body["data"]["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/"));

    let resp = test::call_service(&app, test::TestRequest::get().uri(&url).to_request()).await;
    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain; charset=utf-8"
    );
    assert_eq!(resp.response().body().size(), BodySize::Sized(15));
    assert_eq!(test::read_body(resp).await, "hello agentdock");

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/uploads/../secret.txt").to_request(),
    )
    .await;
    assert!(resp.status().is_client_error());
}

#[actix_web::test]
async fn test_openapi_document() {
    let app = init_app!(app_state(test_config()).await);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api-docs/openapi.json").to_request(),
    )
    .await;
    assert!(body["paths"]["/api/conversations/chat"].is_object());
    assert!(body["paths"]["/consoleapi/auth/login"].is_object());
    assert!(body["components"]["securitySchemes"]["bearer_auth"].is_object());
}

#[actix_web::test]
async fn test_app_state_rag_returns_five_sources() {
    let state = app_state(test_config()).await;
    let chunks: Vec<DocumentChunk> = (0..8)
        .map(|position| DocumentChunk {
            segment_id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            dataset_id: Uuid::new_v4(),
            position,
            content: format!("分段 {}", position),
        })
        .collect();

    let answer = state.rag.chat("问题", &chunks);
    assert_eq!(answer.sources.len(), DEFAULT_MAX_SOURCES);
    assert_eq!(answer.sources, chunks[..DEFAULT_MAX_SOURCES].to_vec());
}
