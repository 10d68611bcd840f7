// 错误处理系统测试

use crate::ai::{AIError, AIErrorCode};
use crate::errors::{ErrorHandlerMiddleware, ErrorResponse, PlatformError};
use actix_web::{test as actix_test, web, App, HttpResponse, ResponseError};

#[test]
fn test_error_creation() {
    let error = PlatformError::validation("username", "用户名长度必须在 3 到 32 之间");
    assert_eq!(error.error_code(), "VALIDATION_ERROR");
    assert_eq!(error.status_code(), 400);
    assert!(error.is_client_error());
    assert!(!error.is_server_error());
    assert!(!error.should_log());
}

#[test]
fn test_business_and_conflict_errors() {
    let error = PlatformError::business("余额不足");
    assert_eq!(error.error_code(), "BUSINESS_ERROR");
    assert_eq!(error.status_code(), 400);
    assert_eq!(error.to_string(), "余额不足");

    let error = PlatformError::conflict("订单已支付");
    assert_eq!(error.status_code(), 409);
}

#[test]
fn test_server_errors_are_logged() {
    let error = PlatformError::database("连接失败");
    assert!(error.is_server_error());
    assert!(error.should_log());
}

#[test]
fn test_error_response_envelope() {
    let error = PlatformError::not_found("智能体");
    let response = ErrorResponse::from_error(&error);

    assert_eq!(response.code, 404);
    assert!(response.message.contains("智能体"));
    assert!(response.data.is_none());
    assert_eq!(response.error_code, "NOT_FOUND");

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["code"], 404);
    assert!(json["data"].is_null());
    assert!(json.get("timestamp").is_some());
    assert!(json.get("error_code").is_none());
}

#[test]
fn test_response_error_status() {
    let error = PlatformError::forbidden("console:user:delete");
    let response = error.error_response();
    assert_eq!(response.status().as_u16(), 403);
    assert_eq!(
        response.headers().get("X-Error-Code").unwrap(),
        "AUTHORIZATION_ERROR"
    );
}

#[test]
fn test_common_error_conversion() {
    let error: PlatformError = agentdock_common::CommonError::validation("测试验证错误").into();
    assert_eq!(error.error_code(), "VALIDATION_ERROR");

    let error: PlatformError = agentdock_common::CommonError::not_found("用户").into();
    assert_eq!(error.error_code(), "NOT_FOUND");
}

#[test]
fn test_db_error_conversion() {
    let error: PlatformError = sea_orm::DbErr::RecordNotFound("订单".to_string()).into();
    assert_eq!(error.error_code(), "NOT_FOUND");

    let error: PlatformError = sea_orm::DbErr::Custom("boom".to_string()).into();
    assert_eq!(error.error_code(), "DATABASE_ERROR");
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "文件未找到");
    let error: PlatformError = io_error.into();
    assert_eq!(error.error_code(), "NOT_FOUND");

    let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let error: PlatformError = io_error.into();
    assert!(error.is_server_error());
}

#[test]
fn test_json_and_id_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
    let error: PlatformError = json_error.into();
    assert_eq!(error.error_code(), "VALIDATION_ERROR");

    let uuid_error = uuid::Uuid::parse_str("not-a-uuid").unwrap_err();
    let error: PlatformError = uuid_error.into();
    assert_eq!(error.status_code(), 400);
}

#[test]
fn test_ai_error_conversion() {
    let error: PlatformError = AIError::new(AIErrorCode::Request, "连接失败").into();
    assert_eq!(error.status_code(), 502);

    let error: PlatformError = AIError::new(AIErrorCode::InvalidConfig, "缺少 API Key").into();
    assert_eq!(error.status_code(), 400);

    let error: PlatformError = AIError::new(AIErrorCode::Timeout, "超时").into();
    assert_eq!(error.error_code(), "TIMEOUT_ERROR");
}

#[actix_web::test]
async fn test_middleware_sets_request_id() {
    let app = actix_test::init_service(
        App::new()
            .wrap(ErrorHandlerMiddleware)
            .route("/ok", web::get().to(|| async { HttpResponse::Ok().finish() })),
    )
    .await;

    let req = actix_test::TestRequest::get()
        .uri("/ok")
        .insert_header(("X-Request-ID", "fixed-id"))
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "fixed-id");

    let req = actix_test::TestRequest::get().uri("/ok").to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert!(resp.headers().get("x-request-id").is_some());
}

#[actix_web::test]
async fn test_json_error_handler_returns_envelope() {
    #[derive(serde::Deserialize)]
    struct Body {
        #[allow(dead_code)]
        name: String,
    }

    let app = actix_test::init_service(
        App::new()
            .app_data(web::JsonConfig::default().error_handler(crate::errors::json_error_handler))
            .route(
                "/echo",
                web::post().to(|_body: web::Json<Body>| async { HttpResponse::Ok().finish() }),
            ),
    )
    .await;

    let req = actix_test::TestRequest::post()
        .uri("/echo")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"wrong\": 1}")
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    let body: serde_json::Value = actix_test::read_body_json(resp).await;
    assert_eq!(body["code"], 400);
    assert!(body["data"].is_null());
}
