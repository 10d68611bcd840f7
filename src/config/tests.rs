// 配置系统测试

use crate::config::*;

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.console_prefix, "/consoleapi");
    assert_eq!(config.server.web_prefix, "/api");
    assert_eq!(config.database.max_connections, 10);
    assert_eq!(config.rag.max_context_segments, 50);
}

#[test]
fn test_default_config_is_valid() {
    let config = AppConfig::default();
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_config_validation() {
    let mut config = AppConfig::default();

    config.server.port = 0;
    assert!(config.validate().is_err());

    config.server.port = 4090;
    config.database.max_connections = 0;
    assert!(config.validate().is_err());

    config.database.max_connections = 10;
    config.ai.temperature = 3.0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_all_collects_every_error() {
    let mut config = AppConfig::default();
    config.server.port = 0;
    config.security.jwt_secret = "short".to_string();
    config.rag.max_context_segments = 0;

    let errors = ConfigValidator::validate_all(&config).unwrap_err();
    assert_eq!(errors.len(), 3);
}

#[test]
fn test_environment_methods() {
    let mut config = AppConfig::default();

    config.environment.name = "development".to_string();
    assert!(config.is_development());
    assert!(!config.is_production());

    config.environment.name = "production".to_string();
    assert!(config.is_production());
    assert!(!config.is_development());
}

#[test]
fn test_config_validator_server_prefixes() {
    let mut server_config = AppConfig::default().server;
    assert!(ConfigValidator::validate_server(&server_config).is_ok());

    server_config.console_prefix = "consoleapi".to_string();
    assert!(ConfigValidator::validate_server(&server_config).is_err());

    server_config.console_prefix = "/api".to_string();
    assert!(ConfigValidator::validate_server(&server_config).is_err());

    server_config.console_prefix = "/consoleapi/".to_string();
    assert!(ConfigValidator::validate_server(&server_config).is_err());
}

#[test]
fn test_config_validator_database() {
    let mut db_config = AppConfig::default().database;
    assert!(ConfigValidator::validate_database(&db_config).is_ok());

    db_config.url = "invalid-url".to_string();
    assert!(ConfigValidator::validate_database(&db_config).is_err());

    db_config.url = "postgresql://localhost/test".to_string();
    db_config.min_connections = 20;
    assert!(ConfigValidator::validate_database(&db_config).is_err());
}

#[test]
fn test_config_validator_security() {
    let mut security_config = AppConfig::default().security;
    assert!(ConfigValidator::validate_security(&security_config).is_ok());

    security_config.jwt_secret = "short".to_string();
    assert!(ConfigValidator::validate_security(&security_config).is_err());

    security_config.jwt_secret = "a".repeat(32);
    security_config.bcrypt_cost = 50;
    assert!(ConfigValidator::validate_security(&security_config).is_err());

    security_config.bcrypt_cost = 10;
    security_config.root_password = "123".to_string();
    assert!(ConfigValidator::validate_security(&security_config).is_err());
}

#[test]
fn test_config_validator_rag() {
    let mut rag_config = AppConfig::default().rag;
    assert!(ConfigValidator::validate_rag(&rag_config).is_ok());

    rag_config.chunk_overlap = rag_config.chunk_size;
    assert!(ConfigValidator::validate_rag(&rag_config).is_err());
}

#[test]
fn test_config_validator_logging() {
    let mut logging_config = AppConfig::default().logging;
    assert!(ConfigValidator::validate_logging(&logging_config).is_ok());

    logging_config.file_enabled = true;
    assert!(ConfigValidator::validate_logging(&logging_config).is_err());

    logging_config.file_path = Some("./logs/agentdock.log".to_string());
    logging_config.rotation = "weekly".to_string();
    assert!(ConfigValidator::validate_logging(&logging_config).is_err());
}

#[test]
fn test_config_validator_storage() {
    let mut storage_config = AppConfig::default().storage;
    assert!(ConfigValidator::validate_storage(&storage_config).is_ok());

    storage_config.public_url_prefix = "uploads".to_string();
    assert!(ConfigValidator::validate_storage(&storage_config).is_err());

    storage_config.public_url_prefix = "/uploads".to_string();
    storage_config.max_file_size = 0;
    assert!(ConfigValidator::validate_storage(&storage_config).is_err());

    storage_config.max_file_size = 1024;
    storage_config.allowed_extensions.clear();
    assert!(ConfigValidator::validate_storage(&storage_config).is_err());
}

#[test]
fn test_config_summary_lists_prefixes() {
    let summary = ConfigLoader::summary(&AppConfig::default());

    assert!(summary.contains("/consoleapi"));
    assert!(summary.contains("/api"));
    assert!(summary.contains("./storage/uploads"));
}
