// 字典、装修、标签、扩展和上传测试

use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::extractors::Validate;
use crate::config::StorageConfig;
use crate::db::entities::{
    extension::{ExtensionStatus, ExtensionType},
    tag::TagType,
};
use crate::db::testing::{memory_db, test_config};
use crate::errors::PlatformError;
use crate::services::decorate::SaveDecorateRequest;
use crate::services::dict::{DictQuery, DictRequest};
use crate::services::extension::{
    validate_version, ExtensionQuery, InstallExtensionRequest, UpdateExtensionRequest, MARKETPLACE,
};
use crate::services::tag::{TagQuery, TagRequest};
use crate::services::upload::{check_extension, check_size, resolve_stored_path};
use crate::services::{DecorateService, DictService, ExtensionService, TagService, UploadService};

fn dict_request(group: &str, key: &str, value: &str, is_enabled: bool) -> DictRequest {
    DictRequest {
        group: group.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        remark: None,
        sort: 0,
        is_enabled,
    }
}

fn install_request(identifier: &str, version: &str) -> InstallExtensionRequest {
    InstallExtensionRequest {
        identifier: identifier.to_string(),
        name: "测试扩展".to_string(),
        version: version.to_string(),
        description: None,
        author: Some("tester".to_string()),
        icon: None,
        extension_type: ExtensionType::Functional,
        is_local: true,
    }
}

fn storage(path: &str) -> StorageConfig {
    StorageConfig {
        path: path.to_string(),
        public_url_prefix: "/uploads".to_string(),
        max_file_size: 16,
        allowed_extensions: vec!["txt".to_string(), ".PNG".to_string()],
    }
}

#[tokio::test]
async fn test_dict_group_map_and_uniqueness() {
    let service = DictService::new(memory_db().await);

    service.create(dict_request("website", "name", "AgentDock", true)).await.unwrap();
    service.create(dict_request("website", "logo", "/logo.png", true)).await.unwrap();
    let hidden = service
        .create(dict_request("website", "beta", "on", false))
        .await
        .unwrap();
    service.create(dict_request("payment", "currency", "CNY", true)).await.unwrap();

    let err = service
        .create(dict_request("website", "name", "重复", true))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Conflict { .. }));

    let map = service.group_map("website").await.unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map.get("name").map(String::as_str), Some("AgentDock"));
    assert!(!map.contains_key("beta"));

    service
        .update(hidden.id, dict_request("website", "beta", "on", true))
        .await
        .unwrap();
    assert_eq!(service.group_map("website").await.unwrap().len(), 3);

    let listed = service
        .list(DictQuery {
            group: Some("payment".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    service.delete(listed[0].id).await.unwrap();
    assert!(service.group_map("payment").await.unwrap().is_empty());
    assert!(service.group_map("missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_decorate_upsert_by_name() {
    let service = DecorateService::new(memory_db().await);

    let err = service.get("home").await.unwrap_err();
    assert!(matches!(err, PlatformError::NotFound { .. }));

    let created = service
        .save(SaveDecorateRequest {
            name: "home".to_string(),
            title: "首页".to_string(),
            data: json!({"banners": []}),
        })
        .await
        .unwrap();
    let updated = service
        .save(SaveDecorateRequest {
            name: "home".to_string(),
            title: "新首页".to_string(),
            data: json!({"banners": [{"image": "/a.png"}]}),
        })
        .await
        .unwrap();

    assert_eq!(created.id, updated.id);
    assert_eq!(service.list().await.unwrap().len(), 1);
    let page = service.get("home").await.unwrap();
    assert_eq!(page.title, "新首页");
    assert_eq!(page.data["banners"][0]["image"], "/a.png");

    let invalid = SaveDecorateRequest {
        name: "home".to_string(),
        title: String::new(),
        data: json!("text"),
    };
    assert!(invalid.validate().is_err());
}

#[tokio::test]
async fn test_tag_unique_per_type() {
    let service = TagService::new(memory_db().await);
    let request = |name: &str, tag_type| TagRequest {
        name: name.to_string(),
        tag_type,
    };

    let agent_tag = service.create(request("热门", TagType::Agent)).await.unwrap();
    service.create(request("热门", TagType::Dataset)).await.unwrap();
    let err = service.create(request(" 热门 ", TagType::Agent)).await.unwrap_err();
    assert!(matches!(err, PlatformError::Conflict { .. }));

    let other = service.create(request("办公", TagType::Agent)).await.unwrap();
    let err = service
        .update(other.id, request("热门", TagType::Agent))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Conflict { .. }));
    service.update(agent_tag.id, request("热门", TagType::Agent)).await.unwrap();

    let agent_tags = service
        .list(TagQuery {
            tag_type: Some(TagType::Agent),
        })
        .await
        .unwrap();
    assert_eq!(agent_tags.len(), 2);

    service.delete(other.id).await.unwrap();
    assert_eq!(service.list(TagQuery::default()).await.unwrap().len(), 2);
}

#[test]
fn test_semver_validation() {
    for version in ["1.0.0", "0.10.2", "2.0.0-beta.1", "1.2.3+build.5"] {
        assert!(validate_version(version).is_ok(), "{}", version);
    }
    for version in ["1.0", "v1.0.0", "01.0.0", "1.0.0-", ""] {
        assert!(validate_version(version).is_err(), "{}", version);
    }

    assert!(install_request("agentdock.search", "1.0.0").validate().is_ok());
    assert!(install_request("Bad Identifier", "1.0.0").validate().is_err());
    assert!(install_request("agentdock.search", "latest").validate().is_err());
}

#[tokio::test]
async fn test_extension_lifecycle() {
    let service = ExtensionService::new(memory_db().await);
    let identifier = MARKETPLACE[0].identifier;

    let installed = service.install(install_request(identifier, "0.9.0")).await.unwrap();
    assert_eq!(installed.status, ExtensionStatus::Disabled);
    let err = service.install(install_request(identifier, "1.0.0")).await.unwrap_err();
    assert!(matches!(err, PlatformError::Conflict { .. }));

    let market = service.marketplace().await.unwrap();
    assert_eq!(market.len(), MARKETPLACE.len());
    let entry = market.iter().find(|e| e.identifier == identifier).unwrap();
    assert!(entry.installed);
    assert!(entry.has_update);
    assert_eq!(entry.installed_version.as_deref(), Some("0.9.0"));
    assert!(market.iter().filter(|e| e.identifier != identifier).all(|e| !e.installed));

    let enabled = service.set_enabled(installed.id, true).await.unwrap();
    assert_eq!(enabled.status, ExtensionStatus::Enabled);

    let updated = service
        .update(
            installed.id,
            UpdateExtensionRequest {
                version: Some(MARKETPLACE[0].version.to_string()),
                ..UpdateExtensionRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.version, MARKETPLACE[0].version);
    assert_eq!(updated.name, "测试扩展");
    let market = service.marketplace().await.unwrap();
    assert!(!market.iter().any(|e| e.has_update));

    let enabled_only = service
        .list(ExtensionQuery {
            status: Some(ExtensionStatus::Enabled),
            ..ExtensionQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(enabled_only.len(), 1);

    service.uninstall(installed.id).await.unwrap();
    assert!(service.list(ExtensionQuery::default()).await.unwrap().is_empty());
    let err = service.uninstall(installed.id).await.unwrap_err();
    assert!(matches!(err, PlatformError::NotFound { .. }));
}

#[test]
fn test_upload_checks() {
    let storage = storage("/data/uploads");

    assert_eq!(check_extension(&storage, "notes.TXT").unwrap(), "txt");
    assert_eq!(check_extension(&storage, "logo.png").unwrap(), "png");
    assert!(check_extension(&storage, "script.exe").is_err());
    assert!(check_extension(&storage, "no-extension").is_err());

    assert!(check_size(&storage, 16).is_ok());
    assert!(matches!(
        check_size(&storage, 17),
        Err(PlatformError::FileProcessing { .. })
    ));
}

#[test]
fn test_resolve_stored_path_rejects_traversal() {
    let storage = storage("/data/uploads");

    let path = resolve_stored_path(&storage, "20240101/a.png").unwrap();
    assert_eq!(path, std::path::PathBuf::from("/data/uploads/20240101/a.png"));
    let path = resolve_stored_path(&storage, "/20240101/./a.png").unwrap();
    assert_eq!(path, std::path::PathBuf::from("/data/uploads/20240101/a.png"));

    for bad in ["../etc/passwd", "20240101/../../secret", "", "."] {
        assert!(resolve_stored_path(&storage, bad).is_err(), "{}", bad);
    }
}

#[tokio::test]
async fn test_store_and_read_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.storage = storage(&dir.path().to_string_lossy());
    let service = UploadService::new(memory_db().await, Arc::new(config));

    let uploader = Uuid::new_v4();
    let file = service
        .store(Some(uploader), "../../evil/说明.txt", Some("text/plain".to_string()), b"hello")
        .await
        .unwrap();
    assert_eq!(file.original_name, "说明.txt");
    assert_eq!(file.extension, "txt");
    assert_eq!(file.size, 5);
    assert_eq!(file.uploaded_by, Some(uploader));
    assert!(file.url.starts_with("/uploads/"));
    assert!(file.url.ends_with(&file.storage_path));

    let (day, name) = file.storage_path.split_once('/').unwrap();
    assert_eq!(day.len(), 8);
    assert_eq!(name, format!("{}.txt", file.id));
    assert!(dir.path().join(&file.storage_path).exists());

    let (mut opened, size) = service.open(&file.storage_path).await.unwrap();
    assert_eq!(size, 5);
    let mut content = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut opened, &mut content).await.unwrap();
    assert_eq!(content, b"hello");
    assert_eq!(service.get(file.id).await.unwrap().id, file.id);
    assert!(matches!(
        service.open("20000101/missing.txt").await,
        Err(PlatformError::NotFound { .. })
    ));
    assert!(matches!(
        service.open(file.storage_path.split_once('/').unwrap().0).await,
        Err(PlatformError::NotFound { .. })
    ));

    let err = service
        .store(None, "big.txt", None, &[b'a'; 17])
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::FileProcessing { .. }));
    let err = service.store(None, "empty.txt", None, &[]).await.unwrap_err();
    assert!(matches!(err, PlatformError::FileProcessing { .. }));
    let err = service.store(None, "virus.exe", None, b"MZ").await.unwrap_err();
    assert!(matches!(err, PlatformError::FileProcessing { .. }));
}
