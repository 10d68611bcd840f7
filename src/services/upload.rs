// 文件上传服务
// 按日期目录存放上传文件，并负责把访问路径安全地映射回存储目录

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::{AppConfig, StorageConfig};
use crate::db::entities::{file, prelude::*};
use crate::errors::{PlatformError, PlatformResult};

/// 取文件扩展名（小写，不含点）
pub fn file_extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// 校验扩展名是否在允许列表中，返回规范化的扩展名
pub fn check_extension(storage: &StorageConfig, name: &str) -> PlatformResult<String> {
    let extension = file_extension(name).ok_or_else(|| {
        PlatformError::file_processing_with_name("无法识别文件类型", name.to_string())
    })?;
    if !storage
        .allowed_extensions
        .iter()
        .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&extension))
    {
        return Err(PlatformError::file_processing_with_name(
            format!("不支持的文件类型: {}", extension),
            name.to_string(),
        ));
    }
    Ok(extension)
}

/// 校验文件大小
pub fn check_size(storage: &StorageConfig, size: u64) -> PlatformResult<()> {
    if size > storage.max_file_size {
        return Err(PlatformError::file_processing(format!(
            "文件大小超过限制 {} 字节",
            storage.max_file_size
        )));
    }
    Ok(())
}

/// 把相对路径解析到存储目录下，拒绝 `..`、绝对路径等越界写法
pub fn resolve_stored_path(storage: &StorageConfig, relative: &str) -> PlatformResult<PathBuf> {
    let relative = Path::new(relative.trim_start_matches('/'));
    let mut resolved = PathBuf::from(&storage.path);
    let mut depth = 0usize;

    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            _ => return Err(PlatformError::validation("path", "非法的文件路径")),
        }
    }

    if depth == 0 {
        return Err(PlatformError::validation("path", "非法的文件路径"));
    }
    Ok(resolved)
}

/// 上传服务
pub struct UploadService {
    db: DatabaseConnection,
    config: Arc<AppConfig>,
}

impl UploadService {
    pub fn new(db: DatabaseConnection, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    /// 保存文件内容并记录 `File`，存放在 `<存储目录>/yyyyMMdd/<uuid>.<ext>`
    #[instrument(skip(self, content), fields(size = content.len()))]
    pub async fn store(
        &self,
        uploaded_by: Option<Uuid>,
        original_name: &str,
        mime_type: Option<String>,
        content: &[u8],
    ) -> PlatformResult<file::Model> {
        let storage = &self.config.storage;
        let original_name = Path::new(original_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let extension = check_extension(storage, &original_name)?;
        check_size(storage, content.len() as u64)?;
        if content.is_empty() {
            return Err(PlatformError::file_processing_with_name("文件内容为空", original_name));
        }

        let now = Utc::now();
        let id = Uuid::new_v4();
        let relative = format!("{}/{}.{}", now.format("%Y%m%d"), id, extension);
        let target = resolve_stored_path(storage, &relative)?;

        if let Some(dir) = target.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&target, content).await?;
        debug!(path = %target.display(), "文件已写入");

        let url = format!(
            "{}/{}",
            storage.public_url_prefix.trim_end_matches('/'),
            relative
        );
        let record = file::ActiveModel {
            id: Set(id),
            original_name: Set(original_name),
            storage_path: Set(relative),
            url: Set(url),
            mime_type: Set(mime_type),
            size: Set(content.len() as i64),
            extension: Set(extension),
            uploaded_by: Set(uploaded_by),
            created_at: Set(now.into()),
        }
        .insert(&self.db)
        .await;

        match record {
            Ok(record) => {
                info!(file_id = %record.id, url = %record.url, "文件已上传");
                Ok(record)
            }
            Err(e) => {
                // 记录写入失败时清理已落盘的文件
                let _ = tokio::fs::remove_file(&target).await;
                Err(e.into())
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> PlatformResult<file::Model> {
        File::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| PlatformError::not_found(format!("文件 {}", id)))
    }

    /// 打开已存储的文件，返回文件句柄和字节数
    pub async fn open(&self, relative: &str) -> PlatformResult<(tokio::fs::File, u64)> {
        let path = resolve_stored_path(&self.config.storage, relative)?;
        let opened = match tokio::fs::File::open(&path).await {
            Ok(opened) => opened,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PlatformError::not_found(format!("文件 {}", relative)));
            }
            Err(e) => return Err(e.into()),
        };
        let metadata = opened.metadata().await?;
        if !metadata.is_file() {
            return Err(PlatformError::not_found(format!("文件 {}", relative)));
        }
        Ok((opened, metadata.len()))
    }
}
