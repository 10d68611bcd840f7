// 文件上传与访问
// 控制台和 Web 端共用 multipart 读取逻辑

use actix_multipart::Multipart;
use actix_web::{body::SizedStream, http::header, web, HttpResponse};
use futures::StreamExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::db::entities::file;
use crate::errors::{PlatformError, PlatformResult};
use crate::services::upload::{check_size, file_extension};
use crate::services::UploadService;

/// 上传文件使用的表单字段
pub const FILE_FIELD: &str = "file";

/// multipart 中读取到的文件
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub content: Vec<u8>,
}

/// 读取 `file` 字段，边读边检查大小限制
pub async fn read_file_field(state: &AppState, payload: &mut Multipart) -> PlatformResult<UploadedFile> {
    let mut uploaded = None;

    while let Some(item) = payload.next().await {
        let mut field = item
            .map_err(|e| PlatformError::file_processing(format!("读取上传内容失败: {}", e)))?;

        if field.name() != FILE_FIELD {
            // 跳过其它字段
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| PlatformError::file_processing(format!("读取上传内容失败: {}", e)))?;
            }
            continue;
        }

        let file_name = field
            .content_disposition()
            .get_filename()
            .unwrap_or_default()
            .to_string();
        let content_type = field.content_type().map(|mime| mime.to_string());

        let mut content = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk
                .map_err(|e| PlatformError::file_processing_with_name(format!("读取文件失败: {}", e), file_name.clone()))?;
            content.extend_from_slice(&data);
            check_size(&state.config.storage, content.len() as u64)?;
        }

        uploaded = Some(UploadedFile {
            file_name,
            content_type,
            content,
        });
    }

    uploaded.ok_or_else(|| PlatformError::validation(FILE_FIELD, "缺少上传文件"))
}

/// 读取并保存上传文件
pub async fn receive(
    state: &AppState,
    uploaded_by: Uuid,
    mut payload: Multipart,
) -> PlatformResult<file::Model> {
    let uploaded = read_file_field(state, &mut payload).await?;
    debug!(file_name = %uploaded.file_name, size = uploaded.content.len(), "收到上传文件");

    UploadService::new(state.db.clone(), state.config.clone())
        .store(
            Some(uploaded_by),
            &uploaded.file_name,
            uploaded.content_type,
            &uploaded.content,
        )
        .await
}

/// 根据扩展名推断响应类型
pub fn content_type_for(path: &str) -> &'static str {
    match file_extension(path).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("pdf") => "application/pdf",
        Some("json") => "application/json",
        Some("txt" | "md" | "csv") => "text/plain; charset=utf-8",
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("mp3") => "audio/mpeg",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

/// 访问已上传的文件 `GET /uploads/{path}`
pub async fn serve(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, PlatformError> {
    let relative = path.into_inner();
    let service = UploadService::new(state.db.clone(), state.config.clone());

    let (opened, size) = service.open(&relative).await.inspect_err(|e| {
        warn!(path = %relative, error = %e, "读取上传文件失败");
    })?;

    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&relative))
        .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
        .body(SizedStream::new(size, ReaderStream::new(opened))))
}
