// 控制台知识库管理

use actix_web::web;
use uuid::Uuid;

use crate::api::extractors::{AuthUser, Pagination, ValidatedJson};
use crate::api::responses::{ok, ok_message, paginated, ApiResult};
use crate::api::state::AppState;
use crate::services::dataset::{
    CreateDocumentRequest, DatasetQuery, DatasetRequest, EnabledRequest, RetrievalTestRequest,
    UpdateSegmentRequest,
};
use crate::services::DatasetService;

fn service(state: &AppState) -> DatasetService {
    DatasetService::new(state.db.clone(), state.config.clone())
}

pub async fn list(
    state: web::Data<AppState>,
    user: AuthUser,
    page: Pagination,
    query: web::Query<DatasetQuery>,
) -> ApiResult {
    user.require_permission("console:dataset:list")?;
    paginated(service(&state).list(query.into_inner(), *page).await?)
}

pub async fn detail(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    user.require_permission("console:dataset:detail")?;
    ok(service(&state).detail(path.into_inner()).await?)
}

pub async fn create(
    state: web::Data<AppState>,
    user: AuthUser,
    body: ValidatedJson<DatasetRequest>,
) -> ApiResult {
    user.require_permission("console:dataset:create")?;
    ok(service(&state).create(user.id(), body.into_inner()).await?)
}

pub async fn update(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: ValidatedJson<DatasetRequest>,
) -> ApiResult {
    user.require_permission("console:dataset:update")?;
    ok(service(&state).update(path.into_inner(), body.into_inner()).await?)
}

pub async fn delete(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    user.require_permission("console:dataset:delete")?;
    service(&state).delete(path.into_inner()).await?;
    ok_message("知识库已删除")
}

pub async fn list_documents(
    state: web::Data<AppState>,
    user: AuthUser,
    page: Pagination,
    path: web::Path<Uuid>,
) -> ApiResult {
    user.require_permission("console:dataset:detail")?;
    paginated(service(&state).list_documents(path.into_inner(), *page).await?)
}

/// 导入文本或已上传的文件
pub async fn create_document(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: ValidatedJson<CreateDocumentRequest>,
) -> ApiResult {
    user.require_permission("console:dataset:document")?;
    ok(service(&state)
        .create_document(path.into_inner(), body.into_inner())
        .await?)
}

pub async fn set_document_enabled(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    body: ValidatedJson<EnabledRequest>,
) -> ApiResult {
    user.require_permission("console:dataset:document")?;
    let (dataset_id, document_id) = path.into_inner();
    ok(service(&state)
        .set_document_enabled(dataset_id, document_id, body.enabled)
        .await?)
}

pub async fn delete_document(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
) -> ApiResult {
    user.require_permission("console:dataset:document")?;
    let (dataset_id, document_id) = path.into_inner();
    service(&state).delete_document(dataset_id, document_id).await?;
    ok_message("文档已删除")
}

pub async fn list_segments(
    state: web::Data<AppState>,
    user: AuthUser,
    page: Pagination,
    path: web::Path<(Uuid, Uuid)>,
) -> ApiResult {
    user.require_permission("console:dataset:detail")?;
    let (dataset_id, document_id) = path.into_inner();
    paginated(
        service(&state)
            .list_segments(dataset_id, document_id, *page)
            .await?,
    )
}

pub async fn update_segment(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    body: ValidatedJson<UpdateSegmentRequest>,
) -> ApiResult {
    user.require_permission("console:dataset:document")?;
    let (dataset_id, segment_id) = path.into_inner();
    ok(service(&state)
        .update_segment(dataset_id, segment_id, body.into_inner())
        .await?)
}

pub async fn set_segment_enabled(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    body: ValidatedJson<EnabledRequest>,
) -> ApiResult {
    user.require_permission("console:dataset:document")?;
    let (dataset_id, segment_id) = path.into_inner();
    ok(service(&state)
        .set_segment_enabled(dataset_id, segment_id, body.enabled)
        .await?)
}

pub async fn delete_segment(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
) -> ApiResult {
    user.require_permission("console:dataset:document")?;
    let (dataset_id, segment_id) = path.into_inner();
    service(&state).delete_segment(dataset_id, segment_id).await?;
    ok_message("分段已删除")
}

pub async fn retrieval_test(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: ValidatedJson<RetrievalTestRequest>,
) -> ApiResult {
    user.require_permission("console:dataset:retrieval-test")?;
    ok(service(&state)
        .retrieval_test(&state.rag, path.into_inner(), body.into_inner())
        .await?)
}

pub fn configure_dataset_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/datasets")
            .route("", web::get().to(list))
            .route("", web::post().to(create))
            .route("/{id}", web::get().to(detail))
            .route("/{id}", web::put().to(update))
            .route("/{id}", web::delete().to(delete))
            .route("/{id}/documents", web::get().to(list_documents))
            .route("/{id}/documents", web::post().to(create_document))
            .route("/{id}/documents/{document_id}", web::delete().to(delete_document))
            .route(
                "/{id}/documents/{document_id}/enabled",
                web::put().to(set_document_enabled),
            )
            .route(
                "/{id}/documents/{document_id}/segments",
                web::get().to(list_segments),
            )
            .route("/{id}/segments/{segment_id}", web::put().to(update_segment))
            .route("/{id}/segments/{segment_id}", web::delete().to(delete_segment))
            .route(
                "/{id}/segments/{segment_id}/enabled",
                web::put().to(set_segment_enabled),
            )
            .route("/{id}/retrieval-test", web::post().to(retrieval_test)),
    );
}
