// 控制台用户管理

use actix_web::web;
use uuid::Uuid;

use crate::api::extractors::{AuthUser, Pagination, ValidatedJson};
use crate::api::responses::{ok, ok_message, paginated, ApiResult};
use crate::api::state::AppState;
use crate::services::user::{CreateUserRequest, ResetPasswordRequest, UpdateUserRequest, UserQuery};
use crate::services::UserService;

fn service(state: &AppState) -> UserService {
    UserService::new(state.db.clone(), state.config.clone())
}

pub async fn list(
    state: web::Data<AppState>,
    user: AuthUser,
    page: Pagination,
    query: web::Query<UserQuery>,
) -> ApiResult {
    user.require_permission("console:user:list")?;
    paginated(service(&state).list(query.into_inner(), *page).await?)
}

pub async fn detail(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    user.require_permission("console:user:detail")?;
    ok(service(&state).detail(path.into_inner()).await?)
}

pub async fn create(
    state: web::Data<AppState>,
    user: AuthUser,
    body: ValidatedJson<CreateUserRequest>,
) -> ApiResult {
    user.require_permission("console:user:create")?;
    ok(service(&state).create(body.into_inner()).await?)
}

pub async fn update(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: ValidatedJson<UpdateUserRequest>,
) -> ApiResult {
    user.require_permission("console:user:update")?;
    ok(service(&state).update(path.into_inner(), body.into_inner()).await?)
}

pub async fn reset_password(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: ValidatedJson<ResetPasswordRequest>,
) -> ApiResult {
    user.require_permission("console:user:reset-password")?;
    service(&state)
        .reset_password(&user, path.into_inner(), body.into_inner())
        .await?;
    ok_message("密码已重置")
}

pub async fn delete(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    user.require_permission("console:user:delete")?;
    service(&state).delete(path.into_inner()).await?;
    ok_message("用户已删除")
}

pub fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("", web::get().to(list))
            .route("", web::post().to(create))
            .route("/{id}", web::get().to(detail))
            .route("/{id}", web::put().to(update))
            .route("/{id}", web::delete().to(delete))
            .route("/{id}/reset-password", web::post().to(reset_password)),
    );
}
