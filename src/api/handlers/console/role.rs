// 控制台角色与权限管理

use actix_web::web;
use uuid::Uuid;

use crate::api::extractors::{AuthUser, ValidatedJson};
use crate::api::responses::{ok, ok_message, ApiResult};
use crate::api::routes::CONSOLE_PERMISSIONS;
use crate::api::state::AppState;
use crate::services::role::{AssignPermissionsRequest, RoleRequest};
use crate::services::{PermissionService, RoleService};

pub async fn list(state: web::Data<AppState>, user: AuthUser) -> ApiResult {
    user.require_permission("console:role:list")?;
    ok(RoleService::new(state.db.clone()).list().await?)
}

pub async fn detail(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    user.require_permission("console:role:detail")?;
    ok(RoleService::new(state.db.clone()).detail(path.into_inner()).await?)
}

pub async fn create(
    state: web::Data<AppState>,
    user: AuthUser,
    body: ValidatedJson<RoleRequest>,
) -> ApiResult {
    user.require_permission("console:role:create")?;
    ok(RoleService::new(state.db.clone()).create(body.into_inner()).await?)
}

pub async fn update(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: ValidatedJson<RoleRequest>,
) -> ApiResult {
    user.require_permission("console:role:update")?;
    ok(RoleService::new(state.db.clone())
        .update(path.into_inner(), body.into_inner())
        .await?)
}

pub async fn delete(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    user.require_permission("console:role:delete")?;
    RoleService::new(state.db.clone()).delete(path.into_inner()).await?;
    ok_message("角色已删除")
}

/// 整体替换角色权限，返回最新的权限代码
pub async fn assign_permissions(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: ValidatedJson<AssignPermissionsRequest>,
) -> ApiResult {
    user.require_permission("console:role:assign-permissions")?;
    ok(RoleService::new(state.db.clone())
        .assign_permissions(path.into_inner(), body.into_inner())
        .await?)
}

pub async fn list_permissions(state: web::Data<AppState>, user: AuthUser) -> ApiResult {
    user.require_permission("console:permission:list")?;
    ok(PermissionService::new(state.db.clone()).list_grouped().await?)
}

/// 按路由声明的权限目录同步数据库
pub async fn sync_permissions(state: web::Data<AppState>, user: AuthUser) -> ApiResult {
    user.require_permission("console:permission:sync")?;
    ok(PermissionService::new(state.db.clone())
        .sync(CONSOLE_PERMISSIONS)
        .await?)
}

pub fn configure_role_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/roles")
            .route("", web::get().to(list))
            .route("", web::post().to(create))
            .route("/{id}", web::get().to(detail))
            .route("/{id}", web::put().to(update))
            .route("/{id}", web::delete().to(delete))
            .route("/{id}/permissions", web::put().to(assign_permissions)),
    )
    .service(
        web::scope("/permissions")
            .route("", web::get().to(list_permissions))
            .route("/sync", web::post().to(sync_permissions)),
    );
}
