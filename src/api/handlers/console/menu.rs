// 控制台菜单管理

use actix_web::web;
use uuid::Uuid;

use crate::api::extractors::{AuthUser, ValidatedJson};
use crate::api::responses::{ok, ok_message, ApiResult};
use crate::api::state::AppState;
use crate::services::menu::MenuRequest;
use crate::services::MenuService;

pub async fn list(state: web::Data<AppState>, user: AuthUser) -> ApiResult {
    user.require_permission("console:menu:list")?;
    ok(MenuService::new(state.db.clone()).list().await?)
}

pub async fn tree(state: web::Data<AppState>, user: AuthUser) -> ApiResult {
    user.require_permission("console:menu:list")?;
    ok(MenuService::new(state.db.clone()).tree().await?)
}

/// 当前用户可见的菜单，无需额外权限
pub async fn user_tree(state: web::Data<AppState>, user: AuthUser) -> ApiResult {
    ok(MenuService::new(state.db.clone()).user_tree(&user).await?)
}

pub async fn create(
    state: web::Data<AppState>,
    user: AuthUser,
    body: ValidatedJson<MenuRequest>,
) -> ApiResult {
    user.require_permission("console:menu:create")?;
    ok(MenuService::new(state.db.clone()).create(body.into_inner()).await?)
}

pub async fn update(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: ValidatedJson<MenuRequest>,
) -> ApiResult {
    user.require_permission("console:menu:update")?;
    ok(MenuService::new(state.db.clone())
        .update(path.into_inner(), body.into_inner())
        .await?)
}

pub async fn delete(state: web::Data<AppState>, user: AuthUser, path: web::Path<Uuid>) -> ApiResult {
    user.require_permission("console:menu:delete")?;
    MenuService::new(state.db.clone()).delete(path.into_inner()).await?;
    ok_message("菜单已删除")
}

pub fn configure_menu_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/menus")
            .route("", web::get().to(list))
            .route("", web::post().to(create))
            .route("/tree", web::get().to(tree))
            .route("/user", web::get().to(user_tree))
            .route("/{id}", web::put().to(update))
            .route("/{id}", web::delete().to(delete)),
    );
}
