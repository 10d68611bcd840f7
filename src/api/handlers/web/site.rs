// Web 端站点配置与装修页面

use actix_web::web;

use crate::api::responses::{ok, ApiResult, Envelope};
use crate::api::state::AppState;
use crate::services::{DecorateService, DictService};

/// 字典分组中启用的键值对
#[utoipa::path(
    get,
    path = "/api/config/{group}",
    tag = "Site",
    params(("group" = String, Path, description = "字典分组")),
    responses((status = 200, description = "键值对，分组不存在时为空对象", body = Envelope))
)]
pub async fn config_group(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    ok(DictService::new(state.db.clone())
        .group_map(&path.into_inner())
        .await?)
}

#[utoipa::path(
    get,
    path = "/api/decorate/{name}",
    tag = "Site",
    params(("name" = String, Path, description = "页面名称")),
    responses(
        (status = 200, description = "装修页面", body = Envelope),
        (status = 404, description = "页面不存在")
    )
)]
pub async fn decorate(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    ok(DecorateService::new(state.db.clone())
        .get(&path.into_inner())
        .await?)
}

pub fn configure_site_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/config/{group}", web::get().to(config_group))
        .route("/decorate/{name}", web::get().to(decorate));
}
