// Web 端接口处理器

pub mod agent;
pub mod auth;
pub mod conversation;
pub mod recharge;
pub mod site;

use actix_web::web;

/// 无需登录的 Web 端路由
pub fn configure_public_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/register", web::post().to(auth::register))
        .route("/auth/login", web::post().to(auth::login))
        .route("/recharge/rules", web::get().to(recharge::rules));
    agent::configure_agent_routes(cfg);
    site::configure_site_routes(cfg);
}

/// 需要登录的 Web 端路由
pub fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    auth::configure_user_routes(cfg);
    conversation::configure_conversation_routes(cfg);
    recharge::configure_order_routes(cfg);
}
