// 控制台接口处理器
// 除登录外都在 Bearer 校验之后，并按权限代码逐个鉴权

pub mod agent;
pub mod auth;
pub mod dataset;
pub mod extension;
pub mod finance;
pub mod menu;
pub mod model;
pub mod role;
pub mod setting;
pub mod user;

use actix_web::web;

/// 注册需要登录的控制台路由
pub fn configure_console_routes(cfg: &mut web::ServiceConfig) {
    auth::configure_auth_routes(cfg);
    user::configure_user_routes(cfg);
    role::configure_role_routes(cfg);
    menu::configure_menu_routes(cfg);
    model::configure_model_routes(cfg);
    dataset::configure_dataset_routes(cfg);
    agent::configure_agent_routes(cfg);
    finance::configure_finance_routes(cfg);
    setting::configure_setting_routes(cfg);
    extension::configure_extension_routes(cfg);
}
