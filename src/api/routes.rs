// API 路由定义
// 控制台、Web 端、上传文件访问和接口文档

use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::auth::jwt_validator;
use crate::api::handlers::{console, files, system, web as web_api};
use crate::config::ServerConfig;
use crate::errors::{json_error_handler, path_error_handler, query_error_handler};
use crate::services::PermissionDef;

/// 控制台权限目录
///
/// 启动时和 `POST /permissions/sync` 会据此同步数据库中的权限表。
pub const CONSOLE_PERMISSIONS: &[PermissionDef] = &[
    PermissionDef::new("console:user:list", "用户列表", "用户管理"),
    PermissionDef::new("console:user:detail", "用户详情", "用户管理"),
    PermissionDef::new("console:user:create", "创建用户", "用户管理"),
    PermissionDef::new("console:user:update", "更新用户", "用户管理"),
    PermissionDef::new("console:user:delete", "删除用户", "用户管理"),
    PermissionDef::new("console:user:reset-password", "重置密码", "用户管理"),
    PermissionDef::new("console:role:list", "角色列表", "角色管理"),
    PermissionDef::new("console:role:detail", "角色详情", "角色管理"),
    PermissionDef::new("console:role:create", "创建角色", "角色管理"),
    PermissionDef::new("console:role:update", "更新角色", "角色管理"),
    PermissionDef::new("console:role:delete", "删除角色", "角色管理"),
    PermissionDef::new("console:role:assign-permissions", "分配权限", "角色管理"),
    PermissionDef::new("console:permission:list", "权限列表", "权限管理"),
    PermissionDef::new("console:permission:sync", "同步权限", "权限管理"),
    PermissionDef::new("console:menu:list", "菜单列表", "菜单管理"),
    PermissionDef::new("console:menu:create", "创建菜单", "菜单管理"),
    PermissionDef::new("console:menu:update", "更新菜单", "菜单管理"),
    PermissionDef::new("console:menu:delete", "删除菜单", "菜单管理"),
    PermissionDef::new("console:ai-provider:list", "提供商列表", "模型管理"),
    PermissionDef::new("console:ai-provider:create", "创建提供商", "模型管理"),
    PermissionDef::new("console:ai-provider:update", "更新提供商", "模型管理"),
    PermissionDef::new("console:ai-provider:delete", "删除提供商", "模型管理"),
    PermissionDef::new("console:ai-model:list", "模型列表", "模型管理"),
    PermissionDef::new("console:ai-model:create", "创建模型", "模型管理"),
    PermissionDef::new("console:ai-model:update", "更新模型", "模型管理"),
    PermissionDef::new("console:ai-model:delete", "删除模型", "模型管理"),
    PermissionDef::new("console:ai-model:test", "测试模型", "模型管理"),
    PermissionDef::new("console:dataset:list", "知识库列表", "知识库"),
    PermissionDef::new("console:dataset:detail", "知识库详情", "知识库"),
    PermissionDef::new("console:dataset:create", "创建知识库", "知识库"),
    PermissionDef::new("console:dataset:update", "更新知识库", "知识库"),
    PermissionDef::new("console:dataset:delete", "删除知识库", "知识库"),
    PermissionDef::new("console:dataset:document", "文档与分段管理", "知识库"),
    PermissionDef::new("console:dataset:retrieval-test", "召回测试", "知识库"),
    PermissionDef::new("console:agent:list", "智能体列表", "智能体"),
    PermissionDef::new("console:agent:detail", "智能体详情", "智能体"),
    PermissionDef::new("console:agent:create", "创建智能体", "智能体"),
    PermissionDef::new("console:agent:update", "更新智能体", "智能体"),
    PermissionDef::new("console:agent:delete", "删除智能体", "智能体"),
    PermissionDef::new("console:agent:publish", "发布智能体", "智能体"),
    PermissionDef::new("console:recharge-rule:list", "套餐列表", "财务管理"),
    PermissionDef::new("console:recharge-rule:create", "创建套餐", "财务管理"),
    PermissionDef::new("console:recharge-rule:update", "更新套餐", "财务管理"),
    PermissionDef::new("console:recharge-rule:delete", "删除套餐", "财务管理"),
    PermissionDef::new("console:order:list", "订单列表", "财务管理"),
    PermissionDef::new("console:order:confirm", "确认到账", "财务管理"),
    PermissionDef::new("console:order:refund", "订单退款", "财务管理"),
    PermissionDef::new("console:finance:center", "财务中心", "财务管理"),
    PermissionDef::new("console:finance:account-log", "账户流水", "财务管理"),
    PermissionDef::new("console:dict:list", "字典列表", "系统设置"),
    PermissionDef::new("console:dict:create", "创建字典", "系统设置"),
    PermissionDef::new("console:dict:update", "更新字典", "系统设置"),
    PermissionDef::new("console:dict:delete", "删除字典", "系统设置"),
    PermissionDef::new("console:decorate:list", "装修页面列表", "系统设置"),
    PermissionDef::new("console:decorate:save", "保存装修页面", "系统设置"),
    PermissionDef::new("console:tag:list", "标签列表", "系统设置"),
    PermissionDef::new("console:tag:create", "创建标签", "系统设置"),
    PermissionDef::new("console:tag:update", "更新标签", "系统设置"),
    PermissionDef::new("console:tag:delete", "删除标签", "系统设置"),
    PermissionDef::new("console:extension:list", "扩展列表", "扩展管理"),
    PermissionDef::new("console:extension:install", "安装扩展", "扩展管理"),
    PermissionDef::new("console:extension:update", "更新扩展", "扩展管理"),
    PermissionDef::new("console:extension:delete", "卸载扩展", "扩展管理"),
    PermissionDef::new("console:extension:enable", "启用停用扩展", "扩展管理"),
    PermissionDef::new("console:upload:file", "上传文件", "系统设置"),
];

/// 注册 Bearer 认证方式
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// API 文档聚合
#[derive(OpenApi)]
#[openapi(
    info(
        title = "AgentDock API",
        description = "AgentDock 控制台登录与 Web 端接口文档",
        version = "0.1.0",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        system::health,
        console::auth::login,
        web_api::auth::register,
        web_api::auth::login,
        web_api::auth::info,
        web_api::auth::update_info,
        web_api::auth::change_password,
        web_api::auth::upload,
        web_api::agent::chat_models,
        web_api::agent::list,
        web_api::agent::detail,
        web_api::conversation::chat,
        web_api::conversation::list,
        web_api::conversation::messages,
        web_api::conversation::rename,
        web_api::conversation::delete,
        web_api::recharge::rules,
        web_api::recharge::create_order,
        web_api::recharge::orders,
        web_api::site::config_group,
        web_api::site::decorate,
    ),
    components(schemas(
        crate::api::responses::Envelope,
        crate::services::auth::RegisterRequest,
        crate::services::auth::LoginRequest,
        crate::services::auth::LoginResponse,
        crate::services::auth::UserProfile,
        crate::services::auth::UpdateProfileRequest,
        crate::services::auth::ChangePasswordRequest,
        crate::services::ai_provider::ChatModelOption,
        crate::services::conversation::ChatRequest,
        crate::services::conversation::RenameRequest,
        crate::services::conversation::ChatOutcome,
        crate::services::recharge::CreateOrderRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "System", description = "系统状态"),
        (name = "Console", description = "控制台认证"),
        (name = "Auth", description = "注册与登录"),
        (name = "User", description = "个人资料与上传"),
        (name = "Agent", description = "模型与智能体"),
        (name = "Conversation", description = "会话与对话"),
        (name = "Recharge", description = "充值与订单"),
        (name = "Site", description = "站点配置与装修页面"),
    )
)]
pub struct ApiDoc;

/// JSON 请求体上限，文档导入的原文也走 JSON
pub const JSON_LIMIT: usize = 8 * 1024 * 1024;

/// 提取器解析失败时同样返回统一信封
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_LIMIT)
            .error_handler(json_error_handler),
    )
    .app_data(web::QueryConfig::default().error_handler(query_error_handler))
    .app_data(web::PathConfig::default().error_handler(path_error_handler));
}

/// 配置全部路由
///
/// 控制台前缀下只有登录是公开的；Web 端前缀下公开接口先注册，其余经过 Bearer 校验。
pub fn configure_routes(cfg: &mut web::ServiceConfig, server: &ServerConfig) {
    cfg.configure(configure_extractors)
        .configure(system::configure_system_routes)
        .route(
            "/uploads/{path:.*}",
            web::get().to(files::serve),
        )
        .service(
            web::scope(&server.console_prefix)
                .route("/auth/login", web::post().to(console::auth::login))
                .service(
                    web::scope("")
                        .wrap(HttpAuthentication::bearer(jwt_validator))
                        .configure(console::configure_console_routes),
                ),
        )
        .service(
            web::scope(&server.web_prefix)
                .configure(web_api::configure_public_routes)
                .service(
                    web::scope("")
                        .wrap(HttpAuthentication::bearer(jwt_validator))
                        .configure(web_api::configure_user_routes),
                ),
        )
        .service(
            SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );
}
