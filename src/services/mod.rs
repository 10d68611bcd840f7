// 服务层模块
// 包含所有业务逻辑服务

pub mod agent;
pub mod ai_provider;
pub mod auth;
pub mod conversation;
pub mod dataset;
pub mod decorate;
pub mod dict;
pub mod extension;
pub mod finance;
pub mod menu;
pub mod permission;
pub mod recharge;
pub mod role;
pub mod tag;
pub mod upload;
pub mod user;

#[cfg(test)]
mod tests;

pub use agent::AgentService;
pub use ai_provider::AiProviderService;
pub use auth::AuthService;
pub use conversation::ConversationService;
pub use dataset::DatasetService;
pub use decorate::DecorateService;
pub use dict::DictService;
pub use extension::ExtensionService;
pub use finance::FinanceService;
pub use menu::MenuService;
pub use permission::{PermissionDef, PermissionService};
pub use recharge::RechargeService;
pub use role::RoleService;
pub use tag::TagService;
pub use upload::UploadService;
pub use user::UserService;

use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, Select};

use agentdock_common::{PaginatedResponse, PaginationParams};

use crate::errors::PlatformResult;

/// 按分页参数查询一页数据
pub(crate) async fn fetch_page<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    params: PaginationParams,
) -> PlatformResult<PaginatedResponse<E::Model>>
where
    E: EntityTrait,
    E::Model: Sync,
{
    let params = params.normalized();
    let paginator = select.paginate(db, params.page_size);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(params.page_index()).await?;
    Ok(PaginatedResponse::new(items, total, params))
}
