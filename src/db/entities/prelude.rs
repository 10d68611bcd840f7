// 实体预导入模块
// 提供便捷的实体导入

pub use super::user::{Entity as User, Model as UserModel, ActiveModel as UserActiveModel};
pub use super::role::{Entity as Role, Model as RoleModel, ActiveModel as RoleActiveModel};
pub use super::permission::{Entity as Permission, Model as PermissionModel, ActiveModel as PermissionActiveModel};
pub use super::user_role::{Entity as UserRole, ActiveModel as UserRoleActiveModel};
pub use super::role_permission::{Entity as RolePermission, ActiveModel as RolePermissionActiveModel};
pub use super::menu::{Entity as Menu, Model as MenuModel, ActiveModel as MenuActiveModel};
pub use super::ai_provider::{Entity as AiProvider, Model as AiProviderModel, ActiveModel as AiProviderActiveModel};
pub use super::ai_model::{Entity as AiModel, Model as AiModelModel, ActiveModel as AiModelActiveModel};
pub use super::dataset::{Entity as Dataset, Model as DatasetModel, ActiveModel as DatasetActiveModel};
pub use super::document::{Entity as Document, Model as DocumentModel, ActiveModel as DocumentActiveModel};
pub use super::segment::{Entity as Segment, Model as SegmentModel, ActiveModel as SegmentActiveModel};
pub use super::agent::{Entity as Agent, Model as AgentModel, ActiveModel as AgentActiveModel};
pub use super::conversation::{Entity as Conversation, Model as ConversationModel, ActiveModel as ConversationActiveModel};
pub use super::message::{Entity as Message, Model as MessageModel, ActiveModel as MessageActiveModel};
pub use super::recharge_rule::{Entity as RechargeRule, Model as RechargeRuleModel, ActiveModel as RechargeRuleActiveModel};
pub use super::order::{Entity as Order, Model as OrderModel, ActiveModel as OrderActiveModel};
pub use super::account_log::{Entity as AccountLog, Model as AccountLogModel, ActiveModel as AccountLogActiveModel};
pub use super::dict::{Entity as Dict, Model as DictModel, ActiveModel as DictActiveModel};
pub use super::decorate_page::{Entity as DecoratePage, Model as DecoratePageModel, ActiveModel as DecoratePageActiveModel};
pub use super::tag::{Entity as Tag, Model as TagModel, ActiveModel as TagActiveModel};
pub use super::extension::{Entity as Extension, Model as ExtensionModel, ActiveModel as ExtensionActiveModel};
pub use super::file::{Entity as File, Model as FileModel, ActiveModel as FileActiveModel};
