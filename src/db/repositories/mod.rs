// 数据仓储模块
// 封装跨多张表的常用查询

pub mod user;
pub mod permission;

pub use user::UserRepository;
pub use permission::PermissionRepository;
