// 数据库实体模块
// 包含所有 SeaORM 实体定义

// 用户与权限
pub mod user;
pub mod role;
pub mod permission;
pub mod user_role;
pub mod role_permission;
pub mod menu;

// 模型配置
pub mod ai_provider;
pub mod ai_model;

// 知识库
pub mod dataset;
pub mod document;
pub mod segment;

// 智能体与会话
pub mod agent;
pub mod conversation;
pub mod message;

// 充值与财务
pub mod recharge_rule;
pub mod order;
pub mod account_log;

// 系统配置
pub mod dict;
pub mod decorate_page;
pub mod tag;
pub mod extension;
pub mod file;

pub mod prelude;
pub use prelude::*;
