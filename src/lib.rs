// AgentDock 服务库
// 导出各模块供二进制入口和测试使用

pub mod ai;
pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod logging;
pub mod services;
