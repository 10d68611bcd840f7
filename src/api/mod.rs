// API 模块
// 认证、提取器、响应封装、处理器与路由

pub mod auth;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod responses;
pub mod routes;
pub mod state;

#[cfg(test)]
mod tests;

pub use middleware::build_cors;
pub use routes::{configure_routes, ApiDoc, CONSOLE_PERMISSIONS};
pub use state::AppState;
