// 错误处理
// 平台错误类型、统一错误信封和请求 ID 中间件

mod middleware;
mod response;
mod types;

#[cfg(test)]
mod tests;

pub use middleware::*;
pub use response::*;
pub use types::*;
