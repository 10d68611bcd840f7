// 结构化日志
// tracing 订阅器初始化与请求级日志上下文

mod context;
mod setup;


pub use context::*;
pub use setup::*;
