// 应用配置
// 默认值、config.toml 与 AGENTDOCK_ 前缀环境变量逐层覆盖

mod loader;
mod settings;
mod validator;

#[cfg(test)]
mod tests;

pub use loader::{convert_config_error, ConfigLoader};
pub use settings::*;
pub use validator::ConfigValidator;
