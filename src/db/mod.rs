// 数据库模块
// 包含数据库连接、实体定义和操作

pub mod connection;
pub mod entities;
pub mod repositories;
pub mod schema;
pub mod seed;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests;

pub use connection::*;
pub use repositories::*;
pub use schema::*;
pub use seed::*;
