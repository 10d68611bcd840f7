// API 处理器

pub mod console;
pub mod files;
pub mod system;
pub mod web;
