//! 配置管理模块

pub mod env;
pub mod log;
pub mod redis;
pub mod settings;

pub use settings::{AppSettings, FirestoreSettings, RedisSettings, TelegramSettings};
