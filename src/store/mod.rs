//! 持久化键值存储
//!
//! 告警冷却记录和节流时间戳都保存在这里。存储是可选能力：
//! 未配置时上层以 `Option<Arc<dyn KvStore>>` 的 `None` 表示并按 fail-open 处理。

pub mod kv_store;
pub mod memory_store;
pub mod redis_store;

pub use kv_store::{get_json, put_json, KvStore, PutOptions};
pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;
