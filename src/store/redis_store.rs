//! Redis 存储实现
//!
//! TTL 使用 `SET key value EX ttl`；元数据写在 `{key}:meta`，与值同一 TTL。

use anyhow::Result;
use redis::AsyncCommands;
use tracing::debug;

use crate::app_config::redis::RedisConnectionPool;
use crate::error::AppError;
use crate::store::kv_store::{KvStore, PutOptions};

pub struct RedisStore {
    pool: RedisConnectionPool,
    key_prefix: Option<String>,
}

impl RedisStore {
    pub fn new(pool: RedisConnectionPool, key_prefix: Option<String>) -> Self {
        Self { pool, key_prefix }
    }

    /// 连接 Redis 并测试可用性
    pub async fn connect(redis_url: &str, key_prefix: Option<String>) -> Result<Self> {
        let pool = RedisConnectionPool::new(redis_url).await?;
        Ok(Self::new(pool, key_prefix))
    }

    fn make_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

fn meta_key(redis_key: &str) -> String {
    format!("{}:meta", redis_key)
}

/// Redis EX 不接受 0，向上取整到至少 1 秒
fn ttl_secs(ttl: std::time::Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

#[async_trait::async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.pool.get_connection().await?;
        let redis_key = self.make_key(key);
        let value: Option<String> = conn
            .get(&redis_key)
            .await
            .map_err(|e| AppError::Store(format!("Redis GET {} 失败: {}", redis_key, e)))?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str, options: PutOptions) -> Result<()> {
        let mut conn = self.pool.get_connection().await?;
        let redis_key = self.make_key(key);

        let mut pipe = redis::pipe();
        pipe.atomic();
        match options.expiration_ttl {
            Some(ttl) => {
                let secs = ttl_secs(ttl);
                pipe.set_ex(&redis_key, value, secs).ignore();
                if let Some(metadata) = &options.metadata {
                    pipe.set_ex(meta_key(&redis_key), metadata, secs).ignore();
                }
            }
            None => {
                pipe.set(&redis_key, value).ignore();
                if let Some(metadata) = &options.metadata {
                    pipe.set(meta_key(&redis_key), metadata).ignore();
                }
            }
        }

        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Store(format!("Redis SET {} 失败: {}", redis_key, e)))?;
        debug!(key = %redis_key, ttl = ?options.expiration_ttl, "Redis写入成功");
        Ok(())
    }
}
