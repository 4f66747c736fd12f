use anyhow::{anyhow, Result};
use redis::aio::MultiplexedConnection;
use redis::Client;
use tracing::{debug, error};

/// Redis 连接管理器
///
/// 持有 `Client`，每次操作获取一个多路复用连接
#[derive(Clone)]
pub struct RedisConnectionPool {
    client: Client,
}

impl RedisConnectionPool {
    /// 创建连接管理器并测试连接
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client =
            Client::open(redis_url).map_err(|e| anyhow!("Failed to create Redis client: {}", e))?;

        let _test_conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                error!("Redis connection test failed: {}", redis_url);
                anyhow!("Failed to test Redis connection: {}", e)
            })?;

        debug!("Redis连接初始化成功");
        Ok(Self { client })
    }

    /// 获取连接
    pub async fn get_connection(&self) -> Result<MultiplexedConnection> {
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| anyhow!("Failed to get multiplexed connection: {}", e))?;
        Ok(conn)
    }
}
