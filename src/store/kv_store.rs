use std::time::Duration;

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::AppError;

/// 写入选项
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// 过期时间，由存储自身的 TTL 机制负责删除
    pub expiration_ttl: Option<Duration>,
    /// 附加元数据（字符串，通常是 JSON）
    pub metadata: Option<String>,
}

impl PutOptions {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            expiration_ttl: Some(ttl),
            metadata: None,
        }
    }

    pub fn metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }
}

/// 键值存储接口
///
/// 按 key 最后写入者胜出，不需要跨 key 事务。
#[async_trait::async_trait]
pub trait KvStore: Send + Sync {
    /// 读取字符串值，不存在或已过期返回 `None`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// 覆盖写入
    async fn put(&self, key: &str, value: &str, options: PutOptions) -> Result<()>;
}

/// 读取并反序列化 JSON 值
pub async fn get_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw).map_err(AppError::Serde)?)),
        None => Ok(None),
    }
}

/// 序列化为 JSON 后写入
pub async fn put_json<T: Serialize + Sync>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
    options: PutOptions,
) -> Result<()> {
    let payload = serde_json::to_string(value).map_err(AppError::Serde)?;
    store.put(key, &payload, options).await
}
