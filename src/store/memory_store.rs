//! 内存存储实现（DashMap），过期时间由注入的时钟判断

use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;

use crate::store::kv_store::{KvStore, PutOptions};
use crate::time_util::{duration_millis, Clock};

#[derive(Clone, Debug)]
struct StoreEntry {
    value: String,
    metadata: Option<String>,
    expire_at: Option<i64>,
}

pub struct MemoryStore {
    map: DashMap<String, StoreEntry>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            map: DashMap::new(),
            clock,
        }
    }

    /// 读取元数据（诊断用）
    pub fn metadata(&self, key: &str) -> Option<String> {
        self.live_entry(key).and_then(|entry| entry.metadata)
    }

    /// 剩余存活毫秒数，无 TTL 时返回 `None`
    pub fn ttl_millis(&self, key: &str) -> Option<i64> {
        let now = self.clock.now_millis();
        self.live_entry(key)
            .and_then(|entry| entry.expire_at)
            .map(|expire_at| expire_at - now)
    }

    pub fn len(&self) -> usize {
        let now = self.clock.now_millis();
        self.map
            .iter()
            .filter(|entry| !Self::is_expired(entry.value(), now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(entry: &StoreEntry, now: i64) -> bool {
        matches!(entry.expire_at, Some(expire_at) if now >= expire_at)
    }

    fn live_entry(&self, key: &str) -> Option<StoreEntry> {
        let now = self.clock.now_millis();
        let entry = self.map.get(key)?.value().clone();
        if Self::is_expired(&entry, now) {
            // 过期则删除
            self.map.remove(key);
            return None;
        }
        Some(entry)
    }
}

#[async_trait::async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.live_entry(key).map(|entry| entry.value))
    }

    async fn put(&self, key: &str, value: &str, options: PutOptions) -> Result<()> {
        let expire_at = options
            .expiration_ttl
            .map(|ttl| self.clock.now_millis() + duration_millis(ttl));

        self.map.insert(
            key.to_string(),
            StoreEntry {
                value: value.to_string(),
                metadata: options.metadata,
                expire_at,
            },
        );
        Ok(())
    }
}
