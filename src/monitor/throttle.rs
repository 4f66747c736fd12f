//! 节流窗口：基于存储中一个毫秒时间戳标量判断周期性动作是否到期。
//!
//! 用于价格同步（`lastPriceUpdateTime`）和错误告警（`lastErrorAlertTime`）。

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use crate::store::{KvStore, PutOptions};
use crate::time_util::{duration_millis, elapsed_since, Clock};

pub struct ThrottleGate {
    store: Option<Arc<dyn KvStore>>,
    clock: Arc<dyn Clock>,
    key: String,
    window: Duration,
}

impl ThrottleGate {
    pub fn new(
        store: Option<Arc<dyn KvStore>>,
        clock: Arc<dyn Clock>,
        key: impl Into<String>,
        window: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            key: key.into(),
            window,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// 上次执行时间，无存储、不存在或解析失败时为 `None`
    pub async fn last_run(&self) -> Option<i64> {
        let store = self.store.as_ref()?;
        match store.get(&self.key).await {
            Ok(Some(raw)) => match raw.trim().parse::<i64>() {
                Ok(ts) => Some(ts),
                Err(e) => {
                    warn!(key = %self.key, raw = %raw, error = %e, "节流时间戳解析失败");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "读取节流时间戳失败");
                None
            }
        }
    }

    /// 窗口是否已过；从未执行或时间戳不可读时视为到期
    pub async fn is_due(&self) -> bool {
        let Some(last) = self.last_run().await else {
            return true;
        };
        match elapsed_since(self.clock.now_millis(), last) {
            Some(elapsed_ms) => {
                let due = elapsed_ms >= duration_millis(self.window);
                debug!(key = %self.key, elapsed_ms, due, "节流窗口判定");
                due
            }
            None => {
                warn!(key = %self.key, last, "节流时间戳超出范围，视为到期");
                true
            }
        }
    }

    /// 记录本次执行时间为当前时间
    pub async fn mark(&self) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let now = self.clock.now_millis();
        store
            .put(&self.key, &now.to_string(), PutOptions::default())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::time_util::ManualClock;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_window_elapsed() {
        let clock = Arc::new(ManualClock::new(10 * 3_600_000));
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let gate = ThrottleGate::new(
            Some(store.clone() as Arc<dyn KvStore>),
            clock.clone(),
            "lastPriceUpdateTime",
            HOUR,
        );

        assert!(gate.is_due().await, "从未执行应视为到期");

        gate.mark().await.unwrap();
        assert_eq!(gate.last_run().await, Some(clock.now_millis()));
        assert!(!gate.is_due().await);

        clock.advance(Duration::from_secs(55 * 60));
        assert!(!gate.is_due().await);

        clock.advance(Duration::from_secs(5 * 60));
        assert!(gate.is_due().await);
    }

    #[tokio::test]
    async fn test_unparseable_timestamp_is_due() {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(MemoryStore::new(clock.clone()));
        store
            .put("lastErrorAlertTime", "yesterday", PutOptions::default())
            .await
            .unwrap();
        let gate = ThrottleGate::new(
            Some(store as Arc<dyn KvStore>),
            clock,
            "lastErrorAlertTime",
            HOUR,
        );
        assert!(gate.is_due().await);
    }

    #[tokio::test]
    async fn test_extreme_timestamps_are_due() {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let gate = ThrottleGate::new(
            Some(store.clone() as Arc<dyn KvStore>),
            clock,
            "lastErrorAlertTime",
            Duration::from_secs(12 * 3600),
        );

        for raw in [i64::MIN.to_string(), i64::MAX.to_string()] {
            store
                .put("lastErrorAlertTime", &raw, PutOptions::default())
                .await
                .unwrap();
            assert!(gate.is_due().await, "{} 应视为到期", raw);
        }
    }

    #[tokio::test]
    async fn test_without_store_always_due() {
        let gate = ThrottleGate::new(None, Arc::new(ManualClock::new(0)), "k", HOUR);
        assert!(gate.is_due().await);
        gate.mark().await.unwrap();
        assert!(gate.is_due().await);
    }
}
