#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use liqwid_sentinel::liqwid::{AssetPrice, LoanSnapshot, LoanSource};
use liqwid_sentinel::mirror::PriceMirror;
use liqwid_sentinel::monitor::AlertLevel;
use liqwid_sentinel::notification::Notifier;
use liqwid_sentinel::store::{KvStore, MemoryStore, PutOptions};
use liqwid_sentinel::time_util::ManualClock;

pub const START: i64 = 1_700_000_000_000;

pub fn clock_and_store() -> (Arc<ManualClock>, Arc<MemoryStore>) {
    let clock = Arc::new(ManualClock::new(START));
    let store = Arc::new(MemoryStore::new(clock.clone()));
    (clock, store)
}

/// 可替换返回值的贷款数据源
pub struct FakeLoanSource {
    loans: Mutex<Result<Vec<LoanSnapshot>, String>>,
    prices: Mutex<Vec<AssetPrice>>,
    pub price_requests: Mutex<Vec<Vec<String>>>,
}

impl FakeLoanSource {
    pub fn with_loans(loans: Vec<LoanSnapshot>) -> Self {
        Self {
            loans: Mutex::new(Ok(loans)),
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            loans: Mutex::new(Err(message.to_string())),
            ..Default::default()
        }
    }

    pub fn set_loans(&self, loans: Vec<LoanSnapshot>) {
        *self.loans.lock().unwrap() = Ok(loans);
    }

    pub fn set_prices(&self, prices: Vec<AssetPrice>) {
        *self.prices.lock().unwrap() = prices;
    }
}

impl Default for FakeLoanSource {
    fn default() -> Self {
        Self {
            loans: Mutex::new(Ok(Vec::new())),
            prices: Mutex::new(Vec::new()),
            price_requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl LoanSource for FakeLoanSource {
    async fn fetch_loans(&self, _account_id: &str) -> Result<Vec<LoanSnapshot>> {
        self.loans.lock().unwrap().clone().map_err(|e| anyhow!(e))
    }

    async fn fetch_prices(&self, symbols: &[String]) -> Result<Vec<AssetPrice>> {
        self.price_requests.lock().unwrap().push(symbols.to_vec());
        Ok(self
            .prices
            .lock()
            .unwrap()
            .iter()
            .filter(|p| symbols.contains(&p.symbol))
            .cloned()
            .collect())
    }
}

/// 记录所有发送的消息，可模拟发送失败
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(AlertLevel, String)>>,
    /// 文本包含该子串时返回 false
    pub fail_when_contains: Mutex<Option<String>>,
}

impl RecordingNotifier {
    pub fn levels(&self) -> Vec<AlertLevel> {
        self.sent.lock().unwrap().iter().map(|(l, _)| *l).collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn fail_on(&self, needle: &str) {
        *self.fail_when_contains.lock().unwrap() = Some(needle.to_string());
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, level: AlertLevel, text: &str) -> bool {
        if let Some(needle) = self.fail_when_contains.lock().unwrap().as_deref() {
            if text.contains(needle) {
                return false;
            }
        }
        self.sent.lock().unwrap().push((level, text.to_string()));
        true
    }
}

#[derive(Default)]
pub struct FakeMirror {
    pub symbols: Vec<String>,
    pub fail_push: bool,
    pub pushed: Mutex<Vec<(Vec<AssetPrice>, i64)>>,
}

#[async_trait::async_trait]
impl PriceMirror for FakeMirror {
    async fn list_symbols(&self) -> Result<Vec<String>> {
        Ok(self.symbols.clone())
    }

    async fn push_prices(&self, prices: &[AssetPrice], updated_at_ms: i64) -> Result<()> {
        if self.fail_push {
            return Err(anyhow!("mirror unavailable"));
        }
        self.pushed
            .lock()
            .unwrap()
            .push((prices.to_vec(), updated_at_ms));
        Ok(())
    }
}

/// 读写都失败的存储
pub struct BrokenStore;

#[async_trait::async_trait]
impl KvStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(anyhow!("store read failed"))
    }

    async fn put(&self, _key: &str, _value: &str, _options: PutOptions) -> Result<()> {
        Err(anyhow!("store write failed"))
    }
}
