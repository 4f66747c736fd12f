mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{clock_and_store, BrokenStore};
use liqwid_sentinel::monitor::{AlertLevel, AlertManager, AlertRecord};
use liqwid_sentinel::store::{KvStore, PutOptions};
use liqwid_sentinel::time_util::{Clock, ManualClock};

const COOLDOWN: Duration = Duration::from_secs(10 * 60);

fn manager() -> (Arc<ManualClock>, AlertManager) {
    let (clock, store) = clock_and_store();
    let manager = AlertManager::new(Some(store as Arc<dyn KvStore>), clock.clone());
    (clock, manager)
}

#[tokio::test]
async fn test_first_alert_then_cooldown_then_allowed_again() {
    let (clock, manager) = manager();

    assert!(manager.should_send_alert("L1", AlertLevel::Warning, "ADA").await);
    manager.record_alert("L1", AlertLevel::Warning, "ADA").await;
    assert!(!manager.should_send_alert("L1", AlertLevel::Warning, "ADA").await);

    clock.advance(COOLDOWN - Duration::from_millis(1));
    assert!(!manager.should_send_alert("L1", AlertLevel::Warning, "ADA").await);

    clock.advance(Duration::from_millis(1));
    assert!(manager.should_send_alert("L1", AlertLevel::Warning, "ADA").await);
}

#[tokio::test]
async fn test_escalation_bypasses_cooldown() {
    let (clock, manager) = manager();
    manager.record_alert("L1", AlertLevel::Warning, "ADA").await;

    assert!(manager.should_send_alert("L1", AlertLevel::Critical, "ADA").await);
    clock.advance(Duration::from_secs(1));
    assert!(manager.should_send_alert("L1", AlertLevel::Critical, "ADA").await);
}

#[tokio::test]
async fn test_repeated_critical_is_throttled() {
    let (clock, manager) = manager();
    manager.record_alert("L1", AlertLevel::Critical, "ADA").await;

    assert!(!manager.should_send_alert("L1", AlertLevel::Critical, "ADA").await);
    clock.advance(COOLDOWN);
    assert!(manager.should_send_alert("L1", AlertLevel::Critical, "ADA").await);
}

/// 降级（critical → warning）没有专门规则，按最近一条 critical 记录走普通冷却判断
#[tokio::test]
async fn test_deescalation_falls_through_to_elapsed_time() {
    let (clock, manager) = manager();
    manager.record_alert("L1", AlertLevel::Critical, "ADA").await;

    assert!(!manager.should_send_alert("L1", AlertLevel::Warning, "ADA").await);
    clock.advance(COOLDOWN);
    assert!(manager.should_send_alert("L1", AlertLevel::Warning, "ADA").await);
}

#[tokio::test]
async fn test_cooldown_is_per_loan() {
    let (_clock, manager) = manager();
    manager.record_alert("L1", AlertLevel::Warning, "ADA").await;

    assert!(!manager.should_send_alert("L1", AlertLevel::Warning, "ADA").await);
    assert!(manager.should_send_alert("L2", AlertLevel::Warning, "ADA").await);
}

#[tokio::test]
async fn test_record_overwrites_previous() {
    let (clock, manager) = manager();
    manager.record_alert("L1", AlertLevel::Warning, "ADA").await;
    clock.advance(Duration::from_secs(30));
    manager.record_alert("L1", AlertLevel::Critical, "ADA").await;

    assert_eq!(
        manager.get_last_alert("L1").await,
        Some(AlertRecord {
            level: AlertLevel::Critical,
            timestamp: clock.now_millis(),
            asset_symbol: "ADA".to_string(),
        })
    );
}

#[tokio::test]
async fn test_without_store_fails_open() {
    let manager = AlertManager::new(None, Arc::new(ManualClock::new(0)));

    manager.record_alert("L1", AlertLevel::Critical, "ADA").await;
    for level in [
        AlertLevel::Info,
        AlertLevel::Warning,
        AlertLevel::Critical,
        AlertLevel::Error,
    ] {
        assert!(manager.should_send_alert("L1", level, "ADA").await);
    }
    assert_eq!(manager.get_last_alert("L1").await, None);
}

#[tokio::test]
async fn test_broken_store_fails_open() {
    let manager = AlertManager::new(
        Some(Arc::new(BrokenStore) as Arc<dyn KvStore>),
        Arc::new(ManualClock::new(0)),
    );

    manager.record_alert("L1", AlertLevel::Warning, "ADA").await;
    assert!(manager.should_send_alert("L1", AlertLevel::Warning, "ADA").await);
    assert_eq!(manager.get_last_alert("L1").await, None);
}

#[tokio::test]
async fn test_minimum_timestamp_record_does_not_block_alert() {
    let (clock, store) = clock_and_store();
    let manager = AlertManager::new(Some(store.clone() as Arc<dyn KvStore>), clock);
    let raw = format!(
        r#"{{"level":"warning","timestamp":{},"assetSymbol":"ADA"}}"#,
        i64::MIN
    );
    store
        .put("alert:L1", &raw, PutOptions::default())
        .await
        .unwrap();

    assert!(manager.should_send_alert("L1", AlertLevel::Warning, "ADA").await);
    assert!(manager.should_send_alert("L1", AlertLevel::Critical, "ADA").await);

    manager.record_alert("L1", AlertLevel::Warning, "ADA").await;
    assert!(!manager.should_send_alert("L1", AlertLevel::Warning, "ADA").await);
}
