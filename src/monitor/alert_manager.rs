//! 告警冷却管理
//!
//! 每个贷款只保存一条最近告警记录 `alert:{loanId}`，按贷款而不是按（贷款, 档位）计冷却，
//! 档位随记录一起保存。warning → critical 的升级不受冷却限制。
//!
//! 所有存储异常都按 fail-open 处理：读不到或解析失败时允许发送，写入失败只记日志。

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::{ALERT_COOLDOWN, ALERT_KEY_PREFIX, ALERT_RETENTION};
use crate::store::{get_json, put_json, KvStore, PutOptions};
use crate::time_util::{duration_millis, elapsed_since, Clock};

/// 告警级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
    Error,
}

impl AlertLevel {
    /// 只有 warning / critical 参与冷却
    pub fn is_throttled(self) -> bool {
        matches!(self, AlertLevel::Warning | AlertLevel::Critical)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlertLevel::Info => "info",
            AlertLevel::Warning => "warning",
            AlertLevel::Critical => "critical",
            AlertLevel::Error => "error",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 最近一次告警记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub level: AlertLevel,
    /// 毫秒时间戳
    pub timestamp: i64,
    pub asset_symbol: String,
}

#[derive(Serialize)]
struct AlertMetadata {
    level: AlertLevel,
    timestamp: i64,
}

pub fn alert_key(loan_id: &str) -> String {
    format!("{}{}", ALERT_KEY_PREFIX, loan_id)
}

pub struct AlertManager {
    store: Option<Arc<dyn KvStore>>,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
    retention: Duration,
}

impl AlertManager {
    pub fn new(store: Option<Arc<dyn KvStore>>, clock: Arc<dyn Clock>) -> Self {
        Self::with_config(store, clock, ALERT_COOLDOWN, ALERT_RETENTION)
    }

    /// 自定义冷却与保留时间。保留时间不大于冷却时间时，过期的记录会被误判为“从未告警”
    pub fn with_config(
        store: Option<Arc<dyn KvStore>>,
        clock: Arc<dyn Clock>,
        cooldown: Duration,
        retention: Duration,
    ) -> Self {
        if store.is_none() {
            warn!("未配置持久化存储，告警冷却失效，所有告警都会发送");
        }
        if retention <= cooldown {
            warn!(
                ?cooldown,
                ?retention,
                "告警记录保留时间不大于冷却时间，冷却可能提前失效"
            );
        }
        Self {
            store,
            clock,
            cooldown,
            retention,
        }
    }

    /// 判断是否应发送告警
    pub async fn should_send_alert(
        &self,
        loan_id: &str,
        level: AlertLevel,
        asset_symbol: &str,
    ) -> bool {
        let Some(store) = &self.store else {
            return true;
        };
        if !level.is_throttled() {
            return true;
        }

        let key = alert_key(loan_id);
        let record = match get_json::<AlertRecord>(store.as_ref(), &key).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(loan_id, %level, asset_symbol, "无告警记录，允许发送");
                return true;
            }
            Err(e) => {
                warn!(loan_id, %level, error = %e, "读取告警记录失败，按允许发送处理");
                return true;
            }
        };

        if level == AlertLevel::Critical && record.level == AlertLevel::Warning {
            info!(loan_id, asset_symbol, "风险由 warning 升级为 critical，跳过冷却");
            return true;
        }

        let Some(elapsed_ms) = elapsed_since(self.clock.now_millis(), record.timestamp) else {
            warn!(
                loan_id,
                %level,
                timestamp = record.timestamp,
                "告警记录时间戳异常，按允许发送处理"
            );
            return true;
        };
        let allowed = elapsed_ms >= duration_millis(self.cooldown);
        debug!(
            loan_id,
            %level,
            last_level = %record.level,
            elapsed_ms,
            cooldown_ms = duration_millis(self.cooldown),
            allowed,
            "告警冷却判定"
        );
        allowed
    }

    /// 记录一次已发送的告警（尽力而为，失败只记日志）
    pub async fn record_alert(&self, loan_id: &str, level: AlertLevel, asset_symbol: &str) {
        let Some(store) = &self.store else {
            return;
        };
        if !level.is_throttled() {
            return;
        }

        let timestamp = self.clock.now_millis();
        let record = AlertRecord {
            level,
            timestamp,
            asset_symbol: asset_symbol.to_string(),
        };
        let mut options = PutOptions::with_ttl(self.retention);
        match serde_json::to_string(&AlertMetadata { level, timestamp }) {
            Ok(metadata) => options = options.metadata(metadata),
            Err(e) => warn!(loan_id, error = %e, "告警元数据序列化失败"),
        }

        let key = alert_key(loan_id);
        match put_json(store.as_ref(), &key, &record, options).await {
            Ok(()) => debug!(loan_id, %level, asset_symbol, "告警记录已写入"),
            Err(e) => warn!(loan_id, %level, error = %e, "写入告警记录失败"),
        }
    }

    /// 读取最近一次告警记录（诊断用），任何错误都返回 `None`
    pub async fn get_last_alert(&self, loan_id: &str) -> Option<AlertRecord> {
        let store = self.store.as_ref()?;
        match get_json::<AlertRecord>(store.as_ref(), &alert_key(loan_id)).await {
            Ok(record) => record,
            Err(e) => {
                warn!(loan_id, error = %e, "读取告警记录失败");
                None
            }
        }
    }
}
