// 全局常量

use std::time::Duration;

/// 同一贷款同一档位的告警冷却时间（10 分钟）
pub const ALERT_COOLDOWN: Duration = Duration::from_secs(10 * 60);

/// 告警记录在存储中的保留时间（1 小时），必须大于冷却时间
pub const ALERT_RETENTION: Duration = Duration::from_secs(60 * 60);

/// 价格同步节流窗口（1 小时）
pub const PRICE_SYNC_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// 错误告警节流窗口（12 小时）
pub const ERROR_ALERT_COOLDOWN: Duration = Duration::from_secs(12 * 60 * 60);

pub const ALERT_KEY_PREFIX: &str = "alert:";
pub const LAST_PRICE_UPDATE_KEY: &str = "lastPriceUpdateTime";
pub const LAST_ERROR_ALERT_KEY: &str = "lastErrorAlertTime";

pub const DEFAULT_HF_WARN: f64 = 1.7;
pub const DEFAULT_HF_CRIT: f64 = 1.5;

pub const DEFAULT_LIQWID_API_URL: &str = "https://v2.api.liqwid.finance/graphql";
pub const DEFAULT_MONITOR_CRON: &str = "0 */5 * * * *";
pub const DEFAULT_FIRESTORE_COLLECTION: &str = "prices";
