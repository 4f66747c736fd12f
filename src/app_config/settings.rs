//! 应用配置
//!
//! 从环境变量（支持 .env）加载并在此处完成校验，监控核心不再重复校验。

use std::env;

use crate::app_config::env::{env_f64, env_non_empty, env_or_default, env_required};
use crate::constants::{
    DEFAULT_FIRESTORE_COLLECTION, DEFAULT_HF_CRIT, DEFAULT_HF_WARN, DEFAULT_LIQWID_API_URL,
    DEFAULT_MONITOR_CRON,
};
use crate::error::{AppError, AppResult};
use crate::job::MonitorSettings;
use crate::monitor::Thresholds;

#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone)]
pub struct RedisSettings {
    pub url: String,
    pub key_prefix: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FirestoreSettings {
    pub project_id: String,
    pub api_key: String,
    pub collection: String,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub monitor: MonitorSettings,
    pub liqwid_api_url: String,
    pub telegram: TelegramSettings,
    /// 未配置时告警冷却 fail-open
    pub redis: Option<RedisSettings>,
    /// 未配置时跳过价格同步
    pub firestore: Option<FirestoreSettings>,
    pub monitor_cron: String,
}

impl AppSettings {
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let account_id = env_required(&lookup, "ACCOUNT_ID")?;
        let thresholds = Thresholds::new(
            env_f64(&lookup, "HF_WARN", DEFAULT_HF_WARN)?,
            env_f64(&lookup, "HF_CRIT", DEFAULT_HF_CRIT)?,
        );
        validate_thresholds(&thresholds)?;

        let telegram = TelegramSettings {
            bot_token: env_required(&lookup, "TELEGRAM_BOT_TOKEN")?,
            chat_id: env_required(&lookup, "TELEGRAM_CHAT_ID")?,
        };

        let redis = env_non_empty(&lookup, "REDIS_HOST").map(|url| RedisSettings {
            url,
            key_prefix: env_non_empty(&lookup, "REDIS_KEY_PREFIX"),
        });

        let firestore = match (
            env_non_empty(&lookup, "FIRESTORE_PROJECT_ID"),
            env_non_empty(&lookup, "FIRESTORE_API_KEY"),
        ) {
            (Some(project_id), Some(api_key)) => Some(FirestoreSettings {
                project_id,
                api_key,
                collection: env_or_default(
                    &lookup,
                    "FIRESTORE_COLLECTION",
                    DEFAULT_FIRESTORE_COLLECTION,
                ),
            }),
            (None, None) => None,
            _ => {
                return Err(AppError::Config(
                    "FIRESTORE_PROJECT_ID 与 FIRESTORE_API_KEY 需同时配置".to_string(),
                ))
            }
        };

        Ok(Self {
            monitor: MonitorSettings::new(account_id, thresholds),
            liqwid_api_url: env_or_default(&lookup, "LIQWID_API_URL", DEFAULT_LIQWID_API_URL),
            telegram,
            redis,
            firestore,
            monitor_cron: env_or_default(&lookup, "MONITOR_CRON", DEFAULT_MONITOR_CRON),
        })
    }
}

/// 阈值必须有限、为正且 `HF_CRIT < HF_WARN`
pub fn validate_thresholds(thresholds: &Thresholds) -> AppResult<()> {
    let Thresholds { warn, crit } = *thresholds;
    if !warn.is_finite() || !crit.is_finite() || crit <= 0.0 {
        return Err(AppError::Config(format!(
            "阈值必须为有限正数: HF_WARN={}, HF_CRIT={}",
            warn, crit
        )));
    }
    if crit >= warn {
        return Err(AppError::Config(format!(
            "HF_CRIT ({}) 必须小于 HF_WARN ({})",
            crit, warn
        )));
    }
    Ok(())
}
