use std::sync::Arc;

use tracing::{error, info, warn};

use crate::app_config::AppSettings;
use crate::job::LoanMonitorJob;
use crate::liqwid::LiqwidClient;
use crate::mirror::FirestoreMirror;
use crate::notification::TelegramNotifier;
use crate::store::{KvStore, RedisStore};
use crate::time_util::SystemClock;

/// 连接持久化存储；未配置或连接失败时返回 `None`，冷却按 fail-open 处理
pub async fn connect_store(settings: &AppSettings) -> Option<Arc<dyn KvStore>> {
    let Some(redis) = &settings.redis else {
        warn!("未配置 REDIS_HOST，告警冷却与节流将失效");
        return None;
    };
    match RedisStore::connect(&redis.url, redis.key_prefix.clone()).await {
        Ok(store) => {
            info!("Redis 存储已连接");
            Some(Arc::new(store))
        }
        Err(e) => {
            error!(error = %e, "Redis 连接失败，按无存储模式运行");
            None
        }
    }
}

pub fn build_notifier(settings: &AppSettings) -> Arc<TelegramNotifier> {
    Arc::new(TelegramNotifier::new(
        settings.telegram.bot_token.clone(),
        settings.telegram.chat_id.clone(),
    ))
}

/// 按配置组装监控任务
pub async fn build_job(settings: &AppSettings) -> LoanMonitorJob {
    let store = connect_store(settings).await;
    let job = LoanMonitorJob::new(
        settings.monitor.clone(),
        Arc::new(LiqwidClient::new(settings.liqwid_api_url.clone())),
        build_notifier(settings),
        store,
        Arc::new(SystemClock),
    );

    match &settings.firestore {
        Some(firestore) => {
            info!(collection = %firestore.collection, "价格镜像已启用");
            job.with_price_mirror(Arc::new(FirestoreMirror::new(
                &firestore.project_id,
                firestore.collection.clone(),
                firestore.api_key.clone(),
            )))
        }
        None => {
            info!("未配置 Firestore，跳过价格同步");
            job
        }
    }
}
