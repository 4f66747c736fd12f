//! 贷款风险监控任务
//!
//! 单次周期：拉取贷款 → 分级 → 冷却判定 → 发送 → 记录 → 价格同步（节流）。
//! 周期内任何未处理错误都走节流后的错误告警，`run` 本身从不返回错误。

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::constants::{
    ALERT_COOLDOWN, ALERT_RETENTION, ERROR_ALERT_COOLDOWN, LAST_ERROR_ALERT_KEY,
    LAST_PRICE_UPDATE_KEY, PRICE_SYNC_INTERVAL,
};
use crate::liqwid::{LoanSnapshot, LoanSource};
use crate::mirror::PriceMirror;
use crate::monitor::{AlertLevel, AlertManager, RiskStatus, ThrottleGate, Thresholds};
use crate::notification::{format_error_alert, format_loan_alert, Notifier};
use crate::store::KvStore;
use crate::time_util::Clock;

/// 监控参数
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub account_id: String,
    pub thresholds: Thresholds,
    pub alert_cooldown: Duration,
    pub alert_retention: Duration,
    pub price_sync_interval: Duration,
    pub error_alert_cooldown: Duration,
}

impl MonitorSettings {
    pub fn new(account_id: impl Into<String>, thresholds: Thresholds) -> Self {
        Self {
            account_id: account_id.into(),
            thresholds,
            alert_cooldown: ALERT_COOLDOWN,
            alert_retention: ALERT_RETENTION,
            price_sync_interval: PRICE_SYNC_INTERVAL,
            error_alert_cooldown: ERROR_ALERT_COOLDOWN,
        }
    }
}

/// 单个周期的执行结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub loans_checked: usize,
    pub safe: usize,
    pub warnings: usize,
    pub criticals: usize,
    pub alerts_sent: usize,
    pub alerts_suppressed: usize,
    pub dispatch_failures: usize,
    /// 本周期同步的价格数量，未执行同步为 `None`
    pub prices_synced: Option<usize>,
    pub error: Option<String>,
}

impl CycleReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "贷款 {} 个 (safe {}, warning {}, critical {}), 告警发送 {} 条, 冷却抑制 {} 条, 发送失败 {} 条",
            self.loans_checked,
            self.safe,
            self.warnings,
            self.criticals,
            self.alerts_sent,
            self.alerts_suppressed,
            self.dispatch_failures
        )?;
        if let Some(count) = self.prices_synced {
            write!(f, ", 价格同步 {} 个", count)?;
        }
        if let Some(err) = &self.error {
            write!(f, ", 错误: {}", err)?;
        }
        Ok(())
    }
}

enum LoanOutcome {
    Safe,
    Sent,
    Suppressed,
    DispatchFailed,
}

pub struct LoanMonitorJob {
    settings: MonitorSettings,
    loan_source: Arc<dyn LoanSource>,
    notifier: Arc<dyn Notifier>,
    price_mirror: Option<Arc<dyn PriceMirror>>,
    alert_manager: AlertManager,
    price_gate: ThrottleGate,
    error_gate: ThrottleGate,
    clock: Arc<dyn Clock>,
}

impl LoanMonitorJob {
    pub fn new(
        settings: MonitorSettings,
        loan_source: Arc<dyn LoanSource>,
        notifier: Arc<dyn Notifier>,
        store: Option<Arc<dyn KvStore>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let alert_manager = AlertManager::with_config(
            store.clone(),
            clock.clone(),
            settings.alert_cooldown,
            settings.alert_retention,
        );
        let price_gate = ThrottleGate::new(
            store.clone(),
            clock.clone(),
            LAST_PRICE_UPDATE_KEY,
            settings.price_sync_interval,
        );
        let error_gate = ThrottleGate::new(
            store,
            clock.clone(),
            LAST_ERROR_ALERT_KEY,
            settings.error_alert_cooldown,
        );
        Self {
            settings,
            loan_source,
            notifier,
            price_mirror: None,
            alert_manager,
            price_gate,
            error_gate,
            clock,
        }
    }

    /// 配置价格镜像；未配置时跳过价格同步
    pub fn with_price_mirror(mut self, mirror: Arc<dyn PriceMirror>) -> Self {
        self.price_mirror = Some(mirror);
        self
    }

    pub fn alert_manager(&self) -> &AlertManager {
        &self.alert_manager
    }

    /// 执行一个监控周期
    pub async fn run(&self) -> CycleReport {
        let span = info_span!("loan_monitor", run_id = %Uuid::new_v4());
        async {
            info!(account_id = %self.settings.account_id, "🔍 开始贷款风险监控...");
            let mut report = CycleReport::default();

            if let Err(e) = self.run_cycle(&mut report).await {
                error!(error = ?e, "监控周期执行失败");
                report.error = Some(format!("{:#}", e));
                self.report_failure(&e).await;
            }

            info!(
                loans = report.loans_checked,
                sent = report.alerts_sent,
                suppressed = report.alerts_suppressed,
                failed = report.dispatch_failures,
                prices = ?report.prices_synced,
                "✅ 监控周期完成: {}",
                report
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn run_cycle(&self, report: &mut CycleReport) -> Result<()> {
        let loans = self
            .loan_source
            .fetch_loans(&self.settings.account_id)
            .await
            .context("获取贷款数据失败")?;

        for loan in &loans {
            report.loans_checked += 1;
            let status = self.settings.thresholds.classify(loan.health_factor);
            match status {
                RiskStatus::Safe => report.safe += 1,
                RiskStatus::Warning => report.warnings += 1,
                RiskStatus::Critical => report.criticals += 1,
            }
            match self.evaluate_loan(loan, status).await {
                LoanOutcome::Safe => {}
                LoanOutcome::Sent => report.alerts_sent += 1,
                LoanOutcome::Suppressed => report.alerts_suppressed += 1,
                LoanOutcome::DispatchFailed => report.dispatch_failures += 1,
            }
        }

        report.prices_synced = self.sync_prices_if_due().await?;
        Ok(())
    }

    /// 单个贷款的判定与发送，失败不影响其他贷款
    async fn evaluate_loan(&self, loan: &LoanSnapshot, status: RiskStatus) -> LoanOutcome {
        let Some(level) = status.alert_level() else {
            debug!(loan_id = %loan.id, health_factor = loan.health_factor, "贷款安全");
            return LoanOutcome::Safe;
        };

        if !self
            .alert_manager
            .should_send_alert(&loan.id, level, &loan.asset_symbol)
            .await
        {
            info!(
                loan_id = %loan.id,
                %level,
                health_factor = loan.health_factor,
                "告警冷却中，跳过发送"
            );
            return LoanOutcome::Suppressed;
        }

        let text = format_loan_alert(loan, level, &self.settings.thresholds);
        if !self.notifier.send(level, &text).await {
            warn!(loan_id = %loan.id, %level, "告警发送失败");
            return LoanOutcome::DispatchFailed;
        }

        self.alert_manager
            .record_alert(&loan.id, level, &loan.asset_symbol)
            .await;
        info!(
            loan_id = %loan.id,
            %level,
            health_factor = loan.health_factor,
            asset = %loan.asset_symbol,
            "告警已发送"
        );
        LoanOutcome::Sent
    }

    /// 价格同步：节流窗口到期才执行，只有全部写入成功才更新时间戳
    async fn sync_prices_if_due(&self) -> Result<Option<usize>> {
        let Some(mirror) = &self.price_mirror else {
            debug!("未配置价格镜像，跳过价格同步");
            return Ok(None);
        };
        if !self.price_gate.is_due().await {
            debug!("价格同步未到期");
            return Ok(None);
        }

        let symbols = mirror.list_symbols().await.context("获取镜像资产列表失败")?;
        let prices = self
            .loan_source
            .fetch_prices(&symbols)
            .await
            .context("获取资产价格失败")?;
        mirror
            .push_prices(&prices, self.clock.now_millis())
            .await
            .context("写入价格镜像失败")?;

        if let Err(e) = self.price_gate.mark().await {
            warn!(error = %e, key = self.price_gate.key(), "更新价格同步时间失败");
        }
        info!(count = prices.len(), "价格同步完成");
        Ok(Some(prices.len()))
    }

    /// 发送错误告警，冷却窗口内只发一次
    async fn report_failure(&self, err: &anyhow::Error) {
        if !self.error_gate.is_due().await {
            info!("错误告警冷却中，跳过发送");
            return;
        }

        let text = format_error_alert(
            &format!("{:#}", err),
            self.settings.error_alert_cooldown,
        );
        if self.notifier.send(AlertLevel::Error, &text).await {
            if let Err(e) = self.error_gate.mark().await {
                warn!(error = %e, key = self.error_gate.key(), "更新错误告警时间失败");
            }
        } else {
            warn!("错误告警发送失败");
        }
    }
}
