//! cron 调度
//!
//! 上一个周期未结束时跳过本次触发，保证周期之间不重叠。

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};

use crate::job::LoanMonitorJob;

/// 启动时先执行一次，然后按 cron 表达式执行，直到收到 Ctrl+C
pub async fn serve(job: Arc<LoanMonitorJob>, cron: &str) -> Result<()> {
    let in_flight = Arc::new(Mutex::new(()));

    run_exclusive(&job, &in_flight).await;

    let mut scheduler = JobScheduler::new()
        .await
        .map_err(|e| anyhow!("创建调度器失败: {:?}", e))?;

    let cron_job = {
        let job = Arc::clone(&job);
        let in_flight = Arc::clone(&in_flight);
        Job::new_async(cron, move |_id, _scheduler| {
            let job = Arc::clone(&job);
            let in_flight = Arc::clone(&in_flight);
            Box::pin(async move {
                run_exclusive(&job, &in_flight).await;
            })
        })
        .map_err(|e| anyhow!("非法的 cron 表达式 {}: {:?}", cron, e))?
    };

    scheduler
        .add(cron_job)
        .await
        .map_err(|e| anyhow!("添加定时任务失败: {:?}", e))?;
    scheduler
        .start()
        .await
        .map_err(|e| anyhow!("启动调度器失败: {:?}", e))?;
    info!(cron, "贷款监控定时任务已启动");

    // 捕捉Ctrl+C信号以平滑关闭
    tokio::signal::ctrl_c().await?;
    info!("收到退出信号，正在关闭调度器...");
    scheduler
        .shutdown()
        .await
        .map_err(|e| anyhow!("关闭调度器失败: {:?}", e))?;

    // 等待进行中的周期结束
    let _guard = in_flight.lock().await;
    Ok(())
}

/// 已有周期在执行时直接返回
pub(crate) async fn run_exclusive(job: &LoanMonitorJob, in_flight: &Mutex<()>) -> bool {
    let Ok(_guard) = in_flight.try_lock() else {
        warn!("上一个监控周期仍在执行，跳过本次触发");
        return false;
    };
    job.run().await;
    true
}
