use std::sync::Arc;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use tracing::info;

use liqwid_sentinel::app::bootstrap;
use liqwid_sentinel::app_config::log::{setup_logging, LogConfig};
use liqwid_sentinel::app_config::AppSettings;
use liqwid_sentinel::job;
use liqwid_sentinel::monitor::AlertLevel;
use liqwid_sentinel::notification::{format_test_message, Notifier};
use liqwid_sentinel::time_util::mill_time_to_datetime;

#[derive(Parser)]
#[command(author, version, about = "Liqwid 借贷健康因子监控", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 执行一次监控周期（供外部 cron 触发）
    Run,
    /// 按 MONITOR_CRON 持续调度，Ctrl+C 退出
    Serve,
    /// 查看某个贷款最近一次告警记录
    LastAlert {
        loan_id: String,
    },
    /// 发送一条测试消息
    TestNotify,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    setup_logging(&LogConfig::from_env())?;

    let cli = Cli::parse();
    let settings = AppSettings::from_env()?;
    info!(
        account_id = %settings.monitor.account_id,
        warn = settings.monitor.thresholds.warn,
        crit = settings.monitor.thresholds.crit,
        "配置加载完成"
    );

    match cli.command {
        Commands::Run => {
            let job = bootstrap::build_job(&settings).await;
            let report = job.run().await;
            println!("{}", report);
        }
        Commands::Serve => {
            let monitor_job = Arc::new(bootstrap::build_job(&settings).await);
            job::serve(monitor_job, &settings.monitor_cron).await?;
        }
        Commands::LastAlert { loan_id } => {
            let job = bootstrap::build_job(&settings).await;
            match job.alert_manager().get_last_alert(&loan_id).await {
                Some(record) => {
                    let at = mill_time_to_datetime(record.timestamp)
                        .unwrap_or_else(|_| record.timestamp.to_string());
                    println!(
                        "{} {} {} @ {}",
                        loan_id, record.level, record.asset_symbol, at
                    );
                }
                None => println!("{} 无告警记录", loan_id),
            }
        }
        Commands::TestNotify => {
            let notifier = bootstrap::build_notifier(&settings);
            let text = format_test_message(&settings.monitor.account_id);
            if !notifier.send(AlertLevel::Info, &text).await {
                return Err(anyhow!("测试消息发送失败"));
            }
            println!("测试消息已发送");
        }
    }

    Ok(())
}
