//! 定时任务

pub mod loan_monitor_job;
pub mod scheduler;

pub use loan_monitor_job::{CycleReport, LoanMonitorJob, MonitorSettings};
pub use scheduler::serve;
