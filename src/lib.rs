//! # Liqwid Sentinel
//!
//! 定时轮询 Liqwid 借贷仓位的健康因子，按阈值分级告警并去重，
//! 同时以较慢节奏把资产价格同步到外部文档数据库。
//!
//! ## 模块
//!
//! - `monitor`: 风险分级、告警冷却、节流窗口
//! - `job`: 单次监控周期编排与定时调度
//! - `store` / `liqwid` / `notification` / `mirror`: 外部协作方的接口与实现
//! - `app_config`: 环境变量配置、日志、Redis

pub mod app;
pub mod app_config;
pub mod constants;
pub mod error;
pub mod job;
pub mod liqwid;
pub mod mirror;
pub mod monitor;
pub mod notification;
pub mod store;
pub mod time_util;

pub use error::{AppError, AppResult};
pub use job::{CycleReport, LoanMonitorJob, MonitorSettings};
pub use monitor::{classify, AlertLevel, AlertManager, AlertRecord, RiskStatus, Thresholds};
