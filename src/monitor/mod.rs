//! 风险判定与告警去重

pub mod alert_manager;
pub mod risk_classifier;
pub mod throttle;

pub use alert_manager::{alert_key, AlertLevel, AlertManager, AlertRecord};
pub use risk_classifier::{classify, RiskStatus, Thresholds};
pub use throttle::ThrottleGate;
