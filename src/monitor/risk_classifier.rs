use serde::{Deserialize, Serialize};

use crate::monitor::alert_manager::AlertLevel;

/// 健康因子风险档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskStatus {
    Safe,
    Warning,
    Critical,
}

impl RiskStatus {
    /// 需要告警的档位对应的告警级别，`Safe` 返回 `None`
    pub fn alert_level(self) -> Option<AlertLevel> {
        match self {
            RiskStatus::Safe => None,
            RiskStatus::Warning => Some(AlertLevel::Warning),
            RiskStatus::Critical => Some(AlertLevel::Critical),
        }
    }
}

/// 告警阈值，约定 `warn > crit > 0`（在配置层校验）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub warn: f64,
    pub crit: f64,
}

impl Thresholds {
    pub fn new(warn: f64, crit: f64) -> Self {
        Self { warn, crit }
    }

    pub fn classify(&self, health_factor: f64) -> RiskStatus {
        classify(health_factor, self.warn, self.crit)
    }
}

/// 按阈值对健康因子分级，先判 critical 再判 warning。
///
/// 阈值是更危险档位的开区间下界，等于阈值时落在更安全的一侧：
/// `hf == warn` 为 safe，`hf == crit` 为 warning。`+inf` 为 safe。
pub fn classify(health_factor: f64, warn: f64, crit: f64) -> RiskStatus {
    if health_factor < crit {
        RiskStatus::Critical
    } else if health_factor < warn {
        RiskStatus::Warning
    } else {
        RiskStatus::Safe
    }
}
