// 告警消息模板（Telegram Markdown）

use std::time::Duration;

use crate::liqwid::LoanSnapshot;
use crate::monitor::{AlertLevel, Thresholds};

/// 错误详情截断长度
const MAX_ERROR_LEN: usize = 500;

fn level_header(level: AlertLevel) -> &'static str {
    match level {
        AlertLevel::Info => "ℹ️ *通知*",
        AlertLevel::Warning => "⚠️ *健康因子预警*",
        AlertLevel::Critical => "🚨 *清算风险告警*",
        AlertLevel::Error => "❌ *监控异常*",
    }
}

pub fn format_health_factor(health_factor: f64) -> String {
    if health_factor.is_infinite() && health_factor > 0.0 {
        "∞".to_string()
    } else {
        format!("{:.2}", health_factor)
    }
}

/// 贷款告警消息
pub fn format_loan_alert(loan: &LoanSnapshot, level: AlertLevel, thresholds: &Thresholds) -> String {
    let threshold = match level {
        AlertLevel::Critical => thresholds.crit,
        _ => thresholds.warn,
    };
    format!(
        "{}\n\n\
         *贷款*: `{}`\n\
         *资产*: {}\n\
         *健康因子*: {}\n\
         *阈值*: < {}\n",
        level_header(level),
        strip_markdown(&loan.id),
        strip_markdown(&loan.asset_symbol),
        format_health_factor(loan.health_factor),
        threshold,
    )
}

/// 监控周期失败消息，`quiet_for` 为错误告警冷却时间
pub fn format_error_alert(error: &str, quiet_for: Duration) -> String {
    format!(
        "{}\n\n监控周期执行失败，{}内不再重复提醒。\n\n`{}`",
        level_header(AlertLevel::Error),
        describe_window(quiet_for),
        truncate(&strip_markdown(error), MAX_ERROR_LEN)
    )
}

fn describe_window(window: Duration) -> String {
    let secs = window.as_secs();
    if secs >= 3600 && secs % 3600 == 0 {
        format!("{} 小时", secs / 3600)
    } else if secs >= 60 {
        format!("{} 分钟", secs / 60)
    } else {
        format!("{} 秒", secs)
    }
}

pub fn format_test_message(account_id: &str) -> String {
    format!(
        "{}\n\n消息通道测试，监控账户: `{}`",
        level_header(AlertLevel::Info),
        strip_markdown(account_id)
    )
}

/// 去掉会破坏 Markdown 解析的字符
fn strip_markdown(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '`' | '*' | '_' | '['))
        .collect()
}

/// 按字符边界截断
fn truncate(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let mut end = max_len;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_alert_uses_crit_threshold() {
        let loan = LoanSnapshot::new("L1", 1.4, "ADA");
        let text = format_loan_alert(&loan, AlertLevel::Critical, &Thresholds::new(1.7, 1.5));
        assert!(text.starts_with("🚨"));
        assert!(text.contains("`L1`"));
        assert!(text.contains("*健康因子*: 1.40\n"));
        assert!(text.contains("< 1.5"));
    }

    #[test]
    fn test_health_factor_formatting() {
        assert_eq!(format_health_factor(f64::INFINITY), "∞");
        assert_eq!(format_health_factor(1.23456), "1.23");
        assert_eq!(format_health_factor(1.4), "1.40");
    }

    #[test]
    fn test_error_alert_names_configured_window() {
        let text = format_error_alert("boom", Duration::from_secs(6 * 3600));
        assert!(text.contains("6 小时内不再重复提醒"));
        assert!(!text.contains("12 小时"));
        assert_eq!(describe_window(Duration::from_secs(90 * 60)), "90 分钟");
        assert_eq!(describe_window(Duration::from_secs(30)), "30 秒");
    }

    #[test]
    fn test_error_alert_is_sanitized_and_truncated() {
        let err = format!("bad_*`{}", "错".repeat(400));
        let text = format_error_alert(&err, Duration::from_secs(12 * 3600));
        assert!(text.contains("12 小时内"));
        assert!(text.contains("bad"));
        assert!(!text.contains("bad_"));
        assert!(text.ends_with("…`"));
    }
}
