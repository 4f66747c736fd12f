//! 消息通道

pub mod message;
pub mod telegram;

use crate::monitor::AlertLevel;

pub use message::{format_error_alert, format_loan_alert, format_test_message};
pub use telegram::TelegramNotifier;

/// 消息发送接口
///
/// 返回 `false` 表示发送方自身重试后仍然失败，调用方只记录日志
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, level: AlertLevel, text: &str) -> bool;
}
