use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::monitor::AlertLevel;
use crate::notification::Notifier;

/// 限流/5xx 最多重试次数
const MAX_RETRIES: usize = 4;
const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Telegram Bot 通知服务
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug)]
enum SendFailure {
    /// 429 或 5xx，可重试
    Retryable(String),
    Fatal(String),
}

impl SendFailure {
    fn is_retryable(&self) -> bool {
        matches!(self, SendFailure::Retryable(_))
    }

    fn message(&self) -> &str {
        match self {
            SendFailure::Retryable(msg) | SendFailure::Fatal(msg) => msg,
        }
    }
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: "https://api.telegram.org".to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    async fn send_once(&self, text: &str) -> Result<(), SendFailure> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SendFailure::Retryable(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let detail = format!("Telegram API error: {} - {}", status, body);
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            warn!("{}, 准备重试", detail);
            Err(SendFailure::Retryable(detail))
        } else {
            Err(SendFailure::Fatal(detail))
        }
    }

    /// 发送文本消息 (Markdown 格式)，限流和 5xx 按指数退避重试
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(500)
            .max_delay(MAX_RETRY_DELAY)
            .map(jitter)
            .take(MAX_RETRIES);

        RetryIf::start(strategy, || self.send_once(text), SendFailure::is_retryable)
            .await
            .map_err(|e| AppError::Notification(e.message().to_string()).into())
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, level: AlertLevel, text: &str) -> bool {
        match self.send_message(text).await {
            Ok(()) => {
                info!(%level, "📨 Telegram message sent successfully");
                true
            }
            Err(e) => {
                error!(%level, error = %e, "Failed to send Telegram message");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classification() {
        assert!(SendFailure::Retryable("429".into()).is_retryable());
        assert!(!SendFailure::Fatal("400".into()).is_retryable());
        assert_eq!(SendFailure::Fatal("bad request".into()).message(), "bad request");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_returns_false() {
        let mut notifier = TelegramNotifier::new("token", "chat");
        // 保留端口，连接会被立即拒绝
        notifier.api_base = "http://127.0.0.1:9".to_string();
        let sent = tokio::time::timeout(
            Duration::from_secs(60),
            notifier.send(AlertLevel::Info, "hello"),
        )
        .await
        .expect("retries are bounded");
        assert!(!sent);
    }
}
