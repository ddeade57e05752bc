//! Notification channels.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use trading_core::error::NotifyError;
use trading_core::traits::{CredentialProvider, Notifier};

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram bot channel posting to one chat.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Create a notifier for a bot token and chat.
    pub fn new(
        token: impl Into<String>,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::NotConfigured(e.to_string()))?;

        Ok(Self {
            client,
            api_base: TELEGRAM_API.to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
        })
    }

    /// Create a notifier reading the token and chat id from `credentials`.
    pub fn from_credentials(
        credentials: &dyn CredentialProvider,
        token_key: &str,
        chat_id_key: &str,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let token = credentials
            .require(token_key)
            .map_err(NotifyError::NotConfigured)?;
        let chat_id = credentials
            .require(chat_id_key)
            .map_err(NotifyError::NotConfigured)?;
        Self::new(token, chat_id, timeout)
    }

    /// Point at a different Bot API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn send_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.token
        )
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(self.send_url())
            .form(&[("chat_id", self.chat_id.as_str()), ("text", message)])
            .send()
            .await
            // reqwest errors carry the URL, which embeds the token.
            .map_err(|e| NotifyError::Delivery(e.without_url().to_string()))?;

        let status = resp.status();
        let body: TelegramResponse = resp
            .json()
            .await
            .map_err(|e| NotifyError::Delivery(format!("{}: {}", status, e.without_url())))?;

        if !body.ok {
            return Err(NotifyError::Delivery(
                body.description.unwrap_or_else(|| status.to_string()),
            ));
        }

        debug!("Telegram message delivered");
        Ok(())
    }
}

/// Channel that writes messages to the log. Used when Telegram is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        info!(target: "notify", "{}", message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading_core::traits::StaticCredentials;

    #[test]
    fn test_send_url() {
        let notifier = TelegramNotifier::new("123:abc", "42", Duration::from_secs(5))
            .unwrap()
            .with_api_base("http://localhost:9000/");
        assert_eq!(
            notifier.send_url(),
            "http://localhost:9000/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_from_credentials_requires_both() {
        let creds = StaticCredentials::new().with("TELEGRAM_BOT_TOKEN", "123:abc");
        let err = TelegramNotifier::from_credentials(
            &creds,
            "TELEGRAM_BOT_TOKEN",
            "TELEGRAM_CHAT_ID",
            Duration::from_secs(5),
        )
        .err()
        .unwrap();
        assert!(matches!(err, NotifyError::NotConfigured(msg) if msg.contains("TELEGRAM_CHAT_ID")));

        let creds = creds.with("TELEGRAM_CHAT_ID", "42");
        assert!(TelegramNotifier::from_credentials(
            &creds,
            "TELEGRAM_BOT_TOKEN",
            "TELEGRAM_CHAT_ID",
            Duration::from_secs(5),
        )
        .is_ok());
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        assert!(LogNotifier.notify("📊 Buy signal on EURUSDm").await.is_ok());
    }
}
