//! Telegram Bot API notifier

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::config::TelegramCredentials;
use crate::error::NotifyError;
use crate::notify::Notifier;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Sends messages to one chat through a bot
pub struct TelegramNotifier {
    client: reqwest::Client,
    bot_token: SecretString,
    chat_id: String,
    base_url: String,
}

impl TelegramNotifier {
    pub fn new(credentials: TelegramCredentials) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            bot_token: credentials.bot_token,
            chat_id: credentials.chat_id,
            base_url: DEFAULT_API_BASE.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.base_url,
            self.bot_token.expose_secret()
        )
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        let form = [("chat_id", self.chat_id.as_str()), ("text", text)];

        // reqwest errors can embed the URL, which carries the bot token
        let response = self
            .client
            .post(self.send_message_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        tracing::info!("Telegram responded {}: {}", status.as_u16(), snippet);

        if status != reqwest::StatusCode::OK {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body: snippet,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier() -> TelegramNotifier {
        TelegramNotifier::new(TelegramCredentials {
            bot_token: SecretString::from("123:abc".to_string()),
            chat_id: "-100200".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_send_message_url() {
        assert_eq!(
            notifier().send_message_url(),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
        assert_eq!(
            notifier()
                .with_base_url("http://localhost:8081/")
                .send_message_url(),
            "http://localhost:8081/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_chat_id_and_name() {
        let notifier = notifier();
        assert_eq!(notifier.chat_id(), "-100200");
        assert_eq!(notifier.name(), "telegram");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error_without_token() {
        let notifier = notifier().with_base_url("http://127.0.0.1:9");

        let err = notifier.send_text("hello").await.unwrap_err();
        match &err {
            NotifyError::Transport(_) => {}
            other => panic!("Expected transport error, got {:?}", other),
        }
        assert!(!err.to_string().contains("123:abc"));
    }
}
