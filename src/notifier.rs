use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request to the Telegram API failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Telegram API rejected the message: {0}")]
    Rejected(String),
}

/// Delivery channel for formatted status messages. Failures propagate to the
/// caller; the poll loop is the catch point.
#[async_trait]
pub trait Notifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Sends plain-text messages to one fixed chat via the Telegram Bot API.
pub struct TelegramNotifier {
    base_url: String,
    token: String,
    chat_id: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct SendMessageResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> TelegramNotifier {
        TelegramNotifier::with_base_url(TELEGRAM_API_URL, token, chat_id)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> TelegramNotifier {
        let base_url = base_url.into();

        TelegramNotifier {
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: token.into(),
            chat_id: chat_id.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        debug!("Sending a status message to chat {}", self.chat_id);

        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);

        let response = self
            .client
            .post(&url)
            .json(&SendMessageRequest {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let description = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_owned());

            return Err(NotifyError::Rejected(format!("status {status}: {description}")));
        }

        let body: SendMessageResponse = response.json().await?;
        if !body.ok {
            return Err(NotifyError::Rejected(
                body.description.unwrap_or_else(|| "<no description>".to_owned()),
            ));
        }

        Ok(())
    }
}
