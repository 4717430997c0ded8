//! Telegram push notifications via the Bot API.

use std::time::Duration;

use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::arbitrage::Opportunity;
use crate::config::Config;
use crate::error::NotifyError;

use super::format::{escape_html, format_opportunity};

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Subset of the Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends messages to a fixed chat.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    http: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Create a notifier for `chat_id` using bot `token`.
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            api_base: TELEGRAM_API.to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Build a notifier when both token and chat id are configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.telegram_enabled() {
            return None;
        }
        match (&config.telegram_bot_token, &config.telegram_chat_id) {
            (Some(token), Some(chat_id)) => Some(Self::new(token.clone(), chat_id.clone())),
            _ => None,
        }
    }

    /// Point the notifier at another Bot API host.
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    /// Chat messages are delivered to.
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// `sendMessage` request body for plain `text`.
    pub fn payload(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "chat_id": self.chat_id,
            "text": format!("<pre>{}</pre>", escape_html(text)),
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        })
    }

    /// Send plain text, wrapped in a `<pre>` block.
    #[instrument(skip(self, text), fields(chat_id = %self.chat_id))]
    pub async fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let response = self.http.post(&url).json(&self.payload(text)).send().await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            warn!(%status, "Telegram sendMessage failed");
            return Err(NotifyError::SendFailed(format!(
                "HTTP {}: {}",
                status,
                truncate(&body, 200)
            )));
        }

        match serde_json::from_str::<ApiResponse>(&body) {
            Ok(reply) if reply.ok => {
                info!("Telegram message sent");
                Ok(())
            }
            Ok(reply) => Err(NotifyError::SendFailed(
                reply.description.unwrap_or_else(|| "ok=false".to_string()),
            )),
            Err(e) => Err(NotifyError::SendFailed(format!("bad response: {}", e))),
        }
    }

    /// Send one formatted opportunity.
    pub async fn notify(&self, opportunity: &Opportunity) -> Result<(), NotifyError> {
        self.send_text(&format_opportunity(opportunity)).await
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
