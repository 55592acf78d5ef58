//! Telegram Bot API client — long polling + message sending.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

use budvabot_core::error::{BotError, Result};
use budvabot_core::types::{MessageFormat, OutboundMessage};

use crate::{MessageSender, SendError};

/// Telegram Bot API client. Long-poll offset is interior state so the
/// same instance can poll and send concurrently.
pub struct TelegramChannel {
    bot_token: String,
    client: reqwest::Client,
    last_update_id: AtomicI64,
}

impl TelegramChannel {
    pub fn new(bot_token: String) -> Self {
        Self {
            bot_token,
            client: reqwest::Client::new(),
            last_update_id: AtomicI64::new(0),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.bot_token, method)
    }

    /// Get updates using long polling.
    pub async fn get_updates(&self) -> Result<Vec<TelegramUpdate>> {
        let offset = self.last_update_id.load(Ordering::Relaxed) + 1;
        let response = self
            .client
            .get(self.api_url("getUpdates"))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", "30".into()),
                ("allowed_updates", "[\"message\"]".into()),
            ])
            .send()
            .await
            .map_err(|e| BotError::Channel(format!("getUpdates failed: {e}")))?;

        let body: TelegramApiResponse<Vec<TelegramUpdate>> = response
            .json()
            .await
            .map_err(|e| BotError::Channel(format!("Invalid Telegram response: {e}")))?;

        if !body.ok {
            return Err(BotError::Channel(format!(
                "Telegram API error: {}",
                body.description.unwrap_or_default()
            )));
        }

        let updates = body.result.unwrap_or_default();
        if let Some(last) = updates.last() {
            self.last_update_id.store(last.update_id, Ordering::Relaxed);
        }
        Ok(updates)
    }

    /// Send one message. Flood control is surfaced as
    /// `SendError::RetryAfter` so the dispatcher can back off.
    pub async fn send_message(&self, message: &OutboundMessage) -> std::result::Result<(), SendError> {
        let mut body = serde_json::json!({
            "chat_id": message.chat_id,
            "text": message.text,
        });
        match message.format {
            MessageFormat::Markdown => body["parse_mode"] = "Markdown".into(),
            MessageFormat::Html => body["parse_mode"] = "HTML".into(),
            MessageFormat::Plain => {}
        }

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| SendError::Failed(format!("sendMessage failed: {e}")))?;

        let result: TelegramApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| SendError::Failed(format!("Invalid send response: {e}")))?;

        if result.ok {
            return Ok(());
        }

        if let Some(retry_after) = result.parameters.and_then(|p| p.retry_after) {
            return Err(SendError::RetryAfter(retry_after));
        }
        Err(SendError::Failed(format!(
            "Telegram error {}: {}",
            result.error_code.unwrap_or_default(),
            result.description.unwrap_or_default()
        )))
    }

    /// Get bot info; used as the startup connectivity check.
    pub async fn get_me(&self) -> Result<TelegramUser> {
        let response = self
            .client
            .get(self.api_url("getMe"))
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| BotError::Channel(format!("getMe failed: {e}")))?;
        let body: TelegramApiResponse<TelegramUser> = response
            .json()
            .await
            .map_err(|e| BotError::Channel(format!("Invalid getMe response: {e}")))?;
        body.result
            .ok_or_else(|| BotError::Channel("No bot info".into()))
    }
}

#[async_trait]
impl MessageSender for TelegramChannel {
    async fn send(&self, message: &OutboundMessage) -> std::result::Result<(), SendError> {
        self.send_message(message).await
    }
}

// --- Telegram API Types ---

#[derive(Debug, Deserialize)]
pub struct TelegramApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
    pub parameters: Option<ResponseParameters>,
}

/// Extra fields Telegram attaches to error responses; `retry_after`
/// carries the flood-control wait in seconds.
#[derive(Debug, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    pub text: Option<String>,
    pub location: Option<TelegramLocation>,
    pub date: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TelegramLocation {
    pub latitude: f64,
    pub longitude: f64,
}
