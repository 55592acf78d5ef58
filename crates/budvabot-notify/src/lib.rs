//! # Budva Bot Notify
//! Telegram Bot API channel and the notification dispatcher.

pub mod dispatch;
pub mod telegram;

pub use dispatch::{DeliveryReport, Dispatcher};
pub use telegram::{TelegramChannel, TelegramUpdate};

use async_trait::async_trait;
use budvabot_core::types::OutboundMessage;
use thiserror::Error;

/// Why a single send failed.
#[derive(Debug, Error)]
pub enum SendError {
    /// Provider flood control: retry after the given number of seconds.
    #[error("rate limited, retry after {0}s")]
    RetryAfter(u64),
    /// Anything else: unknown chat, blocked bot, transient error.
    #[error("send failed: {0}")]
    Failed(String),
}

/// The seam between the dispatcher and the messaging provider.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SendError>;
}
