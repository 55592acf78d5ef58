//! # Budva Bot Store
//!
//! Subscriber persistence behind the `SubscriberStore` trait, with a
//! SQLite backend as the durable copy and `SubscriberRegistry` as the
//! read-mostly in-memory cache loaded once at startup.

pub mod memory;
pub mod registry;
pub mod sqlite;

pub use memory::MemoryStore;
pub use registry::SubscriberRegistry;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use budvabot_core::Result;
use budvabot_core::types::{Subscriber, ZodiacSign};

/// Durable subscriber storage. All writes are upserts: a new value for
/// an existing key replaces it entirely.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Load every subscriber; called once at startup.
    async fn load_all(&self) -> Result<Vec<Subscriber>>;

    /// Register a chat with no location (idempotent).
    async fn ensure_chat(&self, chat_id: i64) -> Result<()>;

    /// Overwrite the chat's coordinate.
    async fn upsert_location(&self, chat_id: i64, lat: f64, lon: f64) -> Result<()>;

    /// Overwrite the chat's zodiac sign.
    async fn upsert_sign(&self, chat_id: i64, sign: ZodiacSign) -> Result<()>;

    /// Overwrite the alert rule for (chat, kind).
    async fn upsert_alert(&self, chat_id: i64, kind: &str, threshold: f64) -> Result<()>;
}
