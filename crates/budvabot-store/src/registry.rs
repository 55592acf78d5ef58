//! In-memory subscriber registry over a durable store.
//!
//! Read-mostly cache populated once at startup; every write goes to the
//! store first, and a failed store write surfaces to the caller without
//! touching the cache, so memory never claims more than disk holds.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use budvabot_core::Result;
use budvabot_core::types::{AlertRule, Coordinate, Subscriber, ZodiacSign};

use crate::SubscriberStore;

pub struct SubscriberRegistry {
    inner: RwLock<HashMap<i64, Subscriber>>,
    store: Arc<dyn SubscriberStore>,
}

impl SubscriberRegistry {
    /// Load all subscribers from the store. The store is the source of
    /// truth at startup.
    pub async fn load(store: Arc<dyn SubscriberStore>) -> Result<Self> {
        let subscribers = store.load_all().await?;
        tracing::info!("Loaded {} subscriber(s)", subscribers.len());
        let map = subscribers.into_iter().map(|s| (s.chat_id, s)).collect();
        Ok(Self {
            inner: RwLock::new(map),
            store,
        })
    }

    /// Register a chat on first contact. Idempotent; keeps existing state.
    pub async fn ensure_subscriber(&self, chat_id: i64) -> Result<()> {
        {
            let map = self.inner.read().await;
            if map.contains_key(&chat_id) {
                return Ok(());
            }
        }
        self.store.ensure_chat(chat_id).await?;
        let mut map = self.inner.write().await;
        map.entry(chat_id).or_insert_with(|| Subscriber::new(chat_id));
        Ok(())
    }

    /// Overwrite the coordinate (never merged).
    pub async fn set_location(&self, chat_id: i64, lat: f64, lon: f64) -> Result<()> {
        self.store.upsert_location(chat_id, lat, lon).await?;
        let mut map = self.inner.write().await;
        let sub = map.entry(chat_id).or_insert_with(|| Subscriber::new(chat_id));
        sub.coordinate = Some(Coordinate {
            latitude: lat,
            longitude: lon,
        });
        Ok(())
    }

    pub async fn set_sign(&self, chat_id: i64, sign: ZodiacSign) -> Result<()> {
        self.store.upsert_sign(chat_id, sign).await?;
        let mut map = self.inner.write().await;
        let sub = map.entry(chat_id).or_insert_with(|| Subscriber::new(chat_id));
        sub.zodiac_sign = Some(sign);
        Ok(())
    }

    pub async fn set_alert(&self, chat_id: i64, kind: &str, threshold: f64) -> Result<()> {
        self.store.upsert_alert(chat_id, kind, threshold).await?;
        let mut map = self.inner.write().await;
        let sub = map.entry(chat_id).or_insert_with(|| Subscriber::new(chat_id));
        match sub.alert_rules.iter_mut().find(|r| r.kind == kind) {
            Some(rule) => rule.threshold = threshold,
            None => sub.alert_rules.push(AlertRule {
                kind: kind.to_string(),
                threshold,
            }),
        }
        Ok(())
    }

    pub async fn coordinate(&self, chat_id: i64) -> Option<Coordinate> {
        self.inner.read().await.get(&chat_id).and_then(|s| s.coordinate)
    }

    pub async fn sign(&self, chat_id: i64) -> Option<ZodiacSign> {
        self.inner.read().await.get(&chat_id).and_then(|s| s.zodiac_sign)
    }

    /// Snapshot of all chat ids, for notification fan-out. The lock is
    /// released before any delivery starts.
    pub async fn chat_ids(&self) -> Vec<i64> {
        self.inner.read().await.keys().copied().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
