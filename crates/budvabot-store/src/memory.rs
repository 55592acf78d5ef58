//! In-memory subscriber store, for tests and ephemeral runs.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use budvabot_core::error::{BotError, Result};
use budvabot_core::types::{AlertRule, Coordinate, Subscriber, ZodiacSign};

use crate::SubscriberStore;

/// Keeps everything in a `Mutex<Vec<_>>`. `fail_writes` simulates a
/// persistent store that is down at runtime.
#[derive(Default)]
pub struct MemoryStore {
    subscribers: Mutex<Vec<Subscriber>>,
    pub fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(BotError::Store("store unavailable".into()));
        }
        Ok(())
    }

    fn with_subscriber<F>(&self, chat_id: i64, f: F) -> Result<()>
    where
        F: FnOnce(&mut Subscriber),
    {
        let mut subs = self
            .subscribers
            .lock()
            .map_err(|e| BotError::Store(e.to_string()))?;
        match subs.iter_mut().find(|s| s.chat_id == chat_id) {
            Some(sub) => f(sub),
            None => {
                let mut sub = Subscriber::new(chat_id);
                f(&mut sub);
                subs.push(sub);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriberStore for MemoryStore {
    async fn load_all(&self) -> Result<Vec<Subscriber>> {
        Ok(self
            .subscribers
            .lock()
            .map_err(|e| BotError::Store(e.to_string()))?
            .clone())
    }

    async fn ensure_chat(&self, chat_id: i64) -> Result<()> {
        self.check_writable()?;
        self.with_subscriber(chat_id, |_| {})
    }

    async fn upsert_location(&self, chat_id: i64, lat: f64, lon: f64) -> Result<()> {
        self.check_writable()?;
        self.with_subscriber(chat_id, |sub| {
            sub.coordinate = Some(Coordinate {
                latitude: lat,
                longitude: lon,
            });
        })
    }

    async fn upsert_sign(&self, chat_id: i64, sign: ZodiacSign) -> Result<()> {
        self.check_writable()?;
        self.with_subscriber(chat_id, |sub| {
            sub.zodiac_sign = Some(sign);
        })
    }

    async fn upsert_alert(&self, chat_id: i64, kind: &str, threshold: f64) -> Result<()> {
        self.check_writable()?;
        self.with_subscriber(chat_id, |sub| {
            match sub.alert_rules.iter_mut().find(|r| r.kind == kind) {
                Some(rule) => rule.threshold = threshold,
                None => sub.alert_rules.push(AlertRule {
                    kind: kind.to_string(),
                    threshold,
                }),
            }
        })
    }
}
