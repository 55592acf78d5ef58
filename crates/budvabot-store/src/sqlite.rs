//! SQLite subscriber store.

use async_trait::async_trait;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

use budvabot_core::error::{BotError, Result};
use budvabot_core::types::{AlertRule, Coordinate, Subscriber, ZodiacSign};

use crate::SubscriberStore;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(|e| BotError::Store(e.to_string()))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS subscribers (
                chat_id INTEGER PRIMARY KEY,
                latitude REAL,
                longitude REAL,
                zodiac_sign TEXT
            );
            CREATE TABLE IF NOT EXISTS alert_rules (
                chat_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                threshold REAL NOT NULL,
                PRIMARY KEY (chat_id, kind)
            );",
        )
        .map_err(|e| BotError::Store(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| BotError::Store(e.to_string()))
    }
}

#[async_trait]
impl SubscriberStore for SqliteStore {
    async fn load_all(&self) -> Result<Vec<Subscriber>> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare("SELECT chat_id, latitude, longitude, zodiac_sign FROM subscribers")
            .map_err(|e| BotError::Store(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                let chat_id: i64 = row.get(0)?;
                let lat: Option<f64> = row.get(1)?;
                let lon: Option<f64> = row.get(2)?;
                let sign: Option<String> = row.get(3)?;
                Ok((chat_id, lat, lon, sign))
            })
            .map_err(|e| BotError::Store(e.to_string()))?;

        let mut subscribers = Vec::new();
        for row in rows {
            let (chat_id, lat, lon, sign) = row.map_err(|e| BotError::Store(e.to_string()))?;
            let coordinate = match (lat, lon) {
                (Some(latitude), Some(longitude)) => Some(Coordinate {
                    latitude,
                    longitude,
                }),
                _ => None,
            };
            subscribers.push(Subscriber {
                chat_id,
                coordinate,
                zodiac_sign: sign.and_then(|s| s.parse::<ZodiacSign>().ok()),
                alert_rules: Vec::new(),
            });
        }

        let mut stmt = conn
            .prepare("SELECT chat_id, kind, threshold FROM alert_rules")
            .map_err(|e| BotError::Store(e.to_string()))?;
        let rules = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                ))
            })
            .map_err(|e| BotError::Store(e.to_string()))?;

        for rule in rules {
            let (chat_id, kind, threshold) = rule.map_err(|e| BotError::Store(e.to_string()))?;
            if let Some(sub) = subscribers.iter_mut().find(|s| s.chat_id == chat_id) {
                sub.alert_rules.push(AlertRule { kind, threshold });
            }
        }

        Ok(subscribers)
    }

    async fn ensure_chat(&self, chat_id: i64) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO subscribers (chat_id) VALUES (?1)",
            rusqlite::params![chat_id],
        )
        .map_err(|e| BotError::Store(e.to_string()))?;
        Ok(())
    }

    async fn upsert_location(&self, chat_id: i64, lat: f64, lon: f64) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO subscribers (chat_id, latitude, longitude) VALUES (?1, ?2, ?3)
             ON CONFLICT (chat_id) DO UPDATE SET latitude = ?2, longitude = ?3",
            rusqlite::params![chat_id, lat, lon],
        )
        .map_err(|e| BotError::Store(e.to_string()))?;
        Ok(())
    }

    async fn upsert_sign(&self, chat_id: i64, sign: ZodiacSign) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO subscribers (chat_id, zodiac_sign) VALUES (?1, ?2)
             ON CONFLICT (chat_id) DO UPDATE SET zodiac_sign = ?2",
            rusqlite::params![chat_id, sign.as_str()],
        )
        .map_err(|e| BotError::Store(e.to_string()))?;
        Ok(())
    }

    async fn upsert_alert(&self, chat_id: i64, kind: &str, threshold: f64) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO alert_rules (chat_id, kind, threshold) VALUES (?1, ?2, ?3)",
            rusqlite::params![chat_id, kind, threshold],
        )
        .map_err(|e| BotError::Store(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> (SqliteStore, std::path::PathBuf) {
        let path = std::env::temp_dir().join(format!("budvabot-test-{name}.db"));
        std::fs::remove_file(&path).ok();
        (SqliteStore::open(&path).unwrap(), path)
    }

    #[tokio::test]
    async fn test_location_round_trip() {
        let (store, path) = temp_store("roundtrip");
        store.upsert_location(7, 42.28, 18.84).await.unwrap();

        // Fresh connection, as at process restart.
        drop(store);
        let store = SqliteStore::open(&path).unwrap();
        let subs = store.load_all().await.unwrap();
        assert_eq!(subs.len(), 1);
        let coord = subs[0].coordinate.unwrap();
        assert!((coord.latitude - 42.28).abs() < 1e-9);
        assert!((coord.longitude - 18.84).abs() < 1e-9);
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_location_upsert_replaces() {
        let (store, path) = temp_store("replace");
        store.upsert_location(7, 1.0, 2.0).await.unwrap();
        store.upsert_location(7, 3.0, 4.0).await.unwrap();
        let subs = store.load_all().await.unwrap();
        assert_eq!(subs.len(), 1);
        let coord = subs[0].coordinate.unwrap();
        assert!((coord.latitude - 3.0).abs() < 1e-9);
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_ensure_chat_keeps_existing_location() {
        let (store, path) = temp_store("ensure");
        store.upsert_location(9, 1.0, 2.0).await.unwrap();
        store.ensure_chat(9).await.unwrap();
        let subs = store.load_all().await.unwrap();
        assert!(subs[0].coordinate.is_some());
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_sign_and_alert_round_trip() {
        let (store, path) = temp_store("sign-alert");
        store.ensure_chat(5).await.unwrap();
        store
            .upsert_sign(5, ZodiacSign::Scorpio)
            .await
            .unwrap();
        store.upsert_alert(5, "water", 20.0).await.unwrap();
        store.upsert_alert(5, "water", 18.0).await.unwrap();

        let subs = store.load_all().await.unwrap();
        assert_eq!(subs[0].zodiac_sign, Some(ZodiacSign::Scorpio));
        assert_eq!(subs[0].alert_rules.len(), 1);
        assert!((subs[0].alert_rules[0].threshold - 18.0).abs() < 1e-9);
        std::fs::remove_file(&path).ok();
    }
}
