//! Settings database access
//!
//! Read/write settings from the settings table (key-value store), and the
//! behavior store built on top of it.

use async_trait::async_trait;
use lectio_common::{Error, ReaderBehavior, Result};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tokio::sync::RwLock;
use tracing::debug;

use lectio_common::db::{DEFAULT_QUEUE_RADIUS, DEFAULT_TICK_INTERVAL_MS};

/// Settings key holding the active reader behavior as JSON
pub const READER_BEHAVIOR_KEY: &str = "reader_behavior";

/// Load the playback timer tick period
///
/// Clamped to 10-1000ms; defaults to 100ms when unset.
pub async fn load_tick_interval(db: &Pool<Sqlite>) -> Result<u64> {
    match get_setting::<u64>(db, "timer_tick_interval_ms").await? {
        Some(interval) => Ok(interval.clamp(10, 1000)),
        None => Ok(DEFAULT_TICK_INTERVAL_MS),
    }
}

/// Load the default queue window radius (defaults to 3)
pub async fn load_queue_radius(db: &Pool<Sqlite>) -> Result<u32> {
    Ok(get_setting::<u32>(db, "queue_default_radius")
        .await?
        .unwrap_or(DEFAULT_QUEUE_RADIUS))
}

/// Generic setting getter
///
/// Returns None if key doesn't exist in database.
/// Parses value from string using FromStr trait.
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<Option<String>> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match value.flatten() {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter
///
/// Inserts or updates setting in database.
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    let value_str = value.to_string();

    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value_str)
    .execute(db)
    .await?;

    Ok(())
}

/// Where the active [`ReaderBehavior`] lives
///
/// Read on every query; the reader never caches the behavior itself.
#[async_trait]
pub trait BehaviorStore: Send + Sync {
    async fn get_reader_behavior(&self) -> Result<ReaderBehavior>;

    async fn set_reader_behavior(&self, behavior: &ReaderBehavior) -> Result<()>;
}

/// Behavior stored as JSON in the settings table
#[derive(Debug, Clone)]
pub struct SqliteBehaviorStore {
    db: Pool<Sqlite>,
}

impl SqliteBehaviorStore {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BehaviorStore for SqliteBehaviorStore {
    async fn get_reader_behavior(&self) -> Result<ReaderBehavior> {
        match get_setting::<String>(&self.db, READER_BEHAVIOR_KEY).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(ReaderBehavior::default()),
        }
    }

    async fn set_reader_behavior(&self, behavior: &ReaderBehavior) -> Result<()> {
        let json = serde_json::to_string(behavior)?;
        debug!("Storing reader behavior: {}", json);
        set_setting(&self.db, READER_BEHAVIOR_KEY, json).await
    }
}

/// In-process behavior store
#[derive(Debug, Default)]
pub struct MemoryBehaviorStore {
    behavior: RwLock<ReaderBehavior>,
}

impl MemoryBehaviorStore {
    pub fn new(behavior: ReaderBehavior) -> Self {
        Self {
            behavior: RwLock::new(behavior),
        }
    }
}

#[async_trait]
impl BehaviorStore for MemoryBehaviorStore {
    async fn get_reader_behavior(&self) -> Result<ReaderBehavior> {
        Ok(*self.behavior.read().await)
    }

    async fn set_reader_behavior(&self, behavior: &ReaderBehavior) -> Result<()> {
        *self.behavior.write().await = *behavior;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectio_common::db::init_memory_database;
    use lectio_common::{ChapterAddress, RepeatPolicy};

    #[tokio::test]
    async fn test_setting_get_set() {
        let db = init_memory_database().await.unwrap();

        assert_eq!(get_setting::<u32>(&db, "missing").await.unwrap(), None);

        set_setting(&db, "answer", 42u32).await.unwrap();
        assert_eq!(get_setting::<u32>(&db, "answer").await.unwrap(), Some(42));

        set_setting(&db, "answer", 43u32).await.unwrap();
        assert_eq!(get_setting::<u32>(&db, "answer").await.unwrap(), Some(43));
    }

    #[tokio::test]
    async fn test_setting_parse_failure_is_error() {
        let db = init_memory_database().await.unwrap();
        set_setting(&db, "timer_tick_interval_ms", "fast").await.unwrap();
        assert!(load_tick_interval(&db).await.is_err());
    }

    #[tokio::test]
    async fn test_defaults_from_schema() {
        let db = init_memory_database().await.unwrap();
        assert_eq!(load_tick_interval(&db).await.unwrap(), DEFAULT_TICK_INTERVAL_MS);
        assert_eq!(load_queue_radius(&db).await.unwrap(), DEFAULT_QUEUE_RADIUS);

        set_setting(&db, "timer_tick_interval_ms", 5u64).await.unwrap();
        assert_eq!(load_tick_interval(&db).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_sqlite_behavior_store_round_trip() {
        let db = init_memory_database().await.unwrap();
        let store = SqliteBehaviorStore::new(db);

        // Unset: one chapter at the start of the canon
        assert_eq!(store.get_reader_behavior().await.unwrap(), ReaderBehavior::default());

        let behavior = ReaderBehavior::Segment {
            start: ChapterAddress::new(18, 22),
            length: None,
            policy: RepeatPolicy::Timed(600.0),
        };
        store.set_reader_behavior(&behavior).await.unwrap();
        assert_eq!(store.get_reader_behavior().await.unwrap(), behavior);
    }

    #[tokio::test]
    async fn test_corrupt_behavior_is_error() {
        let db = init_memory_database().await.unwrap();
        set_setting(&db, READER_BEHAVIOR_KEY, "{not json").await.unwrap();

        let store = SqliteBehaviorStore::new(db);
        assert!(matches!(
            store.get_reader_behavior().await,
            Err(Error::Serialization(_))
        ));
    }
}
