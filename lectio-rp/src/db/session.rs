//! Scoped session values
//!
//! Scalars that belong to a reading session rather than to configuration:
//! where in the sequence the reader is, and how far the playback timer got.
//! They are written on every change so a rebuilt reader resumes in place.

use std::collections::HashMap;

use async_trait::async_trait;
use lectio_common::Result;
use sqlx::{Pool, Sqlite};
use tokio::sync::RwLock;

/// Persisted session scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    SequenceIndex,
    TimerElapsed,
}

impl SessionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::SequenceIndex => "sequence_index",
            SessionKey::TimerElapsed => "timer_elapsed",
        }
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, key: SessionKey) -> Result<Option<f64>>;

    async fn store(&self, key: SessionKey, value: f64) -> Result<()>;
}

/// Session values in the `session_values` table, isolated by scope
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    db: Pool<Sqlite>,
    scope: String,
}

impl SqliteSessionStore {
    pub fn new(db: Pool<Sqlite>, scope: impl Into<String>) -> Self {
        Self {
            db,
            scope: scope.into(),
        }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self, key: SessionKey) -> Result<Option<f64>> {
        let value: Option<f64> =
            sqlx::query_scalar("SELECT value FROM session_values WHERE scope = ? AND key = ?")
                .bind(self.scope.as_str())
                .bind(key.as_str())
                .fetch_optional(&self.db)
                .await?;
        Ok(value)
    }

    async fn store(&self, key: SessionKey, value: f64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO session_values (scope, key, value)
            VALUES (?, ?, ?)
            ON CONFLICT(scope, key) DO UPDATE SET
                value = excluded.value,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(self.scope.as_str())
        .bind(key.as_str())
        .bind(value)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

/// In-process session store for tests and ephemeral readers
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: RwLock<HashMap<SessionKey, f64>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, key: SessionKey) -> Result<Option<f64>> {
        Ok(self.values.read().await.get(&key).copied())
    }

    async fn store(&self, key: SessionKey, value: f64) -> Result<()> {
        self.values.write().await.insert(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectio_common::db::init_memory_database;

    #[tokio::test]
    async fn test_sqlite_store_and_load() {
        let db = init_memory_database().await.unwrap();
        let store = SqliteSessionStore::new(db, "default");

        assert_eq!(store.load(SessionKey::SequenceIndex).await.unwrap(), None);

        store.store(SessionKey::SequenceIndex, 4.0).await.unwrap();
        store.store(SessionKey::TimerElapsed, 12.5).await.unwrap();
        store.store(SessionKey::SequenceIndex, 5.0).await.unwrap();

        assert_eq!(store.load(SessionKey::SequenceIndex).await.unwrap(), Some(5.0));
        assert_eq!(store.load(SessionKey::TimerElapsed).await.unwrap(), Some(12.5));
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let db = init_memory_database().await.unwrap();
        let morning = SqliteSessionStore::new(db.clone(), "morning");
        let evening = SqliteSessionStore::new(db, "evening");

        morning.store(SessionKey::SequenceIndex, 2.0).await.unwrap();

        assert_eq!(evening.load(SessionKey::SequenceIndex).await.unwrap(), None);
        assert_eq!(morning.load(SessionKey::SequenceIndex).await.unwrap(), Some(2.0));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemorySessionStore::new();
        store.store(SessionKey::TimerElapsed, 1.5).await.unwrap();
        assert_eq!(store.load(SessionKey::TimerElapsed).await.unwrap(), Some(1.5));
        assert_eq!(store.load(SessionKey::SequenceIndex).await.unwrap(), None);
    }
}
