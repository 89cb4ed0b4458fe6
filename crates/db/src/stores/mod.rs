use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use guidepost_core::config::{SessionBackend, SessionConfig};
use guidepost_core::session::{PlayerSnapshot, SnapshotError};
use sqlx::migrate::MigrateError;
use thiserror::Error;

use crate::{connect_with_settings, migrations};

pub mod memory;
pub mod session;

pub use memory::InMemorySessionStore;
pub use session::SqlSessionStore;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] MigrateError),
    #[error("stored session `{key}` is unreadable: {source}")]
    Snapshot {
        key: String,
        #[source]
        source: SnapshotError,
    },
    #[error("decode error: {0}")]
    Decode(String),
}

/// Listing entry for a stored slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotSummary {
    pub key: String,
    pub session_id: String,
    pub state: String,
    pub saved_at: DateTime<Utc>,
}

/// Key-value slot holding one player snapshot per key. Saving replaces.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<PlayerSnapshot>, SessionStoreError>;
    async fn save(&self, key: &str, snapshot: &PlayerSnapshot) -> Result<(), SessionStoreError>;
    /// Returns whether a slot was removed.
    async fn clear(&self, key: &str) -> Result<bool, SessionStoreError>;
    async fn list(&self) -> Result<Vec<SlotSummary>, SessionStoreError>;
}

/// Opens the backend named by `[session]`, migrating SQLite first.
pub async fn open_session_store(
    config: &SessionConfig,
) -> Result<Arc<dyn SessionStore>, SessionStoreError> {
    match config.backend {
        SessionBackend::Memory => Ok(Arc::new(InMemorySessionStore::default())),
        SessionBackend::Sqlite => {
            let pool = connect_with_settings(&config.url, config.max_connections, 30).await?;
            migrations::run_pending(&pool).await?;
            Ok(Arc::new(SqlSessionStore::new(pool)))
        }
    }
}

pub(crate) fn decode_snapshot(key: &str, raw: &str) -> Result<PlayerSnapshot, SessionStoreError> {
    PlayerSnapshot::from_json(raw)
        .map_err(|source| SessionStoreError::Snapshot { key: key.to_owned(), source })
}

pub(crate) fn encode_snapshot(key: &str, snapshot: &PlayerSnapshot) -> Result<String, SessionStoreError> {
    snapshot
        .validate()
        .and_then(|()| snapshot.to_json())
        .map_err(|source| SessionStoreError::Snapshot { key: key.to_owned(), source })
}

#[cfg(test)]
mod tests {
    use guidepost_core::config::{SessionBackend, SessionConfig};
    use guidepost_core::session::PlayerSnapshot;

    use super::open_session_store;

    fn config(backend: SessionBackend) -> SessionConfig {
        SessionConfig {
            backend,
            url: "sqlite::memory:".to_owned(),
            key: "demo".to_owned(),
            max_connections: 1,
        }
    }

    #[tokio::test]
    async fn both_backends_round_trip_a_slot() {
        for backend in [SessionBackend::Memory, SessionBackend::Sqlite] {
            let store = open_session_store(&config(backend)).await.expect("open store");
            let snapshot = PlayerSnapshot::idle("demo");

            assert_eq!(store.load("demo").await.expect("load"), None);
            store.save("demo", &snapshot).await.expect("save");
            assert_eq!(store.load("demo").await.expect("load"), Some(snapshot));
            assert!(store.clear("demo").await.expect("clear"));
            assert!(!store.clear("demo").await.expect("clear again"));
        }
    }
}
