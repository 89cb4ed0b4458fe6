use async_trait::async_trait;
use chrono::{DateTime, Utc};
use guidepost_core::session::PlayerSnapshot;
use sqlx::{sqlite::SqliteRow, Row};

use super::{decode_snapshot, encode_snapshot, SessionStore, SessionStoreError, SlotSummary};
use crate::DbPool;

pub struct SqlSessionStore {
    pool: DbPool,
}

impl SqlSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SqlSessionStore {
    async fn load(&self, key: &str) -> Result<Option<PlayerSnapshot>, SessionStoreError> {
        let row = sqlx::query("SELECT snapshot_json FROM session_slot WHERE slot_key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => {
                let raw: String = r.try_get("snapshot_json")?;
                Ok(Some(decode_snapshot(key, &raw)?))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, key: &str, snapshot: &PlayerSnapshot) -> Result<(), SessionStoreError> {
        let raw = encode_snapshot(key, snapshot)?;

        sqlx::query(
            "INSERT INTO session_slot (slot_key, session_id, state, snapshot_json, snapshot_version,
                                       saved_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(slot_key) DO UPDATE SET
                 session_id = excluded.session_id,
                 state = excluded.state,
                 snapshot_json = excluded.snapshot_json,
                 snapshot_version = excluded.snapshot_version,
                 saved_at = excluded.saved_at,
                 updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(&snapshot.session_id)
        .bind(snapshot.state.as_str())
        .bind(&raw)
        .bind(i64::from(snapshot.version))
        .bind(snapshot.saved_at.to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<bool, SessionStoreError> {
        let result = sqlx::query("DELETE FROM session_slot WHERE slot_key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<SlotSummary>, SessionStoreError> {
        let rows = sqlx::query(
            "SELECT slot_key, session_id, state, saved_at FROM session_slot ORDER BY slot_key",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_summary).collect()
    }
}

fn row_to_summary(row: &SqliteRow) -> Result<SlotSummary, SessionStoreError> {
    let saved_at: String = row.try_get("saved_at")?;
    let saved_at = DateTime::parse_from_rfc3339(&saved_at)
        .map_err(|e| SessionStoreError::Decode(format!("invalid saved_at: {e}")))?
        .with_timezone(&Utc);

    Ok(SlotSummary {
        key: row.try_get("slot_key")?,
        session_id: row.try_get("session_id")?,
        state: row.try_get("state")?,
        saved_at,
    })
}
