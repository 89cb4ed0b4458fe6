use std::collections::HashMap;

use async_trait::async_trait;
use guidepost_core::session::PlayerSnapshot;
use tokio::sync::RwLock;

use super::{decode_snapshot, encode_snapshot, SessionStore, SessionStoreError, SlotSummary};

/// Process-local slots. Snapshots are kept as JSON so both backends share
/// one encoding.
#[derive(Default)]
pub struct InMemorySessionStore {
    slots: RwLock<HashMap<String, (SlotSummary, String)>>,
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, key: &str) -> Result<Option<PlayerSnapshot>, SessionStoreError> {
        let slots = self.slots.read().await;
        slots.get(key).map(|(_, raw)| decode_snapshot(key, raw)).transpose()
    }

    async fn save(&self, key: &str, snapshot: &PlayerSnapshot) -> Result<(), SessionStoreError> {
        let raw = encode_snapshot(key, snapshot)?;
        let summary = SlotSummary {
            key: key.to_owned(),
            session_id: snapshot.session_id.clone(),
            state: snapshot.state.as_str().to_owned(),
            saved_at: snapshot.saved_at,
        };
        self.slots.write().await.insert(key.to_owned(), (summary, raw));
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<bool, SessionStoreError> {
        Ok(self.slots.write().await.remove(key).is_some())
    }

    async fn list(&self) -> Result<Vec<SlotSummary>, SessionStoreError> {
        let slots = self.slots.read().await;
        let mut summaries: Vec<SlotSummary> = slots.values().map(|(summary, _)| summary.clone()).collect();
        summaries.sort_by(|left, right| left.key.cmp(&right.key));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use guidepost_core::flows::PlayerState;
    use guidepost_core::session::PlayerSnapshot;

    use crate::stores::{InMemorySessionStore, SessionStore, SessionStoreError};

    #[tokio::test]
    async fn saving_replaces_the_slot() {
        let store = InMemorySessionStore::default();
        store.save("demo", &PlayerSnapshot::idle("first")).await.expect("save");
        store.save("demo", &PlayerSnapshot::idle("second")).await.expect("replace");

        let loaded = store.load("demo").await.expect("load").expect("present");
        assert_eq!(loaded.session_id, "second");
        assert_eq!(store.list().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn inconsistent_snapshots_are_rejected_on_save() {
        let store = InMemorySessionStore::default();
        let mut snapshot = PlayerSnapshot::idle("demo");
        snapshot.version = 99;
        snapshot.state = PlayerState::Analyzing;

        assert!(matches!(
            store.save("demo", &snapshot).await,
            Err(SessionStoreError::Snapshot { .. })
        ));
        assert_eq!(store.load("demo").await.expect("load"), None);
    }
}
