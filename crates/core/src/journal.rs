use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalCategory {
    Flow,
    Analysis,
    Branch,
    Systems,
    Session,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalOutcome {
    Success,
    Rejected,
    Cancelled,
}

/// One playback event, in the order the player produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub entry_id: String,
    pub session_id: String,
    pub event_type: String,
    pub category: JournalCategory,
    pub outcome: JournalOutcome,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn new(
        session_id: impl Into<String>,
        event_type: impl Into<String>,
        category: JournalCategory,
        outcome: JournalOutcome,
    ) -> Self {
        Self {
            entry_id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            event_type: event_type.into(),
            category,
            outcome,
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

pub trait JournalSink: Send + Sync {
    fn record(&self, entry: JournalEntry);
}

/// Drops every entry. Default sink when nobody is listening.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullJournal;

impl JournalSink for NullJournal {
    fn record(&self, _entry: JournalEntry) {}
}

#[derive(Clone, Default)]
pub struct InMemoryJournal {
    entries: Arc<Mutex<Vec<JournalEntry>>>,
}

impl InMemoryJournal {
    pub fn entries(&self) -> Vec<JournalEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn event_types(&self) -> Vec<String> {
        self.entries().into_iter().map(|entry| entry.event_type).collect()
    }
}

impl JournalSink for InMemoryJournal {
    fn record(&self, entry: JournalEntry) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::journal::{
        InMemoryJournal, JournalCategory, JournalEntry, JournalOutcome, JournalSink,
    };

    #[test]
    fn in_memory_journal_keeps_entries_in_order() {
        let journal = InMemoryJournal::default();
        journal.record(
            JournalEntry::new(
                "session-1",
                "analysis.step_started",
                JournalCategory::Analysis,
                JournalOutcome::Success,
            )
            .with_metadata("step", "email"),
        );
        journal.record(JournalEntry::new(
            "session-1",
            "analysis.step_completed",
            JournalCategory::Analysis,
            JournalOutcome::Success,
        ));

        let entries = journal.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].metadata("step"), Some("email"));
        assert_eq!(
            journal.event_types(),
            vec!["analysis.step_started".to_owned(), "analysis.step_completed".to_owned()]
        );
        assert_ne!(entries[0].entry_id, entries[1].entry_id);
    }
}
