//! Serializable subset of player state kept in the session slot.
//!
//! Icons are not stored. They are re-attached from step ids on restore.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::analysis::{AnalysisStep, IconRef, StepId, StepStatus};
use crate::domain::customer::CustomerId;
use crate::domain::suggestion::SuggestionId;
use crate::domain::task::TaskItem;
use crate::flows::PlayerState;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("snapshot version {found} is not supported (expected {SNAPSHOT_VERSION})")]
    UnsupportedVersion { found: u32 },
    #[error("snapshot is inconsistent: {0}")]
    Inconsistent(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub id: StepId,
    pub label: String,
    pub detail: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl From<&AnalysisStep> for StepRecord {
    fn from(step: &AnalysisStep) -> Self {
        Self {
            id: step.id.clone(),
            label: step.label.clone(),
            detail: step.detail.clone(),
            status: step.status,
            result: step.result.clone(),
        }
    }
}

impl StepRecord {
    pub fn into_step(self) -> AnalysisStep {
        let icon = IconRef::for_step_id(self.id.as_str());
        AnalysisStep {
            id: self.id,
            label: self.label,
            detail: self.detail,
            icon,
            status: self.status,
            result: self.result,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub version: u32,
    pub session_id: String,
    pub state: PlayerState,
    pub steps: Vec<StepRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_suggestion: Option<SuggestionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_sku: Option<String>,
    #[serde(default)]
    pub selected_customers: Vec<CustomerId>,
    #[serde(default)]
    pub tasks: Vec<TaskItem>,
    pub saved_at: DateTime<Utc>,
}

impl PlayerSnapshot {
    pub fn idle(session_id: impl Into<String>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            session_id: session_id.into(),
            state: PlayerState::Idle,
            steps: Vec::new(),
            selected_suggestion: None,
            selected_sku: None,
            selected_customers: Vec::new(),
            tasks: Vec::new(),
            saved_at: Utc::now(),
        }
    }

    pub fn restore_steps(&self) -> Vec<AnalysisStep> {
        self.steps.iter().cloned().map(StepRecord::into_step).collect()
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(raw)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Statuses must form a completed prefix with at most one running item.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion { found: self.version });
        }
        check_ordered("step", self.steps.iter().map(|step| (step.id.as_str(), step.status)))?;
        check_ordered("task", self.tasks.iter().map(|task| (task.id.as_str(), task.status)))?;
        Ok(())
    }
}

fn check_ordered<'a>(
    kind: &str,
    statuses: impl Iterator<Item = (&'a str, StepStatus)>,
) -> Result<(), SnapshotError> {
    let mut previous = StepStatus::Complete;
    for (id, status) in statuses {
        if status > previous || (previous == StepStatus::Running && status != StepStatus::Pending) {
            return Err(SnapshotError::Inconsistent(format!(
                "{kind} `{id}` is {} after a {} {kind}",
                status.as_str(),
                previous.as_str()
            )));
        }
        previous = status;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{PlayerSnapshot, SnapshotError, StepRecord};
    use crate::domain::analysis::{IconRef, StepStatus};
    use crate::domain::customer::CustomerId;
    use crate::domain::suggestion::SuggestionId;
    use crate::domain::task::plan_tasks;
    use crate::fixtures::FixtureSet;
    use crate::flows::PlayerState;
    use crate::script::ConversationScript;

    fn snapshot_mid_execution() -> PlayerSnapshot {
        let script = ConversationScript::supplier_delay();
        let steps = script
            .steps()
            .iter()
            .map(|definition| {
                let mut step = definition.start();
                step.complete(definition.result.clone()).expect("running -> complete");
                StepRecord::from(&step)
            })
            .collect();
        let confirmed = FixtureSet::demo().confirmed_upgrade_for(&["CUST-001"]).expect("confirm");
        let mut tasks = plan_tasks(&confirmed);
        tasks[0].advance(StepStatus::Running).expect("pending -> running");
        tasks[0].advance(StepStatus::Complete).expect("running -> complete");
        tasks[1].advance(StepStatus::Running).expect("pending -> running");

        PlayerSnapshot {
            state: PlayerState::BranchExecuting,
            steps,
            selected_suggestion: Some(SuggestionId::new("sug-003")),
            selected_sku: Some("PX-800".to_owned()),
            selected_customers: vec![CustomerId::new("CUST-001")],
            tasks,
            ..PlayerSnapshot::idle("session-1")
        }
    }

    #[test]
    fn json_round_trip_drops_icons_and_rederives_them() {
        let snapshot = snapshot_mid_execution();
        let json = snapshot.to_json().expect("serialize");
        assert!(!json.contains("icon"));

        let restored = PlayerSnapshot::from_json(&json).expect("deserialize");
        assert_eq!(restored, snapshot);

        let steps = restored.restore_steps();
        assert_eq!(steps[0].icon, IconRef::Mail);
        assert_eq!(steps[6].icon, IconRef::Money);
        assert_eq!(steps[6].result.as_deref(), Some("$225,000 revenue at risk across 3 events"));
    }

    #[test]
    fn two_running_tasks_are_rejected() {
        let mut snapshot = snapshot_mid_execution();
        snapshot.tasks[2].status = StepStatus::Running;

        assert!(matches!(snapshot.validate(), Err(SnapshotError::Inconsistent(_))));
    }

    #[test]
    fn completed_step_after_pending_is_rejected() {
        let mut snapshot = snapshot_mid_execution();
        snapshot.steps[2].status = StepStatus::Pending;

        assert!(matches!(snapshot.validate(), Err(SnapshotError::Inconsistent(_))));
    }

    #[test]
    fn unknown_version_and_garbage_are_rejected() {
        let mut snapshot = PlayerSnapshot::idle("session-2");
        snapshot.version = 9;
        let json = snapshot.to_json().expect("serialize");

        assert!(matches!(
            PlayerSnapshot::from_json(&json),
            Err(SnapshotError::UnsupportedVersion { found: 9 })
        ));
        assert!(matches!(PlayerSnapshot::from_json("{not json"), Err(SnapshotError::Decode(_))));
    }
}
