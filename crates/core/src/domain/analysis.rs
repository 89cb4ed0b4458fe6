use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepId(pub String);

impl StepId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Shared lifecycle for analysis steps and branch tasks. Only ever advances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Complete,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Complete => "complete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "complete" | "completed" => Some(Self::Complete),
            _ => None,
        }
    }

    pub fn advance(&mut self, id: &str, next: StepStatus) -> Result<(), DomainError> {
        if next < *self {
            return Err(DomainError::StatusRegression { id: id.to_owned(), from: *self, to: next });
        }
        *self = next;
        Ok(())
    }
}

/// Symbolic icon reference. Icons never travel through the session slot; they
/// are re-derived from step and suggestion ids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IconRef {
    Mail,
    DocumentSearch,
    ShoppingBag,
    Box,
    Building,
    Search,
    Money,
    TaskList,
    ArrowUpload,
    Checkmark,
    #[default]
    Sparkle,
}

impl IconRef {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mail => "mail",
            Self::DocumentSearch => "document-search",
            Self::ShoppingBag => "shopping-bag",
            Self::Box => "box",
            Self::Building => "building",
            Self::Search => "search",
            Self::Money => "money",
            Self::TaskList => "task-list",
            Self::ArrowUpload => "arrow-upload",
            Self::Checkmark => "checkmark",
            Self::Sparkle => "sparkle",
        }
    }

    /// Terminal glyph used by the renderer.
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Mail => "[@]",
            Self::DocumentSearch => "[?]",
            Self::ShoppingBag => "[$]",
            Self::Box => "[#]",
            Self::Building => "[B]",
            Self::Search => "[s]",
            Self::Money => "[m]",
            Self::TaskList => "[=]",
            Self::ArrowUpload => "[^]",
            Self::Checkmark => "[v]",
            Self::Sparkle => "[*]",
        }
    }

    pub fn for_step_id(id: &str) -> Self {
        match id {
            "email" => Self::Mail,
            "po" => Self::DocumentSearch,
            "sales" => Self::ShoppingBag,
            "inventory" => Self::Box,
            "suppliers" => Self::Building,
            "alternates" => Self::Search,
            "impact" => Self::Money,
            _ => Self::Sparkle,
        }
    }

    pub fn for_suggestion_id(id: &str) -> Self {
        match id {
            "sug-001" => Self::Search,
            "sug-002" => Self::TaskList,
            "sug-003" => Self::ArrowUpload,
            "sug-004" => Self::Mail,
            _ => Self::Sparkle,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisStep {
    pub id: StepId,
    pub label: String,
    pub detail: String,
    pub icon: IconRef,
    pub status: StepStatus,
    pub result: Option<String>,
}

impl AnalysisStep {
    pub fn started(id: StepId, label: String, detail: String, icon: IconRef) -> Self {
        Self { id, label, detail, icon, status: StepStatus::Running, result: None }
    }

    pub fn complete(&mut self, result: String) -> Result<(), DomainError> {
        self.status.advance(self.id.as_str(), StepStatus::Complete)?;
        self.result = Some(result);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AnalysisStep, IconRef, StepId, StepStatus};
    use crate::errors::DomainError;

    #[test]
    fn status_never_regresses() {
        let mut status = StepStatus::Complete;
        let error = status.advance("po", StepStatus::Running).expect_err("regression rejected");

        assert!(matches!(error, DomainError::StatusRegression { .. }));
        assert_eq!(status, StepStatus::Complete);
    }

    #[test]
    fn completing_a_step_attaches_result() {
        let mut step = AnalysisStep::started(
            StepId("inventory".to_owned()),
            "Checking inventory".to_owned(),
            "Scanning stock".to_owned(),
            IconRef::Box,
        );
        step.complete("15 units in stock".to_owned()).expect("running -> complete");

        assert_eq!(step.status, StepStatus::Complete);
        assert_eq!(step.result.as_deref(), Some("15 units in stock"));
    }

    #[test]
    fn icon_table_covers_canonical_steps() {
        assert_eq!(IconRef::for_step_id("email"), IconRef::Mail);
        assert_eq!(IconRef::for_step_id("impact"), IconRef::Money);
        assert_eq!(IconRef::for_step_id("unknown"), IconRef::Sparkle);
        assert_eq!(IconRef::for_suggestion_id("sug-003"), IconRef::ArrowUpload);
    }

    #[test]
    fn status_parse_accepts_known_labels() {
        assert_eq!(StepStatus::parse("RUNNING"), Some(StepStatus::Running));
        assert_eq!(StepStatus::parse("completed"), Some(StepStatus::Complete));
        assert_eq!(StepStatus::parse("blocked"), None);
    }
}
