//! The authored analysis walkthrough.

use std::collections::BTreeMap;

use crate::domain::analysis::{AnalysisStep, IconRef, StepId};
use crate::domain::suggestion::SuggestionId;
use crate::flows::BranchKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepDefinition {
    pub id: StepId,
    pub label: String,
    pub detail: String,
    pub result: String,
}

impl StepDefinition {
    pub fn new(id: &str, label: &str, detail: &str, result: &str) -> Self {
        Self {
            id: StepId(id.to_owned()),
            label: label.to_owned(),
            detail: detail.to_owned(),
            result: result.to_owned(),
        }
    }

    pub fn icon(&self) -> IconRef {
        IconRef::for_step_id(self.id.as_str())
    }

    pub fn start(&self) -> AnalysisStep {
        AnalysisStep::started(self.id.clone(), self.label.clone(), self.detail.clone(), self.icon())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationScript {
    steps: Vec<StepDefinition>,
    branches: BTreeMap<SuggestionId, BranchKind>,
}

impl ConversationScript {
    pub fn new(steps: Vec<StepDefinition>) -> Self {
        Self { steps, branches: BTreeMap::new() }
    }

    pub fn with_branch(mut self, suggestion: SuggestionId, branch: BranchKind) -> Self {
        self.branches.insert(suggestion, branch);
        self
    }

    /// Seven-step supplier delay analysis with the premium upgrade wired to `sug-003`.
    pub fn supplier_delay() -> Self {
        Self::new(vec![
            StepDefinition::new(
                "email",
                "Analyzing email content",
                "Extracting key information from supplier notification",
                "Order #SW-2847 \u{2022} ProSound PX-500 \u{2022} 1-week delay due to snowstorm",
            ),
            StepDefinition::new(
                "po",
                "Finding purchase order details",
                "Querying Dynamics 365 for order #SW-2847",
                "PO-2847 \u{2022} 100 units ordered \u{2022} Supplier: SoundWave Pro Audio",
            ),
            StepDefinition::new(
                "sales",
                "Searching for affected sales orders",
                "Checking events requiring ProSound PX-500 speakers",
                "Found 3 events requiring PX-500 speakers (TechCon, Music Festival, Awards Gala)",
            ),
            StepDefinition::new(
                "inventory",
                "Checking inventory across warehouses",
                "Scanning stock levels in all locations",
                "15 units in stock \u{2022} Insufficient for all events",
            ),
            StepDefinition::new(
                "suppliers",
                "Finding alternate suppliers",
                "Searching supplier network for faster delivery options",
                "3 certified suppliers found with 3-5 day delivery",
            ),
            StepDefinition::new(
                "alternates",
                "Checking for substitute products",
                "Looking for compatible speaker systems in stock",
                "PX-800 Premium available \u{2022} 65 units in stock \u{2022} Compatible upgrade",
            ),
            StepDefinition::new(
                "impact",
                "Calculating revenue impact",
                "Analyzing financial risk across affected events",
                "$225,000 revenue at risk across 3 events",
            ),
        ])
        .with_branch(SuggestionId::new("sug-003"), BranchKind::PremiumUpgrade)
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn step(&self, id: &StepId) -> Option<&StepDefinition> {
        self.steps.iter().find(|step| &step.id == id)
    }

    pub fn branch_for(&self, suggestion: &SuggestionId) -> Option<BranchKind> {
        self.branches.get(suggestion).copied()
    }

    /// The suggestion that opens `branch`, if one is wired.
    pub fn suggestion_for(&self, branch: BranchKind) -> Option<&SuggestionId> {
        self.branches.iter().find(|(_, wired)| **wired == branch).map(|(suggestion, _)| suggestion)
    }
}

impl Default for ConversationScript {
    fn default() -> Self {
        Self::supplier_delay()
    }
}

#[cfg(test)]
mod tests {
    use super::ConversationScript;
    use crate::domain::analysis::{IconRef, StepStatus};
    use crate::domain::suggestion::SuggestionId;
    use crate::flows::BranchKind;

    #[test]
    fn canonical_script_has_seven_ordered_steps() {
        let script = ConversationScript::supplier_delay();
        let ids: Vec<_> = script.steps().iter().map(|step| step.id.as_str()).collect();

        assert_eq!(ids, vec!["email", "po", "sales", "inventory", "suppliers", "alternates", "impact"]);
        assert_eq!(script.steps()[6].icon(), IconRef::Money);
    }

    #[test]
    fn only_premium_upgrade_is_wired() {
        let script = ConversationScript::default();

        assert_eq!(script.branch_for(&SuggestionId::new("sug-003")), Some(BranchKind::PremiumUpgrade));
        for inert in ["sug-001", "sug-002", "sug-004"] {
            assert_eq!(script.branch_for(&SuggestionId::new(inert)), None);
        }
        assert_eq!(script.suggestion_for(BranchKind::PremiumUpgrade), Some(&SuggestionId::new("sug-003")));
    }

    #[test]
    fn starting_a_step_marks_it_running() {
        let script = ConversationScript::supplier_delay();
        let step = script.steps()[0].start();

        assert_eq!(step.status, StepStatus::Running);
        assert_eq!(step.icon, IconRef::Mail);
        assert!(step.result.is_none());
    }
}
