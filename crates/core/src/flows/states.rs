use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    Idle,
    Analyzing,
    SuggestionsShown,
    BranchConfiguring,
    BranchExecuting,
    BranchComplete,
}

impl PlayerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Analyzing => "analyzing",
            Self::SuggestionsShown => "suggestions_shown",
            Self::BranchConfiguring => "branch_configuring",
            Self::BranchExecuting => "branch_executing",
            Self::BranchComplete => "branch_complete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "idle" => Some(Self::Idle),
            "analyzing" => Some(Self::Analyzing),
            "suggestions_shown" => Some(Self::SuggestionsShown),
            "branch_configuring" => Some(Self::BranchConfiguring),
            "branch_executing" => Some(Self::BranchExecuting),
            "branch_complete" => Some(Self::BranchComplete),
            _ => None,
        }
    }
}

/// Sub-scripts a suggestion can open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchKind {
    PremiumUpgrade,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerEvent {
    StartAnalysis,
    AnalysisFinished,
    SuggestionChosen { branch: Option<BranchKind> },
    SelectionConfirmed,
    TasksFinished,
    Reset,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FlowContext {
    pub selected_customers: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowAction {
    RunAnalysisSteps,
    RevealSuggestions,
    OpenConfigurator(BranchKind),
    PlanTasks,
    ExecuteTasks,
    PresentArtifacts,
    CancelPlayback,
    ClearSession,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: PlayerState,
    pub to: PlayerState,
    pub event: PlayerEvent,
    pub actions: Vec<FlowAction>,
}
