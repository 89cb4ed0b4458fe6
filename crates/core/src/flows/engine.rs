use thiserror::Error;

use crate::flows::states::{
    BranchKind, FlowAction, FlowContext, PlayerEvent, PlayerState, TransitionOutcome,
};
use crate::journal::{JournalCategory, JournalEntry, JournalOutcome, JournalSink};

pub trait FlowDefinition {
    fn initial_state(&self) -> PlayerState;
    fn transition(
        &self,
        current: &PlayerState,
        event: &PlayerEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// Supplier-delay walkthrough: analysis, suggestion menu, premium upgrade branch.
#[derive(Clone, Debug, Default)]
pub struct GuidedUpgradeFlow;

impl FlowDefinition for GuidedUpgradeFlow {
    fn initial_state(&self) -> PlayerState {
        PlayerState::Idle
    }

    fn transition(
        &self,
        current: &PlayerState,
        event: &PlayerEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_guided_upgrade(current, event, context)
    }
}

#[derive(Clone, Debug)]
pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_state(&self) -> PlayerState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &PlayerState,
        event: &PlayerEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event, context)
    }

    pub fn apply_with_journal<S>(
        &self,
        current: &PlayerState,
        event: &PlayerEvent,
        context: &FlowContext,
        sink: &S,
        session_id: &str,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: JournalSink + ?Sized,
    {
        let result = self.apply(current, event, context);
        match &result {
            Ok(outcome) => sink.record(
                JournalEntry::new(
                    session_id,
                    "flow.transition_applied",
                    JournalCategory::Flow,
                    JournalOutcome::Success,
                )
                .with_metadata("from", outcome.from.as_str())
                .with_metadata("to", outcome.to.as_str())
                .with_metadata("event", format!("{:?}", outcome.event)),
            ),
            Err(error) => sink.record(
                JournalEntry::new(
                    session_id,
                    "flow.transition_rejected",
                    JournalCategory::Flow,
                    JournalOutcome::Rejected,
                )
                .with_metadata("error", error.to_string()),
            ),
        }
        result
    }
}

impl Default for FlowEngine<GuidedUpgradeFlow> {
    fn default() -> Self {
        Self::new(GuidedUpgradeFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("cannot confirm from {state:?} without at least one selected customer")]
    EmptySelection { state: PlayerState },
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: PlayerState, event: PlayerEvent },
}

fn transition_guided_upgrade(
    current: &PlayerState,
    event: &PlayerEvent,
    context: &FlowContext,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use FlowAction::{
        CancelPlayback, ClearSession, ExecuteTasks, OpenConfigurator, PlanTasks, PresentArtifacts,
        RevealSuggestions, RunAnalysisSteps,
    };
    use PlayerEvent::{
        AnalysisFinished, Reset, SelectionConfirmed, StartAnalysis, SuggestionChosen,
        TasksFinished,
    };
    use PlayerState::{
        Analyzing, BranchComplete, BranchConfiguring, BranchExecuting, Idle, SuggestionsShown,
    };

    let (to, actions) = match (current, event) {
        (Idle, StartAnalysis) => (Analyzing, vec![RunAnalysisSteps]),
        (Analyzing, AnalysisFinished) => (SuggestionsShown, vec![RevealSuggestions]),
        (SuggestionsShown, SuggestionChosen { branch: Some(BranchKind::PremiumUpgrade) }) => {
            (BranchConfiguring, vec![OpenConfigurator(BranchKind::PremiumUpgrade)])
        }
        // Unwired suggestions are inert.
        (SuggestionsShown, SuggestionChosen { branch: None }) => (SuggestionsShown, Vec::new()),
        (BranchConfiguring, SelectionConfirmed) => {
            if context.selected_customers == 0 {
                return Err(FlowTransitionError::EmptySelection { state: *current });
            }
            (BranchExecuting, vec![PlanTasks, ExecuteTasks])
        }
        (BranchExecuting, TasksFinished) => (BranchComplete, vec![PresentArtifacts]),
        (_, Reset) => (Idle, vec![CancelPlayback, ClearSession]),
        _ => {
            return Err(FlowTransitionError::InvalidTransition {
                state: *current,
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: *current, to, event: event.clone(), actions })
}

#[cfg(test)]
mod tests {
    use crate::flows::engine::{FlowDefinition, FlowEngine, FlowTransitionError, GuidedUpgradeFlow};
    use crate::flows::states::{BranchKind, FlowAction, FlowContext, PlayerEvent, PlayerState};
    use crate::journal::InMemoryJournal;

    fn chosen(branch: Option<BranchKind>) -> PlayerEvent {
        PlayerEvent::SuggestionChosen { branch }
    }

    #[test]
    fn upgrade_flow_happy_path() {
        let engine = FlowEngine::new(GuidedUpgradeFlow);
        let mut state = engine.initial_state();
        let context = FlowContext { selected_customers: 2 };

        state = engine
            .apply(&state, &PlayerEvent::StartAnalysis, &context)
            .expect("idle -> analyzing")
            .to;
        state = engine
            .apply(&state, &PlayerEvent::AnalysisFinished, &context)
            .expect("analyzing -> suggestions")
            .to;
        let configuring = engine
            .apply(&state, &chosen(Some(BranchKind::PremiumUpgrade)), &context)
            .expect("suggestions -> configuring");
        assert_eq!(configuring.to, PlayerState::BranchConfiguring);
        assert_eq!(configuring.actions, vec![FlowAction::OpenConfigurator(BranchKind::PremiumUpgrade)]);

        state = engine
            .apply(&configuring.to, &PlayerEvent::SelectionConfirmed, &context)
            .expect("configuring -> executing")
            .to;
        let complete = engine
            .apply(&state, &PlayerEvent::TasksFinished, &context)
            .expect("executing -> complete");
        assert_eq!(complete.to, PlayerState::BranchComplete);
        assert!(complete.actions.contains(&FlowAction::PresentArtifacts));
    }

    #[test]
    fn inert_suggestion_leaves_state_unchanged() {
        let engine = FlowEngine::default();
        let outcome = engine
            .apply(&PlayerState::SuggestionsShown, &chosen(None), &FlowContext::default())
            .expect("inert suggestion is accepted");

        assert_eq!(outcome.to, PlayerState::SuggestionsShown);
        assert!(outcome.actions.is_empty());
    }

    #[test]
    fn empty_selection_is_rejected() {
        let engine = FlowEngine::default();
        let error = engine
            .apply(
                &PlayerState::BranchConfiguring,
                &PlayerEvent::SelectionConfirmed,
                &FlowContext { selected_customers: 0 },
            )
            .expect_err("must reject empty selection");

        assert_eq!(error, FlowTransitionError::EmptySelection { state: PlayerState::BranchConfiguring });
    }

    #[test]
    fn invalid_transition_is_rejected() {
        let engine = FlowEngine::default();
        let error = engine
            .apply(&PlayerState::Idle, &PlayerEvent::TasksFinished, &FlowContext::default())
            .expect_err("idle cannot finish tasks");

        assert!(matches!(
            error,
            FlowTransitionError::InvalidTransition {
                state: PlayerState::Idle,
                event: PlayerEvent::TasksFinished
            }
        ));
    }

    #[test]
    fn reset_returns_to_idle_from_every_state() {
        let engine = FlowEngine::default();
        for state in [
            PlayerState::Idle,
            PlayerState::Analyzing,
            PlayerState::SuggestionsShown,
            PlayerState::BranchConfiguring,
            PlayerState::BranchExecuting,
            PlayerState::BranchComplete,
        ] {
            let outcome = engine
                .apply(&state, &PlayerEvent::Reset, &FlowContext::default())
                .expect("reset always applies");
            assert_eq!(outcome.to, PlayerState::Idle);
            assert!(outcome.actions.contains(&FlowAction::CancelPlayback));
        }
    }

    #[test]
    fn complete_is_terminal_until_reset() {
        let engine = FlowEngine::default();
        for event in [
            PlayerEvent::StartAnalysis,
            PlayerEvent::AnalysisFinished,
            chosen(Some(BranchKind::PremiumUpgrade)),
            PlayerEvent::SelectionConfirmed,
            PlayerEvent::TasksFinished,
        ] {
            assert!(engine
                .apply(&PlayerState::BranchComplete, &event, &FlowContext { selected_customers: 1 })
                .is_err());
        }
        assert_eq!(GuidedUpgradeFlow.initial_state(), PlayerState::Idle);
    }

    #[test]
    fn transitions_are_journaled() {
        let engine = FlowEngine::default();
        let journal = InMemoryJournal::default();

        engine
            .apply_with_journal(
                &PlayerState::Idle,
                &PlayerEvent::StartAnalysis,
                &FlowContext::default(),
                &journal,
                "session-7",
            )
            .expect("transition should succeed");
        let _ = engine.apply_with_journal(
            &PlayerState::Idle,
            &PlayerEvent::SelectionConfirmed,
            &FlowContext::default(),
            &journal,
            "session-7",
        );

        let entries = journal.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event_type, "flow.transition_applied");
        assert_eq!(entries[0].metadata("to"), Some("analyzing"));
        assert_eq!(entries[1].event_type, "flow.transition_rejected");
        assert_eq!(entries[1].session_id, "session-7");
    }
}
