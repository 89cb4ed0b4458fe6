//! Timed driver for the guided conversation.
//!
//! The transition table lives in `guidepost_core::flows`; this module owns the
//! clock. Each step or task is a cursor move followed by a paced wait, and
//! every state mutation re-checks the pacer under the state lock, so a reset
//! that lands during a wait wins over the resumption.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use guidepost_core::config::AppConfig;
use guidepost_core::documents::{DocumentError, DocumentRenderer, TaskArtifact};
use guidepost_core::domain::analysis::{AnalysisStep, StepStatus};
use guidepost_core::domain::customer::CustomerId;
use guidepost_core::domain::message::{Message, Role};
use guidepost_core::domain::suggestion::{MatchThresholds, RankedSuggestion, SuggestionId};
use guidepost_core::domain::task::{plan_tasks, TaskId, TaskItem};
use guidepost_core::domain::upgrade::{
    ConfirmedUpgrade, UpgradeConfigurator, UpgradeOption, UpgradePreview, UpgradeSku,
};
use guidepost_core::errors::DomainError;
use guidepost_core::fixtures::FixtureSet;
use guidepost_core::flows::{
    BranchKind, FlowContext, FlowEngine, FlowTransitionError, GuidedUpgradeFlow, PlayerEvent,
    PlayerState, TransitionOutcome,
};
use guidepost_core::journal::{
    JournalCategory, JournalEntry, JournalOutcome, JournalSink, NullJournal,
};
use guidepost_core::script::ConversationScript;
use guidepost_core::session::{PlayerSnapshot, SnapshotError, StepRecord, SNAPSHOT_VERSION};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::pacing::{Cancelled, Pacer, PacingProfile};
use crate::systems::BusinessSystems;
use crate::transcript::Transcript;

pub const ANALYSIS_NOTICE: &str = "Analyzing the supplier notification...";

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error(transparent)]
    Flow(#[from] FlowTransitionError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("`{operation}` is not available while the player is {state:?}")]
    WrongState { operation: &'static str, state: PlayerState },
}

impl PlayerError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

#[derive(Clone, Debug)]
pub struct PlayerOptions {
    pub session_id: String,
    pub pacing: PacingProfile,
    pub thresholds: MatchThresholds,
    pub script: ConversationScript,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            session_id: "guidepost-demo".to_owned(),
            pacing: PacingProfile::default(),
            thresholds: MatchThresholds::default(),
            script: ConversationScript::supplier_delay(),
        }
    }
}

impl PlayerOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            session_id: config.session.key.clone(),
            pacing: PacingProfile::from(&config.player),
            thresholds: config.suggestions.thresholds(),
            script: ConversationScript::supplier_delay(),
        }
    }

    pub fn instant() -> Self {
        Self { pacing: PacingProfile::instant(), ..Self::default() }
    }
}

/// What observers see after every mutation.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerView {
    pub state: PlayerState,
    pub steps: Vec<AnalysisStep>,
    pub progress: f64,
    pub suggestions: Vec<RankedSuggestion>,
    pub selected_suggestion: Option<SuggestionId>,
    pub selected_sku: Option<String>,
    pub selected_customers: Vec<CustomerId>,
    pub preview: Option<UpgradePreview>,
    pub tasks: Vec<TaskItem>,
}

impl PlayerView {
    fn idle() -> Self {
        Self {
            state: PlayerState::Idle,
            steps: Vec::new(),
            progress: 0.0,
            suggestions: Vec::new(),
            selected_suggestion: None,
            selected_sku: None,
            selected_customers: Vec::new(),
            preview: None,
            tasks: Vec::new(),
        }
    }

    pub fn running_steps(&self) -> usize {
        self.steps.iter().filter(|step| step.status == StepStatus::Running).count()
    }

    pub fn running_tasks(&self) -> usize {
        self.tasks.iter().filter(|task| task.status == StepStatus::Running).count()
    }
}

#[derive(Debug)]
struct PlayerInner {
    state: PlayerState,
    steps: Vec<AnalysisStep>,
    selected_suggestion: Option<SuggestionId>,
    configurator: Option<UpgradeConfigurator>,
    confirmed: Option<ConfirmedUpgrade>,
    tasks: Vec<TaskItem>,
    artifacts: HashMap<TaskId, TaskArtifact>,
}

impl PlayerInner {
    fn idle() -> Self {
        Self {
            state: PlayerState::Idle,
            steps: Vec::new(),
            selected_suggestion: None,
            configurator: None,
            confirmed: None,
            tasks: Vec::new(),
            artifacts: HashMap::new(),
        }
    }

    fn selected_count(&self) -> usize {
        self.configurator
            .as_ref()
            .map(|configurator| configurator.selected_customers().count())
            .unwrap_or(0)
    }
}

enum Cursor {
    Start(usize),
    Finish(usize),
    Done,
}

pub struct GuidedPlayer {
    fixtures: Arc<FixtureSet>,
    systems: Arc<dyn BusinessSystems>,
    journal: Arc<dyn JournalSink>,
    renderer: DocumentRenderer,
    engine: FlowEngine<GuidedUpgradeFlow>,
    options: PlayerOptions,
    pacer: Mutex<Pacer>,
    inner: Mutex<PlayerInner>,
    transcript: Transcript,
    view: watch::Sender<PlayerView>,
}

impl GuidedPlayer {
    pub fn new(
        fixtures: Arc<FixtureSet>,
        systems: Arc<dyn BusinessSystems>,
        options: PlayerOptions,
    ) -> Result<Self, PlayerError> {
        fixtures.validate()?;
        let (view, _) = watch::channel(PlayerView::idle());
        Ok(Self {
            fixtures,
            systems,
            journal: Arc::new(NullJournal),
            renderer: DocumentRenderer::with_embedded_templates()?,
            engine: FlowEngine::default(),
            options,
            pacer: Mutex::new(Pacer::new()),
            inner: Mutex::new(PlayerInner::idle()),
            transcript: Transcript::new(),
            view,
        })
    }

    pub fn with_journal(mut self, journal: Arc<dyn JournalSink>) -> Self {
        self.journal = journal;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.options.session_id
    }

    pub fn subscribe(&self) -> watch::Receiver<PlayerView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> PlayerView {
        self.view.borrow().clone()
    }

    pub fn state(&self) -> PlayerState {
        self.lock().state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn progress(&self) -> f64 {
        self.view.borrow().progress
    }

    /// Plays every analysis step, then reveals the suggestion menu.
    pub async fn run_analysis(&self) -> Result<(), PlayerError> {
        let pacer = self.current_pacer();
        self.commit(&pacer, |inner| {
            self.transition(inner, PlayerEvent::StartAnalysis)?;
            inner.steps.clear();
            Ok(())
        })?;
        self.transcript.push(Message::system(ANALYSIS_NOTICE));

        let result = self.continue_analysis(&pacer).await;
        self.note_cancellation("analysis", &result);
        result
    }

    pub fn suggestions(&self) -> Vec<RankedSuggestion> {
        self.view.borrow().suggestions.clone()
    }

    /// Opens the wired branch for `suggestion_id`, or does nothing for an
    /// inert suggestion. Returns the branch that was opened.
    pub async fn choose_suggestion(
        &self,
        suggestion_id: &SuggestionId,
    ) -> Result<Option<BranchKind>, PlayerError> {
        let pacer = self.current_pacer();
        if self.fixtures.suggestion(suggestion_id).is_none() {
            return Err(DomainError::UnknownId { kind: "suggestion", id: suggestion_id.0.clone() }.into());
        }
        let branch = self.options.script.branch_for(suggestion_id);
        let event = PlayerEvent::SuggestionChosen { branch };
        {
            let inner = self.lock();
            self.engine.apply(&inner.state, &event, &FlowContext::default())?;
        }

        let Some(branch) = branch else {
            self.commit(&pacer, |inner| {
                self.transition(inner, event)?;
                Ok(())
            })?;
            debug!(
                event_name = "player.suggestion.inert",
                suggestion_id = suggestion_id.as_str(),
                "suggestion has no branch"
            );
            return Ok(None);
        };

        let options = pacer.guard(self.systems.get_premium_upgrade_options()).await?;
        let configurator = UpgradeConfigurator::new(self.fixtures.upgrade_skus.clone(), options)?;
        self.commit(&pacer, |inner| {
            self.transition(inner, event)?;
            inner.selected_suggestion = Some(suggestion_id.clone());
            inner.configurator = Some(configurator);
            Ok(())
        })?;
        info!(
            event_name = "player.branch.opened",
            session_id = %self.options.session_id,
            suggestion_id = suggestion_id.as_str(),
            branch = ?branch,
            "branch configurator opened"
        );
        Ok(Some(branch))
    }

    pub fn upgrade_skus(&self) -> Vec<UpgradeSku> {
        self.lock().configurator.as_ref().map(|c| c.skus().to_vec()).unwrap_or_default()
    }

    pub fn upgrade_options(&self) -> Vec<UpgradeOption> {
        self.lock().configurator.as_ref().map(|c| c.options().to_vec()).unwrap_or_default()
    }

    pub fn preview(&self) -> Option<UpgradePreview> {
        self.lock().configurator.as_ref().map(UpgradeConfigurator::preview)
    }

    pub fn select_sku(&self, sku: &str) -> Result<(), PlayerError> {
        self.configure("select_sku", |configurator| configurator.select_sku(sku))
    }

    /// Returns whether the customer is selected afterwards.
    pub fn toggle_customer(&self, customer_id: &CustomerId) -> Result<bool, PlayerError> {
        self.configure("toggle_customer", |configurator| configurator.toggle_customer(customer_id))
    }

    pub fn set_customers(&self, customer_ids: &[CustomerId]) -> Result<(), PlayerError> {
        self.configure("set_customers", |configurator| configurator.set_customers(customer_ids))
    }

    /// Plans the task batch. Rejected, with state unchanged, when no customer
    /// is selected.
    pub fn confirm_selection(&self) -> Result<Vec<TaskItem>, PlayerError> {
        let pacer = self.current_pacer();
        self.commit(&pacer, |inner| {
            let confirmed = match &inner.configurator {
                Some(configurator) if configurator.can_confirm() => Some(configurator.confirm()?),
                _ => None,
            };
            self.transition(inner, PlayerEvent::SelectionConfirmed)?;
            let confirmed = confirmed.ok_or_else(|| {
                DomainError::InvariantViolation("confirmed without an upgrade selection".to_owned())
            })?;

            inner.tasks = plan_tasks(&confirmed);
            self.record(
                self.entry("branch.tasks_planned", JournalCategory::Branch, JournalOutcome::Success)
                    .with_metadata("sku", confirmed.sku.sku.clone())
                    .with_metadata("tasks", inner.tasks.len().to_string()),
            );
            inner.confirmed = Some(confirmed);
            Ok(inner.tasks.clone())
        })
    }

    /// Runs the planned tasks in order, one at a time.
    pub async fn execute_tasks(&self) -> Result<(), PlayerError> {
        let pacer = self.current_pacer();
        let state = self.state();
        if state != PlayerState::BranchExecuting {
            return Err(PlayerError::WrongState { operation: "execute_tasks", state });
        }
        let result = self.continue_tasks(&pacer).await;
        self.note_cancellation("tasks", &result);
        result
    }

    pub fn artifact(&self, task_id: &TaskId) -> Option<TaskArtifact> {
        self.lock().artifacts.get(task_id).cloned()
    }

    /// Artifacts of completed tasks, in task order.
    pub fn artifacts(&self) -> Vec<(TaskItem, TaskArtifact)> {
        let inner = self.lock();
        inner
            .tasks
            .iter()
            .filter_map(|task| inner.artifacts.get(&task.id).map(|artifact| (task.clone(), artifact.clone())))
            .collect()
    }

    /// Cancels in-flight playback and clears the session.
    pub fn reset(&self) {
        let mut inner = self.lock();
        self.replace_pacer();
        let from = inner.state;
        if let Err(error) = self.transition(&mut inner, PlayerEvent::Reset) {
            debug!(event_name = "player.reset.rejected", error = %error, "reset transition rejected");
        }
        *inner = PlayerInner::idle();
        self.publish(&inner);
        drop(inner);
        self.transcript.clear();
        info!(
            event_name = "player.reset",
            session_id = %self.options.session_id,
            from = from.as_str(),
            "player reset"
        );
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let inner = self.lock();
        PlayerSnapshot {
            version: SNAPSHOT_VERSION,
            session_id: self.options.session_id.clone(),
            state: inner.state,
            steps: inner.steps.iter().map(StepRecord::from).collect(),
            selected_suggestion: inner.selected_suggestion.clone(),
            selected_sku: inner.configurator.as_ref().map(|c| c.selected_sku().to_owned()),
            selected_customers: inner
                .configurator
                .as_ref()
                .map(|c| c.selected_customers().cloned().collect())
                .unwrap_or_default(),
            tasks: inner.tasks.clone(),
            saved_at: Utc::now(),
        }
    }

    /// Replaces the current session with `snapshot`. In-flight playback is
    /// cancelled; call [`GuidedPlayer::resume`] to continue a restored run.
    pub fn restore(&self, snapshot: PlayerSnapshot) -> Result<(), PlayerError> {
        snapshot.validate()?;
        let definitions = self.options.script.steps();
        if snapshot.steps.len() > definitions.len()
            || snapshot.steps.iter().zip(definitions).any(|(record, definition)| record.id != definition.id)
        {
            return Err(SnapshotError::Inconsistent(
                "analysis steps do not match the conversation script".to_owned(),
            )
            .into());
        }

        let mut restored = PlayerInner::idle();
        restored.state = snapshot.state;
        restored.steps = snapshot.restore_steps();
        if matches!(
            snapshot.state,
            PlayerState::BranchConfiguring | PlayerState::BranchExecuting | PlayerState::BranchComplete
        ) {
            let mut configurator = self.fixtures.configurator()?;
            if let Some(sku) = &snapshot.selected_sku {
                configurator.select_sku(sku)?;
            }
            configurator.set_customers(&snapshot.selected_customers)?;
            if snapshot.state != PlayerState::BranchConfiguring {
                restored.confirmed = Some(configurator.confirm()?);
            }
            restored.selected_suggestion = snapshot.selected_suggestion.clone();
            restored.configurator = Some(configurator);
        }
        restored.tasks = snapshot.tasks;
        if let Some(confirmed) = &restored.confirmed {
            let generated_on = Utc::now().date_naive();
            for task in restored.tasks.iter().filter(|task| task.status == StepStatus::Complete) {
                let artifact =
                    self.renderer.artifact_for(&task.action, confirmed, &self.fixtures, generated_on)?;
                restored.artifacts.insert(task.id.clone(), artifact);
            }
        }

        let mut inner = self.lock();
        self.replace_pacer();
        *inner = restored;
        self.publish(&inner);
        drop(inner);
        self.transcript.clear();

        self.record(
            self.entry("session.restored", JournalCategory::Session, JournalOutcome::Success)
                .with_metadata("state", snapshot.state.as_str()),
        );
        info!(
            event_name = "player.session.restored",
            session_id = %self.options.session_id,
            state = snapshot.state.as_str(),
            "session restored"
        );
        Ok(())
    }

    /// Continues a restored run from its cursor. States without pending
    /// playback are left as they are.
    pub async fn resume(&self) -> Result<(), PlayerError> {
        let pacer = self.current_pacer();
        let result = match self.state() {
            PlayerState::Analyzing => self.continue_analysis(&pacer).await,
            PlayerState::BranchExecuting => self.continue_tasks(&pacer).await,
            _ => Ok(()),
        };
        self.note_cancellation("resume", &result);
        result
    }

    async fn continue_analysis(&self, pacer: &Pacer) -> Result<(), PlayerError> {
        let definitions = self.options.script.steps();
        loop {
            let cursor = {
                let inner = self.lock();
                match inner.steps.last() {
                    Some(step) if step.status == StepStatus::Running => Cursor::Finish(inner.steps.len() - 1),
                    _ if inner.steps.len() < definitions.len() => Cursor::Start(inner.steps.len()),
                    _ => Cursor::Done,
                }
            };

            match cursor {
                Cursor::Start(index) => {
                    let definition = &definitions[index];
                    self.commit(pacer, |inner| {
                        inner.steps.push(definition.start());
                        Ok(())
                    })?;
                    self.record(
                        self.entry("analysis.step_started", JournalCategory::Analysis, JournalOutcome::Success)
                            .with_metadata("step", definition.id.as_str()),
                    );
                    info!(
                        event_name = "player.step.started",
                        session_id = %self.options.session_id,
                        step = definition.id.as_str(),
                        "analysis step started"
                    );
                }
                Cursor::Finish(index) => {
                    let definition = definitions.get(index).ok_or_else(|| {
                        DomainError::InvariantViolation(format!("no script step at position {index}"))
                    })?;
                    let waited = pacer.pause_for(self.options.pacing.analysis_step).await?;
                    self.commit(pacer, |inner| {
                        let step = inner.steps.get_mut(index).ok_or_else(|| DomainError::UnknownId {
                            kind: "analysis step",
                            id: definition.id.as_str().to_owned(),
                        })?;
                        step.complete(definition.result.clone())?;
                        Ok(())
                    })?;
                    self.record(
                        self.entry("analysis.step_completed", JournalCategory::Analysis, JournalOutcome::Success)
                            .with_metadata("step", definition.id.as_str())
                            .with_metadata("waited_ms", waited.as_millis().to_string()),
                    );
                    info!(
                        event_name = "player.step.completed",
                        session_id = %self.options.session_id,
                        step = definition.id.as_str(),
                        waited_ms = waited.as_millis() as u64,
                        "analysis step completed"
                    );
                }
                Cursor::Done => break,
            }
        }

        pacer.pause(self.options.pacing.settle).await?;
        self.commit(pacer, |inner| {
            self.transition(inner, PlayerEvent::AnalysisFinished)?;
            Ok(())
        })?;

        let summary = format!(
            "I found {} ways to keep your events on schedule. Pick one to continue.",
            self.fixtures.suggestions.len()
        );
        self.transcript
            .stream(pacer, Role::Assistant, &summary, self.options.pacing.stream_char)
            .await?;
        Ok(())
    }

    async fn continue_tasks(&self, pacer: &Pacer) -> Result<(), PlayerError> {
        loop {
            let cursor = {
                let inner = self.lock();
                match inner.tasks.iter().position(|task| task.status != StepStatus::Complete) {
                    Some(index) if inner.tasks[index].status == StepStatus::Pending => Cursor::Start(index),
                    Some(index) => Cursor::Finish(index),
                    None => Cursor::Done,
                }
            };

            match cursor {
                Cursor::Start(index) => {
                    let task_id = self.commit(pacer, |inner| {
                        let task = &mut inner.tasks[index];
                        task.advance(StepStatus::Running)?;
                        Ok(task.id.clone())
                    })?;
                    info!(
                        event_name = "player.task.started",
                        session_id = %self.options.session_id,
                        task_id = task_id.as_str(),
                        "task started"
                    );
                }
                Cursor::Finish(index) => {
                    pacer.pause(self.options.pacing.task_step).await?;
                    let task_id = self.commit(pacer, |inner| {
                        let confirmed = inner.confirmed.as_ref().ok_or_else(|| {
                            DomainError::InvariantViolation("tasks running without a confirmed upgrade".to_owned())
                        })?;
                        let artifact = self.renderer.artifact_for(
                            &inner.tasks[index].action,
                            confirmed,
                            &self.fixtures,
                            Utc::now().date_naive(),
                        )?;
                        let task = &mut inner.tasks[index];
                        task.advance(StepStatus::Complete)?;
                        let task_id = task.id.clone();
                        inner.artifacts.insert(task_id.clone(), artifact);
                        Ok(task_id)
                    })?;
                    self.record(
                        self.entry("branch.task_completed", JournalCategory::Branch, JournalOutcome::Success)
                            .with_metadata("task", task_id.as_str()),
                    );
                    info!(
                        event_name = "player.task.completed",
                        session_id = %self.options.session_id,
                        task_id = task_id.as_str(),
                        "task completed"
                    );
                }
                Cursor::Done => break,
            }
        }

        let completed = self.commit(pacer, |inner| {
            self.transition(inner, PlayerEvent::TasksFinished)?;
            Ok(inner.tasks.len())
        })?;
        let summary = format!(
            "All {completed} tasks are complete. The order updates, mitigation report and customer email are ready."
        );
        self.transcript
            .stream(pacer, Role::Assistant, &summary, self.options.pacing.stream_char)
            .await?;
        Ok(())
    }

    fn configure<T, F>(&self, operation: &'static str, apply: F) -> Result<T, PlayerError>
    where
        F: FnOnce(&mut UpgradeConfigurator) -> Result<T, DomainError>,
    {
        let mut inner = self.lock();
        let state = inner.state;
        let Some(configurator) = inner.configurator.as_mut().filter(|_| state == PlayerState::BranchConfiguring)
        else {
            return Err(PlayerError::WrongState { operation, state });
        };
        let value = apply(configurator)?;
        self.publish(&inner);
        debug!(event_name = "player.configurator.changed", operation, "configurator updated");
        Ok(value)
    }

    fn transition(
        &self,
        inner: &mut PlayerInner,
        event: PlayerEvent,
    ) -> Result<TransitionOutcome, PlayerError> {
        let context = FlowContext { selected_customers: inner.selected_count() };
        let outcome = self.engine.apply_with_journal(
            &inner.state,
            &event,
            &context,
            self.journal.as_ref(),
            &self.options.session_id,
        )?;
        inner.state = outcome.to;
        info!(
            event_name = "player.transition",
            session_id = %self.options.session_id,
            from = outcome.from.as_str(),
            to = outcome.to.as_str(),
            "player state changed"
        );
        Ok(outcome)
    }

    /// Applies `mutate` unless `pacer` was cancelled, then publishes the view.
    fn commit<T, F>(&self, pacer: &Pacer, mutate: F) -> Result<T, PlayerError>
    where
        F: FnOnce(&mut PlayerInner) -> Result<T, PlayerError>,
    {
        let mut inner = self.lock();
        pacer.checkpoint()?;
        let result = mutate(&mut inner);
        if result.is_ok() {
            self.publish(&inner);
        }
        result
    }

    fn publish(&self, inner: &PlayerInner) {
        let total = self.options.script.steps().len();
        let complete = inner.steps.iter().filter(|step| step.status == StepStatus::Complete).count();
        let progress = if total == 0 { 0.0 } else { (complete as f64 / total as f64).min(1.0) };
        let suggestions = if matches!(inner.state, PlayerState::Idle | PlayerState::Analyzing) {
            Vec::new()
        } else {
            self.rank_suggestions()
        };

        self.view.send_replace(PlayerView {
            state: inner.state,
            steps: inner.steps.clone(),
            progress,
            suggestions,
            selected_suggestion: inner.selected_suggestion.clone(),
            selected_sku: inner.configurator.as_ref().map(|c| c.selected_sku().to_owned()),
            selected_customers: inner
                .configurator
                .as_ref()
                .map(|c| c.selected_customers().cloned().collect())
                .unwrap_or_default(),
            preview: inner.configurator.as_ref().map(UpgradeConfigurator::preview),
            tasks: inner.tasks.clone(),
        });
    }

    fn rank_suggestions(&self) -> Vec<RankedSuggestion> {
        self.fixtures
            .suggestions
            .iter()
            .map(|suggestion| RankedSuggestion {
                suggestion: suggestion.clone(),
                tier: self.options.thresholds.tier(suggestion.confidence),
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, PlayerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_pacer(&self) -> Pacer {
        self.pacer.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn replace_pacer(&self) {
        let mut pacer = self.pacer.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::take(&mut *pacer);
        previous.cancel();
    }

    fn entry(&self, event_type: &str, category: JournalCategory, outcome: JournalOutcome) -> JournalEntry {
        JournalEntry::new(self.options.session_id.clone(), event_type, category, outcome)
    }

    fn record(&self, entry: JournalEntry) {
        self.journal.record(entry);
    }

    fn note_cancellation(&self, phase: &'static str, result: &Result<(), PlayerError>) {
        if matches!(result, Err(PlayerError::Cancelled(_))) {
            self.record(
                self.entry("player.playback_cancelled", JournalCategory::Session, JournalOutcome::Cancelled)
                    .with_metadata("phase", phase),
            );
            debug!(event_name = "player.cancelled", phase, "playback cancelled");
        }
    }
}

impl Drop for GuidedPlayer {
    fn drop(&mut self) {
        self.current_pacer().cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use guidepost_core::domain::analysis::StepStatus;
    use guidepost_core::domain::customer::CustomerId;
    use guidepost_core::domain::suggestion::{MatchTier, SuggestionId};
    use guidepost_core::fixtures::FixtureSet;
    use guidepost_core::flows::{FlowTransitionError, PlayerState};

    use super::{GuidedPlayer, PlayerError, PlayerOptions};
    use crate::systems::MockBusinessSystems;

    fn instant_player() -> GuidedPlayer {
        let fixtures = Arc::new(FixtureSet::demo());
        let systems = Arc::new(MockBusinessSystems::new(Arc::clone(&fixtures)).with_latency(false));
        GuidedPlayer::new(fixtures, systems, PlayerOptions::instant()).expect("player")
    }

    #[tokio::test]
    async fn instant_run_reaches_suggestions() {
        let player = instant_player();
        player.run_analysis().await.expect("analysis");

        let view = player.view();
        assert_eq!(view.state, PlayerState::SuggestionsShown);
        assert_eq!(view.progress, 1.0);
        assert!(view.steps.iter().all(|step| step.status == StepStatus::Complete));
        assert_eq!(view.suggestions.len(), 4);
        assert_eq!(view.suggestions[0].tier, MatchTier::Strong);
    }

    #[tokio::test]
    async fn configurator_operations_need_the_branch() {
        let player = instant_player();
        assert!(matches!(
            player.toggle_customer(&CustomerId::new("CUST-001")),
            Err(PlayerError::WrongState { state: PlayerState::Idle, .. })
        ));

        player.run_analysis().await.expect("analysis");
        assert_eq!(
            player.choose_suggestion(&SuggestionId::new("sug-001")).await.expect("inert"),
            None
        );
        assert_eq!(player.state(), PlayerState::SuggestionsShown);
        assert!(player.select_sku("PX-1000").is_err());
    }

    #[tokio::test]
    async fn empty_confirmation_leaves_state_unchanged() {
        let player = instant_player();
        player.run_analysis().await.expect("analysis");
        player.choose_suggestion(&SuggestionId::new("sug-003")).await.expect("branch");

        let error = player.confirm_selection().expect_err("nothing selected");
        assert!(matches!(error, PlayerError::Flow(FlowTransitionError::EmptySelection { .. })));
        assert_eq!(player.state(), PlayerState::BranchConfiguring);
        assert!(player.view().tasks.is_empty());
    }

    #[tokio::test]
    async fn unknown_suggestion_is_rejected() {
        let player = instant_player();
        player.run_analysis().await.expect("analysis");

        assert!(matches!(
            player.choose_suggestion(&SuggestionId::new("sug-404")).await,
            Err(PlayerError::Domain(_))
        ));
    }
}
