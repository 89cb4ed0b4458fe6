pub mod config;
pub mod documents;
pub mod domain;
pub mod errors;
pub mod fixtures;
pub mod flows;
pub mod intents;
pub mod journal;
pub mod render;
pub mod script;
pub mod session;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, PlayerConfig};
pub use documents::{Document, DocumentError, DocumentRenderer, OrderUpdateSummary, TaskArtifact};
pub use domain::analysis::{AnalysisStep, IconRef, StepId, StepStatus};
pub use domain::content::DynamicContent;
pub use domain::customer::CustomerId;
pub use domain::message::{Message, Role};
pub use domain::suggestion::{MatchThresholds, MatchTier, Suggestion, SuggestionId};
pub use domain::task::{TaskAction, TaskItem};
pub use domain::upgrade::{ConfirmedUpgrade, UpgradeConfigurator};
pub use errors::{ApplicationError, DomainError};
pub use fixtures::FixtureSet;
pub use flows::{FlowEngine, FlowTransitionError, GuidedUpgradeFlow, PlayerEvent, PlayerState};
pub use intents::{recognize, OrderIntent, Recognition};
pub use journal::{InMemoryJournal, JournalEntry, JournalSink, NullJournal};
pub use script::ConversationScript;
pub use session::{PlayerSnapshot, SnapshotError};
