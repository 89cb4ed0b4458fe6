pub mod engine;
pub mod states;

pub use engine::{FlowDefinition, FlowEngine, FlowTransitionError, GuidedUpgradeFlow};
pub use states::{BranchKind, FlowAction, FlowContext, PlayerEvent, PlayerState, TransitionOutcome};
