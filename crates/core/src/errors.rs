use thiserror::Error;

use crate::{domain::analysis::StepStatus, flows::FlowTransitionError};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("status of `{id}` cannot move from {from:?} to {to:?}")]
    StatusRegression { id: String, from: StepStatus, to: StepStatus },
    #[error(transparent)]
    FlowTransition(#[from] FlowTransitionError),
    #[error("unknown {kind} `{id}`")]
    UnknownId { kind: &'static str, id: String },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Message safe to show in a shell without internal detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::FlowTransition(FlowTransitionError::EmptySelection {
                ..
            })) => "Select at least one customer before confirming.",
            Self::Domain(_) => "That action is not available right now.",
            Self::Persistence(_) => "The saved session could not be accessed.",
            Self::Configuration(_) => "Guidepost is misconfigured. Check guidepost.toml.",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError};
    use crate::flows::{FlowTransitionError, PlayerState};

    #[test]
    fn empty_selection_has_actionable_message() {
        let error = ApplicationError::from(DomainError::from(FlowTransitionError::EmptySelection {
            state: PlayerState::BranchConfiguring,
        }));

        assert_eq!(error.user_message(), "Select at least one customer before confirming.");
    }

    #[test]
    fn other_domain_errors_share_generic_message() {
        let error = ApplicationError::from(DomainError::UnknownId {
            kind: "suggestion",
            id: "sug-999".to_owned(),
        });

        assert_eq!(error.user_message(), "That action is not available right now.");
        assert_eq!(
            ApplicationError::Domain(DomainError::UnknownId {
                kind: "suggestion",
                id: "sug-999".to_owned()
            })
            .to_string(),
            "unknown suggestion `sug-999`"
        );
    }

    #[test]
    fn persistence_error_maps_to_session_message() {
        let error = ApplicationError::Persistence("database is locked".to_owned());
        assert_eq!(error.user_message(), "The saved session could not be accessed.");
    }
}
