//! Workflow errors.

use thiserror::Error;

/// A requested status change was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// The action would leave the entity where it already is.
    #[error("{entity} is already {state}")]
    AlreadyInState {
        entity: &'static str,
        state: &'static str,
    },

    /// The action is not available from the current status.
    #[error("cannot {action} {entity} with status {from}")]
    InvalidTransition {
        entity: &'static str,
        action: &'static str,
        from: &'static str,
    },

    /// The entity is in a terminal status.
    #[error("{entity} is {state} and cannot change status")]
    Terminal {
        entity: &'static str,
        state: &'static str,
    },

    /// A related entity is not in the status this operation requires.
    #[error("{0}")]
    PreconditionFailed(String),
}

impl WorkflowError {
    /// Whether this error is a precondition on a related entity rather than
    /// a conflict with the entity's own status.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::PreconditionFailed(_))
    }
}
