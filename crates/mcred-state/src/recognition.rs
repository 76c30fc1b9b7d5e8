//! # Recognition Activation
//!
//! Recognitions carry no status enum, only `isActive`. Activation and
//! deactivation are free, idempotent toggles. The interesting rule is the
//! creation gate: an institution may only recognize a credential that has
//! been published.

use crate::credential::CredentialStatus;
use crate::error::WorkflowError;

/// Toggle operations exposed as `POST /api/recognitions/:id/{action}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecognitionAction {
    Activate,
    Deactivate,
}

impl RecognitionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
        }
    }

    /// Resulting `isActive` value. Independent of the current value.
    pub fn apply(&self, _is_active: bool) -> bool {
        matches!(self, Self::Activate)
    }
}

/// Gate for creating (or re-pointing) a recognition at a credential.
pub fn ensure_recognizable(credential_status: CredentialStatus) -> Result<(), WorkflowError> {
    if credential_status == CredentialStatus::Published {
        Ok(())
    } else {
        Err(WorkflowError::PreconditionFailed(format!(
            "only published micro-credentials can be recognized (status is {credential_status})"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_are_idempotent() {
        for current in [true, false] {
            assert!(RecognitionAction::Activate.apply(current));
            assert!(!RecognitionAction::Deactivate.apply(current));
        }
    }

    #[test]
    fn only_published_credentials_are_recognizable() {
        assert!(ensure_recognizable(CredentialStatus::Published).is_ok());
        for status in [
            CredentialStatus::Draft,
            CredentialStatus::UnderReview,
            CredentialStatus::Archived,
        ] {
            let err = ensure_recognizable(status).unwrap_err();
            assert!(err.is_precondition());
            assert!(err.to_string().contains(status.as_str()), "{err}");
        }
    }
}
