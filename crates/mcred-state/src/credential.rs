//! # Micro-Credential Publication Workflow
//!
//! ```text
//! DRAFT ──submit──▶ UNDER_REVIEW ──publish──▶ PUBLISHED
//!   │                    │                       │
//!   └──────publish───────┼──────────────────────▶│
//!   │                    │                       │
//!   └──archive──▶ ARCHIVED ◀──archive────────────┘
//! ```
//!
//! Publishing is deliberately not idempotent: publishing a `PUBLISHED`
//! credential fails with "already published". `ARCHIVED` is terminal.

use crate::error::WorkflowError;

const ENTITY: &str = "micro-credential";

mcred_core::vocabulary! {
    /// Lifecycle status of a micro-credential.
    pub enum CredentialStatus {
        Draft => "DRAFT",
        UnderReview => "UNDER_REVIEW",
        Published => "PUBLISHED",
        Archived => "ARCHIVED",
    }
}

impl Default for CredentialStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl CredentialStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Archived)
    }

    /// Actions that succeed from this status.
    pub fn valid_actions(&self) -> &'static [CredentialAction] {
        match self {
            Self::Draft => &[
                CredentialAction::Submit,
                CredentialAction::Publish,
                CredentialAction::Archive,
            ],
            Self::UnderReview => &[CredentialAction::Publish, CredentialAction::Archive],
            Self::Published => &[CredentialAction::Archive],
            Self::Archived => &[],
        }
    }

    /// Statuses reachable in one step.
    pub fn valid_transitions(&self) -> &'static [CredentialStatus] {
        match self {
            Self::Draft => &[Self::UnderReview, Self::Published, Self::Archived],
            Self::UnderReview => &[Self::Published, Self::Archived],
            Self::Published => &[Self::Archived],
            Self::Archived => &[],
        }
    }
}

/// Status-changing operations exposed as `POST /api/credentials/:id/{action}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialAction {
    Submit,
    Publish,
    Archive,
}

impl CredentialAction {
    pub const ALL: &'static [CredentialAction] = &[Self::Submit, Self::Publish, Self::Archive];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Publish => "publish",
            Self::Archive => "archive",
        }
    }
}

impl std::fmt::Display for CredentialAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single transition function for micro-credentials.
pub fn transition(
    from: CredentialStatus,
    action: CredentialAction,
) -> Result<CredentialStatus, WorkflowError> {
    use CredentialAction as A;
    use CredentialStatus as S;

    match (from, action) {
        (S::Draft, A::Submit) => Ok(S::UnderReview),
        (S::Draft | S::UnderReview, A::Publish) => Ok(S::Published),
        (S::Draft | S::UnderReview | S::Published, A::Archive) => Ok(S::Archived),

        (S::Published, A::Publish) => Err(WorkflowError::AlreadyInState {
            entity: ENTITY,
            state: "published",
        }),
        (S::UnderReview, A::Submit) => Err(WorkflowError::AlreadyInState {
            entity: ENTITY,
            state: "under review",
        }),
        (S::Archived, A::Archive) => Err(WorkflowError::AlreadyInState {
            entity: ENTITY,
            state: "archived",
        }),
        (S::Archived, _) => Err(WorkflowError::Terminal {
            entity: ENTITY,
            state: "archived",
        }),
        (from, action) => Err(WorkflowError::InvalidTransition {
            entity: ENTITY,
            action: action.as_str(),
            from: from.as_str(),
        }),
    }
}
