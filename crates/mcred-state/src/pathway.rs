//! # Transfer Pathway Approval Workflow
//!
//! ```text
//! DRAFT ──submit──▶ UNDER_REVIEW ──approve──▶ APPROVED ──activate──▶ ACTIVE
//!   │                                            ▲                  │    ▲
//!   └───────────────approve──────────────────────┘          suspend │    │ activate
//!                                                                   ▼    │
//!                                                                 SUSPENDED
//! any non-archived status ──archive──▶ ARCHIVED (terminal)
//! ```
//!
//! Ordering is strict: a pathway cannot become `ACTIVE` without first
//! being `APPROVED`, and only an `ACTIVE` pathway can be suspended.

use crate::error::WorkflowError;

const ENTITY: &str = "pathway";

mcred_core::vocabulary! {
    /// Lifecycle status of a transfer pathway.
    pub enum PathwayStatus {
        Draft => "DRAFT",
        UnderReview => "UNDER_REVIEW",
        Approved => "APPROVED",
        Active => "ACTIVE",
        Suspended => "SUSPENDED",
        Archived => "ARCHIVED",
    }
}

impl Default for PathwayStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl PathwayStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Archived)
    }

    pub fn valid_actions(&self) -> &'static [PathwayAction] {
        use PathwayAction as A;
        match self {
            Self::Draft => &[A::Submit, A::Approve, A::Archive],
            Self::UnderReview => &[A::Approve, A::Archive],
            Self::Approved => &[A::Activate, A::Archive],
            Self::Active => &[A::Suspend, A::Archive],
            Self::Suspended => &[A::Activate, A::Archive],
            Self::Archived => &[],
        }
    }

    pub fn valid_transitions(&self) -> &'static [PathwayStatus] {
        match self {
            Self::Draft => &[Self::UnderReview, Self::Approved, Self::Archived],
            Self::UnderReview => &[Self::Approved, Self::Archived],
            Self::Approved => &[Self::Active, Self::Archived],
            Self::Active => &[Self::Suspended, Self::Archived],
            Self::Suspended => &[Self::Active, Self::Archived],
            Self::Archived => &[],
        }
    }
}

/// Status-changing operations exposed as `POST /api/pathways/:id/{action}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathwayAction {
    Submit,
    Approve,
    Activate,
    Suspend,
    Archive,
}

impl PathwayAction {
    pub const ALL: &'static [PathwayAction] = &[
        Self::Submit,
        Self::Approve,
        Self::Activate,
        Self::Suspend,
        Self::Archive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Activate => "activate",
            Self::Suspend => "suspend",
            Self::Archive => "archive",
        }
    }

    /// Status this action leads to when it succeeds.
    pub fn target(&self) -> PathwayStatus {
        match self {
            Self::Submit => PathwayStatus::UnderReview,
            Self::Approve => PathwayStatus::Approved,
            Self::Activate => PathwayStatus::Active,
            Self::Suspend => PathwayStatus::Suspended,
            Self::Archive => PathwayStatus::Archived,
        }
    }
}

impl std::fmt::Display for PathwayAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn state_word(status: PathwayStatus) -> &'static str {
    match status {
        PathwayStatus::Draft => "draft",
        PathwayStatus::UnderReview => "under review",
        PathwayStatus::Approved => "approved",
        PathwayStatus::Active => "active",
        PathwayStatus::Suspended => "suspended",
        PathwayStatus::Archived => "archived",
    }
}

/// The single transition function for pathways.
pub fn transition(from: PathwayStatus, action: PathwayAction) -> Result<PathwayStatus, WorkflowError> {
    if from.valid_actions().contains(&action) {
        return Ok(action.target());
    }
    if from == action.target() {
        return Err(WorkflowError::AlreadyInState {
            entity: ENTITY,
            state: state_word(from),
        });
    }
    if from.is_terminal() {
        return Err(WorkflowError::Terminal {
            entity: ENTITY,
            state: state_word(from),
        });
    }
    Err(WorkflowError::InvalidTransition {
        entity: ENTITY,
        action: action.as_str(),
        from: from.as_str(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let mut status = PathwayStatus::default();
        for action in [
            PathwayAction::Submit,
            PathwayAction::Approve,
            PathwayAction::Activate,
            PathwayAction::Suspend,
            PathwayAction::Activate,
            PathwayAction::Archive,
        ] {
            status = transition(status, action).unwrap();
        }
        assert_eq!(status, PathwayStatus::Archived);
    }

    #[test]
    fn approve_directly_from_draft() {
        assert_eq!(
            transition(PathwayStatus::Draft, PathwayAction::Approve).unwrap(),
            PathwayStatus::Approved
        );
    }

    #[test]
    fn cannot_activate_before_approval() {
        for from in [PathwayStatus::Draft, PathwayStatus::UnderReview] {
            let err = transition(from, PathwayAction::Activate).unwrap_err();
            assert!(matches!(err, WorkflowError::InvalidTransition { .. }), "{from}: {err}");
        }
    }

    #[test]
    fn suspend_requires_active() {
        let err = transition(PathwayStatus::Approved, PathwayAction::Suspend).unwrap_err();
        assert_eq!(err.to_string(), "cannot suspend pathway with status APPROVED");
    }

    #[test]
    fn repeated_action_reports_current_state() {
        let err = transition(PathwayStatus::Active, PathwayAction::Activate).unwrap_err();
        assert_eq!(err.to_string(), "pathway is already active");
    }

    #[test]
    fn archived_is_terminal() {
        for action in PathwayAction::ALL {
            assert!(transition(PathwayStatus::Archived, *action).is_err());
        }
        let err = transition(PathwayStatus::Archived, PathwayAction::Approve).unwrap_err();
        assert_eq!(err.to_string(), "pathway is archived and cannot change status");
    }

    #[test]
    fn tables_agree_with_transition_function() {
        for from in PathwayStatus::ALL {
            for action in PathwayAction::ALL {
                let result = transition(*from, *action);
                assert_eq!(result.is_ok(), from.valid_actions().contains(action));
                if let Ok(next) = result {
                    assert!(from.valid_transitions().contains(&next), "{from} -> {next}");
                }
            }
        }
    }
}
