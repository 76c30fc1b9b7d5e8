//! # mcred-state: Status Workflows
//!
//! Each workflow-bearing entity has one status enum and one transition
//! function `(current, action) -> Result<next, WorkflowError>`. Handlers
//! never assign a status directly; they ask the workflow for the next one
//! under the store's write lock and commit only on success.
//!
//! ## Workflows
//!
//! - **Micro-credential** (`credential.rs`):
//!   `DRAFT → UNDER_REVIEW → PUBLISHED`, with `DRAFT → PUBLISHED` allowed and
//!   `ARCHIVED` reachable from every other status. `ARCHIVED` is terminal.
//!
//! - **Recognition** (`recognition.rs`): an `isActive` toggle, plus the
//!   creation gate requiring the recognized credential to be `PUBLISHED`.
//!
//! - **Pathway** (`pathway.rs`):
//!   `DRAFT → UNDER_REVIEW → APPROVED → ACTIVE ⇄ SUSPENDED`, with
//!   `DRAFT → APPROVED` allowed and `ARCHIVED` terminal.

pub mod credential;
pub mod error;
pub mod pathway;
pub mod recognition;

pub use credential::{CredentialAction, CredentialStatus};
pub use error::WorkflowError;
pub use pathway::{PathwayAction, PathwayStatus};
pub use recognition::RecognitionAction;
