//! # API Route Modules
//!
//! One router per entity type, each merged into the application in
//! [`crate::app`]. Handlers follow the same sequence: authorize, validate,
//! resolve references (404 when missing), check uniqueness and workflow
//! preconditions under the store's write lock, commit in memory, write
//! through to Postgres, then shape the response envelope.

use uuid::Uuid;

use crate::error::AppError;
use crate::state::{AppState, CredentialRecord, InstitutionRecord};

/// Write-through to Postgres when a pool is configured.
///
/// On failure the `on_error` block restores the in-memory store, then the
/// handler returns the classified store error.
macro_rules! persist {
    ($state:expr, $save_fn:path, $($args:expr),+ ; on_error => $undo:block) => {
        if let Some(ref pool) = $state.db_pool {
            if let Err(e) = $save_fn(pool, $($args),+).await {
                tracing::error!(error = %e, operation = stringify!($save_fn), "failed to persist to database");
                $undo
                return Err(crate::error::AppError::from(e));
            }
        }
    };
}

pub mod credentials;
pub mod institutions;
pub mod pathways;
pub mod recognitions;
pub mod views;

/// Characters allowed in institution codes besides letters and digits.
pub(crate) const INSTITUTION_CODE_EXTRA: &[char] = &['-'];
/// Characters allowed in program codes besides letters and digits.
pub(crate) const PROGRAM_CODE_EXTRA: &[char] = &['-', '_', '.'];

/// Codes are stored trimmed and upper-cased so uniqueness is case-insensitive.
pub(crate) fn normalize_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Trim an optional free-text field.
pub(crate) fn clean_text(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string())
}

pub(crate) fn find_institution(state: &AppState, id: Uuid) -> Result<InstitutionRecord, AppError> {
    state
        .institutions
        .get(&id)
        .ok_or_else(|| AppError::not_found("institution", id))
}

pub(crate) fn find_credential(state: &AppState, id: Uuid) -> Result<CredentialRecord, AppError> {
    state
        .credentials
        .get(&id)
        .ok_or_else(|| AppError::not_found("micro-credential", id))
}

/// Lower-cased, trimmed search needle, or `None` when blank.
pub(crate) fn search_needle(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}
