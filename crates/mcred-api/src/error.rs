//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps validation, workflow and store errors to HTTP status codes and the
//! uniform envelope `{status: "error", code, message, errors?}`.
//! Never exposes internal or store error details in responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mcred_core::{FieldError, ValidationErrors};
use mcred_state::WorkflowError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Always `"error"`.
    pub status: String,
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Per-field violations, present only for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ErrorBody {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            code: code.to_string(),
            message: message.into(),
            errors: None,
        }
    }
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// A referenced entity does not exist (404).
    #[error("{0}")]
    NotFound(String),

    /// Payload or query failed field rules (400, with per-field details).
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Body or query could not be parsed at all (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Authentication failure: missing or invalid token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authorization failure: insufficient role (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Uniqueness violation or a delete blocked by references (409).
    #[error("{0}")]
    Conflict(String),

    /// Status workflow refused the requested action (400, code `CONFLICT`).
    #[error("{0}")]
    InvalidTransition(String),

    /// A related entity is not in the required status (400).
    #[error("{0}")]
    PreconditionFailed(String),

    /// The database rejected a write on a constraint (400).
    #[error("store constraint violated: {0}")]
    StoreConstraint(String),

    /// The database could not be reached (503). Message is logged, not returned.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::InvalidTransition(_) => (StatusCode::BAD_REQUEST, "CONFLICT"),
            Self::PreconditionFailed(_) => (StatusCode::BAD_REQUEST, "PRECONDITION_FAILED"),
            Self::StoreConstraint(_) => (StatusCode::BAD_REQUEST, "STORE_ERROR"),
            Self::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORE_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// `"<what> <id> not found"`.
    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{what} {id} not found"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::StoreUnavailable(_) => "The data store is unavailable".to_string(),
            Self::StoreConstraint(_) => "The data store rejected the write".to_string(),
            Self::Validation(_) => "Validation failed".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::StoreUnavailable(_) | Self::StoreConstraint(_) => {
                tracing::error!(error = %self, "store error")
            }
            _ => tracing::debug!(code, error = %self, "request failed"),
        }

        let mut body = ErrorBody::new(code, message);
        if let Self::Validation(errors) = self {
            body.errors = Some(errors.into_errors());
        }

        (status, Json(body)).into_response()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        Self::Validation(err)
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        if err.is_precondition() {
            Self::PreconditionFailed(err.to_string())
        } else {
            Self::InvalidTransition(err.to_string())
        }
    }
}

/// Classify database failures.
///
/// Unique violations surface as `CONFLICT`, other integrity violations as
/// a 400 store error, and connectivity failures as 503.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => match db.code().as_deref() {
                Some("23505") => Self::Conflict("a record with the same unique key already exists".into()),
                Some(code) if code.starts_with("23") => Self::StoreConstraint(db.to_string()),
                _ => Self::Internal(err.to_string()),
            },
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => Self::StoreUnavailable(err.to_string()),
            _ => Self::Internal(err.to_string()),
        }
    }
}
