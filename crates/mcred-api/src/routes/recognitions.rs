//! # Recognitions API
//!
//! An institution's formal recognition of another provider's
//! micro-credential. A recognition may only point at a PUBLISHED
//! credential; once created it is switched on and off with the
//! idempotent `activate` / `deactivate` actions.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use mcred_core::{
    paginate, CreditType, FieldChecks, Filter, PageRequest, RecognitionType, Sortable,
    TranscriptMethod, ValidationErrors,
};
use mcred_state::recognition::{ensure_recognizable, RecognitionAction};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::views::{recognition_view, RecognitionView};
use super::{clean_text, find_credential, find_institution};
use crate::auth::{require_role, CallerIdentity, Role};
use crate::db;
use crate::error::AppError;
use crate::extractors::{extract_path, extract_query, extract_validated_json, Validate};
use crate::response::{created, list, ok, ListResponse, Single};
use crate::state::{AppState, RecognitionRecord};

// ── Request types ───────────────────────────────────────────────────────────

/// Request to recognize a published micro-credential.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecognitionRequest {
    pub micro_credential_id: Uuid,
    pub recognizing_institution_id: Uuid,
    pub recognition_type: RecognitionType,
    pub transcript_method: TranscriptMethod,
    pub credits_awarded: Option<f64>,
    pub credit_type: Option<CreditType>,
    pub equivalent_course: Option<String>,
    pub notes: Option<String>,
    pub effective_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

impl Validate for CreateRecognitionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = FieldChecks::new();
        checks
            .number_range("creditsAwarded", self.credits_awarded, 0.0, 120.0)
            .optional_text("equivalentCourse", self.equivalent_course.as_deref(), 1, 200)
            .optional_text("notes", self.notes.as_deref(), 1, 2000)
            .date_order("expiryDate", self.effective_date, self.expiry_date);
        checks.finish()
    }
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecognitionRequest {
    /// Re-point at another credential; it must be PUBLISHED.
    pub micro_credential_id: Option<Uuid>,
    pub recognizing_institution_id: Option<Uuid>,
    pub recognition_type: Option<RecognitionType>,
    pub transcript_method: Option<TranscriptMethod>,
    pub credits_awarded: Option<f64>,
    pub credit_type: Option<CreditType>,
    pub equivalent_course: Option<String>,
    pub notes: Option<String>,
    pub effective_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

impl Validate for UpdateRecognitionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = FieldChecks::new();
        checks
            .number_range("creditsAwarded", self.credits_awarded, 0.0, 120.0)
            .optional_text("equivalentCourse", self.equivalent_course.as_deref(), 1, 200)
            .optional_text("notes", self.notes.as_deref(), 1, 2000);
        checks.finish()
    }
}

impl UpdateRecognitionRequest {
    fn apply(self, record: &mut RecognitionRecord) {
        if let Some(id) = self.micro_credential_id {
            record.micro_credential_id = id;
        }
        if let Some(id) = self.recognizing_institution_id {
            record.recognizing_institution_id = id;
        }
        if let Some(t) = self.recognition_type {
            record.recognition_type = t;
        }
        if let Some(method) = self.transcript_method {
            record.transcript_method = method;
        }
        if self.credits_awarded.is_some() {
            record.credits_awarded = self.credits_awarded;
        }
        if self.credit_type.is_some() {
            record.credit_type = self.credit_type;
        }
        if self.equivalent_course.is_some() {
            record.equivalent_course = clean_text(self.equivalent_course);
        }
        if self.notes.is_some() {
            record.notes = clean_text(self.notes);
        }
        if self.effective_date.is_some() {
            record.effective_date = self.effective_date;
        }
        if self.expiry_date.is_some() {
            record.expiry_date = self.expiry_date;
        }
        if let Some(active) = self.is_active {
            record.is_active = active;
        }
    }
}

/// Query parameters for `GET /api/recognitions`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RecognitionListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    /// One of `createdAt`, `updatedAt`, `creditsAwarded`, `recognitionType`, `effectiveDate`.
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub micro_credential_id: Option<String>,
    pub recognizing_institution_id: Option<String>,
    pub recognition_type: Option<String>,
    pub transcript_method: Option<String>,
    pub credit_type: Option<String>,
    pub is_active: Option<String>,
}

// ── Router ──────────────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/recognitions",
            get(list_recognitions).post(create_recognition),
        )
        .route(
            "/api/recognitions/:id",
            get(get_recognition)
                .put(update_recognition)
                .delete(delete_recognition),
        )
        .route("/api/recognitions/:id/activate", post(activate_recognition))
        .route(
            "/api/recognitions/:id/deactivate",
            post(deactivate_recognition),
        )
}

// ── Handlers ────────────────────────────────────────────────────────────────

/// POST /api/recognitions: Recognize a published micro-credential.
#[utoipa::path(
    post,
    path = "/api/recognitions",
    request_body = CreateRecognitionRequest,
    responses(
        (status = 201, description = "Recognition created", body = RecognitionView),
        (status = 400, description = "Invalid request or credential not published", body = crate::error::ErrorBody),
        (status = 404, description = "Credential or institution not found", body = crate::error::ErrorBody),
    ),
    tag = "recognitions"
)]
async fn create_recognition(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateRecognitionRequest>, JsonRejection>,
) -> Result<Single<RecognitionView>, AppError> {
    require_role(&caller, Role::InstitutionAdmin)?;
    let req = extract_validated_json(body)?;

    let credential = find_credential(&state, req.micro_credential_id)?;
    find_institution(&state, req.recognizing_institution_id)?;
    ensure_recognizable(credential.status)?;

    let now = Utc::now();
    let record = RecognitionRecord {
        id: Uuid::new_v4(),
        micro_credential_id: req.micro_credential_id,
        recognizing_institution_id: req.recognizing_institution_id,
        recognition_type: req.recognition_type,
        transcript_method: req.transcript_method,
        credits_awarded: req.credits_awarded,
        credit_type: req.credit_type,
        equivalent_course: clean_text(req.equivalent_course),
        notes: clean_text(req.notes),
        effective_date: req.effective_date,
        expiry_date: req.expiry_date,
        is_active: req.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };
    let id = record.id;
    state.recognitions.insert(id, record.clone());

    persist!(state, db::recognitions::insert, &record; on_error => {
        state.recognitions.remove(&id);
    });

    tracing::info!(
        recognition_id = %id,
        credential_id = %record.micro_credential_id,
        institution_id = %record.recognizing_institution_id,
        "recognition created"
    );
    Ok(created(recognition_view(&state, record)))
}

/// GET /api/recognitions: List recognitions.
#[utoipa::path(
    get,
    path = "/api/recognitions",
    params(RecognitionListQuery),
    responses(
        (status = 200, description = "Page of recognitions", body = Vec<RecognitionView>),
        (status = 400, description = "Invalid query", body = crate::error::ErrorBody),
    ),
    tag = "recognitions"
)]
async fn list_recognitions(
    State(state): State<AppState>,
    query: Result<Query<RecognitionListQuery>, QueryRejection>,
) -> Result<Json<ListResponse<RecognitionView>>, AppError> {
    let q = extract_query(query)?;

    let mut checks = FieldChecks::new();
    let page = PageRequest::parse(
        &mut checks,
        q.page.as_deref(),
        q.limit.as_deref(),
        q.sort_by.as_deref(),
        q.sort_order.as_deref(),
        RecognitionRecord::SORT_FIELDS,
    );
    let credential_id: Option<Uuid> =
        checks.parse_param("microCredentialId", q.micro_credential_id.as_deref());
    let institution_id: Option<Uuid> = checks.parse_param(
        "recognizingInstitutionId",
        q.recognizing_institution_id.as_deref(),
    );
    let recognition_type: Option<RecognitionType> =
        checks.parse_param("recognitionType", q.recognition_type.as_deref());
    let transcript_method: Option<TranscriptMethod> =
        checks.parse_param("transcriptMethod", q.transcript_method.as_deref());
    let credit_type: Option<CreditType> =
        checks.parse_param("creditType", q.credit_type.as_deref());
    let is_active = checks.parse_bool_param("isActive", q.is_active.as_deref());
    checks.finish()?;

    let filter = Filter::new()
        .eq("microCredentialId", credential_id, |r: &RecognitionRecord| {
            r.micro_credential_id
        })
        .eq(
            "recognizingInstitutionId",
            institution_id,
            |r: &RecognitionRecord| r.recognizing_institution_id,
        )
        .eq("recognitionType", recognition_type, |r: &RecognitionRecord| {
            r.recognition_type
        })
        .eq(
            "transcriptMethod",
            transcript_method,
            |r: &RecognitionRecord| r.transcript_method,
        )
        .eq("creditType", credit_type.map(Some), |r: &RecognitionRecord| {
            r.credit_type
        })
        .eq("isActive", is_active, |r: &RecognitionRecord| r.is_active);

    let page = paginate(state.recognitions.list(), &filter, &page);
    Ok(list(page.map(|r| recognition_view(&state, r))))
}

/// GET /api/recognitions/:id: Fetch one recognition.
#[utoipa::path(
    get,
    path = "/api/recognitions/{id}",
    params(("id" = Uuid, Path, description = "Recognition ID")),
    responses(
        (status = 200, description = "Recognition found", body = RecognitionView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "recognitions"
)]
async fn get_recognition(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Single<RecognitionView>, AppError> {
    let id = extract_path(path)?;
    let record = state
        .recognitions
        .get(&id)
        .ok_or_else(|| AppError::not_found("recognition", id))?;
    Ok(ok(recognition_view(&state, record)))
}

/// PUT /api/recognitions/:id: Partially update a recognition.
#[utoipa::path(
    put,
    path = "/api/recognitions/{id}",
    params(("id" = Uuid, Path, description = "Recognition ID")),
    request_body = UpdateRecognitionRequest,
    responses(
        (status = 200, description = "Recognition updated", body = RecognitionView),
        (status = 400, description = "Invalid request or credential not published", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "recognitions"
)]
async fn update_recognition(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateRecognitionRequest>, JsonRejection>,
) -> Result<Single<RecognitionView>, AppError> {
    require_role(&caller, Role::InstitutionAdmin)?;
    let id = extract_path(path)?;
    let req = extract_validated_json(body)?;

    let target = req
        .micro_credential_id
        .map(|credential_id| find_credential(&state, credential_id))
        .transpose()?;
    if let Some(institution_id) = req.recognizing_institution_id {
        find_institution(&state, institution_id)?;
    }

    let now = Utc::now();
    let (previous, updated) = state
        .recognitions
        .try_update(&id, |current| -> Result<_, AppError> {
            // Only re-pointing requires the new credential to be published.
            if let Some(credential) = &target {
                if credential.id != current.micro_credential_id {
                    ensure_recognizable(credential.status)?;
                }
            }
            let mut next = current.clone();
            req.apply(&mut next);
            let mut checks = FieldChecks::new();
            checks.date_order("expiryDate", next.effective_date, next.expiry_date);
            checks.finish()?;

            next.updated_at = now;
            let previous = std::mem::replace(current, next.clone());
            Ok((previous, next))
        })
        .ok_or_else(|| AppError::not_found("recognition", id))??;

    persist!(state, db::recognitions::update, &updated; on_error => {
        state.recognitions.insert(id, previous);
    });

    tracing::info!(recognition_id = %id, "recognition updated");
    Ok(ok(recognition_view(&state, updated)))
}

/// DELETE /api/recognitions/:id: Delete a recognition.
#[utoipa::path(
    delete,
    path = "/api/recognitions/{id}",
    params(("id" = Uuid, Path, description = "Recognition ID")),
    responses(
        (status = 204, description = "Recognition deleted"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "recognitions"
)]
async fn delete_recognition(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    require_role(&caller, Role::Admin)?;
    let id = extract_path(path)?;
    let removed = state
        .recognitions
        .remove(&id)
        .ok_or_else(|| AppError::not_found("recognition", id))?;

    persist!(state, db::recognitions::delete, id; on_error => {
        state.recognitions.insert(id, removed);
    });

    tracing::info!(recognition_id = %id, "recognition deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_recognition(
    state: &AppState,
    id: Uuid,
    action: RecognitionAction,
) -> Result<RecognitionRecord, AppError> {
    let now = Utc::now();
    let (previous, updated) = state
        .recognitions
        .try_update(&id, |r| {
            let previous = r.clone();
            r.is_active = action.apply(r.is_active);
            r.updated_at = now;
            Ok::<_, AppError>((previous, r.clone()))
        })
        .ok_or_else(|| AppError::not_found("recognition", id))??;

    persist!(state, db::recognitions::update, &updated; on_error => {
        state.recognitions.insert(id, previous);
    });

    tracing::info!(
        recognition_id = %id,
        action = action.as_str(),
        is_active = updated.is_active,
        "recognition toggled"
    );
    Ok(updated)
}

/// POST /api/recognitions/:id/activate: Set `isActive=true`.
#[utoipa::path(
    post,
    path = "/api/recognitions/{id}/activate",
    params(("id" = Uuid, Path, description = "Recognition ID")),
    responses(
        (status = 200, description = "Recognition active", body = RecognitionView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "recognitions"
)]
async fn activate_recognition(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Single<RecognitionView>, AppError> {
    require_role(&caller, Role::InstitutionAdmin)?;
    let id = extract_path(path)?;
    let record = toggle_recognition(&state, id, RecognitionAction::Activate).await?;
    Ok(ok(recognition_view(&state, record)))
}

/// POST /api/recognitions/:id/deactivate: Set `isActive=false`.
#[utoipa::path(
    post,
    path = "/api/recognitions/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Recognition ID")),
    responses(
        (status = 200, description = "Recognition inactive", body = RecognitionView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "recognitions"
)]
async fn deactivate_recognition(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Single<RecognitionView>, AppError> {
    require_role(&caller, Role::InstitutionAdmin)?;
    let id = extract_path(path)?;
    let record = toggle_recognition(&state, id, RecognitionAction::Deactivate).await?;
    Ok(ok(recognition_view(&state, record)))
}
