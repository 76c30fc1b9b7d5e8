//! # Micro-Credentials API
//!
//! CRUD for micro-credential programs plus the publication workflow:
//!
//! ```text
//! DRAFT --submit--> UNDER_REVIEW --publish--> PUBLISHED
//!   \___________________publish___________________/
//! any non-archived --archive--> ARCHIVED (terminal, isActive=false)
//! ```
//!
//! Learning outcomes and prerequisites are owned children: they are
//! created with the credential, replaced wholesale on update, and removed
//! with it.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use mcred_core::{
    contains_ignore_case, paginate, CredentialLevel, CredentialType, CreditType, DeliveryMode,
    FieldChecks, Filter, PageRequest, Sortable, ValidationErrors,
};
use mcred_state::credential::{self, CredentialAction};
use mcred_state::CredentialStatus;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::views::{credential_view, CredentialView};
use super::{
    clean_text, find_credential, find_institution, normalize_code, search_needle,
    PROGRAM_CODE_EXTRA,
};
use crate::auth::{require_role, CallerIdentity, Role};
use crate::db;
use crate::error::AppError;
use crate::extractors::{extract_path, extract_query, extract_validated_json, Validate};
use crate::response::{created, list, ok, ListResponse, Single};
use crate::state::{AppState, CredentialRecord, LearningOutcome, Prerequisite};

// ── Request types ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LearningOutcomeInput {
    #[serde(default)]
    pub description: String,
    /// Bloom's taxonomy level, e.g. "Apply".
    pub bloom_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrerequisiteInput {
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_mandatory: bool,
}

fn default_true() -> bool {
    true
}

/// Request to create a micro-credential. It starts in DRAFT.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCredentialRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    /// 2-50 characters of `[A-Z0-9-_.]`; stored upper-case.
    #[serde(default)]
    pub program_code: String,
    pub institution_id: Uuid,
    pub credential_type: CredentialType,
    pub delivery_mode: DeliveryMode,
    pub level: CredentialLevel,
    pub credit_value: Option<f64>,
    pub credit_type: Option<CreditType>,
    pub duration_hours: Option<i32>,
    pub program_url: Option<String>,
    pub effective_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub learning_outcomes: Vec<LearningOutcomeInput>,
    #[serde(default)]
    pub prerequisites: Vec<PrerequisiteInput>,
}

/// Partial update. Absent fields are left untouched; a present
/// `learningOutcomes` or `prerequisites` list replaces the existing one.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCredentialRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub program_code: Option<String>,
    pub institution_id: Option<Uuid>,
    pub credential_type: Option<CredentialType>,
    pub delivery_mode: Option<DeliveryMode>,
    pub level: Option<CredentialLevel>,
    pub credit_value: Option<f64>,
    pub credit_type: Option<CreditType>,
    pub duration_hours: Option<i32>,
    pub program_url: Option<String>,
    pub effective_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub learning_outcomes: Option<Vec<LearningOutcomeInput>>,
    pub prerequisites: Option<Vec<PrerequisiteInput>>,
}

fn check_outcomes(checks: &mut FieldChecks, outcomes: &[LearningOutcomeInput]) {
    for (i, outcome) in outcomes.iter().enumerate() {
        let mut item = FieldChecks::new();
        item.required_text("description", &outcome.description, 1, 1000)
            .optional_text("bloomLevel", outcome.bloom_level.as_deref(), 1, 100);
        if let Err(errors) = item.finish() {
            checks.nested(&format!("learningOutcomes[{i}]"), errors);
        }
    }
}

fn check_prerequisites(checks: &mut FieldChecks, prerequisites: &[PrerequisiteInput]) {
    for (i, prerequisite) in prerequisites.iter().enumerate() {
        let mut item = FieldChecks::new();
        item.required_text("description", &prerequisite.description, 1, 1000);
        if let Err(errors) = item.finish() {
            checks.nested(&format!("prerequisites[{i}]"), errors);
        }
    }
}

impl Validate for CreateCredentialRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = FieldChecks::new();
        checks
            .required_text("title", &self.title, 1, 200)
            .optional_text("description", self.description.as_deref(), 1, 5000)
            .code("programCode", &self.program_code, 2, 50, PROGRAM_CODE_EXTRA)
            .number_range("creditValue", self.credit_value, 0.0, 120.0)
            .integer_range("durationHours", self.duration_hours, 1, 10_000)
            .optional_url("programUrl", self.program_url.as_deref())
            .date_order("expiryDate", self.effective_date, self.expiry_date);
        check_outcomes(&mut checks, &self.learning_outcomes);
        check_prerequisites(&mut checks, &self.prerequisites);
        checks.finish()
    }
}

impl Validate for UpdateCredentialRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = FieldChecks::new();
        checks
            .optional_text("title", self.title.as_deref(), 1, 200)
            .optional_text("description", self.description.as_deref(), 1, 5000)
            .optional_code(
                "programCode",
                self.program_code.as_deref(),
                2,
                50,
                PROGRAM_CODE_EXTRA,
            )
            .number_range("creditValue", self.credit_value, 0.0, 120.0)
            .integer_range("durationHours", self.duration_hours, 1, 10_000)
            .optional_url("programUrl", self.program_url.as_deref());
        if let Some(outcomes) = &self.learning_outcomes {
            check_outcomes(&mut checks, outcomes);
        }
        if let Some(prerequisites) = &self.prerequisites {
            check_prerequisites(&mut checks, prerequisites);
        }
        checks.finish()
    }
}

fn build_outcomes(inputs: Vec<LearningOutcomeInput>) -> Vec<LearningOutcome> {
    inputs
        .into_iter()
        .zip(0..)
        .map(|(input, order_index)| LearningOutcome {
            id: Uuid::new_v4(),
            description: input.description.trim().to_string(),
            bloom_level: clean_text(input.bloom_level),
            order_index,
        })
        .collect()
}

fn build_prerequisites(inputs: Vec<PrerequisiteInput>) -> Vec<Prerequisite> {
    inputs
        .into_iter()
        .zip(0..)
        .map(|(input, order_index)| Prerequisite {
            id: Uuid::new_v4(),
            description: input.description.trim().to_string(),
            is_mandatory: input.is_mandatory,
            order_index,
        })
        .collect()
}

impl UpdateCredentialRequest {
    fn apply(self, record: &mut CredentialRecord) {
        if let Some(title) = self.title {
            record.title = title.trim().to_string();
        }
        if self.description.is_some() {
            record.description = clean_text(self.description);
        }
        if let Some(code) = self.program_code {
            record.program_code = normalize_code(&code);
        }
        if let Some(id) = self.institution_id {
            record.institution_id = id;
        }
        if let Some(t) = self.credential_type {
            record.credential_type = t;
        }
        if let Some(mode) = self.delivery_mode {
            record.delivery_mode = mode;
        }
        if let Some(level) = self.level {
            record.level = level;
        }
        if self.credit_value.is_some() {
            record.credit_value = self.credit_value;
        }
        if self.credit_type.is_some() {
            record.credit_type = self.credit_type;
        }
        if self.duration_hours.is_some() {
            record.duration_hours = self.duration_hours;
        }
        if self.program_url.is_some() {
            record.program_url = clean_text(self.program_url);
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
        if let Some(outcomes) = self.learning_outcomes {
            record.learning_outcomes = build_outcomes(outcomes);
        }
        if let Some(prerequisites) = self.prerequisites {
            record.prerequisites = build_prerequisites(prerequisites);
        }
    }
}

/// Query parameters for `GET /api/credentials`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CredentialListQuery {
    /// 1-based page number (default 1).
    pub page: Option<String>,
    /// Page size, 1-100 (default 10).
    pub limit: Option<String>,
    /// Sortable field (default `createdAt`).
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default `desc`).
    pub sort_order: Option<String>,
    pub institution_id: Option<String>,
    pub status: Option<String>,
    pub credential_type: Option<String>,
    pub level: Option<String>,
    pub delivery_mode: Option<String>,
    pub credit_type: Option<String>,
    /// `true` or `false`.
    pub is_active: Option<String>,
    /// Case-insensitive match on title, program code, and description.
    pub search: Option<String>,
}

// ── Router ──────────────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/credentials",
            get(list_credentials).post(create_credential),
        )
        .route(
            "/api/credentials/:id",
            get(get_credential)
                .put(update_credential)
                .delete(delete_credential),
        )
        .route("/api/credentials/:id/submit", post(submit_credential))
        .route("/api/credentials/:id/publish", post(publish_credential))
        .route("/api/credentials/:id/archive", post(archive_credential))
}

// ── Handlers ────────────────────────────────────────────────────────────────

/// POST /api/credentials: Create a micro-credential in DRAFT.
#[utoipa::path(
    post,
    path = "/api/credentials",
    request_body = CreateCredentialRequest,
    responses(
        (status = 201, description = "Micro-credential created", body = CredentialView),
        (status = 400, description = "Invalid request", body = crate::error::ErrorBody),
        (status = 404, description = "Institution not found", body = crate::error::ErrorBody),
        (status = 409, description = "Program code already in use", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
async fn create_credential(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateCredentialRequest>, JsonRejection>,
) -> Result<Single<CredentialView>, AppError> {
    require_role(&caller, Role::ProgramCoordinator)?;
    let req = extract_validated_json(body)?;
    find_institution(&state, req.institution_id)?;

    let now = Utc::now();
    let record = CredentialRecord {
        id: Uuid::new_v4(),
        title: req.title.trim().to_string(),
        description: clean_text(req.description),
        program_code: normalize_code(&req.program_code),
        institution_id: req.institution_id,
        credential_type: req.credential_type,
        delivery_mode: req.delivery_mode,
        level: req.level,
        credit_value: req.credit_value,
        credit_type: req.credit_type,
        duration_hours: req.duration_hours,
        program_url: clean_text(req.program_url),
        status: CredentialStatus::Draft,
        effective_date: req.effective_date,
        expiry_date: req.expiry_date,
        is_active: req.is_active.unwrap_or(true),
        published_at: None,
        learning_outcomes: build_outcomes(req.learning_outcomes),
        prerequisites: build_prerequisites(req.prerequisites),
        created_at: now,
        updated_at: now,
    };
    let id = record.id;

    state.credentials.write_with(|map| {
        if map.values().any(|c| c.program_code == record.program_code) {
            return Err(AppError::Conflict(format!(
                "programCode '{}' is already in use",
                record.program_code
            )));
        }
        map.insert(id, record.clone());
        Ok(())
    })?;

    persist!(state, db::credentials::insert, &record; on_error => {
        state.credentials.remove(&id);
    });

    tracing::info!(
        credential_id = %id,
        program_code = %record.program_code,
        institution_id = %record.institution_id,
        "micro-credential created"
    );
    Ok(created(credential_view(&state, record)))
}

/// GET /api/credentials: List micro-credentials.
#[utoipa::path(
    get,
    path = "/api/credentials",
    params(CredentialListQuery),
    responses(
        (status = 200, description = "Page of micro-credentials", body = Vec<CredentialView>),
        (status = 400, description = "Invalid query", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
async fn list_credentials(
    State(state): State<AppState>,
    query: Result<Query<CredentialListQuery>, QueryRejection>,
) -> Result<Json<ListResponse<CredentialView>>, AppError> {
    let q = extract_query(query)?;

    let mut checks = FieldChecks::new();
    let page = PageRequest::parse(
        &mut checks,
        q.page.as_deref(),
        q.limit.as_deref(),
        q.sort_by.as_deref(),
        q.sort_order.as_deref(),
        CredentialRecord::SORT_FIELDS,
    );
    let institution_id: Option<Uuid> =
        checks.parse_param("institutionId", q.institution_id.as_deref());
    let status: Option<CredentialStatus> = checks.parse_param("status", q.status.as_deref());
    let credential_type: Option<CredentialType> =
        checks.parse_param("credentialType", q.credential_type.as_deref());
    let level: Option<CredentialLevel> = checks.parse_param("level", q.level.as_deref());
    let delivery_mode: Option<DeliveryMode> =
        checks.parse_param("deliveryMode", q.delivery_mode.as_deref());
    let credit_type: Option<CreditType> =
        checks.parse_param("creditType", q.credit_type.as_deref());
    let is_active = checks.parse_bool_param("isActive", q.is_active.as_deref());
    checks.finish()?;

    let filter = Filter::new()
        .eq("institutionId", institution_id, |c: &CredentialRecord| {
            c.institution_id
        })
        .eq("status", status, |c: &CredentialRecord| c.status)
        .eq("credentialType", credential_type, |c: &CredentialRecord| {
            c.credential_type
        })
        .eq("level", level, |c: &CredentialRecord| c.level)
        .eq("deliveryMode", delivery_mode, |c: &CredentialRecord| {
            c.delivery_mode
        })
        .eq("creditType", credit_type.map(Some), |c: &CredentialRecord| {
            c.credit_type
        })
        .eq("isActive", is_active, |c: &CredentialRecord| c.is_active)
        .with(
            "search",
            search_needle(q.search.as_deref()),
            |c: &CredentialRecord, needle: &String| {
                contains_ignore_case(&c.title, needle)
                    || contains_ignore_case(&c.program_code, needle)
                    || c
                        .description
                        .as_deref()
                        .is_some_and(|d| contains_ignore_case(d, needle))
            },
        );

    let page = paginate(state.credentials.list(), &filter, &page);
    Ok(list(page.map(|c| credential_view(&state, c))))
}

/// GET /api/credentials/:id: Fetch one micro-credential.
#[utoipa::path(
    get,
    path = "/api/credentials/{id}",
    params(("id" = Uuid, Path, description = "Micro-credential ID")),
    responses(
        (status = 200, description = "Micro-credential found", body = CredentialView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
async fn get_credential(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Single<CredentialView>, AppError> {
    let id = extract_path(path)?;
    let record = find_credential(&state, id)?;
    Ok(ok(credential_view(&state, record)))
}

/// PUT /api/credentials/:id: Partially update a micro-credential.
#[utoipa::path(
    put,
    path = "/api/credentials/{id}",
    params(("id" = Uuid, Path, description = "Micro-credential ID")),
    request_body = UpdateCredentialRequest,
    responses(
        (status = 200, description = "Micro-credential updated", body = CredentialView),
        (status = 400, description = "Invalid request", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Program code already in use", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
async fn update_credential(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateCredentialRequest>, JsonRejection>,
) -> Result<Single<CredentialView>, AppError> {
    require_role(&caller, Role::ProgramCoordinator)?;
    let id = extract_path(path)?;
    let req = extract_validated_json(body)?;
    if let Some(institution_id) = req.institution_id {
        find_institution(&state, institution_id)?;
    }

    let now = Utc::now();
    let (previous, updated) = state.credentials.write_with(|map| -> Result<_, AppError> {
        if let Some(code) = req.program_code.as_deref().map(normalize_code) {
            if map.values().any(|c| c.id != id && c.program_code == code) {
                return Err(AppError::Conflict(format!(
                    "programCode '{code}' is already in use"
                )));
            }
        }
        let current = map
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("micro-credential", id))?;
        if current.status.is_terminal() && req.is_active == Some(true) {
            return Err(AppError::InvalidTransition(format!(
                "micro-credential {id} is archived and cannot be reactivated"
            )));
        }

        let mut next = current.clone();
        req.apply(&mut next);
        let mut checks = FieldChecks::new();
        checks.date_order("expiryDate", next.effective_date, next.expiry_date);
        checks.finish()?;

        next.updated_at = now;
        let previous = std::mem::replace(current, next.clone());
        Ok((previous, next))
    })?;

    persist!(state, db::credentials::update, &updated; on_error => {
        state.credentials.insert(id, previous);
    });

    tracing::info!(credential_id = %id, "micro-credential updated");
    Ok(ok(credential_view(&state, updated)))
}

/// DELETE /api/credentials/:id: Delete an unreferenced micro-credential
/// together with its outcomes and prerequisites.
#[utoipa::path(
    delete,
    path = "/api/credentials/{id}",
    params(("id" = Uuid, Path, description = "Micro-credential ID")),
    responses(
        (status = 204, description = "Micro-credential deleted"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Micro-credential is still referenced", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
async fn delete_credential(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    require_role(&caller, Role::Admin)?;
    let id = extract_path(path)?;

    // Counted under the credentials write lock; creates that reference this
    // credential check it before inserting and may still race the removal.
    let removed = state.credentials.write_with(|map| -> Result<_, AppError> {
        if !map.contains_key(&id) {
            return Err(AppError::not_found("micro-credential", id));
        }
        let recognitions = state
            .recognitions
            .count_where(|r| r.micro_credential_id == id);
        let pathways = state.pathways.count_where(|p| p.micro_credential_id == id);
        if recognitions + pathways > 0 {
            return Err(AppError::Conflict(format!(
                "micro-credential {id} is referenced by {recognitions} recognition(s) \
                 and {pathways} pathway(s)"
            )));
        }
        map.remove(&id)
            .ok_or_else(|| AppError::not_found("micro-credential", id))
    })?;

    persist!(state, db::credentials::delete, id; on_error => {
        state.credentials.insert(id, removed);
    });

    tracing::info!(credential_id = %id, "micro-credential deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Apply a workflow action under the store's write lock, then persist.
async fn transition_credential(
    state: &AppState,
    id: Uuid,
    action: CredentialAction,
) -> Result<CredentialRecord, AppError> {
    let now = Utc::now();
    let (previous, updated) = state
        .credentials
        .try_update(&id, |c| {
            let next = credential::transition(c.status, action)?;
            let previous = c.clone();
            c.status = next;
            match next {
                CredentialStatus::Published => c.published_at = Some(now),
                CredentialStatus::Archived => c.is_active = false,
                _ => {}
            }
            c.updated_at = now;
            Ok::<_, mcred_state::WorkflowError>((previous, c.clone()))
        })
        .ok_or_else(|| AppError::not_found("micro-credential", id))??;

    persist!(state, db::credentials::update_status, &updated; on_error => {
        state.credentials.insert(id, previous);
    });

    tracing::info!(
        credential_id = %id,
        action = action.as_str(),
        from = %previous.status,
        to = %updated.status,
        "micro-credential status changed"
    );
    Ok(updated)
}

/// POST /api/credentials/:id/submit: DRAFT to UNDER_REVIEW.
#[utoipa::path(
    post,
    path = "/api/credentials/{id}/submit",
    params(("id" = Uuid, Path, description = "Micro-credential ID")),
    responses(
        (status = 200, description = "Submitted for review", body = CredentialView),
        (status = 400, description = "Transition not allowed", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
async fn submit_credential(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Single<CredentialView>, AppError> {
    require_role(&caller, Role::ProgramCoordinator)?;
    let id = extract_path(path)?;
    let record = transition_credential(&state, id, CredentialAction::Submit).await?;
    Ok(ok(credential_view(&state, record)))
}

/// POST /api/credentials/:id/publish: Publish and stamp `publishedAt`.
#[utoipa::path(
    post,
    path = "/api/credentials/{id}/publish",
    params(("id" = Uuid, Path, description = "Micro-credential ID")),
    responses(
        (status = 200, description = "Published", body = CredentialView),
        (status = 400, description = "Already published or archived", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
async fn publish_credential(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Single<CredentialView>, AppError> {
    require_role(&caller, Role::InstitutionAdmin)?;
    let id = extract_path(path)?;
    let record = transition_credential(&state, id, CredentialAction::Publish).await?;
    Ok(ok(credential_view(&state, record)))
}

/// POST /api/credentials/:id/archive: Archive and deactivate.
#[utoipa::path(
    post,
    path = "/api/credentials/{id}/archive",
    params(("id" = Uuid, Path, description = "Micro-credential ID")),
    responses(
        (status = 200, description = "Archived", body = CredentialView),
        (status = 400, description = "Already archived", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
async fn archive_credential(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Single<CredentialView>, AppError> {
    require_role(&caller, Role::InstitutionAdmin)?;
    let id = extract_path(path)?;
    let record = transition_credential(&state, id, CredentialAction::Archive).await?;
    Ok(ok(credential_view(&state, record)))
}
