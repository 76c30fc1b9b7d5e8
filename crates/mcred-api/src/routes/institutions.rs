//! # Institutions API
//!
//! Education and training providers. Institutions are shared reference
//! data: credentials, recognitions, and pathways point at them by id.
//! Only ADMIN callers may create, update, or delete them, and an
//! institution that is still referenced cannot be deleted.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use mcred_core::{
    contains_ignore_case, paginate, FieldChecks, Filter, InstitutionType, PageRequest, Sortable,
    ValidationErrors,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::views::{institution_view, InstitutionView};
use super::{clean_text, find_institution, normalize_code, search_needle, INSTITUTION_CODE_EXTRA};
use crate::auth::{require_role, CallerIdentity, Role};
use crate::db;
use crate::error::AppError;
use crate::extractors::{extract_path, extract_query, extract_validated_json, Validate};
use crate::response::{created, list, ok, ListResponse, Single};
use crate::state::{AppState, InstitutionRecord};

// ── Request types ───────────────────────────────────────────────────────────

/// Request to register an institution.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstitutionRequest {
    #[serde(default)]
    pub name: String,
    /// 2-20 characters of `[A-Z0-9-]`; stored upper-case.
    #[serde(default)]
    pub code: String,
    pub institution_type: InstitutionType,
    pub country: Option<String>,
    pub website: Option<String>,
}

impl Validate for CreateInstitutionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = FieldChecks::new();
        checks
            .required_text("name", &self.name, 1, 200)
            .code("code", &self.code, 2, 20, INSTITUTION_CODE_EXTRA)
            .optional_text("country", self.country.as_deref(), 2, 56)
            .optional_url("website", self.website.as_deref());
        checks.finish()
    }
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInstitutionRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub institution_type: Option<InstitutionType>,
    pub country: Option<String>,
    pub website: Option<String>,
}

impl Validate for UpdateInstitutionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = FieldChecks::new();
        checks
            .optional_text("name", self.name.as_deref(), 1, 200)
            .optional_code("code", self.code.as_deref(), 2, 20, INSTITUTION_CODE_EXTRA)
            .optional_text("country", self.country.as_deref(), 2, 56)
            .optional_url("website", self.website.as_deref());
        checks.finish()
    }
}

impl UpdateInstitutionRequest {
    fn apply(self, record: &mut InstitutionRecord) {
        if let Some(name) = self.name {
            record.name = name.trim().to_string();
        }
        if let Some(code) = self.code {
            record.code = normalize_code(&code);
        }
        if let Some(t) = self.institution_type {
            record.institution_type = t;
        }
        if self.country.is_some() {
            record.country = clean_text(self.country);
        }
        if self.website.is_some() {
            record.website = clean_text(self.website);
        }
    }
}

/// Query parameters for `GET /api/institutions`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct InstitutionListQuery {
    /// 1-based page number (default 1).
    pub page: Option<String>,
    /// Page size, 1-100 (default 10).
    pub limit: Option<String>,
    /// One of `createdAt`, `updatedAt`, `name`, `code`.
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default `desc`).
    pub sort_order: Option<String>,
    pub institution_type: Option<String>,
    pub country: Option<String>,
    /// Case-insensitive match on name and code.
    pub search: Option<String>,
}

// ── Router ──────────────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/institutions",
            get(list_institutions).post(create_institution),
        )
        .route(
            "/api/institutions/:id",
            get(get_institution)
                .put(update_institution)
                .delete(delete_institution),
        )
}

// ── Handlers ────────────────────────────────────────────────────────────────

/// POST /api/institutions: Register an institution.
#[utoipa::path(
    post,
    path = "/api/institutions",
    request_body = CreateInstitutionRequest,
    responses(
        (status = 201, description = "Institution created", body = InstitutionView),
        (status = 400, description = "Invalid request", body = crate::error::ErrorBody),
        (status = 409, description = "Code already in use", body = crate::error::ErrorBody),
    ),
    tag = "institutions"
)]
async fn create_institution(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateInstitutionRequest>, JsonRejection>,
) -> Result<Single<InstitutionView>, AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_validated_json(body)?;

    let now = Utc::now();
    let record = InstitutionRecord {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        code: normalize_code(&req.code),
        institution_type: req.institution_type,
        country: clean_text(req.country),
        website: clean_text(req.website),
        created_at: now,
        updated_at: now,
    };
    let id = record.id;

    state.institutions.write_with(|map| {
        if map.values().any(|i| i.code == record.code) {
            return Err(AppError::Conflict(format!(
                "institution code '{}' is already in use",
                record.code
            )));
        }
        map.insert(id, record.clone());
        Ok(())
    })?;

    persist!(state, db::institutions::insert, &record; on_error => {
        state.institutions.remove(&id);
    });

    tracing::info!(institution_id = %id, code = %record.code, "institution created");
    Ok(created(institution_view(&state, record)))
}

/// GET /api/institutions: List institutions.
#[utoipa::path(
    get,
    path = "/api/institutions",
    params(InstitutionListQuery),
    responses(
        (status = 200, description = "Page of institutions", body = Vec<InstitutionView>),
        (status = 400, description = "Invalid query", body = crate::error::ErrorBody),
    ),
    tag = "institutions"
)]
async fn list_institutions(
    State(state): State<AppState>,
    query: Result<Query<InstitutionListQuery>, QueryRejection>,
) -> Result<Json<ListResponse<InstitutionView>>, AppError> {
    let q = extract_query(query)?;

    let mut checks = FieldChecks::new();
    let page = PageRequest::parse(
        &mut checks,
        q.page.as_deref(),
        q.limit.as_deref(),
        q.sort_by.as_deref(),
        q.sort_order.as_deref(),
        InstitutionRecord::SORT_FIELDS,
    );
    let institution_type: Option<InstitutionType> =
        checks.parse_param("institutionType", q.institution_type.as_deref());
    checks.finish()?;

    let country = search_needle(q.country.as_deref());
    let filter = Filter::new()
        .eq("institutionType", institution_type, |i: &InstitutionRecord| {
            i.institution_type
        })
        .with("country", country, |i: &InstitutionRecord, c: &String| {
            i.country.as_deref().is_some_and(|v| v.to_lowercase() == *c)
        })
        .with(
            "search",
            search_needle(q.search.as_deref()),
            |i: &InstitutionRecord, needle: &String| {
                contains_ignore_case(&i.name, needle) || contains_ignore_case(&i.code, needle)
            },
        );

    let page = paginate(state.institutions.list(), &filter, &page);
    Ok(list(page.map(|i| institution_view(&state, i))))
}

/// GET /api/institutions/:id: Fetch one institution.
#[utoipa::path(
    get,
    path = "/api/institutions/{id}",
    params(("id" = Uuid, Path, description = "Institution ID")),
    responses(
        (status = 200, description = "Institution found", body = InstitutionView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "institutions"
)]
async fn get_institution(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Single<InstitutionView>, AppError> {
    let id = extract_path(path)?;
    let record = find_institution(&state, id)?;
    Ok(ok(institution_view(&state, record)))
}

/// PUT /api/institutions/:id: Partially update an institution.
#[utoipa::path(
    put,
    path = "/api/institutions/{id}",
    params(("id" = Uuid, Path, description = "Institution ID")),
    request_body = UpdateInstitutionRequest,
    responses(
        (status = 200, description = "Institution updated", body = InstitutionView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Code already in use", body = crate::error::ErrorBody),
    ),
    tag = "institutions"
)]
async fn update_institution(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateInstitutionRequest>, JsonRejection>,
) -> Result<Single<InstitutionView>, AppError> {
    require_role(&caller, Role::Admin)?;
    let id = extract_path(path)?;
    let req = extract_validated_json(body)?;

    let now = Utc::now();
    let (previous, updated) = state.institutions.write_with(|map| -> Result<_, AppError> {
        if let Some(code) = req.code.as_deref().map(normalize_code) {
            if map.values().any(|i| i.id != id && i.code == code) {
                return Err(AppError::Conflict(format!(
                    "institution code '{code}' is already in use"
                )));
            }
        }
        let current = map
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("institution", id))?;
        let previous = current.clone();
        req.apply(current);
        current.updated_at = now;
        Ok((previous, current.clone()))
    })?;

    persist!(state, db::institutions::update, &updated; on_error => {
        state.institutions.insert(id, previous);
    });

    tracing::info!(institution_id = %id, "institution updated");
    Ok(ok(institution_view(&state, updated)))
}

/// DELETE /api/institutions/:id: Delete an unreferenced institution.
#[utoipa::path(
    delete,
    path = "/api/institutions/{id}",
    params(("id" = Uuid, Path, description = "Institution ID")),
    responses(
        (status = 204, description = "Institution deleted"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Institution is still referenced", body = crate::error::ErrorBody),
    ),
    tag = "institutions"
)]
async fn delete_institution(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    require_role(&caller, Role::Admin)?;
    let id = extract_path(path)?;

    // Counted under the institutions write lock; creates that reference this
    // institution check it before inserting and may still race the removal.
    let removed = state.institutions.write_with(|map| -> Result<_, AppError> {
        if !map.contains_key(&id) {
            return Err(AppError::not_found("institution", id));
        }
        let credentials = state.credentials.count_where(|c| c.institution_id == id);
        let recognitions = state
            .recognitions
            .count_where(|r| r.recognizing_institution_id == id);
        let pathways = state
            .pathways
            .count_where(|p| p.source_institution_id == id || p.target_institution_id == id);
        if credentials + recognitions + pathways > 0 {
            return Err(AppError::Conflict(format!(
                "institution {id} is referenced by {credentials} micro-credential(s), \
                 {recognitions} recognition(s) and {pathways} pathway(s)"
            )));
        }
        map.remove(&id)
            .ok_or_else(|| AppError::not_found("institution", id))
    })?;

    persist!(state, db::institutions::delete, id; on_error => {
        state.institutions.insert(id, removed);
    });

    tracing::info!(institution_id = %id, "institution deleted");
    Ok(StatusCode::NO_CONTENT)
}
