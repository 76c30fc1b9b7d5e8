//! # Pathways API
//!
//! Credit-transfer routes from a source to a target institution, carried
//! by a micro-credential. Status changes go through
//! [`mcred_state::pathway::transition`]:
//!
//! ```text
//! DRAFT --submit--> UNDER_REVIEW --approve--> APPROVED --activate--> ACTIVE
//!   \______________approve_______________/                 ^        |
//!                                                  activate |   suspend
//!                                                           +-- SUSPENDED
//! any non-archived --archive--> ARCHIVED
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use mcred_core::{
    contains_ignore_case, paginate, FieldChecks, Filter, PageRequest, PathwayType, Sortable,
    ValidationErrors,
};
use mcred_state::pathway::{self, PathwayAction};
use mcred_state::PathwayStatus;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::views::{pathway_view, PathwayView};
use super::{clean_text, find_credential, find_institution, search_needle};
use crate::auth::{require_role, CallerIdentity, Role};
use crate::db;
use crate::error::AppError;
use crate::extractors::{extract_path, extract_query, extract_validated_json, Validate};
use crate::response::{created, list, ok, ListResponse, Single};
use crate::state::{AppState, PathwayRecord};

// ── Request types ───────────────────────────────────────────────────────────

/// Request to propose a pathway. It starts in DRAFT.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePathwayRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub source_institution_id: Uuid,
    /// Must differ from `sourceInstitutionId`.
    pub target_institution_id: Uuid,
    pub micro_credential_id: Uuid,
    pub pathway_type: PathwayType,
    pub credits_transferred: Option<f64>,
    pub requirements: Option<String>,
    pub effective_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
}

fn check_endpoints(checks: &mut FieldChecks, source: Uuid, target: Uuid) {
    if source == target {
        checks.fail(
            "targetInstitutionId",
            "must differ from sourceInstitutionId",
        );
    }
}

impl Validate for CreatePathwayRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = FieldChecks::new();
        checks
            .required_text("name", &self.name, 1, 200)
            .optional_text("description", self.description.as_deref(), 1, 5000)
            .number_range("creditsTransferred", self.credits_transferred, 0.0, 120.0)
            .optional_text("requirements", self.requirements.as_deref(), 1, 5000)
            .date_order("expiryDate", self.effective_date, self.expiry_date);
        check_endpoints(
            &mut checks,
            self.source_institution_id,
            self.target_institution_id,
        );
        checks.finish()
    }
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePathwayRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub source_institution_id: Option<Uuid>,
    pub target_institution_id: Option<Uuid>,
    pub micro_credential_id: Option<Uuid>,
    pub pathway_type: Option<PathwayType>,
    pub credits_transferred: Option<f64>,
    pub requirements: Option<String>,
    pub effective_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
}

impl Validate for UpdatePathwayRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = FieldChecks::new();
        checks
            .optional_text("name", self.name.as_deref(), 1, 200)
            .optional_text("description", self.description.as_deref(), 1, 5000)
            .number_range("creditsTransferred", self.credits_transferred, 0.0, 120.0)
            .optional_text("requirements", self.requirements.as_deref(), 1, 5000);
        checks.finish()
    }
}

impl UpdatePathwayRequest {
    fn apply(self, record: &mut PathwayRecord) {
        if let Some(name) = self.name {
            record.name = name.trim().to_string();
        }
        if self.description.is_some() {
            record.description = clean_text(self.description);
        }
        if let Some(id) = self.source_institution_id {
            record.source_institution_id = id;
        }
        if let Some(id) = self.target_institution_id {
            record.target_institution_id = id;
        }
        if let Some(id) = self.micro_credential_id {
            record.micro_credential_id = id;
        }
        if let Some(t) = self.pathway_type {
            record.pathway_type = t;
        }
        if self.credits_transferred.is_some() {
            record.credits_transferred = self.credits_transferred;
        }
        if self.requirements.is_some() {
            record.requirements = clean_text(self.requirements);
        }
        if self.effective_date.is_some() {
            record.effective_date = self.effective_date;
        }
        if self.expiry_date.is_some() {
            record.expiry_date = self.expiry_date;
        }
    }
}

/// Query parameters for `GET /api/pathways`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PathwayListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    /// One of `createdAt`, `updatedAt`, `name`, `status`, `creditsTransferred`, `approvedAt`.
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub source_institution_id: Option<String>,
    pub target_institution_id: Option<String>,
    pub micro_credential_id: Option<String>,
    pub pathway_type: Option<String>,
    pub status: Option<String>,
    /// Case-insensitive match on name and description.
    pub search: Option<String>,
}

// ── Router ──────────────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/pathways", get(list_pathways).post(create_pathway))
        .route(
            "/api/pathways/:id",
            get(get_pathway).put(update_pathway).delete(delete_pathway),
        )
        .route("/api/pathways/:id/submit", post(submit_pathway))
        .route("/api/pathways/:id/approve", post(approve_pathway))
        .route("/api/pathways/:id/activate", post(activate_pathway))
        .route("/api/pathways/:id/suspend", post(suspend_pathway))
        .route("/api/pathways/:id/archive", post(archive_pathway))
}

// ── Handlers ────────────────────────────────────────────────────────────────

/// POST /api/pathways: Propose a pathway in DRAFT.
#[utoipa::path(
    post,
    path = "/api/pathways",
    request_body = CreatePathwayRequest,
    responses(
        (status = 201, description = "Pathway created", body = PathwayView),
        (status = 400, description = "Invalid request", body = crate::error::ErrorBody),
        (status = 404, description = "Institution or credential not found", body = crate::error::ErrorBody),
    ),
    tag = "pathways"
)]
async fn create_pathway(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreatePathwayRequest>, JsonRejection>,
) -> Result<Single<PathwayView>, AppError> {
    require_role(&caller, Role::ProgramCoordinator)?;
    let req = extract_validated_json(body)?;

    find_institution(&state, req.source_institution_id)?;
    find_institution(&state, req.target_institution_id)?;
    find_credential(&state, req.micro_credential_id)?;

    let now = Utc::now();
    let record = PathwayRecord {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        description: clean_text(req.description),
        source_institution_id: req.source_institution_id,
        target_institution_id: req.target_institution_id,
        micro_credential_id: req.micro_credential_id,
        pathway_type: req.pathway_type,
        status: PathwayStatus::Draft,
        credits_transferred: req.credits_transferred,
        requirements: clean_text(req.requirements),
        approved_at: None,
        effective_date: req.effective_date,
        expiry_date: req.expiry_date,
        created_at: now,
        updated_at: now,
    };
    let id = record.id;
    state.pathways.insert(id, record.clone());

    persist!(state, db::pathways::insert, &record; on_error => {
        state.pathways.remove(&id);
    });

    tracing::info!(
        pathway_id = %id,
        source = %record.source_institution_id,
        target = %record.target_institution_id,
        "pathway created"
    );
    Ok(created(pathway_view(&state, record)))
}

/// GET /api/pathways: List pathways.
#[utoipa::path(
    get,
    path = "/api/pathways",
    params(PathwayListQuery),
    responses(
        (status = 200, description = "Page of pathways", body = Vec<PathwayView>),
        (status = 400, description = "Invalid query", body = crate::error::ErrorBody),
    ),
    tag = "pathways"
)]
async fn list_pathways(
    State(state): State<AppState>,
    query: Result<Query<PathwayListQuery>, QueryRejection>,
) -> Result<Json<ListResponse<PathwayView>>, AppError> {
    let q = extract_query(query)?;

    let mut checks = FieldChecks::new();
    let page = PageRequest::parse(
        &mut checks,
        q.page.as_deref(),
        q.limit.as_deref(),
        q.sort_by.as_deref(),
        q.sort_order.as_deref(),
        PathwayRecord::SORT_FIELDS,
    );
    let source: Option<Uuid> =
        checks.parse_param("sourceInstitutionId", q.source_institution_id.as_deref());
    let target: Option<Uuid> =
        checks.parse_param("targetInstitutionId", q.target_institution_id.as_deref());
    let credential_id: Option<Uuid> =
        checks.parse_param("microCredentialId", q.micro_credential_id.as_deref());
    let pathway_type: Option<PathwayType> =
        checks.parse_param("pathwayType", q.pathway_type.as_deref());
    let status: Option<PathwayStatus> = checks.parse_param("status", q.status.as_deref());
    checks.finish()?;

    let filter = Filter::new()
        .eq("sourceInstitutionId", source, |p: &PathwayRecord| {
            p.source_institution_id
        })
        .eq("targetInstitutionId", target, |p: &PathwayRecord| {
            p.target_institution_id
        })
        .eq("microCredentialId", credential_id, |p: &PathwayRecord| {
            p.micro_credential_id
        })
        .eq("pathwayType", pathway_type, |p: &PathwayRecord| p.pathway_type)
        .eq("status", status, |p: &PathwayRecord| p.status)
        .with(
            "search",
            search_needle(q.search.as_deref()),
            |p: &PathwayRecord, needle: &String| {
                contains_ignore_case(&p.name, needle)
                    || p
                        .description
                        .as_deref()
                        .is_some_and(|d| contains_ignore_case(d, needle))
            },
        );

    let page = paginate(state.pathways.list(), &filter, &page);
    Ok(list(page.map(|p| pathway_view(&state, p))))
}

/// GET /api/pathways/:id: Fetch one pathway.
#[utoipa::path(
    get,
    path = "/api/pathways/{id}",
    params(("id" = Uuid, Path, description = "Pathway ID")),
    responses(
        (status = 200, description = "Pathway found", body = PathwayView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "pathways"
)]
async fn get_pathway(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Single<PathwayView>, AppError> {
    let id = extract_path(path)?;
    let record = state
        .pathways
        .get(&id)
        .ok_or_else(|| AppError::not_found("pathway", id))?;
    Ok(ok(pathway_view(&state, record)))
}

/// PUT /api/pathways/:id: Partially update a pathway.
#[utoipa::path(
    put,
    path = "/api/pathways/{id}",
    params(("id" = Uuid, Path, description = "Pathway ID")),
    request_body = UpdatePathwayRequest,
    responses(
        (status = 200, description = "Pathway updated", body = PathwayView),
        (status = 400, description = "Invalid request", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "pathways"
)]
async fn update_pathway(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdatePathwayRequest>, JsonRejection>,
) -> Result<Single<PathwayView>, AppError> {
    require_role(&caller, Role::ProgramCoordinator)?;
    let id = extract_path(path)?;
    let req = extract_validated_json(body)?;

    for institution_id in [req.source_institution_id, req.target_institution_id]
        .into_iter()
        .flatten()
    {
        find_institution(&state, institution_id)?;
    }
    if let Some(credential_id) = req.micro_credential_id {
        find_credential(&state, credential_id)?;
    }

    let now = Utc::now();
    let (previous, updated) = state
        .pathways
        .try_update(&id, |current| -> Result<_, AppError> {
            let mut next = current.clone();
            req.apply(&mut next);
            let mut checks = FieldChecks::new();
            checks.date_order("expiryDate", next.effective_date, next.expiry_date);
            check_endpoints(
                &mut checks,
                next.source_institution_id,
                next.target_institution_id,
            );
            checks.finish()?;

            next.updated_at = now;
            let previous = std::mem::replace(current, next.clone());
            Ok((previous, next))
        })
        .ok_or_else(|| AppError::not_found("pathway", id))??;

    persist!(state, db::pathways::update, &updated; on_error => {
        state.pathways.insert(id, previous);
    });

    tracing::info!(pathway_id = %id, "pathway updated");
    Ok(ok(pathway_view(&state, updated)))
}

/// DELETE /api/pathways/:id: Delete a pathway.
#[utoipa::path(
    delete,
    path = "/api/pathways/{id}",
    params(("id" = Uuid, Path, description = "Pathway ID")),
    responses(
        (status = 204, description = "Pathway deleted"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "pathways"
)]
async fn delete_pathway(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    require_role(&caller, Role::Admin)?;
    let id = extract_path(path)?;
    let removed = state
        .pathways
        .remove(&id)
        .ok_or_else(|| AppError::not_found("pathway", id))?;

    persist!(state, db::pathways::delete, id; on_error => {
        state.pathways.insert(id, removed);
    });

    tracing::info!(pathway_id = %id, "pathway deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn transition_pathway(
    state: &AppState,
    id: Uuid,
    action: PathwayAction,
) -> Result<PathwayRecord, AppError> {
    let now = Utc::now();
    let (previous, updated) = state
        .pathways
        .try_update(&id, |p| {
            let next = pathway::transition(p.status, action)?;
            let previous = p.clone();
            p.status = next;
            if next == PathwayStatus::Approved {
                p.approved_at = Some(now);
            }
            p.updated_at = now;
            Ok::<_, mcred_state::WorkflowError>((previous, p.clone()))
        })
        .ok_or_else(|| AppError::not_found("pathway", id))??;

    persist!(state, db::pathways::update_status, &updated; on_error => {
        state.pathways.insert(id, previous);
    });

    tracing::info!(
        pathway_id = %id,
        action = action.as_str(),
        from = %previous.status,
        to = %updated.status,
        "pathway status changed"
    );
    Ok(updated)
}

/// Shared body of the five action endpoints.
async fn pathway_action(
    state: AppState,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
    action: PathwayAction,
) -> Result<Single<PathwayView>, AppError> {
    let required = match action {
        PathwayAction::Submit => Role::ProgramCoordinator,
        _ => Role::InstitutionAdmin,
    };
    require_role(&caller, required)?;
    let id = extract_path(path)?;
    let record = transition_pathway(&state, id, action).await?;
    Ok(ok(pathway_view(&state, record)))
}

/// POST /api/pathways/:id/submit: DRAFT to UNDER_REVIEW.
#[utoipa::path(
    post,
    path = "/api/pathways/{id}/submit",
    params(("id" = Uuid, Path, description = "Pathway ID")),
    responses(
        (status = 200, description = "Submitted for review", body = PathwayView),
        (status = 400, description = "Transition not allowed", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "pathways"
)]
async fn submit_pathway(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Single<PathwayView>, AppError> {
    pathway_action(state, caller, path, PathwayAction::Submit).await
}

/// POST /api/pathways/:id/approve: Approve and stamp `approvedAt`.
#[utoipa::path(
    post,
    path = "/api/pathways/{id}/approve",
    params(("id" = Uuid, Path, description = "Pathway ID")),
    responses(
        (status = 200, description = "Approved", body = PathwayView),
        (status = 400, description = "Transition not allowed", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "pathways"
)]
async fn approve_pathway(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Single<PathwayView>, AppError> {
    pathway_action(state, caller, path, PathwayAction::Approve).await
}

/// POST /api/pathways/:id/activate: APPROVED or SUSPENDED to ACTIVE.
#[utoipa::path(
    post,
    path = "/api/pathways/{id}/activate",
    params(("id" = Uuid, Path, description = "Pathway ID")),
    responses(
        (status = 200, description = "Active", body = PathwayView),
        (status = 400, description = "Transition not allowed", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "pathways"
)]
async fn activate_pathway(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Single<PathwayView>, AppError> {
    pathway_action(state, caller, path, PathwayAction::Activate).await
}

/// POST /api/pathways/:id/suspend: ACTIVE to SUSPENDED.
#[utoipa::path(
    post,
    path = "/api/pathways/{id}/suspend",
    params(("id" = Uuid, Path, description = "Pathway ID")),
    responses(
        (status = 200, description = "Suspended", body = PathwayView),
        (status = 400, description = "Transition not allowed", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "pathways"
)]
async fn suspend_pathway(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Single<PathwayView>, AppError> {
    pathway_action(state, caller, path, PathwayAction::Suspend).await
}

/// POST /api/pathways/:id/archive: Retire the pathway.
#[utoipa::path(
    post,
    path = "/api/pathways/{id}/archive",
    params(("id" = Uuid, Path, description = "Pathway ID")),
    responses(
        (status = 200, description = "Archived", body = PathwayView),
        (status = 400, description = "Already archived", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "pathways"
)]
async fn archive_pathway(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Single<PathwayView>, AppError> {
    pathway_action(state, caller, path, PathwayAction::Archive).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CredentialRecord, InstitutionRecord};
    use mcred_core::{CredentialLevel, CredentialType, DeliveryMode, InstitutionType};
    use mcred_state::CredentialStatus;

    struct Fixture {
        state: AppState,
        source: Uuid,
        target: Uuid,
        credential: Uuid,
    }

    fn fixture() -> Fixture {
        let state = AppState::new();
        let now = Utc::now();
        let mut ids = Vec::new();
        for code in ["SRC", "TGT"] {
            let record = InstitutionRecord {
                id: Uuid::new_v4(),
                name: code.into(),
                code: code.into(),
                institution_type: InstitutionType::College,
                country: None,
                website: None,
                created_at: now,
                updated_at: now,
            };
            ids.push(record.id);
            state.institutions.insert(record.id, record);
        }
        let credential = CredentialRecord {
            id: Uuid::new_v4(),
            title: "Welding Basics".into(),
            description: None,
            program_code: "WELD-1".into(),
            institution_id: ids[0],
            credential_type: CredentialType::ShortCourse,
            delivery_mode: DeliveryMode::InPerson,
            level: CredentialLevel::Introductory,
            credit_value: None,
            credit_type: None,
            duration_hours: Some(40),
            program_url: None,
            status: CredentialStatus::Published,
            effective_date: None,
            expiry_date: None,
            is_active: true,
            published_at: Some(now),
            learning_outcomes: Vec::new(),
            prerequisites: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let credential_id = credential.id;
        state.credentials.insert(credential_id, credential);
        Fixture {
            state,
            source: ids[0],
            target: ids[1],
            credential: credential_id,
        }
    }

    fn request(f: &Fixture) -> CreatePathwayRequest {
        CreatePathwayRequest {
            name: "Welding to Engineering Diploma".into(),
            description: Some("Credit toward year one".into()),
            source_institution_id: f.source,
            target_institution_id: f.target,
            micro_credential_id: f.credential,
            pathway_type: PathwayType::Articulation,
            credits_transferred: Some(15.0),
            requirements: None,
            effective_date: None,
            expiry_date: None,
        }
    }

    async fn draft(f: &Fixture) -> Uuid {
        let (_, Json(body)) = create_pathway(
            State(f.state.clone()),
            CallerIdentity::admin(),
            Ok(Json(request(f))),
        )
        .await
        .unwrap();
        assert_eq!(body.data.pathway.status, PathwayStatus::Draft);
        body.data.pathway.id
    }

    #[test]
    fn same_source_and_target_is_rejected() {
        let f = fixture();
        let mut req = request(&f);
        req.target_institution_id = req.source_institution_id;
        let errors = req.validate().unwrap_err();
        assert!(errors.has_field("targetInstitutionId"));
    }

    #[tokio::test]
    async fn full_lifecycle() {
        let f = fixture();
        let id = draft(&f).await;

        let steps = [
            (PathwayAction::Submit, PathwayStatus::UnderReview),
            (PathwayAction::Approve, PathwayStatus::Approved),
            (PathwayAction::Activate, PathwayStatus::Active),
            (PathwayAction::Suspend, PathwayStatus::Suspended),
            (PathwayAction::Activate, PathwayStatus::Active),
            (PathwayAction::Archive, PathwayStatus::Archived),
        ];
        for (action, expected) in steps {
            let record = transition_pathway(&f.state, id, action).await.unwrap();
            assert_eq!(record.status, expected, "{action}");
        }
        assert!(f.state.pathways.get(&id).unwrap().approved_at.is_some());

        for action in PathwayAction::ALL {
            let err = transition_pathway(&f.state, id, *action).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidTransition(_)), "{action}");
        }
    }

    #[tokio::test]
    async fn draft_cannot_be_activated() {
        let f = fixture();
        let id = draft(&f).await;
        let err = transition_pathway(&f.state, id, PathwayAction::Activate)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
        assert_eq!(f.state.pathways.get(&id).unwrap().status, PathwayStatus::Draft);
    }

    #[tokio::test]
    async fn coordinator_may_submit_but_not_approve() {
        let f = fixture();
        let id = draft(&f).await;
        let coordinator = CallerIdentity {
            role: Role::ProgramCoordinator,
            user_id: None,
        };

        let (_, Json(body)) = pathway_action(
            f.state.clone(),
            coordinator.clone(),
            Ok(Path(id)),
            PathwayAction::Submit,
        )
        .await
        .unwrap();
        assert_eq!(body.data.pathway.status, PathwayStatus::UnderReview);

        let err = pathway_action(f.state.clone(), coordinator, Ok(Path(id)), PathwayAction::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn update_rejects_target_equal_to_stored_source() {
        let f = fixture();
        let id = draft(&f).await;
        let req = UpdatePathwayRequest {
            target_institution_id: Some(f.source),
            ..Default::default()
        };
        let err = update_pathway(
            State(f.state.clone()),
            CallerIdentity::admin(),
            Ok(Path(id)),
            Ok(Json(req)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref e) if e.has_field("targetInstitutionId")));
    }

    #[tokio::test]
    async fn create_requires_existing_credential() {
        let f = fixture();
        let mut req = request(&f);
        req.micro_credential_id = Uuid::new_v4();
        let err = create_pathway(State(f.state.clone()), CallerIdentity::admin(), Ok(Json(req)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m.starts_with("micro-credential")));
    }
}
