//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Micro-Credential Registry API",
        version = "0.1.0",
        description = "Registry of institutions, micro-credentials, cross-institution recognitions, and credit-transfer pathways.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Institutions
        crate::routes::institutions::create_institution,
        crate::routes::institutions::list_institutions,
        crate::routes::institutions::get_institution,
        crate::routes::institutions::update_institution,
        crate::routes::institutions::delete_institution,
        // Micro-credentials
        crate::routes::credentials::create_credential,
        crate::routes::credentials::list_credentials,
        crate::routes::credentials::get_credential,
        crate::routes::credentials::update_credential,
        crate::routes::credentials::delete_credential,
        crate::routes::credentials::submit_credential,
        crate::routes::credentials::publish_credential,
        crate::routes::credentials::archive_credential,
        // Recognitions
        crate::routes::recognitions::create_recognition,
        crate::routes::recognitions::list_recognitions,
        crate::routes::recognitions::get_recognition,
        crate::routes::recognitions::update_recognition,
        crate::routes::recognitions::delete_recognition,
        crate::routes::recognitions::activate_recognition,
        crate::routes::recognitions::deactivate_recognition,
        // Pathways
        crate::routes::pathways::create_pathway,
        crate::routes::pathways::list_pathways,
        crate::routes::pathways::get_pathway,
        crate::routes::pathways::update_pathway,
        crate::routes::pathways::delete_pathway,
        crate::routes::pathways::submit_pathway,
        crate::routes::pathways::approve_pathway,
        crate::routes::pathways::activate_pathway,
        crate::routes::pathways::suspend_pathway,
        crate::routes::pathways::archive_pathway,
    ),
    components(schemas(
        // Records
        crate::state::InstitutionRecord,
        crate::state::CredentialRecord,
        crate::state::LearningOutcome,
        crate::state::Prerequisite,
        crate::state::RecognitionRecord,
        crate::state::PathwayRecord,
        // Views
        crate::routes::views::InstitutionSummary,
        crate::routes::views::CredentialSummary,
        crate::routes::views::InstitutionView,
        crate::routes::views::CredentialRecognition,
        crate::routes::views::CredentialView,
        crate::routes::views::RecognitionView,
        crate::routes::views::PathwayView,
        // Vocabularies
        mcred_core::CredentialType,
        mcred_core::DeliveryMode,
        mcred_core::CredentialLevel,
        mcred_core::CreditType,
        mcred_core::RecognitionType,
        mcred_core::TranscriptMethod,
        mcred_core::PathwayType,
        mcred_core::InstitutionType,
        mcred_state::CredentialStatus,
        mcred_state::PathwayStatus,
        // Errors
        crate::error::ErrorBody,
        mcred_core::FieldError,
        // Request DTOs
        crate::routes::institutions::CreateInstitutionRequest,
        crate::routes::institutions::UpdateInstitutionRequest,
        crate::routes::credentials::CreateCredentialRequest,
        crate::routes::credentials::UpdateCredentialRequest,
        crate::routes::credentials::LearningOutcomeInput,
        crate::routes::credentials::PrerequisiteInput,
        crate::routes::recognitions::CreateRecognitionRequest,
        crate::routes::recognitions::UpdateRecognitionRequest,
        crate::routes::pathways::CreatePathwayRequest,
        crate::routes::pathways::UpdatePathwayRequest,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "institutions", description = "Education and training providers"),
        (name = "credentials", description = "Micro-credential programs and their publication workflow"),
        (name = "recognitions", description = "Cross-institution recognition of published micro-credentials"),
        (name = "pathways", description = "Credit-transfer pathways and their approval workflow"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme used by write endpoints.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_every_entity_path() {
        let spec = ApiDoc::openapi();
        for path in [
            "/api/institutions",
            "/api/institutions/{id}",
            "/api/credentials/{id}/publish",
            "/api/recognitions/{id}/deactivate",
            "/api/pathways/{id}/suspend",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn spec_registers_bearer_scheme() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert_eq!(
            json["components"]["securitySchemes"]["bearer"]["scheme"],
            "bearer"
        );
    }
}
