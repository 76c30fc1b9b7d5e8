//! # Response Views
//!
//! Records as returned by the API, with related entities eagerly joined:
//!
//! | View | Includes |
//! |------|----------|
//! | [`InstitutionView`] | counts of owned credentials and issued recognitions |
//! | [`CredentialView`] | owning institution, recognitions with their recognizing institution |
//! | [`RecognitionView`] | credential (with its institution), recognizing institution |
//! | [`PathwayView`] | source and target institutions, credential |
//!
//! A dangling reference (possible only in a partially hydrated store)
//! renders as `null` rather than failing the request.

use mcred_core::InstitutionType;
use mcred_state::CredentialStatus;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{AppState, CredentialRecord, InstitutionRecord, PathwayRecord, RecognitionRecord};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionSummary {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub institution_type: InstitutionType,
}

impl From<InstitutionRecord> for InstitutionSummary {
    fn from(r: InstitutionRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            code: r.code,
            institution_type: r.institution_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSummary {
    pub id: Uuid,
    pub title: String,
    pub program_code: String,
    pub status: CredentialStatus,
    pub institution: Option<InstitutionSummary>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionView {
    #[serde(flatten)]
    pub institution: InstitutionRecord,
    pub credential_count: usize,
    pub recognition_count: usize,
}

/// A recognition nested inside a [`CredentialView`].
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecognition {
    #[serde(flatten)]
    pub recognition: RecognitionRecord,
    pub recognizing_institution: Option<InstitutionSummary>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialView {
    #[serde(flatten)]
    pub credential: CredentialRecord,
    pub institution: Option<InstitutionSummary>,
    pub recognitions: Vec<CredentialRecognition>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionView {
    #[serde(flatten)]
    pub recognition: RecognitionRecord,
    pub micro_credential: Option<CredentialSummary>,
    pub recognizing_institution: Option<InstitutionSummary>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PathwayView {
    #[serde(flatten)]
    pub pathway: PathwayRecord,
    pub source_institution: Option<InstitutionSummary>,
    pub target_institution: Option<InstitutionSummary>,
    pub micro_credential: Option<CredentialSummary>,
}

fn institution_summary(state: &AppState, id: Uuid) -> Option<InstitutionSummary> {
    state.institutions.get(&id).map(InstitutionSummary::from)
}

fn credential_summary(state: &AppState, id: Uuid) -> Option<CredentialSummary> {
    state.credentials.get(&id).map(|c| CredentialSummary {
        id: c.id,
        institution: institution_summary(state, c.institution_id),
        title: c.title,
        program_code: c.program_code,
        status: c.status,
    })
}

pub fn institution_view(state: &AppState, institution: InstitutionRecord) -> InstitutionView {
    let id = institution.id;
    InstitutionView {
        credential_count: state.credentials.count_where(|c| c.institution_id == id),
        recognition_count: state
            .recognitions
            .count_where(|r| r.recognizing_institution_id == id),
        institution,
    }
}

pub fn credential_view(state: &AppState, credential: CredentialRecord) -> CredentialView {
    let id = credential.id;
    let mut recognitions = state.recognitions.list_where(|r| r.micro_credential_id == id);
    recognitions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    CredentialView {
        institution: institution_summary(state, credential.institution_id),
        recognitions: recognitions
            .into_iter()
            .map(|r| CredentialRecognition {
                recognizing_institution: institution_summary(state, r.recognizing_institution_id),
                recognition: r,
            })
            .collect(),
        credential,
    }
}

pub fn recognition_view(state: &AppState, recognition: RecognitionRecord) -> RecognitionView {
    RecognitionView {
        micro_credential: credential_summary(state, recognition.micro_credential_id),
        recognizing_institution: institution_summary(state, recognition.recognizing_institution_id),
        recognition,
    }
}

pub fn pathway_view(state: &AppState, pathway: PathwayRecord) -> PathwayView {
    PathwayView {
        source_institution: institution_summary(state, pathway.source_institution_id),
        target_institution: institution_summary(state, pathway.target_institution_id),
        micro_credential: credential_summary(state, pathway.micro_credential_id),
        pathway,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn institution(state: &AppState, code: &str) -> InstitutionRecord {
        let now = Utc::now();
        let record = InstitutionRecord {
            id: Uuid::new_v4(),
            name: format!("{code} University"),
            code: code.into(),
            institution_type: InstitutionType::University,
            country: None,
            website: None,
            created_at: now,
            updated_at: now,
        };
        state.institutions.insert(record.id, record.clone());
        record
    }

    #[test]
    fn institution_view_flattens_record() {
        let state = AppState::new();
        let inst = institution(&state, "UOA");
        let json = serde_json::to_value(institution_view(&state, inst.clone())).unwrap();
        assert_eq!(json["id"], serde_json::json!(inst.id));
        assert_eq!(json["code"], "UOA");
        assert_eq!(json["credentialCount"], 0);
        assert_eq!(json["recognitionCount"], 0);
    }

    #[test]
    fn dangling_reference_renders_null() {
        let state = AppState::new();
        let now = Utc::now();
        let pathway = PathwayRecord {
            id: Uuid::new_v4(),
            name: "Orphan".into(),
            description: None,
            source_institution_id: Uuid::new_v4(),
            target_institution_id: institution(&state, "TGT").id,
            micro_credential_id: Uuid::new_v4(),
            pathway_type: mcred_core::PathwayType::Transfer,
            status: mcred_state::PathwayStatus::Draft,
            credits_transferred: None,
            requirements: None,
            approved_at: None,
            effective_date: None,
            expiry_date: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(pathway_view(&state, pathway)).unwrap();
        assert!(json["sourceInstitution"].is_null());
        assert_eq!(json["targetInstitution"]["code"], "TGT");
        assert!(json["microCredential"].is_null());
        assert_eq!(json["status"], "DRAFT");
    }
}
