//! # Integration Tests for mcred-api
//!
//! Drives the assembled router end to end: institution and credential
//! round trips, uniqueness, the publication and pathway workflows, the
//! recognition gate, pagination, authentication, and the probe endpoints.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use mcred_api::state::{AppConfig, AppState};

const SECRET: &str = "test-secret";

/// Helper: build the test app with auth disabled (every caller is ADMIN).
fn test_app() -> axum::Router {
    mcred_api::app(AppState::new())
}

/// Helper: build the test app with auth enabled.
fn test_app_with_auth() -> axum::Router {
    let config = AppConfig {
        auth_token: Some(SECRET.to_string()),
        ..AppConfig::default()
    };
    mcred_api::app(AppState::with_config(config, None))
}

fn bearer(role: &str) -> String {
    format!("Bearer {role}::{SECRET}")
}

/// Helper: send a request and decode the JSON body (`Null` when empty).
async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    auth: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = auth {
        builder = builder.header("Authorization", value);
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

async fn post(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body), None).await
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None, None).await
}

async fn create_institution(app: &axum::Router, code: &str) -> String {
    let (status, body) = post(
        app,
        "/api/institutions",
        json!({
            "name": format!("Institution {code}"),
            "code": code,
            "institutionType": "UNIVERSITY",
            "country": "Kenya"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn create_credential(app: &axum::Router, institution_id: &str, code: &str) -> String {
    let (status, body) = post(
        app,
        "/api/credentials",
        json!({
            "title": format!("Credential {code}"),
            "programCode": code,
            "institutionId": institution_id,
            "credentialType": "CERTIFICATE",
            "deliveryMode": "ONLINE",
            "level": "INTRODUCTORY",
            "creditValue": 5.0,
            "creditType": "ECTS"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn publish(app: &axum::Router, credential_id: &str) {
    let (status, body) = send(
        app,
        Method::POST,
        &format!("/api/credentials/{credential_id}/publish"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

// -- Probes -------------------------------------------------------------------

#[tokio::test]
async fn health_reports_in_memory_mode() {
    let app = test_app();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy", "database": "in-memory"}));

    let (status, body) = get(&app, "/health/liveness").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}

#[tokio::test]
async fn health_needs_no_credentials_when_auth_enabled() {
    let app = test_app_with_auth();
    let (status, _) = send(&app, Method::GET, "/health", None, Some("Bearer wrong")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn openapi_spec_is_served() {
    let app = test_app();
    let (status, body) = get(&app, "/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/pathways/{id}/approve"].is_object());
    assert!(body["components"]["schemas"]["CredentialView"].is_object());
}

#[tokio::test]
async fn metrics_count_requests_and_records() {
    let app = test_app();
    create_institution(&app, "MET-1").await;
    let (status, _) = get(&app, "/api/institutions/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requests"], 2);
    assert_eq!(body["clientErrors"], 1);
    assert_eq!(body["institutions"], 1);
    assert_eq!(body["credentials"], 0);
}

// -- Institutions & Credentials -----------------------------------------------

#[tokio::test]
async fn credential_round_trip_with_children() {
    let app = test_app();
    let institution_id = create_institution(&app, "uon").await;

    let (status, body) = post(
        &app,
        "/api/credentials",
        json!({
            "title": "  Data Literacy  ",
            "programCode": "dl-101",
            "institutionId": institution_id,
            "credentialType": "DIGITAL_BADGE",
            "deliveryMode": "HYBRID",
            "level": "INTERMEDIATE",
            "durationHours": 40,
            "learningOutcomes": [
                {"description": "Read a chart", "bloomLevel": "UNDERSTAND"},
                {"description": "Clean a dataset"}
            ],
            "prerequisites": [{"description": "Spreadsheet basics", "isMandatory": false}]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "success");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = get(&app, &format!("/api/credentials/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["title"], "Data Literacy");
    assert_eq!(data["programCode"], "DL-101");
    assert_eq!(data["status"], "DRAFT");
    assert_eq!(data["institution"]["code"], "UON");
    assert_eq!(data["learningOutcomes"][0]["description"], "Read a chart");
    assert_eq!(data["learningOutcomes"][1]["orderIndex"], 1);
    assert_eq!(data["prerequisites"][0]["isMandatory"], false);
    assert_eq!(data["recognitions"], json!([]));

    let (_, body) = get(&app, &format!("/api/institutions/{institution_id}")).await;
    assert_eq!(body["data"]["credentialCount"], 1);
}

#[tokio::test]
async fn program_code_is_unique_on_create_and_update() {
    let app = test_app();
    let institution_id = create_institution(&app, "UNI-A").await;
    create_credential(&app, &institution_id, "CS-1").await;
    let second = create_credential(&app, &institution_id, "CS-2").await;

    let (status, body) = post(
        &app,
        "/api/credentials",
        json!({
            "title": "Duplicate",
            "programCode": "cs-1",
            "institutionId": institution_id,
            "credentialType": "CERTIFICATE",
            "deliveryMode": "ONLINE",
            "level": "INTRODUCTORY"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/credentials/{second}"),
        Some(json!({"programCode": "CS-1"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Keeping its own code is not a conflict.
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/credentials/{second}"),
        Some(json!({"programCode": "cs-2"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn partial_update_leaves_absent_fields() {
    let app = test_app();
    let institution_id = create_institution(&app, "UNI-P").await;
    let id = create_credential(&app, &institution_id, "PU-1").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/credentials/{id}"),
        Some(json!({"title": "Renamed"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["title"], "Renamed");
    assert_eq!(body["data"]["programCode"], "PU-1");
    assert_eq!(body["data"]["creditType"], "ECTS");
    assert_eq!(body["data"]["level"], "INTRODUCTORY");
}

#[tokio::test]
async fn validation_errors_list_fields() {
    let app = test_app();
    let (status, body) = post(
        &app,
        "/api/institutions",
        json!({"name": "", "code": "x", "institutionType": "UNIVERSITY", "website": "nope"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"code"));
    assert!(fields.contains(&"website"));
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let app = test_app();
    let missing = uuid::Uuid::new_v4();
    let (status, body) = get(&app, &format!("/api/credentials/{missing}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["status"], "error");
}

// -- Credential Workflow & Recognitions ---------------------------------------

#[tokio::test]
async fn publishing_twice_is_a_workflow_conflict() {
    let app = test_app();
    let institution_id = create_institution(&app, "UNI-W").await;
    let id = create_credential(&app, &institution_id, "WF-1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/credentials/{id}/submit"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "UNDER_REVIEW");

    publish(&app, &id).await;
    let (_, body) = get(&app, &format!("/api/credentials/{id}")).await;
    assert_eq!(body["data"]["status"], "PUBLISHED");
    assert!(body["data"]["publishedAt"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/credentials/{id}/publish"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "CONFLICT");
    assert!(body["message"].as_str().unwrap().contains("already published"));
}

#[tokio::test]
async fn recognition_requires_published_credential() {
    let app = test_app();
    let provider = create_institution(&app, "PROV").await;
    let recognizer = create_institution(&app, "RECO").await;
    let credential = create_credential(&app, &provider, "RG-1").await;

    let request = json!({
        "microCredentialId": credential,
        "recognizingInstitutionId": recognizer,
        "recognitionType": "FULL_CREDIT",
        "transcriptMethod": "PASS_FAIL",
        "creditsAwarded": 5.0
    });

    let (status, body) = post(&app, "/api/recognitions", request.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "PRECONDITION_FAILED");

    publish(&app, &credential).await;
    let (status, body) = post(&app, "/api/recognitions", request).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let recognition = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["isActive"], true);
    assert_eq!(body["data"]["recognizingInstitution"]["code"], "RECO");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/recognitions/{recognition}/deactivate"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], false);

    let (_, body) = get(&app, &format!("/api/credentials/{credential}")).await;
    assert_eq!(body["data"]["recognitions"].as_array().unwrap().len(), 1);

    let (_, body) = get(
        &app,
        &format!("/api/recognitions?recognizingInstitutionId={recognizer}&isActive=false"),
    )
    .await;
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn archived_credential_cannot_be_reactivated_by_update() {
    let app = test_app();
    let institution_id = create_institution(&app, "UNI-AR").await;
    let id = create_credential(&app, &institution_id, "AR-1").await;
    publish(&app, &id).await;
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/credentials/{id}/archive"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/credentials/{id}"),
        Some(json!({ "isActive": true, "title": "Revived" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["code"], "CONFLICT");

    let (_, body) = get(&app, &format!("/api/credentials/{id}")).await;
    assert_eq!(body["data"]["status"], "ARCHIVED");
    assert_eq!(body["data"]["isActive"], false);
    assert_eq!(body["data"]["title"], "Credential AR-1");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/credentials/{id}"),
        Some(json!({ "isActive": false, "title": "Retired" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["title"], "Retired");
}

#[tokio::test]
async fn recognition_of_archived_credential_stays_editable() {
    let app = test_app();
    let provider = create_institution(&app, "PROV-A").await;
    let recognizer = create_institution(&app, "RECO-A").await;
    let credential = create_credential(&app, &provider, "RA-1").await;
    let draft = create_credential(&app, &provider, "RA-2").await;
    publish(&app, &credential).await;

    let (status, body) = post(
        &app,
        "/api/recognitions",
        json!({
            "microCredentialId": credential,
            "recognizingInstitutionId": recognizer,
            "recognitionType": "FULL_CREDIT",
            "transcriptMethod": "PASS_FAIL"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let recognition = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/credentials/{credential}/archive"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/recognitions/{recognition}"),
        Some(json!({
            "microCredentialId": credential,
            "recognizingInstitutionId": recognizer,
            "notes": "x"
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["notes"], "x");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/recognitions/{recognition}"),
        Some(json!({ "microCredentialId": draft })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "PRECONDITION_FAILED");
}

#[tokio::test]
async fn referenced_records_cannot_be_deleted() {
    let app = test_app();
    let provider = create_institution(&app, "DEL-P").await;
    let recognizer = create_institution(&app, "DEL-R").await;
    let credential = create_credential(&app, &provider, "DEL-1").await;
    publish(&app, &credential).await;
    let (status, body) = post(
        &app,
        "/api/recognitions",
        json!({
            "microCredentialId": credential,
            "recognizingInstitutionId": recognizer,
            "recognitionType": "EXEMPTION",
            "transcriptMethod": "NOTATION"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let recognition = body["data"]["id"].as_str().unwrap().to_string();

    for uri in [
        format!("/api/institutions/{provider}"),
        format!("/api/institutions/{recognizer}"),
        format!("/api/credentials/{credential}"),
    ] {
        let (status, _) = send(&app, Method::DELETE, &uri, None, None).await;
        assert_eq!(status, StatusCode::CONFLICT, "{uri}");
    }

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/recognitions/{recognition}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/credentials/{credential}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/institutions/{provider}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = get(&app, &format!("/api/institutions/{provider}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_deletes_remove_once() {
    let app = test_app();
    let provider = create_institution(&app, "DEL-C").await;
    let credential = create_credential(&app, &provider, "DEL-C1").await;
    let uri = format!("/api/credentials/{credential}");

    let (first, second) = tokio::join!(
        send(&app, Method::DELETE, &uri, None, None),
        send(&app, Method::DELETE, &uri, None, None),
    );
    let mut statuses = vec![first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::NO_CONTENT, StatusCode::NOT_FOUND]);

    let uri = format!("/api/institutions/{provider}");
    let (first, second) = tokio::join!(
        send(&app, Method::DELETE, &uri, None, None),
        send(&app, Method::DELETE, &uri, None, None),
    );
    let mut statuses = vec![first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::NO_CONTENT, StatusCode::NOT_FOUND]);
}

// -- Pathways -----------------------------------------------------------------

#[tokio::test]
async fn pathway_approval_workflow() {
    let app = test_app();
    let source = create_institution(&app, "SRC").await;
    let target = create_institution(&app, "TGT").await;
    let credential = create_credential(&app, &source, "PW-1").await;

    let (status, body) = post(
        &app,
        "/api/pathways",
        json!({
            "name": "Badge to degree",
            "sourceInstitutionId": source,
            "targetInstitutionId": target,
            "microCredentialId": credential,
            "pathwayType": "ARTICULATION",
            "creditsTransferred": 5.0
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "DRAFT");
    assert_eq!(body["data"]["sourceInstitution"]["code"], "SRC");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/pathways/{id}/activate"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "CONFLICT");

    for (action, expected) in [
        ("submit", "UNDER_REVIEW"),
        ("approve", "APPROVED"),
        ("activate", "ACTIVE"),
        ("suspend", "SUSPENDED"),
        ("archive", "ARCHIVED"),
    ] {
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/pathways/{id}/{action}"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{action}: {body}");
        assert_eq!(body["data"]["status"], expected, "{action}");
    }

    let (_, body) = get(&app, &format!("/api/pathways/{id}")).await;
    assert!(body["data"]["approvedAt"].is_string());

    let (_, body) = get(&app, "/api/pathways?status=ARCHIVED").await;
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn pathway_endpoints_must_differ() {
    let app = test_app();
    let source = create_institution(&app, "SAME").await;
    let credential = create_credential(&app, &source, "SM-1").await;

    let (status, body) = post(
        &app,
        "/api/pathways",
        json!({
            "name": "Loop",
            "sourceInstitutionId": source,
            "targetInstitutionId": source,
            "microCredentialId": credential,
            "pathwayType": "TRANSFER"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "targetInstitutionId");
}

// -- Listing ------------------------------------------------------------------

#[tokio::test]
async fn pagination_partitions_results() {
    let app = test_app();
    let institution_id = create_institution(&app, "PAGE").await;
    for n in 0..5 {
        create_credential(&app, &institution_id, &format!("PG-{n}")).await;
    }

    let mut seen = Vec::new();
    for page in 1..=3 {
        let (status, body) = get(
            &app,
            &format!("/api/credentials?page={page}&limit=2&sortBy=programCode&sortOrder=asc"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["total"], 5);
        assert_eq!(body["pagination"]["totalPages"], 3);
        for item in body["data"].as_array().unwrap() {
            seen.push(item["programCode"].as_str().unwrap().to_string());
        }
    }
    assert_eq!(seen, vec!["PG-0", "PG-1", "PG-2", "PG-3", "PG-4"]);

    let (_, body) = get(&app, "/api/credentials?search=credential%20pg-3").await;
    assert_eq!(body["pagination"]["total"], 1);

    let (status, body) = get(&app, "/api/credentials?limit=1000").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "limit");
}

// -- Authentication -----------------------------------------------------------

#[tokio::test]
async fn writes_require_authentication_and_role() {
    let app = test_app_with_auth();
    let body = json!({"name": "Gated", "code": "GATE", "institutionType": "COLLEGE"});

    // Anonymous write.
    let (status, _) = send(&app, Method::POST, "/api/institutions", Some(body.clone()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Wrong secret.
    let (status, body_json) = send(
        &app,
        Method::POST,
        "/api/institutions",
        Some(body.clone()),
        Some("Bearer ADMIN::wrong"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body_json["code"], "UNAUTHORIZED");

    // Insufficient role.
    let coordinator = bearer("PROGRAM_COORDINATOR");
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/institutions",
        Some(body.clone()),
        Some(&coordinator),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = bearer("ADMIN");
    let (status, _) = send(&app, Method::POST, "/api/institutions", Some(body), Some(&admin)).await;
    assert_eq!(status, StatusCode::CREATED);

    // Reads stay public.
    let (status, body) = get(&app, "/api/institutions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn coordinator_submits_but_cannot_publish() {
    let app = test_app_with_auth();
    let admin = bearer("ADMIN");
    let coordinator = bearer("PROGRAM_COORDINATOR");

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/institutions",
        Some(json!({"name": "Roles", "code": "ROLE", "institutionType": "UNIVERSITY"})),
        Some(&admin),
    )
    .await;
    let institution_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/credentials",
        Some(json!({
            "title": "Role-gated",
            "programCode": "RG-9",
            "institutionId": institution_id,
            "credentialType": "SHORT_COURSE",
            "deliveryMode": "SELF_PACED",
            "level": "ADVANCED"
        })),
        Some(&coordinator),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/credentials/{id}/submit"),
        None,
        Some(&coordinator),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/credentials/{id}/publish"),
        None,
        Some(&coordinator),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let institution_admin = bearer("INSTITUTION_ADMIN");
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/credentials/{id}/publish"),
        None,
        Some(&institution_admin),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
