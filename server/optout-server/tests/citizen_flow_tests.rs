mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use database_layer::{DecisionType, DecisionTypeStore, PatientStore};
use serde_json::json;
use uuid::Uuid;

use common::{TestApp, JANE, JOHN, NO_CONTACT};

async fn seed_decision_type(app: &TestApp) -> Uuid {
    let now = Utc::now();
    let decision_type = DecisionType {
        id: Uuid::new_v4(),
        name: "Opt-Out".to_string(),
        created_by: "seed".to_string(),
        created_date: now,
        updated_by: "seed".to_string(),
        updated_date: now,
    };
    app.storage.create_decision_type(&decision_type).await.unwrap();
    decision_type.id
}

async fn request_code(app: &TestApp, nhs_number: &str, force: bool) -> (StatusCode, serde_json::Value) {
    app.post(
        "/api/patientcode/request",
        json!({
            "nhs_number": nhs_number,
            "notification_preference": "email",
            "generate_new_code": force
        }),
    )
    .await
}

async fn verify(app: &TestApp, code: &str) -> (StatusCode, serde_json::Value) {
    app.post(
        "/api/patientcode/verify",
        json!({ "nhs_number": JANE, "validation_code": code }),
    )
    .await
}

#[tokio::test]
async fn test_search_by_nhs_number_returns_redacted_record() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/api/patientsearch/nhsnumber", json!({ "nhs_number": "943 476 5919" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let patient = &body["data"];
    assert_eq!(patient["nhs_number"], JANE);
    assert_eq!(patient["given_name"], "J***");
    assert_eq!(patient["surname"], "S****");
    assert_eq!(patient["address"], "123 H*** S*****, L****");
    assert_eq!(patient["post_code"], "LS1 4**");
    assert_eq!(patient["phone"], "07*******23");
    assert_eq!(patient["email"], "j***.s****@example.com");
}

#[tokio::test]
async fn test_search_rejects_bad_nhs_number_and_reports_misses() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/api/patientsearch/nhsnumber", json!({ "nhs_number": "9434765918" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["nhs_number"].is_array());

    let (status, _) = app
        .post("/api/patientsearch/nhsnumber", json!({ "nhs_number": "1000000060" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_details_search_needs_a_single_match() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/api/patientsearch/details",
            json!({ "surname": "SMITH", "given_name": "john", "date_of_birth": "1980-01-02" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nhs_number"], JOHN);

    let (status, _) = app
        .post(
            "/api/patientsearch/details",
            json!({ "surname": "Smith", "date_of_birth": "1980-01-02" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .post(
            "/api/patientsearch/details",
            json!({ "surname": "Jones", "date_of_birth": "1980-01-02" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_code_request_never_returns_the_code() {
    let app = TestApp::new();

    let (status, body) = request_code(&app, JANE, false).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["data"]["notification_preference"], "email");

    let receipt = body["data"].as_object().unwrap();
    assert!(receipt.keys().all(|k| k == "notification_preference" || k == "expires_on"));
    assert_eq!(app.sent.lock().len(), 1);

    let code = app.last_code();

    let stored = app.storage.find_patient_by_nhs_number(JANE).await.unwrap().unwrap();
    assert_eq!(stored.validation_code.as_deref(), Some(code.as_str()));
    assert_eq!(stored.retry_count, 0);
}

#[tokio::test]
async fn test_live_code_is_not_reissued_unless_forced() {
    let app = TestApp::new();
    request_code(&app, JANE, false).await;
    let first = app.last_code();

    let (status, body) = request_code(&app, JANE, false).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_code"], "VERIFY_5007");
    assert_eq!(app.sent.lock().len(), 1);

    let (status, _) = request_code(&app, JANE, true).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(app.sent.lock().len(), 2);

    // The replaced code no longer verifies unless it happens to repeat
    let second = app.last_code();
    if first != second {
        let (status, _) = verify(&app, &first).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_email_preference_without_email_is_rejected() {
    let app = TestApp::new();

    let (status, body) = request_code(&app, NO_CONTACT, false).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["notification_preference"].is_array());
    assert!(app.sent.lock().is_empty());
}

#[tokio::test]
async fn test_valid_code_verifies_exactly_once() {
    let app = TestApp::new();
    request_code(&app, JANE, false).await;
    let code = app.last_code();

    let (status, body) = verify(&app, &code.to_lowercase()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["verified"], true);

    let (status, body) = verify(&app, &code).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_code"], "VERIFY_5005");
}

#[tokio::test]
async fn test_failed_attempts_lock_verification() {
    let app = TestApp::new();
    request_code(&app, JANE, false).await;
    let code = app.last_code();
    let wrong = if code == "ZZZZZ" { "YYYYY" } else { "ZZZZZ" };

    for attempt in 1..=3 {
        let (status, body) = verify(&app, wrong).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "attempt {attempt}");
        assert!(body["field_errors"]["validation_code"].is_array());
        let stored = app.storage.find_patient_by_nhs_number(JANE).await.unwrap().unwrap();
        assert_eq!(stored.retry_count, attempt);
    }

    // Even the right code is refused once locked, and the counter stays put
    let (status, body) = verify(&app, &code).await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["error_code"], "VERIFY_5004");
    let stored = app.storage.find_patient_by_nhs_number(JANE).await.unwrap().unwrap();
    assert_eq!(stored.retry_count, 3);

    // A new code unlocks verification
    let (status, _) = request_code(&app, JANE, false).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let (status, _) = verify(&app, &app.last_code()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_code_is_gone() {
    let app = TestApp::new();
    request_code(&app, JANE, false).await;
    let code = app.last_code();

    app.clock.advance(Duration::minutes(1441));

    let (status, body) = verify(&app, &code).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error_code"], "VERIFY_5003");
}

#[tokio::test]
async fn test_verify_without_request_reports_no_code() {
    let app = TestApp::new();

    let (status, body) = verify(&app, "ABCDE").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VERIFY_5001");
}

#[tokio::test]
async fn test_verified_decision_consumes_verification() {
    let app = TestApp::new();
    let decision_type_id = seed_decision_type(&app).await;

    let decision = json!({
        "nhs_number": JANE,
        "decision_type_id": decision_type_id,
        "decision_choice": "Opt-Out"
    });

    let (status, _) = app.post("/api/decisions/verified", decision.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    request_code(&app, JANE, false).await;
    let (status, _) = app.post("/api/decisions/verified", decision.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    verify(&app, &app.last_code()).await;
    let (status, body) = app.post("/api/decisions/verified", decision.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["decision_type_id"], decision_type_id.to_string());
    assert_eq!(body["data"]["created_by"], "citizen");

    let (status, body) = app.post("/api/decisions/verified", decision).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error_code"], "VERIFY_5006");
}
