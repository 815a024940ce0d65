//! FhirPdsBroker against a local stand-in for the PDS API

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::NaiveDate;
use pds_service::{FhirPdsBroker, PatientSearchCriteria, PdsBroker, PdsError};
use std::collections::HashMap;
use std::time::Duration;

const PATIENT: &str = include_str!("fixtures/patient_9000000009.json");

async fn read_patient(Path(nhs_number): Path<String>, headers: HeaderMap) -> impl IntoResponse {
    if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some("test-key") {
        return (StatusCode::UNAUTHORIZED, String::new());
    }
    match nhs_number.as_str() {
        "9000000009" => (StatusCode::OK, PATIENT.to_string()),
        "9999999999" => (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()),
        _ => (StatusCode::NOT_FOUND, String::new()),
    }
}

async fn search(Query(params): Query<HashMap<String, String>>) -> String {
    let hit = params.get("family").map(String::as_str) == Some("Smith")
        && params.get("birthdate").map(String::as_str) == Some("eq2010-10-22");
    let entries = if hit {
        format!(r#"[{{"resource": {PATIENT}}}]"#)
    } else {
        "[]".to_string()
    };
    format!(r#"{{"resourceType": "Bundle", "type": "searchset", "entry": {entries}}}"#)
}

async fn spawn_pds() -> String {
    let app = Router::new()
        .route("/Patient/:nhs_number", get(read_patient))
        .route("/Patient", get(search));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

fn broker(base_url: &str) -> FhirPdsBroker {
    FhirPdsBroker::new(base_url, Some("test-key".to_string()), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_get_patient_maps_record() {
    let base_url = spawn_pds().await;
    let patient = broker(&base_url)
        .get_patient("9000000009")
        .await
        .unwrap()
        .expect("patient present");

    assert_eq!(patient.surname, "Smith");
    assert_eq!(patient.post_code.as_deref(), Some("LS1 6AE"));
}

#[tokio::test]
async fn test_unknown_patient_is_none() {
    let base_url = spawn_pds().await;
    let patient = broker(&base_url).get_patient("9434765919").await.unwrap();
    assert!(patient.is_none());
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let base_url = spawn_pds().await;
    let result = broker(&base_url).get_patient("9999999999").await;
    match result {
        Err(error @ PdsError::UnexpectedStatus { status: 500, .. }) => {
            assert!(error.is_unavailable());
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_search_sends_fhir_parameters() {
    let base_url = spawn_pds().await;
    let criteria = PatientSearchCriteria {
        surname: "Smith".to_string(),
        given_name: None,
        date_of_birth: NaiveDate::from_ymd_opt(2010, 10, 22).unwrap(),
        post_code: None,
    };

    let found = broker(&base_url).search_patients(&criteria).await.unwrap();
    assert_eq!(found.len(), 1);

    let miss = PatientSearchCriteria {
        surname: "Jones".to_string(),
        ..criteria
    };
    assert!(broker(&base_url).search_patients(&miss).await.unwrap().is_empty());
}
