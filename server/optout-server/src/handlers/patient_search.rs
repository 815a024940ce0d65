use axum::{extract::State, Json};

use crate::error::{api_success, ApiError, ApiResponse};
use crate::redaction::RedactedPatient;
use crate::server::OptOutServer;
use crate::services::{DetailsSearchRequest, NhsNumberSearchRequest};

/// Find a patient by NHS number. The record comes back redacted.
#[utoipa::path(
    post,
    path = "/api/patientsearch/nhsnumber",
    request_body = NhsNumberSearchRequest,
    responses(
        (status = 200, description = "Redacted patient record", body = RedactedPatient),
        (status = 400, description = "Invalid NHS number"),
        (status = 404, description = "No patient with this NHS number"),
        (status = 502, description = "PDS failure")
    ),
    tag = "patient-search"
)]
pub async fn search_by_nhs_number(
    State(server): State<OptOutServer>,
    Json(req): Json<NhsNumberSearchRequest>,
) -> Result<Json<ApiResponse<RedactedPatient>>, ApiError> {
    let patient = server.patient_search.search_by_nhs_number(req).await?;
    Ok(Json(api_success(patient)))
}

/// Find a patient by demographic details. Exactly one match is required.
#[utoipa::path(
    post,
    path = "/api/patientsearch/details",
    request_body = DetailsSearchRequest,
    responses(
        (status = 200, description = "Redacted patient record", body = RedactedPatient),
        (status = 400, description = "Missing surname or a future date of birth"),
        (status = 404, description = "No matching patient"),
        (status = 422, description = "More than one patient matches"),
        (status = 502, description = "PDS failure")
    ),
    tag = "patient-search"
)]
pub async fn search_by_details(
    State(server): State<OptOutServer>,
    Json(req): Json<DetailsSearchRequest>,
) -> Result<Json<ApiResponse<RedactedPatient>>, ApiError> {
    let patient = server.patient_search.search_by_details(req).await?;
    Ok(Json(api_success(patient)))
}
