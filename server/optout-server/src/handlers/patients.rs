use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use database_layer::Patient;
use uuid::Uuid;

use super::require_admin;
use crate::error::{api_success, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::server::OptOutServer;
use crate::services::PatientRequest;
use crate::types::PaginationParams;

#[utoipa::path(
    get,
    path = "/api/patients",
    params(PaginationParams),
    responses(
        (status = 200, description = "Patients retrieved successfully", body = Vec<Patient>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator role required")
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn list_patients(
    State(server): State<OptOutServer>,
    Query(pagination): Query<PaginationParams>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Patient>>>, ApiError> {
    require_admin(&server, &auth)?;
    let page = server.patients.list_patients(pagination.to_page_request()).await?;
    Ok(Json(pagination.wrap_response(page)))
}

#[utoipa::path(
    get,
    path = "/api/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Patient retrieved successfully", body = Patient),
        (status = 404, description = "Patient not found")
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn get_patient(
    State(server): State<OptOutServer>,
    Path(id): Path<Uuid>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Patient>>, ApiError> {
    require_admin(&server, &auth)?;
    let patient = server.patients.retrieve_patient(id).await?;
    Ok(Json(api_success(patient)))
}

#[utoipa::path(
    post,
    path = "/api/patients",
    request_body = PatientRequest,
    responses(
        (status = 201, description = "Patient created successfully", body = Patient),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "NHS number already registered")
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn create_patient(
    State(server): State<OptOutServer>,
    auth: AuthContext,
    Json(req): Json<PatientRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Patient>>), ApiError> {
    require_admin(&server, &auth)?;
    let patient = server.patients.add_patient(req, &auth.subject).await?;
    Ok((StatusCode::CREATED, Json(api_success(patient))))
}

#[utoipa::path(
    put,
    path = "/api/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient ID")),
    request_body = PatientRequest,
    responses(
        (status = 200, description = "Patient updated successfully", body = Patient),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Patient not found")
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn update_patient(
    State(server): State<OptOutServer>,
    Path(id): Path<Uuid>,
    auth: AuthContext,
    Json(req): Json<PatientRequest>,
) -> Result<Json<ApiResponse<Patient>>, ApiError> {
    require_admin(&server, &auth)?;
    let patient = server.patients.modify_patient(id, req, &auth.subject).await?;
    Ok(Json(api_success(patient)))
}

#[utoipa::path(
    delete,
    path = "/api/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Patient deleted", body = Patient),
        (status = 400, description = "Patient still has decisions"),
        (status = 404, description = "Patient not found")
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn delete_patient(
    State(server): State<OptOutServer>,
    Path(id): Path<Uuid>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Patient>>, ApiError> {
    require_admin(&server, &auth)?;
    let patient = server.patients.remove_patient(id, &auth.subject).await?;
    Ok(Json(api_success(patient)))
}
