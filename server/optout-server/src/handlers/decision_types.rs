use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use database_layer::DecisionType;
use uuid::Uuid;

use super::require_admin;
use crate::error::{api_success, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::server::OptOutServer;
use crate::services::DecisionTypeRequest;
use crate::types::PaginationParams;

#[utoipa::path(
    get,
    path = "/api/decisiontypes",
    params(PaginationParams),
    responses(
        (status = 200, description = "Decision types retrieved successfully", body = Vec<DecisionType>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator role required")
    ),
    tag = "decision-types",
    security(("bearer_auth" = []))
)]
pub async fn list_decision_types(
    State(server): State<OptOutServer>,
    Query(pagination): Query<PaginationParams>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<DecisionType>>>, ApiError> {
    require_admin(&server, &auth)?;
    let page = server.decision_types.list_decision_types(pagination.to_page_request()).await?;
    Ok(Json(pagination.wrap_response(page)))
}

#[utoipa::path(
    get,
    path = "/api/decisiontypes/{id}",
    params(("id" = Uuid, Path, description = "Decision type ID")),
    responses(
        (status = 200, description = "Decision type retrieved successfully", body = DecisionType),
        (status = 404, description = "Decision type not found")
    ),
    tag = "decision-types",
    security(("bearer_auth" = []))
)]
pub async fn get_decision_type(
    State(server): State<OptOutServer>,
    Path(id): Path<Uuid>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<DecisionType>>, ApiError> {
    require_admin(&server, &auth)?;
    let decision_type = server.decision_types.retrieve_decision_type(id).await?;
    Ok(Json(api_success(decision_type)))
}

#[utoipa::path(
    post,
    path = "/api/decisiontypes",
    request_body = DecisionTypeRequest,
    responses(
        (status = 201, description = "Decision type created successfully", body = DecisionType),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Name already in use")
    ),
    tag = "decision-types",
    security(("bearer_auth" = []))
)]
pub async fn create_decision_type(
    State(server): State<OptOutServer>,
    auth: AuthContext,
    Json(req): Json<DecisionTypeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DecisionType>>), ApiError> {
    require_admin(&server, &auth)?;
    let decision_type = server.decision_types.add_decision_type(req, &auth.subject).await?;
    Ok((StatusCode::CREATED, Json(api_success(decision_type))))
}

#[utoipa::path(
    put,
    path = "/api/decisiontypes/{id}",
    params(("id" = Uuid, Path, description = "Decision type ID")),
    request_body = DecisionTypeRequest,
    responses(
        (status = 200, description = "Decision type updated successfully", body = DecisionType),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Decision type not found")
    ),
    tag = "decision-types",
    security(("bearer_auth" = []))
)]
pub async fn update_decision_type(
    State(server): State<OptOutServer>,
    Path(id): Path<Uuid>,
    auth: AuthContext,
    Json(req): Json<DecisionTypeRequest>,
) -> Result<Json<ApiResponse<DecisionType>>, ApiError> {
    require_admin(&server, &auth)?;
    let decision_type = server.decision_types.modify_decision_type(id, req, &auth.subject).await?;
    Ok(Json(api_success(decision_type)))
}

#[utoipa::path(
    delete,
    path = "/api/decisiontypes/{id}",
    params(("id" = Uuid, Path, description = "Decision type ID")),
    responses(
        (status = 200, description = "Decision type deleted", body = DecisionType),
        (status = 400, description = "Decision type is still used by decisions"),
        (status = 404, description = "Decision type not found")
    ),
    tag = "decision-types",
    security(("bearer_auth" = []))
)]
pub async fn delete_decision_type(
    State(server): State<OptOutServer>,
    Path(id): Path<Uuid>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<DecisionType>>, ApiError> {
    require_admin(&server, &auth)?;
    let decision_type = server.decision_types.remove_decision_type(id, &auth.subject).await?;
    Ok(Json(api_success(decision_type)))
}
