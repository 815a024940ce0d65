use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use database_layer::Decision;
use uuid::Uuid;

use super::require_admin;
use crate::error::{api_success, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::server::OptOutServer;
use crate::services::{DecisionRequest, VerifiedDecisionRequest};
use crate::types::PaginationParams;

#[utoipa::path(
    get,
    path = "/api/decisions",
    params(PaginationParams),
    responses(
        (status = 200, description = "Decisions retrieved successfully", body = Vec<Decision>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator role required")
    ),
    tag = "decisions",
    security(("bearer_auth" = []))
)]
pub async fn list_decisions(
    State(server): State<OptOutServer>,
    Query(pagination): Query<PaginationParams>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Decision>>>, ApiError> {
    require_admin(&server, &auth)?;
    let page = server.decisions.list_decisions(pagination.to_page_request()).await?;
    Ok(Json(pagination.wrap_response(page)))
}

#[utoipa::path(
    get,
    path = "/api/decisions/{id}",
    params(("id" = Uuid, Path, description = "Decision ID")),
    responses(
        (status = 200, description = "Decision retrieved successfully", body = Decision),
        (status = 404, description = "Decision not found")
    ),
    tag = "decisions",
    security(("bearer_auth" = []))
)]
pub async fn get_decision(
    State(server): State<OptOutServer>,
    Path(id): Path<Uuid>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Decision>>, ApiError> {
    require_admin(&server, &auth)?;
    let decision = server.decisions.retrieve_decision(id).await?;
    Ok(Json(api_success(decision)))
}

#[utoipa::path(
    post,
    path = "/api/decisions",
    request_body = DecisionRequest,
    responses(
        (status = 201, description = "Decision created successfully", body = Decision),
        (status = 400, description = "Invalid request, or unknown patient or decision type")
    ),
    tag = "decisions",
    security(("bearer_auth" = []))
)]
pub async fn create_decision(
    State(server): State<OptOutServer>,
    auth: AuthContext,
    Json(req): Json<DecisionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Decision>>), ApiError> {
    require_admin(&server, &auth)?;
    let decision = server.decisions.add_decision(req, &auth.subject).await?;
    Ok((StatusCode::CREATED, Json(api_success(decision))))
}

#[utoipa::path(
    put,
    path = "/api/decisions/{id}",
    params(("id" = Uuid, Path, description = "Decision ID")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Decision updated successfully", body = Decision),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Decision not found")
    ),
    tag = "decisions",
    security(("bearer_auth" = []))
)]
pub async fn update_decision(
    State(server): State<OptOutServer>,
    Path(id): Path<Uuid>,
    auth: AuthContext,
    Json(req): Json<DecisionRequest>,
) -> Result<Json<ApiResponse<Decision>>, ApiError> {
    require_admin(&server, &auth)?;
    let decision = server.decisions.modify_decision(id, req, &auth.subject).await?;
    Ok(Json(api_success(decision)))
}

#[utoipa::path(
    delete,
    path = "/api/decisions/{id}",
    params(("id" = Uuid, Path, description = "Decision ID")),
    responses(
        (status = 200, description = "Decision deleted", body = Decision),
        (status = 400, description = "Decision has been adopted by a consumer"),
        (status = 404, description = "Decision not found")
    ),
    tag = "decisions",
    security(("bearer_auth" = []))
)]
pub async fn delete_decision(
    State(server): State<OptOutServer>,
    Path(id): Path<Uuid>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Decision>>, ApiError> {
    require_admin(&server, &auth)?;
    let decision = server.decisions.remove_decision(id, &auth.subject).await?;
    Ok(Json(api_success(decision)))
}

/// Record a citizen's decision after their validation code was verified.
/// The verification is used up.
#[utoipa::path(
    post,
    path = "/api/decisions/verified",
    request_body = VerifiedDecisionRequest,
    responses(
        (status = 201, description = "Decision recorded", body = Decision),
        (status = 400, description = "Invalid request or unknown decision type"),
        (status = 403, description = "Validation code not verified")
    ),
    tag = "decisions"
)]
pub async fn create_verified_decision(
    State(server): State<OptOutServer>,
    Json(req): Json<VerifiedDecisionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Decision>>), ApiError> {
    let decision = server.verified_decisions.record_decision(req).await?;
    Ok((StatusCode::CREATED, Json(api_success(decision))))
}
