use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use database_layer::ConsumerAdoption;
use uuid::Uuid;

use super::require_admin;
use crate::error::{api_success, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::server::OptOutServer;
use crate::services::ConsumerAdoptionRequest;
use crate::types::PaginationParams;

#[utoipa::path(
    get,
    path = "/api/consumeradoptions",
    params(PaginationParams),
    responses(
        (status = 200, description = "Consumer adoptions retrieved successfully", body = Vec<ConsumerAdoption>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator role required")
    ),
    tag = "consumer-adoptions",
    security(("bearer_auth" = []))
)]
pub async fn list_consumer_adoptions(
    State(server): State<OptOutServer>,
    Query(pagination): Query<PaginationParams>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<ConsumerAdoption>>>, ApiError> {
    require_admin(&server, &auth)?;
    let page = server.adoptions.list_adoptions(pagination.to_page_request()).await?;
    Ok(Json(pagination.wrap_response(page)))
}

#[utoipa::path(
    get,
    path = "/api/consumeradoptions/{id}",
    params(("id" = Uuid, Path, description = "Consumer adoption ID")),
    responses(
        (status = 200, description = "Consumer adoption retrieved successfully", body = ConsumerAdoption),
        (status = 404, description = "Consumer adoption not found")
    ),
    tag = "consumer-adoptions",
    security(("bearer_auth" = []))
)]
pub async fn get_consumer_adoption(
    State(server): State<OptOutServer>,
    Path(id): Path<Uuid>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<ConsumerAdoption>>, ApiError> {
    require_admin(&server, &auth)?;
    let consumer_adoption = server.adoptions.retrieve_adoption(id).await?;
    Ok(Json(api_success(consumer_adoption)))
}

#[utoipa::path(
    post,
    path = "/api/consumeradoptions",
    request_body = ConsumerAdoptionRequest,
    responses(
        (status = 201, description = "Consumer adoption created successfully", body = ConsumerAdoption),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Decision already adopted by this consumer")
    ),
    tag = "consumer-adoptions",
    security(("bearer_auth" = []))
)]
pub async fn create_consumer_adoption(
    State(server): State<OptOutServer>,
    auth: AuthContext,
    Json(req): Json<ConsumerAdoptionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ConsumerAdoption>>), ApiError> {
    require_admin(&server, &auth)?;
    let consumer_adoption = server.adoptions.add_adoption(req, &auth.subject).await?;
    Ok((StatusCode::CREATED, Json(api_success(consumer_adoption))))
}

#[utoipa::path(
    put,
    path = "/api/consumeradoptions/{id}",
    params(("id" = Uuid, Path, description = "Consumer adoption ID")),
    request_body = ConsumerAdoptionRequest,
    responses(
        (status = 200, description = "Consumer adoption updated successfully", body = ConsumerAdoption),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Consumer adoption not found")
    ),
    tag = "consumer-adoptions",
    security(("bearer_auth" = []))
)]
pub async fn update_consumer_adoption(
    State(server): State<OptOutServer>,
    Path(id): Path<Uuid>,
    auth: AuthContext,
    Json(req): Json<ConsumerAdoptionRequest>,
) -> Result<Json<ApiResponse<ConsumerAdoption>>, ApiError> {
    require_admin(&server, &auth)?;
    let consumer_adoption = server.adoptions.modify_adoption(id, req, &auth.subject).await?;
    Ok(Json(api_success(consumer_adoption)))
}

#[utoipa::path(
    delete,
    path = "/api/consumeradoptions/{id}",
    params(("id" = Uuid, Path, description = "Consumer adoption ID")),
    responses(
        (status = 200, description = "Consumer adoption deleted", body = ConsumerAdoption),
        (status = 404, description = "Consumer adoption not found")
    ),
    tag = "consumer-adoptions",
    security(("bearer_auth" = []))
)]
pub async fn delete_consumer_adoption(
    State(server): State<OptOutServer>,
    Path(id): Path<Uuid>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<ConsumerAdoption>>, ApiError> {
    require_admin(&server, &auth)?;
    let consumer_adoption = server.adoptions.remove_adoption(id, &auth.subject).await?;
    Ok(Json(api_success(consumer_adoption)))
}
