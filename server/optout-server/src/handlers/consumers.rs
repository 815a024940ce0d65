use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use database_layer::Consumer;
use uuid::Uuid;

use super::require_admin;
use crate::error::{api_success, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::server::OptOutServer;
use crate::services::ConsumerRequest;
use crate::types::PaginationParams;

#[utoipa::path(
    get,
    path = "/api/consumers",
    params(PaginationParams),
    responses(
        (status = 200, description = "Consumers retrieved successfully", body = Vec<Consumer>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator role required")
    ),
    tag = "consumers",
    security(("bearer_auth" = []))
)]
pub async fn list_consumers(
    State(server): State<OptOutServer>,
    Query(pagination): Query<PaginationParams>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Consumer>>>, ApiError> {
    require_admin(&server, &auth)?;
    let page = server.consumers.list_consumers(pagination.to_page_request()).await?;
    Ok(Json(pagination.wrap_response(page)))
}

#[utoipa::path(
    get,
    path = "/api/consumers/{id}",
    params(("id" = Uuid, Path, description = "Consumer ID")),
    responses(
        (status = 200, description = "Consumer retrieved successfully", body = Consumer),
        (status = 404, description = "Consumer not found")
    ),
    tag = "consumers",
    security(("bearer_auth" = []))
)]
pub async fn get_consumer(
    State(server): State<OptOutServer>,
    Path(id): Path<Uuid>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Consumer>>, ApiError> {
    require_admin(&server, &auth)?;
    let consumer = server.consumers.retrieve_consumer(id).await?;
    Ok(Json(api_success(consumer)))
}

#[utoipa::path(
    post,
    path = "/api/consumers",
    request_body = ConsumerRequest,
    responses(
        (status = 201, description = "Consumer created successfully", body = Consumer),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Name or client id already registered")
    ),
    tag = "consumers",
    security(("bearer_auth" = []))
)]
pub async fn create_consumer(
    State(server): State<OptOutServer>,
    auth: AuthContext,
    Json(req): Json<ConsumerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Consumer>>), ApiError> {
    require_admin(&server, &auth)?;
    let consumer = server.consumers.add_consumer(req, &auth.subject).await?;
    Ok((StatusCode::CREATED, Json(api_success(consumer))))
}

#[utoipa::path(
    put,
    path = "/api/consumers/{id}",
    params(("id" = Uuid, Path, description = "Consumer ID")),
    request_body = ConsumerRequest,
    responses(
        (status = 200, description = "Consumer updated successfully", body = Consumer),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Consumer not found")
    ),
    tag = "consumers",
    security(("bearer_auth" = []))
)]
pub async fn update_consumer(
    State(server): State<OptOutServer>,
    Path(id): Path<Uuid>,
    auth: AuthContext,
    Json(req): Json<ConsumerRequest>,
) -> Result<Json<ApiResponse<Consumer>>, ApiError> {
    require_admin(&server, &auth)?;
    let consumer = server.consumers.modify_consumer(id, req, &auth.subject).await?;
    Ok(Json(api_success(consumer)))
}

#[utoipa::path(
    delete,
    path = "/api/consumers/{id}",
    params(("id" = Uuid, Path, description = "Consumer ID")),
    responses(
        (status = 200, description = "Consumer deleted", body = Consumer),
        (status = 400, description = "Consumer still has adoptions"),
        (status = 404, description = "Consumer not found")
    ),
    tag = "consumers",
    security(("bearer_auth" = []))
)]
pub async fn delete_consumer(
    State(server): State<OptOutServer>,
    Path(id): Path<Uuid>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Consumer>>, ApiError> {
    require_admin(&server, &auth)?;
    let consumer = server.consumers.remove_consumer(id, &auth.subject).await?;
    Ok(Json(api_success(consumer)))
}
