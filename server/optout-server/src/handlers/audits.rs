use axum::{
    extract::{Path, Query, State},
    Json,
};
use database_layer::Audit;
use uuid::Uuid;

use super::require_admin;
use crate::error::{api_success, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::server::OptOutServer;
use crate::types::PaginationParams;

/// Audit trail, newest first. Read-only.
#[utoipa::path(
    get,
    path = "/api/audits",
    params(PaginationParams),
    responses(
        (status = 200, description = "Audit entries retrieved successfully", body = Vec<Audit>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator role required")
    ),
    tag = "audits",
    security(("bearer_auth" = []))
)]
pub async fn list_audits(
    State(server): State<OptOutServer>,
    Query(pagination): Query<PaginationParams>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Audit>>>, ApiError> {
    require_admin(&server, &auth)?;
    let page = server.audits.list_audits(pagination.to_page_request()).await?;
    Ok(Json(pagination.wrap_response(page)))
}

#[utoipa::path(
    get,
    path = "/api/audits/{id}",
    params(("id" = Uuid, Path, description = "Audit ID")),
    responses(
        (status = 200, description = "Audit entry retrieved successfully", body = Audit),
        (status = 404, description = "Audit entry not found")
    ),
    tag = "audits",
    security(("bearer_auth" = []))
)]
pub async fn get_audit(
    State(server): State<OptOutServer>,
    Path(id): Path<Uuid>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Audit>>, ApiError> {
    require_admin(&server, &auth)?;
    let audit = server.audits.retrieve_audit(id).await?;
    Ok(Json(api_success(audit)))
}
