use axum::{extract::State, Json};
use database_layer::PendingDecision;

use crate::error::{api_success, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::server::OptOutServer;
use crate::services::{AdoptDecisionsRequest, AdoptionSummary};

/// Decisions the calling consumer has not adopted yet.
#[utoipa::path(
    get,
    path = "/api/consumerdecisions",
    responses(
        (status = 200, description = "Pending decisions", body = Vec<PendingDecision>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not an active registered consumer")
    ),
    tag = "consumer-decisions",
    security(("bearer_auth" = []))
)]
pub async fn list_pending_decisions(
    State(server): State<OptOutServer>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<PendingDecision>>>, ApiError> {
    let consumer = server.consumer_decisions.authorize(&auth).await?;
    let pending = server.consumer_decisions.pending_decisions(&consumer).await?;
    tracing::debug!(consumer_id = %consumer.id, count = pending.len(), "Pending decisions listed");
    Ok(Json(api_success(pending)))
}

/// Mark decisions as adopted by the calling consumer.
#[utoipa::path(
    post,
    path = "/api/consumerdecisions/adopt",
    request_body = AdoptDecisionsRequest,
    responses(
        (status = 200, description = "Adoptions recorded", body = AdoptionSummary),
        (status = 400, description = "Empty batch or unknown decision ids"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not an active registered consumer")
    ),
    tag = "consumer-decisions",
    security(("bearer_auth" = []))
)]
pub async fn adopt_decisions(
    State(server): State<OptOutServer>,
    auth: AuthContext,
    Json(req): Json<AdoptDecisionsRequest>,
) -> Result<Json<ApiResponse<AdoptionSummary>>, ApiError> {
    let consumer = server.consumer_decisions.authorize(&auth).await?;
    let summary = server.consumer_decisions.adopt(&consumer, req).await?;
    Ok(Json(api_success(summary)))
}
