use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{api_success, ApiResponse};
use crate::server::OptOutServer;

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: String,
    #[schema(example = "0.1.0")]
    pub version: String,
    /// Active storage backend
    #[schema(example = "postgres")]
    pub storage: String,
    pub checks: HashMap<String, String>,
}

/// Version information response
#[derive(Debug, Serialize, ToSchema)]
pub struct VersionResponse {
    #[schema(example = "optout-server")]
    pub name: String,
    #[schema(example = "0.1.0")]
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Storage is unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(
    State(server): State<OptOutServer>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let storage_healthy = server.storage.is_healthy().await;

    let mut checks = HashMap::new();
    checks.insert(
        "storage".to_string(),
        if storage_healthy { "healthy" } else { "unhealthy" }.to_string(),
    );

    let (status, label) = if storage_healthy {
        (StatusCode::OK, "healthy")
    } else {
        tracing::warn!(backend = server.storage.backend_name(), "Storage health check failed");
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    let response = HealthResponse {
        status: label.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: server.storage.backend_name().to_string(),
        checks,
    };
    (status, Json(api_success(response)))
}

#[utoipa::path(
    get,
    path = "/version",
    tag = "health",
    responses(
        (status = 200, description = "Build information", body = VersionResponse)
    )
)]
pub async fn version_info() -> Json<ApiResponse<VersionResponse>> {
    Json(api_success(VersionResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
