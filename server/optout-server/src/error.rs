use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use error_common::codes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::{DependencyError, ServiceError};
use crate::validation_code::VerificationError;

/// Standard API error response structure
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Always false; mirrors the flag on [`ApiResponse`]
    pub success: bool,
    /// Unique error ID for tracking
    pub error_id: String,
    /// Error type
    pub error_type: String,
    /// Stable error code from `error_common::codes`
    pub error_code: String,
    /// Human-readable error message
    pub message: String,
    /// Field-specific validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<HashMap<String, Vec<String>>>,
    /// Timestamp when error occurred
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Suggested actions for resolving the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

/// Standard API success response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

/// Response metadata for pagination
#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Main API error enum
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: &'static str,
        field_errors: Option<HashMap<String, Vec<String>>>,
    },

    #[error("Authentication error: {message}")]
    Authentication { message: String, code: &'static str },

    #[error("Authorization error: {message}")]
    Authorization { message: String, code: &'static str },

    #[error("Resource not found: {resource_type}")]
    NotFound { resource_type: String },

    #[error("Resource conflict: {message}")]
    Conflict { message: String, code: &'static str },

    #[error("{message}")]
    Gone { message: String },

    #[error("{message}")]
    Locked { message: String },

    #[error("Unprocessable entity: {message}")]
    UnprocessableEntity { message: String },

    #[error("Upstream dependency failed: {message}")]
    Dependency {
        message: String,
        code: &'static str,
        unavailable: bool,
    },
}

impl ApiError {
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            code: codes::authentication::INVALID_TOKEN,
        }
    }

    pub fn missing_token(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            code: codes::authentication::MISSING_TOKEN,
        }
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
            code: codes::authorization::ACCESS_DENIED,
        }
    }

    pub fn not_found(resource_type: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            code: codes::resource::ALREADY_EXISTS,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Authorization { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Gone { .. } => StatusCode::GONE,
            ApiError::Locked { .. } => StatusCode::LOCKED,
            ApiError::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Dependency { unavailable, .. } => {
                if *unavailable {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::BAD_GATEWAY
                }
            }
        }
    }

    /// Get the error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "validation_error",
            ApiError::Authentication { .. } => "authentication_error",
            ApiError::Authorization { .. } => "authorization_error",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Conflict { .. } => "conflict",
            ApiError::Gone { .. } => "code_expired",
            ApiError::Locked { .. } => "retries_exhausted",
            ApiError::UnprocessableEntity { .. } => "unprocessable_entity",
            ApiError::Dependency { .. } => "dependency_error",
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { code, .. }
            | ApiError::Authentication { code, .. }
            | ApiError::Authorization { code, .. }
            | ApiError::Conflict { code, .. }
            | ApiError::Dependency { code, .. } => code,
            ApiError::NotFound { .. } => codes::resource::NOT_FOUND,
            ApiError::Gone { .. } => codes::verification::CODE_EXPIRED,
            ApiError::Locked { .. } => codes::verification::RETRIES_EXHAUSTED,
            ApiError::UnprocessableEntity { .. } => codes::resource::AMBIGUOUS_MATCH,
        }
    }

    /// Get suggested actions for resolving the error
    pub fn suggestions(&self) -> Option<Vec<String>> {
        match self {
            ApiError::Validation { .. } => Some(vec![
                "Check the request payload for invalid fields".to_string(),
                "Ensure all required fields are provided".to_string(),
            ]),
            ApiError::Authentication { .. } => Some(vec![
                "Send a bearer token in the Authorization header".to_string(),
                "Check if your token has expired".to_string(),
            ]),
            ApiError::Authorization { .. } => Some(vec![
                "Verify you have the required role".to_string(),
            ]),
            ApiError::Gone { .. } | ApiError::Locked { .. } => Some(vec![
                "Request a new validation code".to_string(),
            ]),
            ApiError::UnprocessableEntity { .. } => Some(vec![
                "Search by NHS number instead".to_string(),
            ]),
            ApiError::Dependency { .. } => Some(vec![
                "Try again in a few moments".to_string(),
                "Contact support if the issue persists".to_string(),
            ]),
            _ => None,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Validation(field_errors) => ApiError::Validation {
                message: "Request validation failed".to_string(),
                code: codes::validation::INVALID_INPUT,
                field_errors: Some(field_errors.into_map()),
            },
            ServiceError::NotFound { entity, .. } => ApiError::not_found(entity),
            ServiceError::AlreadyExists { .. } => ApiError::conflict(error.to_string()),
            ServiceError::InvalidReference { .. } => ApiError::Validation {
                message: error.to_string(),
                code: codes::validation::INVALID_REFERENCE,
                field_errors: None,
            },
            ServiceError::Verification(verification) => verification.into(),
            ServiceError::AmbiguousMatch => ApiError::UnprocessableEntity {
                message: error.to_string(),
            },
            ServiceError::Unauthorized { message, code } => {
                ApiError::Authorization { message, code }
            }
            ServiceError::Dependency(dependency) => {
                let (code, unavailable) = match &dependency {
                    DependencyError::Storage(e) => (
                        if e.is_unavailable() {
                            codes::dependency::STORAGE_UNAVAILABLE
                        } else {
                            codes::dependency::STORAGE_FAILED
                        },
                        e.is_unavailable(),
                    ),
                    DependencyError::Pds(e) => (codes::dependency::PDS_FAILED, e.is_unavailable()),
                    DependencyError::Notification(e) => {
                        (codes::dependency::NOTIFICATION_FAILED, e.is_unavailable())
                    }
                };
                // Provider detail stays in the log line, not the response body
                warn!(error = %dependency, "Dependency failure");
                ApiError::Dependency {
                    message: dependency.public_message().to_string(),
                    code,
                    unavailable,
                }
            }
        }
    }
}

impl From<VerificationError> for ApiError {
    fn from(error: VerificationError) -> Self {
        let message = error.to_string();
        match error {
            VerificationError::NoCodeIssued => ApiError::Validation {
                message,
                code: codes::verification::NO_CODE_ISSUED,
                field_errors: None,
            },
            VerificationError::InvalidCode { .. } => ApiError::Validation {
                field_errors: Some(HashMap::from([(
                    "validation_code".to_string(),
                    vec![message.clone()],
                )])),
                message,
                code: codes::verification::CODE_INVALID,
            },
            VerificationError::AlreadyVerified => ApiError::Conflict {
                message,
                code: codes::verification::ALREADY_VERIFIED,
            },
            VerificationError::CodeAlreadyIssued { .. } => ApiError::Conflict {
                message,
                code: codes::verification::CODE_ALREADY_ISSUED,
            },
            VerificationError::Expired => ApiError::Gone { message },
            VerificationError::RetriesExhausted => ApiError::Locked { message },
            VerificationError::NotVerified => ApiError::Authorization {
                message,
                code: codes::verification::NOT_VERIFIED,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4().to_string();
        let status_code = self.status_code();

        if status_code.is_server_error() {
            error!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %self,
                "API error occurred"
            );
        } else {
            warn!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %self,
                "Request rejected"
            );
        }

        let error_response = ApiErrorResponse {
            success: false,
            error_id,
            error_type: self.error_type().to_string(),
            error_code: self.error_code().to_string(),
            message: self.to_string(),
            suggestions: self.suggestions(),
            field_errors: match self {
                ApiError::Validation { field_errors, .. } => field_errors,
                _ => None,
            },
            timestamp: chrono::Utc::now(),
        };

        (status_code, Json(error_response)).into_response()
    }
}

/// Helper function to create successful API responses
pub fn api_success<T>(data: T) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        data,
        metadata: None,
    }
}

/// Helper function to create successful API responses with metadata
pub fn api_success_with_meta<T>(data: T, metadata: ResponseMetadata) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        data,
        metadata: Some(metadata),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use error_common::FieldErrors;

    #[test]
    fn test_verification_status_mapping() {
        let cases = [
            (VerificationError::NoCodeIssued, StatusCode::BAD_REQUEST),
            (
                VerificationError::InvalidCode {
                    remaining_attempts: 2,
                },
                StatusCode::BAD_REQUEST,
            ),
            (VerificationError::AlreadyVerified, StatusCode::CONFLICT),
            (VerificationError::Expired, StatusCode::GONE),
            (VerificationError::RetriesExhausted, StatusCode::LOCKED),
            (VerificationError::NotVerified, StatusCode::FORBIDDEN),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status_code(), status);
        }
    }

    #[test]
    fn test_service_error_mapping() {
        let validation = ApiError::from(ServiceError::Validation(FieldErrors::single(
            "surname",
            "Surname is required",
        )));
        assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.error_code(), codes::validation::INVALID_INPUT);

        let ambiguous = ApiError::from(ServiceError::AmbiguousMatch);
        assert_eq!(ambiguous.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let storage = ApiError::from(ServiceError::from(
            database_layer::DatabaseError::ConnectionFailed("refused".to_string()),
        ));
        assert_eq!(storage.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(storage.error_code(), codes::dependency::STORAGE_UNAVAILABLE);

        let pds = ApiError::from(ServiceError::from(pds_service::PdsError::UnexpectedStatus {
            status: 400,
            body: String::new(),
        }));
        assert_eq!(pds.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_duplicate_maps_to_conflict() {
        let error = ApiError::from(ServiceError::from(
            database_layer::DatabaseError::already_exists("Consumer", "consumers_name_key"),
        ));
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
        assert_eq!(error.error_code(), codes::resource::ALREADY_EXISTS);
    }

    #[tokio::test]
    async fn test_error_body_carries_failure_flag_and_code() {
        let response = ApiError::authentication("Missing bearer token").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ApiErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!body.success);
        assert_eq!(body.error_type, "authentication_error");
        assert!(body.field_errors.is_none());
    }
}
