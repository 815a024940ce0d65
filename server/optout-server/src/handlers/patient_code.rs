use axum::{extract::State, http::StatusCode, Json};

use crate::error::{api_success, ApiError, ApiResponse};
use crate::server::OptOutServer;
use crate::services::{CodeRequest, CodeRequestReceipt, CodeVerification, VerifyCodeRequest};

/// Issue a validation code and send it on the chosen channel.
#[utoipa::path(
    post,
    path = "/api/patientcode/request",
    request_body = CodeRequest,
    responses(
        (status = 202, description = "Code issued and handed to the provider", body = CodeRequestReceipt),
        (status = 400, description = "Invalid NHS number or no contact detail for the channel"),
        (status = 404, description = "No patient with this NHS number"),
        (status = 409, description = "A live code exists and a new one was not requested"),
        (status = 502, description = "PDS or notification failure")
    ),
    tag = "patient-code"
)]
pub async fn request_code(
    State(server): State<OptOutServer>,
    Json(req): Json<CodeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CodeRequestReceipt>>), ApiError> {
    let receipt = server.patient_codes.request_code(req).await?;
    Ok((StatusCode::ACCEPTED, Json(api_success(receipt))))
}

/// Check a submitted validation code.
#[utoipa::path(
    post,
    path = "/api/patientcode/verify",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Code matched", body = CodeVerification),
        (status = 400, description = "No code issued, or the code did not match"),
        (status = 409, description = "Already verified"),
        (status = 410, description = "Code expired"),
        (status = 423, description = "Too many failed attempts")
    ),
    tag = "patient-code"
)]
pub async fn verify_code(
    State(server): State<OptOutServer>,
    Json(req): Json<VerifyCodeRequest>,
) -> Result<Json<ApiResponse<CodeVerification>>, ApiError> {
    let verification = server.patient_codes.verify_code(req).await?;
    Ok(Json(api_success(verification)))
}
