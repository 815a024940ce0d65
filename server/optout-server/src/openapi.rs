use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::routes::paths;
use crate::server::OptOutServer;

/// Main OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::health::version_info,

        crate::handlers::patient_search::search_by_nhs_number,
        crate::handlers::patient_search::search_by_details,
        crate::handlers::patient_code::request_code,
        crate::handlers::patient_code::verify_code,
        crate::handlers::decisions::create_verified_decision,

        crate::handlers::consumer_decisions::list_pending_decisions,
        crate::handlers::consumer_decisions::adopt_decisions,

        crate::handlers::patients::list_patients,
        crate::handlers::patients::get_patient,
        crate::handlers::patients::create_patient,
        crate::handlers::patients::update_patient,
        crate::handlers::patients::delete_patient,
        crate::handlers::decisions::list_decisions,
        crate::handlers::decisions::get_decision,
        crate::handlers::decisions::create_decision,
        crate::handlers::decisions::update_decision,
        crate::handlers::decisions::delete_decision,
        crate::handlers::decision_types::list_decision_types,
        crate::handlers::decision_types::get_decision_type,
        crate::handlers::decision_types::create_decision_type,
        crate::handlers::decision_types::update_decision_type,
        crate::handlers::decision_types::delete_decision_type,
        crate::handlers::consumers::list_consumers,
        crate::handlers::consumers::get_consumer,
        crate::handlers::consumers::create_consumer,
        crate::handlers::consumers::update_consumer,
        crate::handlers::consumers::delete_consumer,
        crate::handlers::consumer_adoptions::list_consumer_adoptions,
        crate::handlers::consumer_adoptions::get_consumer_adoption,
        crate::handlers::consumer_adoptions::create_consumer_adoption,
        crate::handlers::consumer_adoptions::update_consumer_adoption,
        crate::handlers::consumer_adoptions::delete_consumer_adoption,
        crate::handlers::audits::list_audits,
        crate::handlers::audits::get_audit,
    ),
    components(
        schemas(
            crate::handlers::health::HealthResponse,
            crate::handlers::health::VersionResponse,
            crate::error::ApiErrorResponse,
            crate::redaction::RedactedPatient,
            crate::services::NhsNumberSearchRequest,
            crate::services::DetailsSearchRequest,
            crate::services::CodeRequest,
            crate::services::CodeRequestReceipt,
            crate::services::VerifyCodeRequest,
            crate::services::CodeVerification,
            crate::services::VerifiedDecisionRequest,
            crate::services::ResponsiblePerson,
            crate::services::AdoptDecisionsRequest,
            crate::services::AdoptionSummary,
            crate::services::PatientRequest,
            crate::services::DecisionRequest,
            crate::services::DecisionTypeRequest,
            crate::services::ConsumerRequest,
            crate::services::ConsumerAdoptionRequest,
            database_layer::Patient,
            database_layer::NotificationPreference,
            database_layer::Decision,
            database_layer::PendingDecision,
            database_layer::DecisionType,
            database_layer::Consumer,
            database_layer::ConsumerAdoption,
            database_layer::Audit,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Service health and version"),
        (name = "patient-search", description = "Citizen lookup against PDS, answered with redacted records"),
        (name = "patient-code", description = "Validation code request and verification"),
        (name = "decisions", description = "Recorded decisions"),
        (name = "consumer-decisions", description = "Decision feed for consumer systems"),
        (name = "patients", description = "Patient administration"),
        (name = "decision-types", description = "Decision type administration"),
        (name = "consumers", description = "Consumer administration"),
        (name = "consumer-adoptions", description = "Adoption administration"),
        (name = "audits", description = "Audit trail"),
    ),
    info(
        title = "Patient Opt-Out API",
        version = "0.1.0",
        description = "Citizens find their record, verify a one-time code and record a data-sharing decision. Consumer systems collect and adopt those decisions.",
        license(name = "AGPL-3.0-only"),
    ),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create OpenAPI documentation routes
pub fn create_docs_routes() -> Router<OptOutServer> {
    Router::new().merge(SwaggerUi::new(paths::docs::SWAGGER_UI).url(paths::docs::OPENAPI_JSON, ApiDoc::openapi()))
}
