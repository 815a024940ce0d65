pub mod paths;

use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    handlers::{
        audits, consumer_adoptions, consumer_decisions, consumers, decision_types, decisions,
        health, patient_code, patient_search, patients,
    },
    openapi,
    server::OptOutServer,
};

/// Create health check routes
pub fn health_routes() -> Router<OptOutServer> {
    Router::new()
        .route(paths::health::HEALTH, get(health::health_check))
        .route(paths::health::VERSION, get(health::version_info))
}

/// Anonymous routes used by citizens
pub fn citizen_routes() -> Router<OptOutServer> {
    Router::new()
        .route(paths::citizen::SEARCH_BY_NHS_NUMBER, post(patient_search::search_by_nhs_number))
        .route(paths::citizen::SEARCH_BY_DETAILS, post(patient_search::search_by_details))
        .route(paths::citizen::CODE_REQUEST, post(patient_code::request_code))
        .route(paths::citizen::CODE_VERIFY, post(patient_code::verify_code))
        .route(paths::citizen::VERIFIED_DECISION, post(decisions::create_verified_decision))
}

/// Decision feed for consumer systems
pub fn consumer_routes() -> Router<OptOutServer> {
    Router::new()
        .route(
            paths::consumer::PENDING_DECISIONS,
            get(consumer_decisions::list_pending_decisions),
        )
        .route(paths::consumer::ADOPT, post(consumer_decisions::adopt_decisions))
}

/// Administrative CRUD
pub fn admin_routes() -> Router<OptOutServer> {
    Router::new()
        .route(
            paths::admin::PATIENTS,
            get(patients::list_patients).post(patients::create_patient),
        )
        .route(
            paths::admin::PATIENT_BY_ID,
            get(patients::get_patient)
                .put(patients::update_patient)
                .delete(patients::delete_patient),
        )
        .route(
            paths::admin::DECISIONS,
            get(decisions::list_decisions).post(decisions::create_decision),
        )
        .route(
            paths::admin::DECISION_BY_ID,
            get(decisions::get_decision)
                .put(decisions::update_decision)
                .delete(decisions::delete_decision),
        )
        .route(
            paths::admin::DECISION_TYPES,
            get(decision_types::list_decision_types).post(decision_types::create_decision_type),
        )
        .route(
            paths::admin::DECISION_TYPE_BY_ID,
            get(decision_types::get_decision_type)
                .put(decision_types::update_decision_type)
                .delete(decision_types::delete_decision_type),
        )
        .route(
            paths::admin::CONSUMERS,
            get(consumers::list_consumers).post(consumers::create_consumer),
        )
        .route(
            paths::admin::CONSUMER_BY_ID,
            get(consumers::get_consumer)
                .put(consumers::update_consumer)
                .delete(consumers::delete_consumer),
        )
        .route(
            paths::admin::CONSUMER_ADOPTIONS,
            get(consumer_adoptions::list_consumer_adoptions)
                .post(consumer_adoptions::create_consumer_adoption),
        )
        .route(
            paths::admin::CONSUMER_ADOPTION_BY_ID,
            get(consumer_adoptions::get_consumer_adoption)
                .put(consumer_adoptions::update_consumer_adoption)
                .delete(consumer_adoptions::delete_consumer_adoption),
        )
        .route(paths::admin::AUDITS, get(audits::list_audits))
        .route(paths::admin::AUDIT_BY_ID, get(audits::get_audit))
}

/// Create all application routes
pub fn create_routes() -> Router<OptOutServer> {
    Router::new()
        .merge(health_routes())
        .merge(openapi::create_docs_routes())
        .merge(citizen_routes())
        .merge(consumer_routes())
        .merge(admin_routes())
}
