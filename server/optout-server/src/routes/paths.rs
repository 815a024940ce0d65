//! Route paths, in axum's `:param` syntax

pub mod health {
    pub const HEALTH: &str = "/health";
    pub const VERSION: &str = "/version";
}

pub mod docs {
    pub const SWAGGER_UI: &str = "/docs";
    pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";
}

pub mod citizen {
    pub const SEARCH_BY_NHS_NUMBER: &str = "/api/patientsearch/nhsnumber";
    pub const SEARCH_BY_DETAILS: &str = "/api/patientsearch/details";
    pub const CODE_REQUEST: &str = "/api/patientcode/request";
    pub const CODE_VERIFY: &str = "/api/patientcode/verify";
    pub const VERIFIED_DECISION: &str = "/api/decisions/verified";
}

pub mod consumer {
    pub const PENDING_DECISIONS: &str = "/api/consumerdecisions";
    pub const ADOPT: &str = "/api/consumerdecisions/adopt";
}

pub mod admin {
    pub const PATIENTS: &str = "/api/patients";
    pub const PATIENT_BY_ID: &str = "/api/patients/:id";
    pub const DECISIONS: &str = "/api/decisions";
    pub const DECISION_BY_ID: &str = "/api/decisions/:id";
    pub const DECISION_TYPES: &str = "/api/decisiontypes";
    pub const DECISION_TYPE_BY_ID: &str = "/api/decisiontypes/:id";
    pub const CONSUMERS: &str = "/api/consumers";
    pub const CONSUMER_BY_ID: &str = "/api/consumers/:id";
    pub const CONSUMER_ADOPTIONS: &str = "/api/consumeradoptions";
    pub const CONSUMER_ADOPTION_BY_ID: &str = "/api/consumeradoptions/:id";
    pub const AUDITS: &str = "/api/audits";
    pub const AUDIT_BY_ID: &str = "/api/audits/:id";
}
