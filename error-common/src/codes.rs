// Error codes returned in API error bodies.
// Codes are stable identifiers; messages may change.

pub mod validation {
    pub const INVALID_INPUT: &str = "VALIDATION_1001";
    pub const INVALID_REFERENCE: &str = "VALIDATION_1004";
}

pub mod authentication {
    pub const MISSING_TOKEN: &str = "AUTH_2001";
    pub const INVALID_TOKEN: &str = "AUTH_2002";
}

pub mod authorization {
    pub const ACCESS_DENIED: &str = "AUTHZ_3001";
    pub const CONSUMER_INACTIVE: &str = "AUTHZ_3002";
}

pub mod resource {
    pub const NOT_FOUND: &str = "RESOURCE_4001";
    pub const ALREADY_EXISTS: &str = "RESOURCE_4002";
    pub const AMBIGUOUS_MATCH: &str = "RESOURCE_4003";
}

pub mod verification {
    pub const NO_CODE_ISSUED: &str = "VERIFY_5001";
    pub const CODE_INVALID: &str = "VERIFY_5002";
    pub const CODE_EXPIRED: &str = "VERIFY_5003";
    pub const RETRIES_EXHAUSTED: &str = "VERIFY_5004";
    pub const ALREADY_VERIFIED: &str = "VERIFY_5005";
    pub const NOT_VERIFIED: &str = "VERIFY_5006";
    pub const CODE_ALREADY_ISSUED: &str = "VERIFY_5007";
}

pub mod dependency {
    pub const STORAGE_FAILED: &str = "DEP_6001";
    pub const STORAGE_UNAVAILABLE: &str = "DEP_6002";
    pub const PDS_FAILED: &str = "DEP_6003";
    pub const NOTIFICATION_FAILED: &str = "DEP_6004";
}
