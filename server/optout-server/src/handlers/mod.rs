//! HTTP handlers, one module per API area
//!
//! Citizen endpoints (patient search, patient code, verified decisions) are
//! anonymous. Administrative CRUD requires the administrator role and
//! records the token subject as the acting user.

pub mod audits;
pub mod consumer_adoptions;
pub mod consumer_decisions;
pub mod consumers;
pub mod decision_types;
pub mod decisions;
pub mod health;
pub mod patient_code;
pub mod patient_search;
pub mod patients;

use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::server::OptOutServer;

/// Check `auth` carries the configured administrator role.
pub(crate) fn require_admin(server: &OptOutServer, auth: &AuthContext) -> Result<(), ApiError> {
    auth.require_role(&server.config.auth.admin_role)
}
