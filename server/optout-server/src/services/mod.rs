//! Service layer
//!
//! Foundation services own one entity each: they validate input, stamp the
//! created/updated fields and talk to storage through the broker traits.
//! Orchestration services combine them with PDS, notifications and the
//! validation-code rules to implement the citizen and consumer flows.

pub mod audit;
pub mod consumer;
pub mod consumer_adoption;
pub mod consumer_decision;
pub mod decision;
pub mod decision_type;
pub mod error;
pub mod patient;
pub mod patient_code;
pub mod patient_search;
pub mod verified_decision;

pub use audit::AuditService;
pub use consumer::{ConsumerRequest, ConsumerService};
pub use consumer_adoption::{ConsumerAdoptionRequest, ConsumerAdoptionService};
pub use consumer_decision::{AdoptDecisionsRequest, AdoptionSummary, ConsumerDecisionService};
pub use decision::{DecisionRequest, DecisionService, ResponsiblePerson};
pub use decision_type::{DecisionTypeRequest, DecisionTypeService};
pub use error::{DependencyError, ServiceError, ServiceResult};
pub use patient::{PatientRequest, PatientService};
pub use patient_code::{CodeRequest, CodeRequestReceipt, CodeVerification, PatientCodeService, VerifyCodeRequest};
pub use patient_search::{DetailsSearchRequest, NhsNumberSearchRequest, PatientSearchService};
pub use verified_decision::{VerifiedDecisionRequest, VerifiedDecisionService};

use std::sync::Arc;

use database_layer::{AuditEvent, AuditLogger, AuditType, Storage};

use crate::clock::Clock;

/// What every service needs: storage, the audit trail and the time.
#[derive(Clone)]
pub struct ServiceContext {
    pub storage: Arc<dyn Storage>,
    pub audit: AuditLogger,
    pub clock: Arc<dyn Clock>,
}

impl ServiceContext {
    pub fn new(storage: Arc<dyn Storage>, audit: AuditLogger, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            audit,
            clock,
        }
    }

    /// Record an administrative change made by `actor`.
    pub async fn audit_admin_change(&self, actor: &str, title: &str, message: String) {
        self.audit
            .log_event(AuditEvent::new(AuditType::AdminChange, title, message).with_actor(actor))
            .await;
    }
}
