//! Storage brokers.
//!
//! Services reach storage only through these traits. Each write is a single
//! row operation, except [`DecisionStore::create_verified_decision`] which
//! runs as one transaction. Uniqueness and reference rules are enforced by
//! the backend and reported as [`DatabaseError::AlreadyExists`] and
//! [`DatabaseError::ForeignKeyViolation`].
//!
//! Validation-code transitions are conditional updates, so concurrent
//! requests against one patient cannot both succeed.
//!
//! [`DatabaseError::AlreadyExists`]: crate::DatabaseError::AlreadyExists
//! [`DatabaseError::ForeignKeyViolation`]: crate::DatabaseError::ForeignKeyViolation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DatabaseResult;
use crate::models::{
    Audit, Consumer, ConsumerAdoption, Decision, DecisionType, PageRequest, Paged, Patient,
    PendingDecision,
};

#[async_trait]
pub trait PatientStore: Send + Sync {
    async fn create_patient(&self, patient: &Patient) -> DatabaseResult<Patient>;
    async fn find_patient(&self, id: Uuid) -> DatabaseResult<Option<Patient>>;
    async fn find_patient_by_nhs_number(&self, nhs_number: &str) -> DatabaseResult<Option<Patient>>;
    async fn list_patients(&self, page: PageRequest) -> DatabaseResult<Paged<Patient>>;
    async fn update_patient(&self, patient: &Patient) -> DatabaseResult<Patient>;
    async fn delete_patient(&self, id: Uuid) -> DatabaseResult<Patient>;

    /// Count one wrong guess against `code`, in a single conditional write.
    ///
    /// Returns `None`, leaving the row untouched, unless `code` is still the
    /// patient's unmatched code with fewer than `max_retry_count` failures.
    async fn record_failed_attempt(
        &self,
        id: Uuid,
        code: &str,
        max_retry_count: i32,
        actor: &str,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Patient>>;

    /// Mark `code` as matched at `now`, under the same conditions as
    /// [`PatientStore::record_failed_attempt`]. `None` when another request
    /// got there first.
    async fn mark_code_matched(
        &self,
        id: Uuid,
        code: &str,
        max_retry_count: i32,
        actor: &str,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Patient>>;
}

#[async_trait]
pub trait DecisionTypeStore: Send + Sync {
    async fn create_decision_type(&self, decision_type: &DecisionType) -> DatabaseResult<DecisionType>;
    async fn find_decision_type(&self, id: Uuid) -> DatabaseResult<Option<DecisionType>>;
    async fn list_decision_types(&self, page: PageRequest) -> DatabaseResult<Paged<DecisionType>>;
    async fn update_decision_type(&self, decision_type: &DecisionType) -> DatabaseResult<DecisionType>;
    async fn delete_decision_type(&self, id: Uuid) -> DatabaseResult<DecisionType>;
}

#[async_trait]
pub trait DecisionStore: Send + Sync {
    async fn create_decision(&self, decision: &Decision) -> DatabaseResult<Decision>;
    async fn find_decision(&self, id: Uuid) -> DatabaseResult<Option<Decision>>;
    async fn list_decisions(&self, page: PageRequest) -> DatabaseResult<Paged<Decision>>;
    async fn update_decision(&self, decision: &Decision) -> DatabaseResult<Decision>;
    async fn delete_decision(&self, id: Uuid) -> DatabaseResult<Decision>;

    /// Store a citizen's decision and clear the patient's matched code in
    /// one atomic step. `None`, with nothing written, when the patient has
    /// no matched code left to use.
    async fn create_verified_decision(&self, decision: &Decision) -> DatabaseResult<Option<Decision>>;

    /// Decisions the consumer has not adopted, oldest first.
    async fn list_pending_decisions(&self, consumer_id: Uuid) -> DatabaseResult<Vec<PendingDecision>>;
}

#[async_trait]
pub trait ConsumerStore: Send + Sync {
    async fn create_consumer(&self, consumer: &Consumer) -> DatabaseResult<Consumer>;
    async fn find_consumer(&self, id: Uuid) -> DatabaseResult<Option<Consumer>>;
    async fn find_consumer_by_client_id(&self, client_id: &str) -> DatabaseResult<Option<Consumer>>;
    async fn list_consumers(&self, page: PageRequest) -> DatabaseResult<Paged<Consumer>>;
    async fn update_consumer(&self, consumer: &Consumer) -> DatabaseResult<Consumer>;
    async fn delete_consumer(&self, id: Uuid) -> DatabaseResult<Consumer>;
}

#[async_trait]
pub trait ConsumerAdoptionStore: Send + Sync {
    async fn create_adoption(&self, adoption: &ConsumerAdoption) -> DatabaseResult<ConsumerAdoption>;
    async fn find_adoption(&self, id: Uuid) -> DatabaseResult<Option<ConsumerAdoption>>;
    async fn list_adoptions(&self, page: PageRequest) -> DatabaseResult<Paged<ConsumerAdoption>>;
    async fn update_adoption(&self, adoption: &ConsumerAdoption) -> DatabaseResult<ConsumerAdoption>;
    async fn delete_adoption(&self, id: Uuid) -> DatabaseResult<ConsumerAdoption>;

    /// Ids of every decision the consumer has already adopted.
    async fn list_adopted_decision_ids(&self, consumer_id: Uuid) -> DatabaseResult<Vec<Uuid>>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn create_audit(&self, audit: &Audit) -> DatabaseResult<Audit>;
    async fn find_audit(&self, id: Uuid) -> DatabaseResult<Option<Audit>>;
    async fn list_audits(&self, page: PageRequest) -> DatabaseResult<Paged<Audit>>;
}

/// Every broker behind one handle.
#[async_trait]
pub trait Storage:
    PatientStore + DecisionTypeStore + DecisionStore + ConsumerStore + ConsumerAdoptionStore + AuditStore
{
    /// Cheap liveness check used by the health endpoint.
    async fn is_healthy(&self) -> bool;

    /// Backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}
