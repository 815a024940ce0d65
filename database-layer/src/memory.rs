//! Process-local storage backend.
//!
//! All tables sit behind one lock so reference and uniqueness checks run
//! atomically with the write they guard. Used by the `memory` backend and by
//! the service and HTTP tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{DatabaseError, DatabaseResult};
use crate::models::{
    Audit, Consumer, ConsumerAdoption, Decision, DecisionType, PageRequest, Paged, Patient,
    PendingDecision,
};
use crate::store::{
    AuditStore, ConsumerAdoptionStore, ConsumerStore, DecisionStore, DecisionTypeStore,
    PatientStore, Storage,
};

#[derive(Default)]
struct Tables {
    patients: HashMap<Uuid, Patient>,
    decision_types: HashMap<Uuid, DecisionType>,
    decisions: HashMap<Uuid, Decision>,
    consumers: HashMap<Uuid, Consumer>,
    adoptions: HashMap<Uuid, ConsumerAdoption>,
    audits: HashMap<Uuid, Audit>,
}

#[derive(Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page_of<T: Clone>(
    rows: &HashMap<Uuid, T>,
    page: PageRequest,
    sort_key: impl Fn(&T) -> chrono::DateTime<chrono::Utc>,
) -> Paged<T> {
    let mut items: Vec<&T> = rows.values().collect();
    items.sort_by_key(|row| sort_key(row));
    Paged {
        total: i64::try_from(items.len()).unwrap_or(i64::MAX),
        items: page.slice(items.into_iter().cloned()),
    }
}

/// The patient whose unmatched, unexhausted code is `code`, if any.
fn open_code<'a>(
    tables: &'a mut Tables,
    id: Uuid,
    code: &str,
    max_retry_count: i32,
) -> Option<&'a mut Patient> {
    tables.patients.get_mut(&id).filter(|p| {
        p.validation_code.as_deref() == Some(code)
            && p.validation_code_matched_on.is_none()
            && p.retry_count < max_retry_count
    })
}

fn ensure_new<T>(rows: &HashMap<Uuid, T>, id: Uuid, entity: &'static str) -> DatabaseResult<()> {
    if rows.contains_key(&id) {
        return Err(DatabaseError::already_exists(entity, format!("id {id}")));
    }
    Ok(())
}

#[async_trait]
impl PatientStore for MemoryStorage {
    async fn create_patient(&self, patient: &Patient) -> DatabaseResult<Patient> {
        let mut tables = self.tables.write();
        ensure_new(&tables.patients, patient.id, "patient")?;
        if tables
            .patients
            .values()
            .any(|p| p.nhs_number == patient.nhs_number)
        {
            return Err(DatabaseError::already_exists("patient", "patients_nhs_number_key"));
        }
        tables.patients.insert(patient.id, patient.clone());
        Ok(patient.clone())
    }

    async fn find_patient(&self, id: Uuid) -> DatabaseResult<Option<Patient>> {
        Ok(self.tables.read().patients.get(&id).cloned())
    }

    async fn find_patient_by_nhs_number(&self, nhs_number: &str) -> DatabaseResult<Option<Patient>> {
        Ok(self
            .tables
            .read()
            .patients
            .values()
            .find(|p| p.nhs_number == nhs_number)
            .cloned())
    }

    async fn list_patients(&self, page: PageRequest) -> DatabaseResult<Paged<Patient>> {
        Ok(page_of(&self.tables.read().patients, page, |p| p.created_date))
    }

    async fn update_patient(&self, patient: &Patient) -> DatabaseResult<Patient> {
        let mut tables = self.tables.write();
        if tables
            .patients
            .values()
            .any(|p| p.id != patient.id && p.nhs_number == patient.nhs_number)
        {
            return Err(DatabaseError::already_exists("patient", "patients_nhs_number_key"));
        }
        let stored = tables
            .patients
            .get_mut(&patient.id)
            .ok_or_else(|| DatabaseError::not_found("patient", patient.id))?;
        let created_by = std::mem::take(&mut stored.created_by);
        let created_date = stored.created_date;
        *stored = Patient {
            created_by,
            created_date,
            ..patient.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_patient(&self, id: Uuid) -> DatabaseResult<Patient> {
        let mut tables = self.tables.write();
        if tables.decisions.values().any(|d| d.patient_id == id) {
            return Err(DatabaseError::foreign_key("patient", "decisions_patient_id_fkey"));
        }
        tables
            .patients
            .remove(&id)
            .ok_or_else(|| DatabaseError::not_found("patient", id))
    }

    async fn record_failed_attempt(
        &self,
        id: Uuid,
        code: &str,
        max_retry_count: i32,
        actor: &str,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Patient>> {
        let mut tables = self.tables.write();
        Ok(open_code(&mut tables, id, code, max_retry_count).map(|patient| {
            patient.retry_count += 1;
            patient.updated_by = actor.to_string();
            patient.updated_date = now;
            patient.clone()
        }))
    }

    async fn mark_code_matched(
        &self,
        id: Uuid,
        code: &str,
        max_retry_count: i32,
        actor: &str,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Patient>> {
        let mut tables = self.tables.write();
        Ok(open_code(&mut tables, id, code, max_retry_count)
            .filter(|p| p.validation_code_expires_on.is_some_and(|expires_on| now <= expires_on))
            .map(|patient| {
                patient.validation_code_matched_on = Some(now);
                patient.updated_by = actor.to_string();
                patient.updated_date = now;
                patient.clone()
            }))
    }
}

#[async_trait]
impl DecisionTypeStore for MemoryStorage {
    async fn create_decision_type(&self, decision_type: &DecisionType) -> DatabaseResult<DecisionType> {
        let mut tables = self.tables.write();
        ensure_new(&tables.decision_types, decision_type.id, "decision type")?;
        if tables
            .decision_types
            .values()
            .any(|t| t.name == decision_type.name)
        {
            return Err(DatabaseError::already_exists("decision type", "decision_types_name_key"));
        }
        tables
            .decision_types
            .insert(decision_type.id, decision_type.clone());
        Ok(decision_type.clone())
    }

    async fn find_decision_type(&self, id: Uuid) -> DatabaseResult<Option<DecisionType>> {
        Ok(self.tables.read().decision_types.get(&id).cloned())
    }

    async fn list_decision_types(&self, page: PageRequest) -> DatabaseResult<Paged<DecisionType>> {
        Ok(page_of(&self.tables.read().decision_types, page, |t| t.created_date))
    }

    async fn update_decision_type(&self, decision_type: &DecisionType) -> DatabaseResult<DecisionType> {
        let mut tables = self.tables.write();
        if tables
            .decision_types
            .values()
            .any(|t| t.id != decision_type.id && t.name == decision_type.name)
        {
            return Err(DatabaseError::already_exists("decision type", "decision_types_name_key"));
        }
        let stored = tables
            .decision_types
            .get_mut(&decision_type.id)
            .ok_or_else(|| DatabaseError::not_found("decision type", decision_type.id))?;
        stored.name.clone_from(&decision_type.name);
        stored.updated_by.clone_from(&decision_type.updated_by);
        stored.updated_date = decision_type.updated_date;
        Ok(stored.clone())
    }

    async fn delete_decision_type(&self, id: Uuid) -> DatabaseResult<DecisionType> {
        let mut tables = self.tables.write();
        if tables.decisions.values().any(|d| d.decision_type_id == id) {
            return Err(DatabaseError::foreign_key(
                "decision type",
                "decisions_decision_type_id_fkey",
            ));
        }
        tables
            .decision_types
            .remove(&id)
            .ok_or_else(|| DatabaseError::not_found("decision type", id))
    }
}

#[async_trait]
impl DecisionStore for MemoryStorage {
    async fn create_decision(&self, decision: &Decision) -> DatabaseResult<Decision> {
        let mut tables = self.tables.write();
        ensure_new(&tables.decisions, decision.id, "decision")?;
        if !tables.patients.contains_key(&decision.patient_id) {
            return Err(DatabaseError::foreign_key("decision", "decisions_patient_id_fkey"));
        }
        if !tables.decision_types.contains_key(&decision.decision_type_id) {
            return Err(DatabaseError::foreign_key("decision", "decisions_decision_type_id_fkey"));
        }
        tables.decisions.insert(decision.id, decision.clone());
        Ok(decision.clone())
    }

    async fn create_verified_decision(&self, decision: &Decision) -> DatabaseResult<Option<Decision>> {
        let mut tables = self.tables.write();
        ensure_new(&tables.decisions, decision.id, "decision")?;
        if !tables.decision_types.contains_key(&decision.decision_type_id) {
            return Err(DatabaseError::foreign_key("decision", "decisions_decision_type_id_fkey"));
        }
        let Some(patient) = tables
            .patients
            .get_mut(&decision.patient_id)
            .filter(|p| p.validation_code_matched_on.is_some())
        else {
            return Ok(None);
        };
        patient.validation_code = None;
        patient.validation_code_expires_on = None;
        patient.validation_code_matched_on = None;
        patient.retry_count = 0;
        patient.updated_by.clone_from(&decision.created_by);
        patient.updated_date = decision.created_date;

        tables.decisions.insert(decision.id, decision.clone());
        Ok(Some(decision.clone()))
    }

    async fn find_decision(&self, id: Uuid) -> DatabaseResult<Option<Decision>> {
        Ok(self.tables.read().decisions.get(&id).cloned())
    }

    async fn list_decisions(&self, page: PageRequest) -> DatabaseResult<Paged<Decision>> {
        Ok(page_of(&self.tables.read().decisions, page, |d| d.created_date))
    }

    async fn update_decision(&self, decision: &Decision) -> DatabaseResult<Decision> {
        let mut tables = self.tables.write();
        if !tables.patients.contains_key(&decision.patient_id) {
            return Err(DatabaseError::foreign_key("decision", "decisions_patient_id_fkey"));
        }
        if !tables.decision_types.contains_key(&decision.decision_type_id) {
            return Err(DatabaseError::foreign_key("decision", "decisions_decision_type_id_fkey"));
        }
        let stored = tables
            .decisions
            .get_mut(&decision.id)
            .ok_or_else(|| DatabaseError::not_found("decision", decision.id))?;
        let created_by = std::mem::take(&mut stored.created_by);
        let created_date = stored.created_date;
        *stored = Decision {
            created_by,
            created_date,
            ..decision.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_decision(&self, id: Uuid) -> DatabaseResult<Decision> {
        let mut tables = self.tables.write();
        if tables.adoptions.values().any(|a| a.decision_id == id) {
            return Err(DatabaseError::foreign_key(
                "decision",
                "consumer_adoptions_decision_id_fkey",
            ));
        }
        tables
            .decisions
            .remove(&id)
            .ok_or_else(|| DatabaseError::not_found("decision", id))
    }

    async fn list_pending_decisions(&self, consumer_id: Uuid) -> DatabaseResult<Vec<PendingDecision>> {
        let tables = self.tables.read();
        let mut pending: Vec<PendingDecision> = tables
            .decisions
            .values()
            .filter(|d| {
                !tables
                    .adoptions
                    .values()
                    .any(|a| a.consumer_id == consumer_id && a.decision_id == d.id)
            })
            .filter_map(|d| {
                let patient = tables.patients.get(&d.patient_id)?;
                let decision_type = tables.decision_types.get(&d.decision_type_id)?;
                Some(PendingDecision {
                    decision: d.clone(),
                    nhs_number: patient.nhs_number.clone(),
                    decision_type_name: decision_type.name.clone(),
                })
            })
            .collect();
        pending.sort_by_key(|p| p.decision.created_date);
        Ok(pending)
    }
}

#[async_trait]
impl ConsumerStore for MemoryStorage {
    async fn create_consumer(&self, consumer: &Consumer) -> DatabaseResult<Consumer> {
        let mut tables = self.tables.write();
        ensure_new(&tables.consumers, consumer.id, "consumer")?;
        if tables.consumers.values().any(|c| c.name == consumer.name) {
            return Err(DatabaseError::already_exists("consumer", "consumers_name_key"));
        }
        if tables
            .consumers
            .values()
            .any(|c| c.client_id == consumer.client_id)
        {
            return Err(DatabaseError::already_exists("consumer", "consumers_client_id_key"));
        }
        tables.consumers.insert(consumer.id, consumer.clone());
        Ok(consumer.clone())
    }

    async fn find_consumer(&self, id: Uuid) -> DatabaseResult<Option<Consumer>> {
        Ok(self.tables.read().consumers.get(&id).cloned())
    }

    async fn find_consumer_by_client_id(&self, client_id: &str) -> DatabaseResult<Option<Consumer>> {
        Ok(self
            .tables
            .read()
            .consumers
            .values()
            .find(|c| c.client_id == client_id)
            .cloned())
    }

    async fn list_consumers(&self, page: PageRequest) -> DatabaseResult<Paged<Consumer>> {
        Ok(page_of(&self.tables.read().consumers, page, |c| c.created_date))
    }

    async fn update_consumer(&self, consumer: &Consumer) -> DatabaseResult<Consumer> {
        let mut tables = self.tables.write();
        let others = tables.consumers.values().filter(|c| c.id != consumer.id);
        for other in others {
            if other.name == consumer.name {
                return Err(DatabaseError::already_exists("consumer", "consumers_name_key"));
            }
            if other.client_id == consumer.client_id {
                return Err(DatabaseError::already_exists("consumer", "consumers_client_id_key"));
            }
        }
        let stored = tables
            .consumers
            .get_mut(&consumer.id)
            .ok_or_else(|| DatabaseError::not_found("consumer", consumer.id))?;
        let created_by = std::mem::take(&mut stored.created_by);
        let created_date = stored.created_date;
        *stored = Consumer {
            created_by,
            created_date,
            ..consumer.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_consumer(&self, id: Uuid) -> DatabaseResult<Consumer> {
        let mut tables = self.tables.write();
        if tables.adoptions.values().any(|a| a.consumer_id == id) {
            return Err(DatabaseError::foreign_key(
                "consumer",
                "consumer_adoptions_consumer_id_fkey",
            ));
        }
        tables
            .consumers
            .remove(&id)
            .ok_or_else(|| DatabaseError::not_found("consumer", id))
    }
}

#[async_trait]
impl ConsumerAdoptionStore for MemoryStorage {
    async fn create_adoption(&self, adoption: &ConsumerAdoption) -> DatabaseResult<ConsumerAdoption> {
        let mut tables = self.tables.write();
        ensure_new(&tables.adoptions, adoption.id, "consumer adoption")?;
        if !tables.consumers.contains_key(&adoption.consumer_id) {
            return Err(DatabaseError::foreign_key(
                "consumer adoption",
                "consumer_adoptions_consumer_id_fkey",
            ));
        }
        if !tables.decisions.contains_key(&adoption.decision_id) {
            return Err(DatabaseError::foreign_key(
                "consumer adoption",
                "consumer_adoptions_decision_id_fkey",
            ));
        }
        if tables.adoptions.values().any(|a| {
            a.consumer_id == adoption.consumer_id && a.decision_id == adoption.decision_id
        }) {
            return Err(DatabaseError::already_exists(
                "consumer adoption",
                "consumer_adoptions_consumer_id_decision_id_key",
            ));
        }
        tables.adoptions.insert(adoption.id, adoption.clone());
        Ok(adoption.clone())
    }

    async fn find_adoption(&self, id: Uuid) -> DatabaseResult<Option<ConsumerAdoption>> {
        Ok(self.tables.read().adoptions.get(&id).cloned())
    }

    async fn list_adoptions(&self, page: PageRequest) -> DatabaseResult<Paged<ConsumerAdoption>> {
        Ok(page_of(&self.tables.read().adoptions, page, |a| a.created_date))
    }

    async fn update_adoption(&self, adoption: &ConsumerAdoption) -> DatabaseResult<ConsumerAdoption> {
        let mut tables = self.tables.write();
        if !tables.consumers.contains_key(&adoption.consumer_id) {
            return Err(DatabaseError::foreign_key(
                "consumer adoption",
                "consumer_adoptions_consumer_id_fkey",
            ));
        }
        if !tables.decisions.contains_key(&adoption.decision_id) {
            return Err(DatabaseError::foreign_key(
                "consumer adoption",
                "consumer_adoptions_decision_id_fkey",
            ));
        }
        if tables.adoptions.values().any(|a| {
            a.id != adoption.id
                && a.consumer_id == adoption.consumer_id
                && a.decision_id == adoption.decision_id
        }) {
            return Err(DatabaseError::already_exists(
                "consumer adoption",
                "consumer_adoptions_consumer_id_decision_id_key",
            ));
        }
        let stored = tables
            .adoptions
            .get_mut(&adoption.id)
            .ok_or_else(|| DatabaseError::not_found("consumer adoption", adoption.id))?;
        let created_by = std::mem::take(&mut stored.created_by);
        let created_date = stored.created_date;
        *stored = ConsumerAdoption {
            created_by,
            created_date,
            ..adoption.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_adoption(&self, id: Uuid) -> DatabaseResult<ConsumerAdoption> {
        self.tables
            .write()
            .adoptions
            .remove(&id)
            .ok_or_else(|| DatabaseError::not_found("consumer adoption", id))
    }

    async fn list_adopted_decision_ids(&self, consumer_id: Uuid) -> DatabaseResult<Vec<Uuid>> {
        Ok(self
            .tables
            .read()
            .adoptions
            .values()
            .filter(|a| a.consumer_id == consumer_id)
            .map(|a| a.decision_id)
            .collect())
    }
}

#[async_trait]
impl AuditStore for MemoryStorage {
    async fn create_audit(&self, audit: &Audit) -> DatabaseResult<Audit> {
        let mut tables = self.tables.write();
        ensure_new(&tables.audits, audit.id, "audit")?;
        tables.audits.insert(audit.id, audit.clone());
        Ok(audit.clone())
    }

    async fn find_audit(&self, id: Uuid) -> DatabaseResult<Option<Audit>> {
        Ok(self.tables.read().audits.get(&id).cloned())
    }

    async fn list_audits(&self, page: PageRequest) -> DatabaseResult<Paged<Audit>> {
        let tables = self.tables.read();
        let mut items: Vec<&Audit> = tables.audits.values().collect();
        // newest first
        items.sort_by_key(|a| std::cmp::Reverse(a.created_date));
        Ok(Paged {
            total: i64::try_from(items.len()).unwrap_or(i64::MAX),
            items: page.slice(items.into_iter().cloned()),
        })
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn is_healthy(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
