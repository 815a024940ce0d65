// Postgres storage backend
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::connection::DatabasePool;
use crate::error::{DatabaseError, DatabaseResult};
use crate::models::{
    Audit, Consumer, ConsumerAdoption, Decision, DecisionType, PageRequest, Paged, Patient,
    PendingDecision,
};
use crate::store::{
    AuditStore, ConsumerAdoptionStore, ConsumerStore, DecisionStore, DecisionTypeStore,
    PatientStore, Storage,
};

/// Storage brokers over a Postgres pool.
#[derive(Clone)]
pub struct PgStorage {
    pool: DatabasePool,
}

impl PgStorage {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    fn db(&self) -> &PgPool {
        self.pool.pool()
    }

    async fn count(&self, table: &'static str) -> DatabaseResult<i64> {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(self.db())
            .await
            .map_err(|e| DatabaseError::from_sqlx(table, e))
    }
}

#[async_trait]
impl PatientStore for PgStorage {
    async fn create_patient(&self, patient: &Patient) -> DatabaseResult<Patient> {
        sqlx::query_as::<_, Patient>(
            r#"
            INSERT INTO patients (
                id, nhs_number, title, given_name, surname, date_of_birth, gender,
                email, phone, address, post_code,
                validation_code, validation_code_expires_on, validation_code_matched_on,
                retry_count, notification_preference,
                created_by, created_date, updated_by, updated_date
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
            )
            RETURNING *
            "#,
        )
        .bind(patient.id)
        .bind(&patient.nhs_number)
        .bind(&patient.title)
        .bind(&patient.given_name)
        .bind(&patient.surname)
        .bind(patient.date_of_birth)
        .bind(&patient.gender)
        .bind(&patient.email)
        .bind(&patient.phone)
        .bind(&patient.address)
        .bind(&patient.post_code)
        .bind(&patient.validation_code)
        .bind(patient.validation_code_expires_on)
        .bind(patient.validation_code_matched_on)
        .bind(patient.retry_count)
        .bind(patient.notification_preference)
        .bind(&patient.created_by)
        .bind(patient.created_date)
        .bind(&patient.updated_by)
        .bind(patient.updated_date)
        .fetch_one(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("patient", e))
    }

    async fn find_patient(&self, id: Uuid) -> DatabaseResult<Option<Patient>> {
        sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db())
            .await
            .map_err(|e| DatabaseError::from_sqlx("patient", e))
    }

    async fn find_patient_by_nhs_number(&self, nhs_number: &str) -> DatabaseResult<Option<Patient>> {
        sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE nhs_number = $1")
            .bind(nhs_number)
            .fetch_optional(self.db())
            .await
            .map_err(|e| DatabaseError::from_sqlx("patient", e))
    }

    async fn list_patients(&self, page: PageRequest) -> DatabaseResult<Paged<Patient>> {
        let items = sqlx::query_as::<_, Patient>(
            "SELECT * FROM patients ORDER BY created_date LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("patient", e))?;

        Ok(Paged {
            items,
            total: self.count("patients").await?,
        })
    }

    async fn update_patient(&self, patient: &Patient) -> DatabaseResult<Patient> {
        sqlx::query_as::<_, Patient>(
            r#"
            UPDATE patients SET
                nhs_number = $2, title = $3, given_name = $4, surname = $5,
                date_of_birth = $6, gender = $7, email = $8, phone = $9,
                address = $10, post_code = $11, validation_code = $12,
                validation_code_expires_on = $13, validation_code_matched_on = $14,
                retry_count = $15, notification_preference = $16,
                updated_by = $17, updated_date = $18
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(patient.id)
        .bind(&patient.nhs_number)
        .bind(&patient.title)
        .bind(&patient.given_name)
        .bind(&patient.surname)
        .bind(patient.date_of_birth)
        .bind(&patient.gender)
        .bind(&patient.email)
        .bind(&patient.phone)
        .bind(&patient.address)
        .bind(&patient.post_code)
        .bind(&patient.validation_code)
        .bind(patient.validation_code_expires_on)
        .bind(patient.validation_code_matched_on)
        .bind(patient.retry_count)
        .bind(patient.notification_preference)
        .bind(&patient.updated_by)
        .bind(patient.updated_date)
        .fetch_optional(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("patient", e))?
        .ok_or_else(|| DatabaseError::not_found("patient", patient.id))
    }

    async fn delete_patient(&self, id: Uuid) -> DatabaseResult<Patient> {
        sqlx::query_as::<_, Patient>("DELETE FROM patients WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(self.db())
            .await
            .map_err(|e| DatabaseError::from_sqlx("patient", e))?
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
        sqlx::query_as::<_, Patient>(
            r#"
            UPDATE patients SET
                retry_count = retry_count + 1,
                updated_by = $4, updated_date = $5
            WHERE id = $1
              AND validation_code = $2
              AND validation_code_matched_on IS NULL
              AND retry_count < $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(max_retry_count)
        .bind(actor)
        .bind(now)
        .fetch_optional(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("patient", e))
    }

    async fn mark_code_matched(
        &self,
        id: Uuid,
        code: &str,
        max_retry_count: i32,
        actor: &str,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Patient>> {
        sqlx::query_as::<_, Patient>(
            r#"
            UPDATE patients SET
                validation_code_matched_on = $5,
                updated_by = $4, updated_date = $5
            WHERE id = $1
              AND validation_code = $2
              AND validation_code_matched_on IS NULL
              AND retry_count < $3
              AND validation_code_expires_on >= $5
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(max_retry_count)
        .bind(actor)
        .bind(now)
        .fetch_optional(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("patient", e))
    }
}

#[async_trait]
impl DecisionTypeStore for PgStorage {
    async fn create_decision_type(&self, decision_type: &DecisionType) -> DatabaseResult<DecisionType> {
        sqlx::query_as::<_, DecisionType>(
            r#"
            INSERT INTO decision_types (id, name, created_by, created_date, updated_by, updated_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(decision_type.id)
        .bind(&decision_type.name)
        .bind(&decision_type.created_by)
        .bind(decision_type.created_date)
        .bind(&decision_type.updated_by)
        .bind(decision_type.updated_date)
        .fetch_one(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("decision type", e))
    }

    async fn find_decision_type(&self, id: Uuid) -> DatabaseResult<Option<DecisionType>> {
        sqlx::query_as::<_, DecisionType>("SELECT * FROM decision_types WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db())
            .await
            .map_err(|e| DatabaseError::from_sqlx("decision type", e))
    }

    async fn list_decision_types(&self, page: PageRequest) -> DatabaseResult<Paged<DecisionType>> {
        let items = sqlx::query_as::<_, DecisionType>(
            "SELECT * FROM decision_types ORDER BY created_date LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("decision type", e))?;

        Ok(Paged {
            items,
            total: self.count("decision_types").await?,
        })
    }

    async fn update_decision_type(&self, decision_type: &DecisionType) -> DatabaseResult<DecisionType> {
        sqlx::query_as::<_, DecisionType>(
            r#"
            UPDATE decision_types SET name = $2, updated_by = $3, updated_date = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(decision_type.id)
        .bind(&decision_type.name)
        .bind(&decision_type.updated_by)
        .bind(decision_type.updated_date)
        .fetch_optional(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("decision type", e))?
        .ok_or_else(|| DatabaseError::not_found("decision type", decision_type.id))
    }

    async fn delete_decision_type(&self, id: Uuid) -> DatabaseResult<DecisionType> {
        sqlx::query_as::<_, DecisionType>("DELETE FROM decision_types WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(self.db())
            .await
            .map_err(|e| DatabaseError::from_sqlx("decision type", e))?
            .ok_or_else(|| DatabaseError::not_found("decision type", id))
    }
}

#[async_trait]
impl DecisionStore for PgStorage {
    async fn create_decision(&self, decision: &Decision) -> DatabaseResult<Decision> {
        sqlx::query_as::<_, Decision>(
            r#"
            INSERT INTO decisions (
                id, patient_id, decision_type_id, decision_choice,
                responsible_person_given_name, responsible_person_surname,
                responsible_person_relationship,
                created_by, created_date, updated_by, updated_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(decision.id)
        .bind(decision.patient_id)
        .bind(decision.decision_type_id)
        .bind(&decision.decision_choice)
        .bind(&decision.responsible_person_given_name)
        .bind(&decision.responsible_person_surname)
        .bind(&decision.responsible_person_relationship)
        .bind(&decision.created_by)
        .bind(decision.created_date)
        .bind(&decision.updated_by)
        .bind(decision.updated_date)
        .fetch_one(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("decision", e))
    }

    async fn create_verified_decision(&self, decision: &Decision) -> DatabaseResult<Option<Decision>> {
        let mut tx = self
            .db()
            .begin()
            .await
            .map_err(|e| DatabaseError::from_sqlx("decision", e))?;

        let consumed = sqlx::query(
            r#"
            UPDATE patients SET
                validation_code = NULL,
                validation_code_expires_on = NULL,
                validation_code_matched_on = NULL,
                retry_count = 0,
                updated_by = $2, updated_date = $3
            WHERE id = $1 AND validation_code_matched_on IS NOT NULL
            "#,
        )
        .bind(decision.patient_id)
        .bind(&decision.created_by)
        .bind(decision.created_date)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx("patient", e))?;

        if consumed.rows_affected() != 1 {
            // Dropping the transaction rolls it back
            return Ok(None);
        }

        let stored = sqlx::query_as::<_, Decision>(
            r#"
            INSERT INTO decisions (
                id, patient_id, decision_type_id, decision_choice,
                responsible_person_given_name, responsible_person_surname,
                responsible_person_relationship,
                created_by, created_date, updated_by, updated_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(decision.id)
        .bind(decision.patient_id)
        .bind(decision.decision_type_id)
        .bind(&decision.decision_choice)
        .bind(&decision.responsible_person_given_name)
        .bind(&decision.responsible_person_surname)
        .bind(&decision.responsible_person_relationship)
        .bind(&decision.created_by)
        .bind(decision.created_date)
        .bind(&decision.updated_by)
        .bind(decision.updated_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx("decision", e))?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::from_sqlx("decision", e))?;
        Ok(Some(stored))
    }

    async fn find_decision(&self, id: Uuid) -> DatabaseResult<Option<Decision>> {
        sqlx::query_as::<_, Decision>("SELECT * FROM decisions WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db())
            .await
            .map_err(|e| DatabaseError::from_sqlx("decision", e))
    }

    async fn list_decisions(&self, page: PageRequest) -> DatabaseResult<Paged<Decision>> {
        let items = sqlx::query_as::<_, Decision>(
            "SELECT * FROM decisions ORDER BY created_date LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("decision", e))?;

        Ok(Paged {
            items,
            total: self.count("decisions").await?,
        })
    }

    async fn update_decision(&self, decision: &Decision) -> DatabaseResult<Decision> {
        sqlx::query_as::<_, Decision>(
            r#"
            UPDATE decisions SET
                patient_id = $2, decision_type_id = $3, decision_choice = $4,
                responsible_person_given_name = $5, responsible_person_surname = $6,
                responsible_person_relationship = $7,
                updated_by = $8, updated_date = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(decision.id)
        .bind(decision.patient_id)
        .bind(decision.decision_type_id)
        .bind(&decision.decision_choice)
        .bind(&decision.responsible_person_given_name)
        .bind(&decision.responsible_person_surname)
        .bind(&decision.responsible_person_relationship)
        .bind(&decision.updated_by)
        .bind(decision.updated_date)
        .fetch_optional(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("decision", e))?
        .ok_or_else(|| DatabaseError::not_found("decision", decision.id))
    }

    async fn delete_decision(&self, id: Uuid) -> DatabaseResult<Decision> {
        sqlx::query_as::<_, Decision>("DELETE FROM decisions WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(self.db())
            .await
            .map_err(|e| DatabaseError::from_sqlx("decision", e))?
            .ok_or_else(|| DatabaseError::not_found("decision", id))
    }

    async fn list_pending_decisions(&self, consumer_id: Uuid) -> DatabaseResult<Vec<PendingDecision>> {
        sqlx::query_as::<_, PendingDecision>(
            r#"
            SELECT d.*, p.nhs_number, t.name AS decision_type_name
            FROM decisions d
            JOIN patients p ON p.id = d.patient_id
            JOIN decision_types t ON t.id = d.decision_type_id
            WHERE NOT EXISTS (
                SELECT 1 FROM consumer_adoptions a
                WHERE a.decision_id = d.id AND a.consumer_id = $1
            )
            ORDER BY d.created_date
            "#,
        )
        .bind(consumer_id)
        .fetch_all(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("decision", e))
    }
}

#[async_trait]
impl ConsumerStore for PgStorage {
    async fn create_consumer(&self, consumer: &Consumer) -> DatabaseResult<Consumer> {
        sqlx::query_as::<_, Consumer>(
            r#"
            INSERT INTO consumers (
                id, name, client_id, contact_person, contact_email, contact_number,
                is_active, created_by, created_date, updated_by, updated_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(consumer.id)
        .bind(&consumer.name)
        .bind(&consumer.client_id)
        .bind(&consumer.contact_person)
        .bind(&consumer.contact_email)
        .bind(&consumer.contact_number)
        .bind(consumer.is_active)
        .bind(&consumer.created_by)
        .bind(consumer.created_date)
        .bind(&consumer.updated_by)
        .bind(consumer.updated_date)
        .fetch_one(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("consumer", e))
    }

    async fn find_consumer(&self, id: Uuid) -> DatabaseResult<Option<Consumer>> {
        sqlx::query_as::<_, Consumer>("SELECT * FROM consumers WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db())
            .await
            .map_err(|e| DatabaseError::from_sqlx("consumer", e))
    }

    async fn find_consumer_by_client_id(&self, client_id: &str) -> DatabaseResult<Option<Consumer>> {
        sqlx::query_as::<_, Consumer>("SELECT * FROM consumers WHERE client_id = $1")
            .bind(client_id)
            .fetch_optional(self.db())
            .await
            .map_err(|e| DatabaseError::from_sqlx("consumer", e))
    }

    async fn list_consumers(&self, page: PageRequest) -> DatabaseResult<Paged<Consumer>> {
        let items = sqlx::query_as::<_, Consumer>(
            "SELECT * FROM consumers ORDER BY created_date LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("consumer", e))?;

        Ok(Paged {
            items,
            total: self.count("consumers").await?,
        })
    }

    async fn update_consumer(&self, consumer: &Consumer) -> DatabaseResult<Consumer> {
        sqlx::query_as::<_, Consumer>(
            r#"
            UPDATE consumers SET
                name = $2, client_id = $3, contact_person = $4, contact_email = $5,
                contact_number = $6, is_active = $7, updated_by = $8, updated_date = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(consumer.id)
        .bind(&consumer.name)
        .bind(&consumer.client_id)
        .bind(&consumer.contact_person)
        .bind(&consumer.contact_email)
        .bind(&consumer.contact_number)
        .bind(consumer.is_active)
        .bind(&consumer.updated_by)
        .bind(consumer.updated_date)
        .fetch_optional(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("consumer", e))?
        .ok_or_else(|| DatabaseError::not_found("consumer", consumer.id))
    }

    async fn delete_consumer(&self, id: Uuid) -> DatabaseResult<Consumer> {
        sqlx::query_as::<_, Consumer>("DELETE FROM consumers WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(self.db())
            .await
            .map_err(|e| DatabaseError::from_sqlx("consumer", e))?
            .ok_or_else(|| DatabaseError::not_found("consumer", id))
    }
}

#[async_trait]
impl ConsumerAdoptionStore for PgStorage {
    async fn create_adoption(&self, adoption: &ConsumerAdoption) -> DatabaseResult<ConsumerAdoption> {
        sqlx::query_as::<_, ConsumerAdoption>(
            r#"
            INSERT INTO consumer_adoptions (
                id, consumer_id, decision_id, adoption_date,
                created_by, created_date, updated_by, updated_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(adoption.id)
        .bind(adoption.consumer_id)
        .bind(adoption.decision_id)
        .bind(adoption.adoption_date)
        .bind(&adoption.created_by)
        .bind(adoption.created_date)
        .bind(&adoption.updated_by)
        .bind(adoption.updated_date)
        .fetch_one(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("consumer adoption", e))
    }

    async fn find_adoption(&self, id: Uuid) -> DatabaseResult<Option<ConsumerAdoption>> {
        sqlx::query_as::<_, ConsumerAdoption>("SELECT * FROM consumer_adoptions WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db())
            .await
            .map_err(|e| DatabaseError::from_sqlx("consumer adoption", e))
    }

    async fn list_adoptions(&self, page: PageRequest) -> DatabaseResult<Paged<ConsumerAdoption>> {
        let items = sqlx::query_as::<_, ConsumerAdoption>(
            "SELECT * FROM consumer_adoptions ORDER BY created_date LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("consumer adoption", e))?;

        Ok(Paged {
            items,
            total: self.count("consumer_adoptions").await?,
        })
    }

    async fn update_adoption(&self, adoption: &ConsumerAdoption) -> DatabaseResult<ConsumerAdoption> {
        sqlx::query_as::<_, ConsumerAdoption>(
            r#"
            UPDATE consumer_adoptions SET
                consumer_id = $2, decision_id = $3, adoption_date = $4,
                updated_by = $5, updated_date = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(adoption.id)
        .bind(adoption.consumer_id)
        .bind(adoption.decision_id)
        .bind(adoption.adoption_date)
        .bind(&adoption.updated_by)
        .bind(adoption.updated_date)
        .fetch_optional(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("consumer adoption", e))?
        .ok_or_else(|| DatabaseError::not_found("consumer adoption", adoption.id))
    }

    async fn delete_adoption(&self, id: Uuid) -> DatabaseResult<ConsumerAdoption> {
        sqlx::query_as::<_, ConsumerAdoption>(
            "DELETE FROM consumer_adoptions WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("consumer adoption", e))?
        .ok_or_else(|| DatabaseError::not_found("consumer adoption", id))
    }

    async fn list_adopted_decision_ids(&self, consumer_id: Uuid) -> DatabaseResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT decision_id FROM consumer_adoptions WHERE consumer_id = $1",
        )
        .bind(consumer_id)
        .fetch_all(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("consumer adoption", e))
    }
}

#[async_trait]
impl AuditStore for PgStorage {
    async fn create_audit(&self, audit: &Audit) -> DatabaseResult<Audit> {
        sqlx::query_as::<_, Audit>(
            r#"
            INSERT INTO audits (
                id, correlation_id, audit_type, title, message, log_level,
                created_by, created_date, updated_by, updated_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(audit.id)
        .bind(&audit.correlation_id)
        .bind(&audit.audit_type)
        .bind(&audit.title)
        .bind(&audit.message)
        .bind(&audit.log_level)
        .bind(&audit.created_by)
        .bind(audit.created_date)
        .bind(&audit.updated_by)
        .bind(audit.updated_date)
        .fetch_one(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("audit", e))
    }

    async fn find_audit(&self, id: Uuid) -> DatabaseResult<Option<Audit>> {
        sqlx::query_as::<_, Audit>("SELECT * FROM audits WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db())
            .await
            .map_err(|e| DatabaseError::from_sqlx("audit", e))
    }

    async fn list_audits(&self, page: PageRequest) -> DatabaseResult<Paged<Audit>> {
        let items = sqlx::query_as::<_, Audit>(
            "SELECT * FROM audits ORDER BY created_date DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.db())
        .await
        .map_err(|e| DatabaseError::from_sqlx("audit", e))?;

        Ok(Paged {
            items,
            total: self.count("audits").await?,
        })
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn is_healthy(&self) -> bool {
        self.pool.is_healthy().await
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
