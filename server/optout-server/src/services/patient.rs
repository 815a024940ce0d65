use chrono::NaiveDate;
use database_layer::{NotificationPreference, PageRequest, Paged, Patient};
use error_common::FieldErrors;
use pds_service::PdsPatient;
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ServiceContext, ServiceError, ServiceResult};
use crate::validation::{
    check_max_length, check_nhs_number, check_optional_email, normalise_nhs_number, require_id,
    require_text, RequestValidation,
};

const ENTITY: &str = "Patient";

fn default_preference() -> NotificationPreference {
    NotificationPreference::Email
}

/// Admin create/update payload. Validation-code fields are not writable.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PatientRequest {
    pub nhs_number: String,
    #[serde(default)]
    pub title: Option<String>,
    pub given_name: String,
    pub surname: String,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub post_code: Option<String>,
    #[serde(default = "default_preference")]
    pub notification_preference: NotificationPreference,
}

impl RequestValidation for PatientRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_nhs_number(&mut errors, "nhs_number", &normalise_nhs_number(&self.nhs_number));
        require_text(&mut errors, "given_name", &self.given_name);
        require_text(&mut errors, "surname", &self.surname);
        check_optional_email(&mut errors, "email", self.email.as_deref());
        check_max_length(&mut errors, "title", self.title.as_deref(), 35);
        check_max_length(&mut errors, "post_code", self.post_code.as_deref(), 10);
        errors.into_result()
    }
}

impl PatientRequest {
    fn apply_to(self, patient: &mut Patient) {
        patient.nhs_number = normalise_nhs_number(&self.nhs_number);
        patient.title = self.title;
        patient.given_name = self.given_name.trim().to_string();
        patient.surname = self.surname.trim().to_string();
        patient.date_of_birth = self.date_of_birth;
        patient.gender = self.gender;
        patient.email = self.email;
        patient.phone = self.phone;
        patient.address = self.address;
        patient.post_code = self.post_code;
        patient.notification_preference = self.notification_preference;
    }
}

#[derive(Clone)]
pub struct PatientService {
    ctx: ServiceContext,
}

impl PatientService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Blank record stamped for creation by `actor`.
    fn new_record(&self, actor: &str) -> Patient {
        let now = self.ctx.clock.now();
        Patient {
            id: Uuid::new_v4(),
            nhs_number: String::new(),
            title: None,
            given_name: String::new(),
            surname: String::new(),
            date_of_birth: NaiveDate::default(),
            gender: None,
            email: None,
            phone: None,
            address: None,
            post_code: None,
            validation_code: None,
            validation_code_expires_on: None,
            validation_code_matched_on: None,
            retry_count: 0,
            notification_preference: default_preference(),
            created_by: actor.to_string(),
            created_date: now,
            updated_by: actor.to_string(),
            updated_date: now,
        }
    }

    /// # Errors
    ///
    /// Validation failures, a duplicate NHS number, or storage errors.
    pub async fn add_patient(&self, request: PatientRequest, actor: &str) -> ServiceResult<Patient> {
        request.validate()?;
        self.check_date_of_birth(request.date_of_birth)?;

        let mut patient = self.new_record(actor);
        request.apply_to(&mut patient);
        let stored = self.ctx.storage.create_patient(&patient).await?;

        info!(patient_id = %stored.id, "Patient created");
        self.ctx
            .audit_admin_change(actor, "Patient created", format!("Patient {} created", stored.id))
            .await;
        Ok(stored)
    }

    /// # Errors
    ///
    /// [`ServiceError::NotFound`] when no patient has this id.
    pub async fn retrieve_patient(&self, id: Uuid) -> ServiceResult<Patient> {
        let mut errors = FieldErrors::new();
        require_id(&mut errors, "id", id);
        errors.into_result()?;

        self.ctx
            .storage
            .find_patient(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    /// # Errors
    ///
    /// Storage errors only.
    pub async fn list_patients(&self, page: PageRequest) -> ServiceResult<Paged<Patient>> {
        Ok(self.ctx.storage.list_patients(page).await?)
    }

    /// Replace the demographic fields. Validation-code state is kept.
    ///
    /// # Errors
    ///
    /// Validation failures, an unknown id, or a clash with another patient's
    /// NHS number.
    pub async fn modify_patient(
        &self,
        id: Uuid,
        request: PatientRequest,
        actor: &str,
    ) -> ServiceResult<Patient> {
        request.validate()?;
        self.check_date_of_birth(request.date_of_birth)?;

        let mut patient = self.retrieve_patient(id).await?;
        request.apply_to(&mut patient);
        let stored = self.save(patient, actor).await?;

        self.ctx
            .audit_admin_change(actor, "Patient updated", format!("Patient {id} updated"))
            .await;
        Ok(stored)
    }

    /// # Errors
    ///
    /// An unknown id, or a patient that still has decisions.
    pub async fn remove_patient(&self, id: Uuid, actor: &str) -> ServiceResult<Patient> {
        self.retrieve_patient(id).await?;
        let deleted = self.ctx.storage.delete_patient(id).await?;

        self.ctx
            .audit_admin_change(actor, "Patient deleted", format!("Patient {id} deleted"))
            .await;
        Ok(deleted)
    }

    /// # Errors
    ///
    /// Storage errors only.
    pub async fn find_by_nhs_number(&self, nhs_number: &str) -> ServiceResult<Option<Patient>> {
        Ok(self.ctx.storage.find_patient_by_nhs_number(nhs_number).await?)
    }

    /// Local copy of a PDS record, not yet stored.
    pub fn from_pds(&self, record: &PdsPatient, actor: &str) -> Patient {
        let mut patient = self.new_record(actor);
        patient.nhs_number = record.nhs_number.clone();
        refresh_from_pds(&mut patient, record);
        patient
    }

    /// # Errors
    ///
    /// A duplicate NHS number or storage errors.
    pub async fn insert(&self, patient: &Patient) -> ServiceResult<Patient> {
        Ok(self.ctx.storage.create_patient(patient).await?)
    }

    /// Stamp the update fields and write the whole row.
    ///
    /// # Errors
    ///
    /// Storage errors, including a vanished row.
    pub async fn save(&self, mut patient: Patient, actor: &str) -> ServiceResult<Patient> {
        patient.updated_by = actor.to_string();
        patient.updated_date = self.ctx.clock.now();
        Ok(self.ctx.storage.update_patient(&patient).await?)
    }

    fn check_date_of_birth(&self, date_of_birth: NaiveDate) -> ServiceResult<()> {
        let today = self.ctx.clock.now().date_naive();
        if date_of_birth > today {
            return Err(FieldErrors::single("date_of_birth", "Date of birth is in the future").into());
        }
        Ok(())
    }
}

/// Overwrite demographic and contact fields with the PDS values.
pub fn refresh_from_pds(patient: &mut Patient, record: &PdsPatient) {
    patient.title = record.title.clone();
    patient.given_name = record.given_name.clone();
    patient.surname = record.surname.clone();
    patient.date_of_birth = record.date_of_birth;
    patient.gender = record.gender.clone();
    patient.email = record.email.clone();
    patient.phone = record.phone.clone();
    patient.address = record.address.clone();
    patient.post_code = record.post_code.clone();
}
