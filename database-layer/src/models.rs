// Persisted entities
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Channel used to deliver a validation code to the patient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationPreference {
    Email,
    Sms,
    Letter,
}

impl NotificationPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPreference::Email => "email",
            NotificationPreference::Sms => "sms",
            NotificationPreference::Letter => "letter",
        }
    }
}

impl std::fmt::Display for NotificationPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A patient known locally, refreshed from PDS whenever a code is requested.
///
/// The validation code itself is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Patient {
    pub id: Uuid,
    pub nhs_number: String,
    pub title: Option<String>,
    pub given_name: String,
    pub surname: String,
    pub date_of_birth: NaiveDate,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub post_code: Option<String>,
    #[serde(skip_serializing, default)]
    pub validation_code: Option<String>,
    pub validation_code_expires_on: Option<DateTime<Utc>>,
    pub validation_code_matched_on: Option<DateTime<Utc>>,
    pub retry_count: i32,
    pub notification_preference: NotificationPreference,
    pub created_by: String,
    pub created_date: DateTime<Utc>,
    pub updated_by: String,
    pub updated_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DecisionType {
    pub id: Uuid,
    pub name: String,
    pub created_by: String,
    pub created_date: DateTime<Utc>,
    pub updated_by: String,
    pub updated_date: DateTime<Utc>,
}

/// A recorded consent choice. The responsible-person fields are set when a
/// parent or guardian acts for the patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Decision {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub decision_type_id: Uuid,
    pub decision_choice: Option<String>,
    pub responsible_person_given_name: Option<String>,
    pub responsible_person_surname: Option<String>,
    pub responsible_person_relationship: Option<String>,
    pub created_by: String,
    pub created_date: DateTime<Utc>,
    pub updated_by: String,
    pub updated_date: DateTime<Utc>,
}

/// A decision not yet adopted by a given consumer, with the context the
/// consumer needs to act on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PendingDecision {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub decision: Decision,
    pub nhs_number: String,
    pub decision_type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Consumer {
    pub id: Uuid,
    pub name: String,
    /// Matched against the `sub` claim of the caller's bearer token
    pub client_id: String,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub contact_number: Option<String>,
    pub is_active: bool,
    pub created_by: String,
    pub created_date: DateTime<Utc>,
    pub updated_by: String,
    pub updated_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ConsumerAdoption {
    pub id: Uuid,
    pub consumer_id: Uuid,
    pub decision_id: Uuid,
    pub adoption_date: DateTime<Utc>,
    pub created_by: String,
    pub created_date: DateTime<Utc>,
    pub updated_by: String,
    pub updated_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Audit {
    pub id: Uuid,
    pub correlation_id: String,
    pub audit_type: String,
    pub title: String,
    pub message: String,
    pub log_level: String,
    pub created_by: String,
    pub created_date: DateTime<Utc>,
    pub updated_by: String,
    pub updated_date: DateTime<Utc>,
}

/// Offset/limit window for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset: offset.max(0),
            limit: limit.max(0),
        }
    }

    /// Apply the window to an already ordered iterator.
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(usize::try_from(self.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(self.limit).unwrap_or(0))
            .collect()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { offset: 0, limit: 20 }
    }
}

/// One page of results plus the total number of rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
}
