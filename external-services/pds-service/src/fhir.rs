//! FHIR R4 client for the Personal Demographics Service.
//!
//! Only the parts of the Patient resource the service uses are modelled;
//! everything else in the payload is ignored.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::broker::PdsBroker;
use crate::error::{PdsError, PdsResult};
use crate::models::{PatientSearchCriteria, PdsPatient};

const FHIR_JSON: &str = "application/fhir+json";
const NHS_NUMBER_SYSTEM: &str = "https://fhir.nhs.uk/Id/nhs-number";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FhirPatient {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    identifier: Vec<FhirIdentifier>,
    #[serde(default)]
    name: Vec<FhirHumanName>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    birth_date: Option<String>,
    #[serde(default)]
    address: Vec<FhirAddress>,
    #[serde(default)]
    telecom: Vec<FhirContactPoint>,
}

#[derive(Debug, Deserialize)]
struct FhirIdentifier {
    #[serde(default)]
    system: Option<String>,
    value: String,
}

#[derive(Debug, Deserialize)]
struct FhirHumanName {
    #[serde(rename = "use", default)]
    name_use: Option<String>,
    #[serde(default)]
    prefix: Vec<String>,
    #[serde(default)]
    given: Vec<String>,
    #[serde(default)]
    family: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FhirAddress {
    #[serde(rename = "use", default)]
    address_use: Option<String>,
    #[serde(default)]
    line: Vec<String>,
    #[serde(default)]
    postal_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FhirContactPoint {
    system: String,
    value: String,
    #[serde(rename = "use", default)]
    contact_use: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FhirBundle {
    #[serde(default)]
    entry: Vec<FhirBundleEntry>,
}

#[derive(Debug, Deserialize)]
struct FhirBundleEntry {
    resource: FhirPatient,
}

/// Pick the entry marked with `preferred` use, else the first one.
fn preferred<'a, T>(items: &'a [T], preferred: &str, use_of: impl Fn(&T) -> Option<&str>) -> Option<&'a T> {
    items
        .iter()
        .find(|item| use_of(item) == Some(preferred))
        .or_else(|| items.first())
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl FhirPatient {
    pub(crate) fn into_pds_patient(self) -> PdsResult<PdsPatient> {
        let nhs_number = self
            .identifier
            .iter()
            .find(|i| i.system.as_deref() == Some(NHS_NUMBER_SYSTEM))
            .map(|i| i.value.clone())
            .or(self.id)
            .ok_or_else(|| PdsError::InvalidResponse("patient has no NHS number".to_string()))?;

        let name = preferred(&self.name, "usual", |n| n.name_use.as_deref())
            .ok_or_else(|| PdsError::InvalidResponse("patient has no name".to_string()))?;
        let surname = name
            .family
            .clone()
            .ok_or_else(|| PdsError::InvalidResponse("patient has no family name".to_string()))?;

        let birth_date = self
            .birth_date
            .as_deref()
            .ok_or_else(|| PdsError::InvalidResponse("patient has no birth date".to_string()))?;
        let date_of_birth = NaiveDate::parse_from_str(birth_date, "%Y-%m-%d")
            .map_err(|e| PdsError::InvalidResponse(format!("bad birth date {birth_date}: {e}")))?;

        let address = preferred(&self.address, "home", |a| a.address_use.as_deref());

        let email = self
            .telecom
            .iter()
            .find(|t| t.system == "email")
            .map(|t| t.value.clone());
        let phones: Vec<&FhirContactPoint> =
            self.telecom.iter().filter(|t| t.system == "phone").collect();
        let phone = phones
            .iter()
            .find(|t| t.contact_use.as_deref() == Some("mobile"))
            .or_else(|| phones.first())
            .map(|t| t.value.clone());

        Ok(PdsPatient {
            nhs_number,
            title: non_empty(name.prefix.join(" ")),
            given_name: name.given.join(" "),
            surname,
            date_of_birth,
            gender: self.gender,
            email,
            phone,
            address: address.and_then(|a| non_empty(a.line.join(", "))),
            post_code: address.and_then(|a| a.postal_code.clone()),
        })
    }
}

impl FhirBundle {
    pub(crate) fn into_pds_patients(self) -> PdsResult<Vec<PdsPatient>> {
        self.entry
            .into_iter()
            .map(|entry| entry.resource.into_pds_patient())
            .collect()
    }
}

/// PDS FHIR API client.
pub struct FhirPdsBroker {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl FhirPdsBroker {
    /// Create a client for `base_url` (e.g. the PDS sandbox
    /// `https://sandbox.api.service.nhs.uk/personal-demographics/FHIR/R4`).
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> PdsResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, FHIR_JSON)
            .header("X-Request-ID", Uuid::new_v4().to_string());
        match &self.api_key {
            Some(key) => builder.header("apikey", key),
            None => builder,
        }
    }

    async fn error_for(response: reqwest::Response) -> PdsError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        PdsError::UnexpectedStatus { status, body }
    }
}

#[async_trait]
impl PdsBroker for FhirPdsBroker {
    async fn get_patient(&self, nhs_number: &str) -> PdsResult<Option<PdsPatient>> {
        let url = format!("{}/Patient/{}", self.base_url, nhs_number);
        let response = self.request(&url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("PDS has no record for the requested NHS number");
            return Ok(None);
        }
        if !status.is_success() {
            let error = Self::error_for(response).await;
            warn!(error = %error, "PDS patient retrieval failed");
            return Err(error);
        }

        let patient: FhirPatient = response.json().await?;
        patient.into_pds_patient().map(Some)
    }

    async fn search_patients(&self, criteria: &PatientSearchCriteria) -> PdsResult<Vec<PdsPatient>> {
        let url = format!("{}/Patient", self.base_url);
        let mut query = vec![
            ("family", criteria.surname.clone()),
            ("birthdate", format!("eq{}", criteria.date_of_birth.format("%Y-%m-%d"))),
        ];
        if let Some(given) = &criteria.given_name {
            query.push(("given", given.clone()));
        }
        if let Some(post_code) = &criteria.post_code {
            query.push(("address-postalcode", post_code.clone()));
        }

        let response = self.request(&url).query(&query).send().await?;
        if !response.status().is_success() {
            let error = Self::error_for(response).await;
            warn!(error = %error, "PDS patient search failed");
            return Err(error);
        }

        let bundle: FhirBundle = response.json().await?;
        let patients = bundle.into_pds_patients()?;
        debug!(matches = patients.len(), "PDS search completed");
        Ok(patients)
    }
}
