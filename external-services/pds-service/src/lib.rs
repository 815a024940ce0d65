//! Personal Demographics Service (PDS) integration
//!
//! [`PdsBroker`] is the seam the rest of the service depends on. Two
//! implementations ship:
//!
//! - [`FhirPdsBroker`] calls the PDS FHIR R4 API over HTTPS
//! - [`FakePdsBroker`] answers from a fixed list, loaded from JSON in
//!   development
//!
//! With the `mock` feature the crate also exports `MockPdsBroker`.

pub mod broker;
pub mod error;
pub mod fake;
pub mod fhir;
pub mod models;

pub use broker::PdsBroker;
#[cfg(any(test, feature = "mock"))]
pub use broker::MockPdsBroker;
pub use error::{PdsError, PdsResult};
pub use fake::FakePdsBroker;
pub use fhir::FhirPdsBroker;
pub use models::{normalise_post_code, PatientSearchCriteria, PdsPatient};
