//! Common error handling utilities for the opt-out service
//!
//! Shared by every crate in the workspace so that storage, external-service
//! and HTTP layers agree on:
//!
//! - **Error codes**: stable identifiers returned in API error bodies
//! - **Error categories**: the coarse class used for HTTP status mapping
//! - **Field errors**: validation problems collected per field
//!
//! # Example
//!
//! ```rust
//! use error_common::{codes, ErrorCategory, FieldErrors};
//!
//! fn validate_surname(surname: &str) -> Result<(), FieldErrors> {
//!     let mut errors = FieldErrors::new();
//!     errors.require("surname", !surname.trim().is_empty(), "Surname is required");
//!     errors.into_result()
//! }
//!
//! assert!(validate_surname("").is_err());
//! assert_eq!(codes::validation::INVALID_INPUT, "VALIDATION_1001");
//! assert_eq!(ErrorCategory::Validation.as_str(), "validation_error");
//! ```

pub mod codes;
pub mod types;

pub use types::*;
