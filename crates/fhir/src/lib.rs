//! FHIR wire models, mapping, and structural validation for fhir-bridge.
//!
//! This crate provides the FHIR-facing half of the conversion pipeline:
//! - **Wire models**: strict serde structs matching the FHIR JSON shape of the three
//!   supported resources (Patient, Practitioner, Organization).
//! - **Mappers**: pure translation from a typed intake model to a FHIR JSON string
//!   (`from_intake`). No I/O, no persistence; the same input always produces the same
//!   output.
//! - **Validators**: structural checks that parse generated FHIR JSON back into its wire
//!   shape and assert the minimum required fields, collecting *all* violations into one
//!   [`FhirValidationError`] rather than stopping at the first.
//!
//! Each resource gets a zero-sized facade type (`Patient`, `Practitioner`,
//! `Organization`) carrying its operations as associated functions. Selection by
//! resource type is a `match` in the orchestrator over the closed intake union; there is
//! no runtime registry.

mod datatypes;
pub mod organization;
pub mod patient;
pub mod practitioner;
pub mod validation;

// Re-export facades
pub use organization::Organization;
pub use patient::Patient;
pub use practitioner::Practitioner;

// Re-export validation types
pub use validation::{FhirValidationError, FHIR_VALIDATION_FAILED};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("translation error: {0}")]
    Translation(String),

    #[error(transparent)]
    Validation(#[from] FhirValidationError),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
