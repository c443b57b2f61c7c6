//! # Bridge Core
//!
//! Core conversion pipeline for fhir-bridge.
//!
//! This crate contains the whole intake-to-FHIR conversion pipeline behind the API
//! surfaces:
//! - Input validation resolving raw caller JSON into a typed intake payload
//! - The conversion orchestrator (`ConversionService`): validate, persist, map,
//!   validate FHIR, record the outcome, and replay stored requests
//! - Durable conversion records in a sharded JSON file store under the configured
//!   data directory
//!
//! **No API concerns**: Authentication, HTTP servers, or OpenAPI schemas for request
//! DTOs belong in the REST binary and `api-shared`.

pub mod config;
pub mod constants;
pub mod conversion;
pub mod entities;
pub mod error;
pub mod repositories;
pub mod validation;

pub use config::CoreConfig;
pub use conversion::{ConversionOutcome, ConversionService};
pub use entities::{
    Access, ConversionRequest, ConversionStatus, FhirResourceRecord, StoredInput,
};
pub use error::{ConversionError, ConversionResult};
pub use validation::{validate_intake, InvalidIntake};

// Re-export the canonical record identifier for callers of the core API.
pub use bridge_uuid::{RecordUuid, UuidError};
