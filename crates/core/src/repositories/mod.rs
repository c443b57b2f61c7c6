//! Conversion record store.
//!
//! This module contains the file-backed repositories for conversion requests and their
//! generated FHIR resources, plus shared directory helpers.

pub mod helpers;
pub mod requests;
pub mod resources;

pub use requests::ConversionRequestRepository;
pub use resources::FhirResourceRepository;
