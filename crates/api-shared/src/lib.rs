//! # API Shared
//!
//! Shared utilities and definitions for fhir-bridge API surfaces.
//!
//! Contains:
//! - Caller identity resolution from API keys (`auth` module)
//! - Shared services like `HealthService`
//!
//! Used by the REST binary for common functionality.

pub mod auth;
pub mod health;

pub use auth::{caller_for_api_key, AuthError};
pub use health::{HealthRes, HealthService};
