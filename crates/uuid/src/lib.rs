//! Record identifier and sharded-path utilities.
//!
//! fhir-bridge stores conversion records under sharded directories derived from a UUID.
//!
//! To keep path derivation deterministic and consistent across the codebase, fhir-bridge uses a
//! *canonical* UUID representation for storage identifiers: **32 lowercase hexadecimal
//! characters** (no hyphens).
//!
//! This crate provides:
//! - A small wrapper type ([`RecordUuid`]) that *guarantees* the canonical format once
//!   constructed.
//! - Shared sharding logic to derive record directory locations from an identifier.
//!
//! ## Canonical UUID form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Notes:
//! - This is the same value you would get from `Uuid::new_v4().simple().to_string()`.
//! - Canonical form is *required* for externally supplied identifiers (for example, from CLI/API
//!   inputs). Use [`RecordUuid::parse`] to validate an input string.
//! - Non-canonical values (uppercase, hyphenated, wrong length, non-hex) are rejected.
//!
//! ## Sharded directory layout
//! For a canonical UUID `u`, fhir-bridge stores data under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `conversion_data/conversions/55/0e/550e8400e29b41d4a716446655440000/`
//!
//! This scheme prevents very large fan-out in a single directory when many conversion records
//! accumulate.

mod service;

// Re-export public types
pub use service::{RecordUuid, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
