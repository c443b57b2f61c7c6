//! Internal implementation of the canonical record identifier.
//!
//! This module contains the implementation details for the UUID-based record
//! identifiers used throughout fhir-bridge.

use crate::{UuidError, UuidResult};
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// fhir-bridge's canonical UUID representation (32 lowercase hex characters, no hyphens).
///
/// This wrapper type guarantees that once constructed, the contained UUID is in the
/// canonical format. It provides type safety for identifier operations and ensures
/// consistent path derivation across the system.
///
/// # When to use this type
/// Use this wrapper whenever you are:
/// - Accepting a record id string from *outside* the core (CLI input, API request, etc), or
/// - Deriving a sharded storage path for a conversion record.
/// - Generating new conversion record identifiers.
///
/// Once you have a `RecordUuid`, you can safely assume the internal UUID is valid
/// and in canonical form.
///
/// # Construction
/// - [`RecordUuid::new`] generates a new canonical UUID (for new conversion records).
/// - [`RecordUuid::parse`] validates an externally supplied identifier.
///
/// # Errors
/// [`RecordUuid::parse`] returns [`UuidError::InvalidInput`] if the input is not already
/// canonical.
///
/// # Display format
/// When displayed or converted to string, `RecordUuid` always produces the canonical
/// 32-character lowercase hex format without hyphens.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordUuid(Uuid);

impl Default for RecordUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordUuid {
    /// Generates a new UUID in canonical form.
    ///
    /// This is suitable for allocating a fresh identifier when a conversion request or
    /// generated FHIR resource is first persisted. The generated UUID follows RFC 4122
    /// version 4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses a UUID string that must already be in canonical form.
    ///
    /// This does **not** normalise other common UUID forms (for example, hyphenated or
    /// uppercase). Callers must provide the canonical representation. This strict validation
    /// ensures consistency and prevents issues with different UUID representations.
    ///
    /// # Arguments
    ///
    /// * `input` - UUID string to validate and wrap. Must be exactly 32 lowercase hex characters.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if Self::is_canonical(input) {
            // SAFETY: is_canonical guarantees valid hex, so parse_str will succeed
            let uuid = Uuid::parse_str(input).expect("is_canonical guarantees valid UUID");
            return Ok(Self(uuid));
        }
        Err(UuidError::InvalidInput(format!(
            "record id must be 32 lowercase hex characters without hyphens, got: '{}'",
            input
        )))
    }

    /// Returns the identifier as a `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is in canonical UUID form.
    ///
    /// This is a purely syntactic check that validates:
    /// - Exactly 32 bytes long
    /// - Contains only lowercase hex characters (`0-9` and `a-f`)
    ///
    /// This method is fast and can be used for pre-validation before calling [`parse`].
    ///
    /// [`parse`]: RecordUuid::parse
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns `parent_dir/<s1>/<s2>/<uuid>/` where `s1`/`s2` are derived from this UUID.
    ///
    /// This implements the sharding scheme:
    /// - `s1` is the first two hex characters of the UUID
    /// - `s2` is the next two hex characters
    /// - The full UUID forms the leaf directory
    ///
    /// This sharding prevents filesystem performance issues with large numbers of conversion
    /// record directories in a single location.
    ///
    /// # Arguments
    ///
    /// * `parent_dir` - Base directory under which to shard the UUID.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.0.simple().to_string();
        let s1 = &canonical[0..2];
        let s2 = &canonical[2..4];
        parent_dir.join(s1).join(s2).join(&canonical)
    }
}

impl fmt::Display for RecordUuid {
    /// Formats the identifier in canonical form (32 lowercase hex characters, no hyphens).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display in canonical (simple) form
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for RecordUuid {
    type Err = UuidError;

    /// Parses a string into a `RecordUuid`, requiring canonical form.
    ///
    /// This is equivalent to calling [`RecordUuid::parse`].
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if the string is not in canonical UUID form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordUuid::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RecordUuid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RecordUuid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordUuid::parse(&s).map_err(serde::de::Error::custom)
    }
}
