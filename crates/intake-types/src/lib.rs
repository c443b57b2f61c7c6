//! Intake-side types for fhir-bridge.
//!
//! This crate defines the *non-FHIR* input side of the conversion pipeline:
//! - The closed [`ResourceType`] enum naming the three supported FHIR targets.
//! - The flat, resource-specific intake models ([`PatientInput`],
//!   [`PractitionerInput`], [`OrganizationInput`]) submitted by callers.
//! - The [`IntakePayload`] tagged union produced once by input validation, so that no
//!   untyped value is carried past the validation step.
//!
//! Intake models are transient: they exist as mapper input and as the JSON snapshot
//! serialized into a conversion request's `inputDataJson`. All serde boundaries use
//! camelCase field names.

mod models;

pub use models::{
    AddressInput, IntakePayload, OrganizationInput, PatientInput, PractitionerInput,
};

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Error returned when a resource-type tag names none of the supported FHIR resources.
///
/// This is a configuration-level failure, distinct from ordinary input validation: the
/// caller (or a stored record) asked for a conversion target the pipeline has no mapper
/// or validator for.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported resource type: {0}")]
pub struct UnsupportedResourceType(pub String);

/// The closed set of FHIR resource types the pipeline converts to.
///
/// The numeric codes (Patient=1, Practitioner=2, Organization=3) are part of the wire
/// contract with API callers; the string names are what gets persisted on conversion
/// records. Both forms are accepted when deserializing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Patient,
    Practitioner,
    Organization,
}

impl ResourceType {
    /// All supported resource types, in wire-code order.
    pub const ALL: [ResourceType; 3] = [
        ResourceType::Patient,
        ResourceType::Practitioner,
        ResourceType::Organization,
    ];

    /// The FHIR resource-type tag (also the persisted form).
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Patient => "Patient",
            ResourceType::Practitioner => "Practitioner",
            ResourceType::Organization => "Organization",
        }
    }

    /// Numeric wire code used by API callers.
    pub fn code(&self) -> u8 {
        match self {
            ResourceType::Patient => 1,
            ResourceType::Practitioner => 2,
            ResourceType::Organization => 3,
        }
    }

    /// Resolve a numeric wire code back to a resource type.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            1 => Some(ResourceType::Patient),
            2 => Some(ResourceType::Practitioner),
            3 => Some(ResourceType::Organization),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = UnsupportedResourceType;

    /// Parses the persisted resource-type tag ("Patient", "Practitioner", "Organization").
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedResourceType`] for any other string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Patient" => Ok(ResourceType::Patient),
            "Practitioner" => Ok(ResourceType::Practitioner),
            "Organization" => Ok(ResourceType::Organization),
            other => Err(UnsupportedResourceType(other.to_string())),
        }
    }
}

impl Serialize for ResourceType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResourceType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ResourceTypeVisitor;

        impl<'de> Visitor<'de> for ResourceTypeVisitor {
            type Value = ResourceType;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a resource type name or numeric code (1-3)")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value.parse().map_err(de::Error::custom)
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                ResourceType::from_code(value).ok_or_else(|| {
                    de::Error::custom(UnsupportedResourceType(value.to_string()))
                })
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(value)
                    .ok()
                    .and_then(ResourceType::from_code)
                    .ok_or_else(|| de::Error::custom(UnsupportedResourceType(value.to_string())))
            }
        }

        deserializer.deserialize_any(ResourceTypeVisitor)
    }
}
