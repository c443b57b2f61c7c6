//! Flat intake models and the validated payload union.
//!
//! These structs mirror the ad-hoc JSON submitted by intake callers. Every field is
//! optional at the serde layer so that a missing field deserializes cleanly and can be
//! reported by input validation with a field-specific message, rather than failing the
//! whole payload.

use crate::ResourceType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Postal address fields attached to a patient intake record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressInput {
    pub line1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Intake record for a patient.
///
/// Required by input validation: `first_name`, `last_name`, `date_of_birth`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// ISO 8601 calendar date (`YYYY-MM-DD`).
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<AddressInput>,
}

/// Intake record for a practitioner.
///
/// Required by input validation: `first_name`, `last_name`, `license_number`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PractitionerInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub qualification: Option<String>,
    pub speciality: Option<String>,
    pub license_number: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub organization_name: Option<String>,
}

/// Intake record for an organization.
///
/// Required by input validation: `name`, `registration_number`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrganizationInput {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub org_type: Option<String>,
    pub registration_number: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// A validated intake payload, resolved to its concrete model exactly once.
///
/// Input validation deserializes the raw caller JSON into the variant matching the
/// requested [`ResourceType`]; everything downstream of validation (mapping, snapshot
/// persistence, replay) works with this closed union and never with an untyped value.
#[derive(Clone, Debug, PartialEq)]
pub enum IntakePayload {
    Patient(PatientInput),
    Practitioner(PractitionerInput),
    Organization(OrganizationInput),
}

impl IntakePayload {
    /// The resource type this payload converts to.
    pub fn resource_type(&self) -> ResourceType {
        match self {
            IntakePayload::Patient(_) => ResourceType::Patient,
            IntakePayload::Practitioner(_) => ResourceType::Practitioner,
            IntakePayload::Organization(_) => ResourceType::Organization,
        }
    }

    /// Serializes the inner intake model to the camelCase JSON snapshot persisted on a
    /// conversion request (`inputDataJson`).
    ///
    /// The snapshot carries the *typed* model, not the raw caller payload, so replay
    /// always re-reads exactly what validation accepted.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_snapshot_json(&self) -> serde_json::Result<String> {
        match self {
            IntakePayload::Patient(p) => serde_json::to_string(p),
            IntakePayload::Practitioner(p) => serde_json::to_string(p),
            IntakePayload::Organization(o) => serde_json::to_string(o),
        }
    }
}
