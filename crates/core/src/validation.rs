//! Intake payload validation.
//!
//! The boundary accepts an open-ended JSON object; this module resolves it into the
//! typed intake model matching the requested resource type exactly once, then checks the
//! resource-specific required fields. Nothing downstream of this function ever sees an
//! untyped value.
//!
//! Ordinary validation failures are values, not panics or errors: the caller gets back a
//! human-readable reason and nothing is persisted.

use chrono::{Datelike, NaiveDate};
use intake_types::{
    IntakePayload, OrganizationInput, PatientInput, PractitionerInput, ResourceType,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A rejected intake payload, carrying the reason reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InvalidIntake(pub String);

impl InvalidIntake {
    fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Validates a raw intake payload against the requested resource type.
///
/// Required fields:
/// - Patient: `firstName`, `lastName`, `dateOfBirth`
/// - Practitioner: `firstName`, `lastName`, `licenseNumber`
/// - Organization: `name`, `registrationNumber`
///
/// # Errors
///
/// Returns [`InvalidIntake`] when:
/// - the payload is not a JSON object or is empty ("Request data cannot be empty"),
/// - the payload does not deserialize into the intake model ("Invalid data format: …",
///   annotated with the path of the failing field),
/// - a required field is missing or blank (a field-specific message such as
///   "License number is required").
pub fn validate_intake(
    resource_type: ResourceType,
    data: &Value,
) -> Result<IntakePayload, InvalidIntake> {
    let is_empty = match data {
        Value::Object(map) => map.is_empty(),
        Value::Null => true,
        _ => false,
    };
    if is_empty {
        return Err(InvalidIntake::new("Request data cannot be empty"));
    }

    match resource_type {
        ResourceType::Patient => {
            let patient: PatientInput = deserialize_model(data)?;

            require_text(&patient.first_name, "First name is required")?;
            require_text(&patient.last_name, "Last name is required")?;
            match patient.date_of_birth {
                None => return Err(InvalidIntake::new("Date of birth is required")),
                Some(date) if is_unset_date(date) => {
                    return Err(InvalidIntake::new("Date of birth is required"))
                }
                Some(_) => {}
            }

            Ok(IntakePayload::Patient(patient))
        }
        ResourceType::Practitioner => {
            let practitioner: PractitionerInput = deserialize_model(data)?;

            require_text(&practitioner.first_name, "First name is required")?;
            require_text(&practitioner.last_name, "Last name is required")?;
            require_text(&practitioner.license_number, "License number is required")?;

            Ok(IntakePayload::Practitioner(practitioner))
        }
        ResourceType::Organization => {
            let organization: OrganizationInput = deserialize_model(data)?;

            require_text(&organization.name, "Organization name is required")?;
            require_text(
                &organization.registration_number,
                "Registration number is required",
            )?;

            Ok(IntakePayload::Organization(organization))
        }
    }
}

/// Deserializes the raw payload into a typed intake model, surfacing a best-effort
/// "path" (e.g. `address.postalCode`) to the failing field on mismatch.
fn deserialize_model<T: DeserializeOwned>(data: &Value) -> Result<T, InvalidIntake> {
    match serde_path_to_error::deserialize::<_, T>(data.clone()) {
        Ok(model) => Ok(model),
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() { "<root>" } else { path.as_str() };
            Err(InvalidIntake::new(format!(
                "Invalid data format: {path}: {source}"
            )))
        }
    }
}

/// The `0001-01-01` sentinel some upstream systems emit for "no date of birth".
fn is_unset_date(date: NaiveDate) -> bool {
    (date.year(), date.month(), date.day()) == (1, 1, 1)
}

/// Rejects absent or whitespace-only required text fields with the given message.
fn require_text(value: &Option<String>, message: &str) -> Result<(), InvalidIntake> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(()),
        _ => Err(InvalidIntake::new(message)),
    }
}
