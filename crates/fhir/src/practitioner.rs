//! FHIR Practitioner wire model, intake mapping, and structural validation.
//!
//! Responsibilities:
//! - Define the strict wire model for the generated Practitioner JSON
//! - Map a validated [`PractitionerInput`] to a FHIR Practitioner JSON string
//! - Parse generated JSON back into the wire shape and assert minimum structure

use crate::datatypes::{
    administrative_gender, non_blank, telecom_entries, CodeableConceptWire, ContactPointWire,
    HumanNameWire, IdentifierWire, IDENTIFIER_USE_OFFICIAL, PRACTITIONER_LICENSE_SYSTEM,
    TELECOM_USE_WORK,
};
use crate::validation::FhirValidationError;
use crate::{FhirError, FhirResult};
use intake_types::PractitionerInput;
use serde::{Deserialize, Serialize};

/// Practitioner resource operations.
///
/// Zero-sized facade; all methods are associated functions.
pub struct Practitioner;

impl Practitioner {
    /// The FHIR resource-type tag for this resource.
    pub const RESOURCE_TYPE: &'static str = "Practitioner";

    /// Maps a validated practitioner intake model to a FHIR Practitioner JSON string.
    ///
    /// Mapping rules:
    /// - A single official-use name: family = last name, given = [first name].
    /// - Gender maps totally (anything outside male/female/other becomes "unknown").
    /// - The license number becomes an official-use identifier with a fixed system URI.
    /// - Phone and email become telecom entries (use "work") only when non-blank.
    /// - The qualification field, when present, becomes a single qualification entry with
    ///   a free-text code.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] if serialisation fails.
    pub fn from_intake(input: &PractitionerInput) -> FhirResult<String> {
        let identifier = non_blank(&input.license_number)
            .map(|license| IdentifierWire {
                use_type: Some(IDENTIFIER_USE_OFFICIAL.to_string()),
                system: Some(PRACTITIONER_LICENSE_SYSTEM.to_string()),
                value: license.to_string(),
            })
            .into_iter()
            .collect();

        let qualification = non_blank(&input.qualification)
            .map(|text| QualificationWire {
                code: CodeableConceptWire {
                    text: Some(text.to_string()),
                },
            })
            .into_iter()
            .collect();

        let wire = PractitionerWire {
            resource_type: Self::RESOURCE_TYPE.to_string(),
            name: vec![HumanNameWire::official(
                input.last_name.clone(),
                input.first_name.clone().into_iter().collect(),
            )],
            gender: Some(administrative_gender(input.gender.as_deref()).to_string()),
            identifier,
            telecom: telecom_entries(&input.phone_number, &input.email, TELECOM_USE_WORK),
            qualification,
        };

        serde_json::to_string(&wire)
            .map_err(|e| FhirError::Translation(format!("Failed to serialise practitioner: {e}")))
    }

    /// Parses generated Practitioner JSON and asserts its minimum required structure.
    ///
    /// Checks (all collected, not short-circuited):
    /// - the resource-type tag is exactly "Practitioner",
    /// - at least one name entry,
    /// - gender present,
    /// - at least one identifier.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] if the JSON does not parse as a Practitioner
    /// wire shape, or [`FhirError::Validation`] carrying every violated check.
    pub fn validate(fhir_json: &str) -> FhirResult<()> {
        let wire: PractitionerWire = serde_json::from_str(fhir_json)
            .map_err(|e| FhirError::Translation(format!("Practitioner schema mismatch: {e}")))?;

        let mut errors = Vec::new();

        if wire.resource_type != Self::RESOURCE_TYPE {
            errors.push("ResourceType must be Practitioner".to_string());
        }

        if wire.name.is_empty() {
            errors.push("Practitioner.name is required".to_string());
        }

        if wire.gender.is_none() {
            errors.push("Practitioner.gender is required".to_string());
        }

        if wire.identifier.is_empty() {
            errors.push("Practitioner.identifier (license number) is required".to_string());
        }

        if !errors.is_empty() {
            return Err(FhirValidationError::new(errors).into());
        }

        Ok(())
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

/// Wire representation of a generated FHIR Practitioner resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct PractitionerWire {
    #[serde(rename = "resourceType")]
    resource_type: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    name: Vec<HumanNameWire>,

    #[serde(skip_serializing_if = "Option::is_none")]
    gender: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    identifier: Vec<IdentifierWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    telecom: Vec<ContactPointWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    qualification: Vec<QualificationWire>,
}

/// Wire representation of a Practitioner qualification entry.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct QualificationWire {
    code: CodeableConceptWire,
}
