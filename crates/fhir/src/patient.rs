//! FHIR Patient wire model, intake mapping, and structural validation.
//!
//! Responsibilities:
//! - Define the strict wire model for the generated Patient JSON
//! - Map a validated [`PatientInput`] to a FHIR Patient JSON string
//! - Parse generated JSON back into the wire shape and assert minimum structure
//!
//! Mapping is deterministic and pure; the generated JSON is the only output.

use crate::datatypes::{
    administrative_gender, non_blank, telecom_entries, AddressWire, ContactPointWire,
    HumanNameWire, TELECOM_USE_HOME,
};
use crate::validation::FhirValidationError;
use crate::{FhirError, FhirResult};
use intake_types::PatientInput;
use serde::{Deserialize, Serialize};

/// Patient resource operations.
///
/// This is a zero-sized type used for namespacing patient-related operations.
/// All methods are associated functions.
pub struct Patient;

impl Patient {
    /// The FHIR resource-type tag for this resource.
    pub const RESOURCE_TYPE: &'static str = "Patient";

    /// Maps a validated patient intake model to a FHIR Patient JSON string.
    ///
    /// Mapping rules:
    /// - A single official-use name: family = last name, given = [first name].
    /// - Gender maps totally: "male"/"female"/"other" (case-insensitive) pass through,
    ///   anything else (including absence) becomes "unknown".
    /// - Birth date is formatted as `YYYY-MM-DD`.
    /// - Phone and email become telecom entries (use "home") only when non-blank.
    /// - The address is emitted only when an address object is present, with flat fields
    ///   carried over verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] if serialisation fails.
    pub fn from_intake(input: &PatientInput) -> FhirResult<String> {
        let wire = PatientWire {
            resource_type: Self::RESOURCE_TYPE.to_string(),
            name: vec![HumanNameWire::official(
                input.last_name.clone(),
                input.first_name.clone().into_iter().collect(),
            )],
            gender: Some(administrative_gender(input.gender.as_deref()).to_string()),
            birth_date: input.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()),
            telecom: telecom_entries(&input.phone_number, &input.email, TELECOM_USE_HOME),
            address: input
                .address
                .as_ref()
                .map(|a| AddressWire {
                    line: a.line1.clone().into_iter().collect(),
                    city: a.city.clone(),
                    state: a.state.clone(),
                    postal_code: a.postal_code.clone(),
                    country: a.country.clone(),
                })
                .into_iter()
                .collect(),
        };

        serde_json::to_string(&wire)
            .map_err(|e| FhirError::Translation(format!("Failed to serialise patient: {e}")))
    }

    /// Parses generated Patient JSON and asserts its minimum required structure.
    ///
    /// Checks (all collected, not short-circuited):
    /// - the resource-type tag is exactly "Patient",
    /// - at least one name entry,
    /// - gender present,
    /// - birthDate present and non-blank.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] if the JSON does not parse as a Patient wire
    /// shape, or [`FhirError::Validation`] carrying every violated check.
    pub fn validate(fhir_json: &str) -> FhirResult<()> {
        let wire: PatientWire = serde_json::from_str(fhir_json)
            .map_err(|e| FhirError::Translation(format!("Patient schema mismatch: {e}")))?;

        let mut errors = Vec::new();

        if wire.resource_type != Self::RESOURCE_TYPE {
            errors.push("ResourceType must be Patient".to_string());
        }

        if wire.name.is_empty() {
            errors.push("Patient.name is required".to_string());
        }

        if wire.gender.is_none() {
            errors.push("Patient.gender is required".to_string());
        }

        if non_blank(&wire.birth_date).is_none() {
            errors.push("Patient.birthDate is required".to_string());
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

/// Wire representation of a generated FHIR Patient resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct PatientWire {
    #[serde(rename = "resourceType")]
    resource_type: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    name: Vec<HumanNameWire>,

    #[serde(skip_serializing_if = "Option::is_none")]
    gender: Option<String>,

    #[serde(rename = "birthDate", skip_serializing_if = "Option::is_none")]
    birth_date: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    telecom: Vec<ContactPointWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    address: Vec<AddressWire>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use intake_types::AddressInput;

    fn minimal_patient() -> PatientInput {
        PatientInput {
            first_name: Some("John".to_string()),
            last_name: Some("Doe".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 14),
            gender: Some("male".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn maps_official_name_gender_and_birth_date() {
        let json = Patient::from_intake(&minimal_patient()).expect("map patient");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["resourceType"], "Patient");
        assert_eq!(value["name"][0]["use"], "official");
        assert_eq!(value["name"][0]["family"], "Doe");
        assert_eq!(value["name"][0]["given"][0], "John");
        assert_eq!(value["gender"], "male");
        assert_eq!(value["birthDate"], "1990-05-14");
    }

    #[test]
    fn minimal_patient_passes_validation() {
        let json = Patient::from_intake(&minimal_patient()).expect("map patient");
        Patient::validate(&json).expect("generated patient should validate");
    }

    #[test]
    fn absent_gender_maps_to_unknown() {
        let mut input = minimal_patient();
        input.gender = None;

        let json = Patient::from_intake(&input).expect("map patient");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["gender"], "unknown");

        Patient::validate(&json).expect("unknown gender still validates");
    }

    #[test]
    fn uppercase_gender_maps_case_insensitively() {
        for raw in ["Male", "MALE", "male"] {
            let mut input = minimal_patient();
            input.gender = Some(raw.to_string());

            let json = Patient::from_intake(&input).expect("map patient");
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["gender"], "male", "input gender '{raw}'");
        }
    }

    #[test]
    fn unrecognised_gender_maps_to_unknown() {
        let mut input = minimal_patient();
        input.gender = Some("something else".to_string());

        let json = Patient::from_intake(&input).expect("map patient");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["gender"], "unknown");
    }

    #[test]
    fn telecom_uses_home_and_skips_blank_entries() {
        let mut input = minimal_patient();
        input.phone_number = Some("+1-555-123-4567".to_string());
        input.email = Some("".to_string());

        let json = Patient::from_intake(&input).expect("map patient");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let telecom = value["telecom"].as_array().unwrap();
        assert_eq!(telecom.len(), 1);
        assert_eq!(telecom[0]["system"], "phone");
        assert_eq!(telecom[0]["use"], "home");
    }

    #[test]
    fn address_emitted_only_when_present() {
        let without = Patient::from_intake(&minimal_patient()).expect("map patient");
        let value: serde_json::Value = serde_json::from_str(&without).unwrap();
        assert!(value.get("address").is_none());

        let mut input = minimal_patient();
        input.address = Some(AddressInput {
            line1: Some("123 Main Street".to_string()),
            city: Some("San Francisco".to_string()),
            state: Some("CA".to_string()),
            postal_code: Some("94105".to_string()),
            country: Some("USA".to_string()),
        });

        let with = Patient::from_intake(&input).expect("map patient");
        let value: serde_json::Value = serde_json::from_str(&with).unwrap();
        let address = &value["address"][0];
        assert_eq!(address["line"][0], "123 Main Street");
        assert_eq!(address["city"], "San Francisco");
        assert_eq!(address["state"], "CA");
        assert_eq!(address["postalCode"], "94105");
        assert_eq!(address["country"], "USA");
    }

    #[test]
    fn validate_collects_all_violations() {
        let json = r#"{"resourceType": "Observation"}"#;

        let err = Patient::validate(json).expect_err("should fail validation");
        match err {
            FhirError::Validation(v) => {
                assert_eq!(v.code, "FHIR_VALIDATION_FAILED");
                assert_eq!(v.errors.len(), 4);
                assert!(v.errors.contains(&"ResourceType must be Patient".to_string()));
                assert!(v.errors.contains(&"Patient.name is required".to_string()));
                assert!(v.errors.contains(&"Patient.gender is required".to_string()));
                assert!(v.errors.contains(&"Patient.birthDate is required".to_string()));
            }
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_blank_birth_date() {
        let json = r#"{
            "resourceType": "Patient",
            "name": [{"use": "official", "family": "Doe", "given": ["John"]}],
            "gender": "male",
            "birthDate": "   "
        }"#;

        let err = Patient::validate(json).expect_err("should fail validation");
        match err {
            FhirError::Validation(v) => {
                assert_eq!(v.errors, vec!["Patient.birthDate is required".to_string()]);
            }
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_reports_unparseable_json_as_translation_error() {
        let err = Patient::validate("{not json").expect_err("should fail to parse");
        assert!(matches!(err, FhirError::Translation(_)));
    }

    #[test]
    fn mapping_is_deterministic() {
        let input = minimal_patient();
        let a = Patient::from_intake(&input).unwrap();
        let b = Patient::from_intake(&input).unwrap();
        assert_eq!(a, b);
    }
}
