//! FHIR Organization wire model, intake mapping, and structural validation.
//!
//! Responsibilities:
//! - Define the strict wire model for the generated Organization JSON
//! - Map a validated [`OrganizationInput`] to a FHIR Organization JSON string
//! - Parse generated JSON back into the wire shape and assert minimum structure

use crate::datatypes::{
    non_blank, telecom_entries, AddressWire, CodeableConceptWire, ContactPointWire,
    IdentifierWire, IDENTIFIER_USE_OFFICIAL, TELECOM_USE_WORK,
};
use crate::validation::FhirValidationError;
use crate::{FhirError, FhirResult};
use intake_types::OrganizationInput;
use serde::{Deserialize, Serialize};

/// Organization resource operations.
///
/// Zero-sized facade; all methods are associated functions.
pub struct Organization;

impl Organization {
    /// The FHIR resource-type tag for this resource.
    pub const RESOURCE_TYPE: &'static str = "Organization";

    /// Maps a validated organization intake model to a FHIR Organization JSON string.
    ///
    /// Mapping rules:
    /// - The name is carried over verbatim.
    /// - The registration number, when present, becomes an official-use identifier.
    /// - The type field, when present, becomes a single free-text CodeableConcept.
    /// - Phone and email become telecom entries (use "work") only when non-blank.
    /// - A single address is emitted when any of the flat address fields is non-blank.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] if serialisation fails.
    pub fn from_intake(input: &OrganizationInput) -> FhirResult<String> {
        let identifier = non_blank(&input.registration_number)
            .map(|registration| IdentifierWire {
                use_type: Some(IDENTIFIER_USE_OFFICIAL.to_string()),
                system: None,
                value: registration.to_string(),
            })
            .into_iter()
            .collect();

        let org_type = non_blank(&input.org_type)
            .map(|text| CodeableConceptWire {
                text: Some(text.to_string()),
            })
            .into_iter()
            .collect();

        let has_address_field = [
            &input.address_line,
            &input.city,
            &input.state,
            &input.postal_code,
            &input.country,
        ]
        .into_iter()
        .any(|field| non_blank(field).is_some());

        let address = if has_address_field {
            vec![AddressWire {
                line: input.address_line.clone().into_iter().collect(),
                city: input.city.clone(),
                state: input.state.clone(),
                postal_code: input.postal_code.clone(),
                country: input.country.clone(),
            }]
        } else {
            Vec::new()
        };

        let wire = OrganizationWire {
            resource_type: Self::RESOURCE_TYPE.to_string(),
            name: input.name.clone(),
            org_type,
            identifier,
            telecom: telecom_entries(&input.phone_number, &input.email, TELECOM_USE_WORK),
            address,
        };

        serde_json::to_string(&wire)
            .map_err(|e| FhirError::Translation(format!("Failed to serialise organization: {e}")))
    }

    /// Parses generated Organization JSON and asserts its minimum required structure.
    ///
    /// Checks (all collected, not short-circuited):
    /// - the resource-type tag is exactly "Organization",
    /// - name present and non-blank,
    /// - at least one identifier.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] if the JSON does not parse as an Organization
    /// wire shape, or [`FhirError::Validation`] carrying every violated check.
    pub fn validate(fhir_json: &str) -> FhirResult<()> {
        let wire: OrganizationWire = serde_json::from_str(fhir_json)
            .map_err(|e| FhirError::Translation(format!("Organization schema mismatch: {e}")))?;

        let mut errors = Vec::new();

        if wire.resource_type != Self::RESOURCE_TYPE {
            errors.push("ResourceType must be Organization".to_string());
        }

        if non_blank(&wire.name).is_none() {
            errors.push("Organization.name is required".to_string());
        }

        if wire.identifier.is_empty() {
            errors.push("Organization.identifier (registration number) is required".to_string());
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

/// Wire representation of a generated FHIR Organization resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct OrganizationWire {
    #[serde(rename = "resourceType")]
    resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    org_type: Vec<CodeableConceptWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    identifier: Vec<IdentifierWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    telecom: Vec<ContactPointWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    address: Vec<AddressWire>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_organization() -> OrganizationInput {
        OrganizationInput {
            name: Some("Gen Hosp".to_string()),
            registration_number: Some("ORG1".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn maps_name_and_official_identifier() {
        let json = Organization::from_intake(&minimal_organization()).expect("map organization");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["resourceType"], "Organization");
        assert_eq!(value["name"], "Gen Hosp");

        let identifier = value["identifier"].as_array().unwrap();
        assert_eq!(identifier.len(), 1);
        assert_eq!(identifier[0]["use"], "official");
        assert_eq!(identifier[0]["value"], "ORG1");
    }

    #[test]
    fn minimal_organization_passes_validation() {
        let json = Organization::from_intake(&minimal_organization()).expect("map organization");
        Organization::validate(&json).expect("generated organization should validate");
    }

    #[test]
    fn type_becomes_free_text_codeable_concept() {
        let mut input = minimal_organization();
        input.org_type = Some("Hospital".to_string());

        let json = Organization::from_intake(&input).expect("map organization");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"][0]["text"], "Hospital");
    }

    #[test]
    fn address_emitted_when_any_flat_field_present() {
        let without = Organization::from_intake(&minimal_organization()).expect("map organization");
        let value: serde_json::Value = serde_json::from_str(&without).unwrap();
        assert!(value.get("address").is_none());

        let mut input = minimal_organization();
        input.city = Some("Springfield".to_string());

        let with = Organization::from_intake(&input).expect("map organization");
        let value: serde_json::Value = serde_json::from_str(&with).unwrap();
        let address = value["address"].as_array().unwrap();
        assert_eq!(address.len(), 1);
        assert_eq!(address[0]["city"], "Springfield");
    }

    #[test]
    fn telecom_uses_work() {
        let mut input = minimal_organization();
        input.phone_number = Some("+1-555-999-0000".to_string());

        let json = Organization::from_intake(&input).expect("map organization");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["telecom"][0]["use"], "work");
    }

    #[test]
    fn validate_requires_name_and_identifier() {
        let json = r#"{"resourceType": "Organization", "name": "  "}"#;

        let err = Organization::validate(json).expect_err("should fail validation");
        match err {
            FhirError::Validation(v) => {
                assert_eq!(v.errors.len(), 2);
                assert!(v
                    .errors
                    .contains(&"Organization.name is required".to_string()));
                assert!(v.errors.contains(
                    &"Organization.identifier (registration number) is required".to_string()
                ));
            }
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_wrong_resource_type_tag() {
        let json = r#"{
            "resourceType": "Patient",
            "name": "Gen Hosp",
            "identifier": [{"use": "official", "value": "ORG1"}]
        }"#;

        let err = Organization::validate(json).expect_err("should fail validation");
        match err {
            FhirError::Validation(v) => {
                assert_eq!(v.errors, vec!["ResourceType must be Organization".to_string()]);
            }
            other => panic!("expected Validation error, got {other:?}"),
        }
    }
}
