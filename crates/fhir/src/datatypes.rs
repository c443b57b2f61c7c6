//! Shared FHIR wire datatypes and mapping helpers.
//!
//! These structs are the common building blocks of the three resource wire models:
//! HumanName, ContactPoint, Address, Identifier, and CodeableConcept, in their FHIR JSON
//! shape. They are deliberately minimal: only the fields the pipeline produces and
//! validates.

use serde::{Deserialize, Serialize};

/// Name use tag for the single official name the mappers emit.
pub(crate) const NAME_USE_OFFICIAL: &str = "official";

/// Identifier use tag for registration/license identifiers.
pub(crate) const IDENTIFIER_USE_OFFICIAL: &str = "official";

/// ContactPoint system tag for phone numbers.
pub(crate) const TELECOM_SYSTEM_PHONE: &str = "phone";

/// ContactPoint system tag for email addresses.
pub(crate) const TELECOM_SYSTEM_EMAIL: &str = "email";

/// ContactPoint use tag for patient contact details.
pub(crate) const TELECOM_USE_HOME: &str = "home";

/// ContactPoint use tag for practitioner and organization contact details.
pub(crate) const TELECOM_USE_WORK: &str = "work";

/// Identifier system URI for practitioner license numbers.
pub(crate) const PRACTITIONER_LICENSE_SYSTEM: &str = "http://hl7.org/fhir/sid/us-npi";

/// Wire representation of a FHIR HumanName.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct HumanNameWire {
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

impl HumanNameWire {
    /// The single official-use name entry the mappers produce.
    pub(crate) fn official(family: Option<String>, given: Vec<String>) -> Self {
        Self {
            use_type: Some(NAME_USE_OFFICIAL.to_string()),
            family,
            given,
        }
    }
}

/// Wire representation of a FHIR ContactPoint.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct ContactPointWire {
    pub system: String,
    pub value: String,

    #[serde(rename = "use")]
    pub use_type: String,
}

/// Wire representation of a FHIR Address.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct AddressWire {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(rename = "postalCode", skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Wire representation of a FHIR Identifier.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct IdentifierWire {
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    pub value: String,
}

/// Wire representation of a free-text FHIR CodeableConcept.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct CodeableConceptWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Maps an intake gender string to a FHIR administrative-gender code.
///
/// The mapping is total: "male"/"female"/"other" (case-insensitive) map to themselves,
/// anything else, including absence and blank strings, maps to "unknown".
pub(crate) fn administrative_gender(input: Option<&str>) -> &'static str {
    match input.map(str::to_ascii_lowercase).as_deref() {
        Some("male") => "male",
        Some("female") => "female",
        Some("other") => "other",
        _ => "unknown",
    }
}

/// Returns the trimmed value when it is present and non-blank.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
}

/// Builds telecom entries for optional phone/email fields.
///
/// Entries are added only for non-blank values; phone and email carry distinct system
/// tags and share the caller-supplied use tag ("home" for patients, "work" for
/// practitioners and organizations).
pub(crate) fn telecom_entries(
    phone: &Option<String>,
    email: &Option<String>,
    use_tag: &str,
) -> Vec<ContactPointWire> {
    let mut telecom = Vec::new();

    if let Some(phone) = non_blank(phone) {
        telecom.push(ContactPointWire {
            system: TELECOM_SYSTEM_PHONE.to_string(),
            value: phone.to_string(),
            use_type: use_tag.to_string(),
        });
    }

    if let Some(email) = non_blank(email) {
        telecom.push(ContactPointWire {
            system: TELECOM_SYSTEM_EMAIL.to_string(),
            value: email.to_string(),
            use_type: use_tag.to_string(),
        });
    }

    telecom
}
