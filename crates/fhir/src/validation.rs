//! Structured FHIR validation failures.
//!
//! Validators collect every violated check into one failure so the caller sees all
//! problems at once, and carry a stable error code that is persisted as the conversion
//! record's failure reason.

/// Stable error code recorded when a generated resource fails structural validation.
pub const FHIR_VALIDATION_FAILED: &str = "FHIR_VALIDATION_FAILED";

/// A structural validation failure with the full list of field-level problems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {}", .code, .errors.join("; "))]
pub struct FhirValidationError {
    /// Stable machine-readable code ([`FHIR_VALIDATION_FAILED`]).
    pub code: &'static str,
    /// Human-readable field-level messages, one per violated check.
    pub errors: Vec<String>,
}

impl FhirValidationError {
    /// Wraps the collected messages under the stable validation error code.
    pub fn new(errors: Vec<String>) -> Self {
        Self {
            code: FHIR_VALIDATION_FAILED,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_stable_code_and_all_messages() {
        let err = FhirValidationError::new(vec![
            "Patient.name is required".to_string(),
            "Patient.gender is required".to_string(),
        ]);

        assert_eq!(err.code, FHIR_VALIDATION_FAILED);
        assert_eq!(err.errors.len(), 2);
        assert_eq!(
            err.to_string(),
            "FHIR_VALIDATION_FAILED: Patient.name is required; Patient.gender is required"
        );
    }
}
