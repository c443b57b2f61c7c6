//! Conversion orchestration.
//!
//! `ConversionService` drives one conversion attempt end to end: it validates the
//! intake payload, persists a `Pending` request, maps it to FHIR, validates the
//! generated JSON, then persists the resource and the terminal status. It also replays
//! stored requests
//! from their persisted input snapshot and serves the ownership-scoped read operations.
//!
//! Every code path of `convert`/`rerun` returns a [`ConversionOutcome`]; the only `Err`
//! cases are store-level faults (I/O, serialization of records), which the boundary maps
//! to 500-class responses. Each terminal status transition is persisted before the call
//! returns.

use crate::config::CoreConfig;
use crate::entities::{Access, ConversionRequest, FhirResourceRecord, StoredInput};
use crate::error::{ConversionError, ConversionResult};
use crate::repositories::{ConversionRequestRepository, FhirResourceRepository};
use crate::validation::validate_intake;
use bridge_uuid::RecordUuid;
use fhir::{FhirError, Organization, Patient, Practitioner};
use intake_types::{IntakePayload, ResourceType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

/// Result envelope returned to the boundary for `convert` and `rerun`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOutcome {
    /// The conversion request id, when one was persisted for this attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub id: Option<RecordUuid>,

    pub success: bool,

    pub message: String,

    /// The generated FHIR resource, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub fhir_resource: Option<Value>,

    /// Field-level messages when FHIR validation failed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<String>,
}

impl ConversionOutcome {
    fn success(id: RecordUuid, message: &str, fhir_resource: Value) -> Self {
        Self {
            id: Some(id),
            success: true,
            message: message.to_string(),
            fhir_resource: Some(fhir_resource),
            validation_errors: Vec::new(),
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self {
            id: None,
            success: false,
            message: message.into(),
            fhir_resource: None,
            validation_errors: Vec::new(),
        }
    }

    fn failed(id: RecordUuid, message: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            success: false,
            message: message.into(),
            fhir_resource: None,
            validation_errors: Vec::new(),
        }
    }

    fn failed_validation(id: RecordUuid, code: &str, errors: Vec<String>) -> Self {
        Self {
            id: Some(id),
            success: false,
            message: code.to_string(),
            fhir_resource: None,
            validation_errors: errors,
        }
    }
}

/// Orchestrates the conversion pipeline over the file-backed store.
#[derive(Clone, Debug)]
pub struct ConversionService {
    requests: ConversionRequestRepository,
    resources: FhirResourceRepository,
}

impl ConversionService {
    /// Creates a service over the configured store.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            requests: ConversionRequestRepository::new(cfg.clone()),
            resources: FhirResourceRepository::new(cfg),
        }
    }

    /// Converts a raw intake payload into a FHIR resource.
    ///
    /// Pipeline:
    /// 1. Validate and type the payload; on rejection nothing is persisted.
    /// 2. Persist a `Pending` request whose `inputDataJson` snapshots the typed payload.
    /// 3. Map to FHIR JSON and structurally validate it.
    /// 4. On success persist the resource and mark the request `Success`; on FHIR
    ///    validation failure mark it `Failed` with the stable error code; on any other
    ///    mapping failure mark it `Failed` with the failure text.
    ///
    /// # Errors
    ///
    /// Only store-level faults (directory/file I/O, record serialization) are returned
    /// as `Err`; every pipeline outcome is an `Ok(ConversionOutcome)`.
    pub fn convert(
        &self,
        resource_type: ResourceType,
        data: &Value,
        caller: Option<&str>,
    ) -> ConversionResult<ConversionOutcome> {
        let payload = match validate_intake(resource_type, data) {
            Ok(payload) => payload,
            Err(reason) => {
                tracing::info!(%resource_type, "intake rejected: {reason}");
                return Ok(ConversionOutcome::rejected(reason.to_string()));
            }
        };

        let input_json = payload
            .to_snapshot_json()
            .map_err(ConversionError::Serialization)?;
        let mut request =
            self.requests
                .create(resource_type, input_json, caller.map(str::to_string))?;

        tracing::info!(id = %request.id, %resource_type, "conversion request created");

        let fhir_json = match map_payload(&payload).and_then(|json| {
            validate_generated(resource_type, &json)?;
            Ok(json)
        }) {
            Ok(json) => json,
            Err(FhirError::Validation(violation)) => {
                request.mark_failed(violation.code);
                self.requests.update(&request)?;

                tracing::warn!(id = %request.id, "FHIR validation failed: {violation}");
                return Ok(ConversionOutcome::failed_validation(
                    request.id.clone(),
                    violation.code,
                    violation.errors,
                ));
            }
            Err(err) => {
                request.mark_failed(err.to_string());
                self.requests.update(&request)?;

                tracing::warn!(id = %request.id, "conversion failed: {err}");
                return Ok(ConversionOutcome::failed(
                    request.id.clone(),
                    format!("Conversion failed: {err}"),
                ));
            }
        };

        self.resources.save(&request.id, fhir_json.clone())?;
        request.mark_success();
        self.requests.update(&request)?;

        let resource: Value =
            serde_json::from_str(&fhir_json).map_err(ConversionError::Deserialization)?;
        Ok(ConversionOutcome::success(
            request.id.clone(),
            "Conversion completed successfully",
            resource,
        ))
    }

    /// Replays a stored conversion request from its persisted input snapshot.
    ///
    /// The stored snapshot is re-typed, the request re-enters `Pending`, the payload is
    /// mapped again, and the previously generated resource (if any) is deleted before
    /// the fresh one is inserted, so a request never ends up with two resources.
    ///
    /// Structural validation is not repeated on replay: the snapshot is exactly what
    /// validation accepted when the record was first converted.
    ///
    /// # Errors
    ///
    /// Only store-level faults are returned as `Err`; missing/forbidden records and
    /// legacy snapshots are reported in the outcome.
    pub fn rerun(
        &self,
        conversion_request_id: &str,
        caller: Option<&str>,
    ) -> ConversionResult<ConversionOutcome> {
        let id = match RecordUuid::parse(conversion_request_id) {
            Ok(id) => id,
            Err(_) => return Ok(ConversionOutcome::rejected("Conversion request not found")),
        };

        let mut request = match self.access_request(&id, caller)? {
            Access::Found(request) => request,
            Access::NotFound => {
                return Ok(ConversionOutcome::rejected("Conversion request not found"))
            }
            Access::Forbidden => {
                return Ok(ConversionOutcome::failed(
                    id,
                    "Conversion request belongs to another caller",
                ))
            }
        };

        let payload = match request.load_input() {
            StoredInput::Snapshot(payload) => payload,
            StoredInput::Missing => {
                return Ok(ConversionOutcome::failed(
                    id,
                    "Re-run failed: No input data found in stored record",
                ))
            }
            StoredInput::Unreadable => {
                return Ok(ConversionOutcome::failed(
                    id,
                    "This conversion was created before replay support was added and cannot be re-run.",
                ))
            }
        };

        request.reset_pending();
        self.requests.update(&request)?;

        match map_payload(&payload) {
            Ok(fhir_json) => {
                self.resources.delete_by_request_id(&request.id)?;
                self.resources.save(&request.id, fhir_json.clone())?;

                request.mark_success();
                self.requests.update(&request)?;

                tracing::info!(id = %request.id, "re-run completed");
                let resource: Value =
                    serde_json::from_str(&fhir_json).map_err(ConversionError::Deserialization)?;
                Ok(ConversionOutcome::success(
                    request.id.clone(),
                    "Re-run completed successfully",
                    resource,
                ))
            }
            Err(err) => {
                request.mark_failed(err.to_string());
                self.requests.update(&request)?;

                tracing::warn!(id = %request.id, "re-run failed: {err}");
                Ok(ConversionOutcome::failed(
                    request.id.clone(),
                    format!("Re-run failed: {err}"),
                ))
            }
        }
    }

    /// Looks up a conversion request with the ownership rule applied.
    ///
    /// A non-canonical id maps to `NotFound` (such a record cannot exist).
    pub fn get_request(
        &self,
        conversion_request_id: &str,
        caller: Option<&str>,
    ) -> ConversionResult<Access<ConversionRequest>> {
        let id = match RecordUuid::parse(conversion_request_id) {
            Ok(id) => id,
            Err(_) => return Ok(Access::NotFound),
        };
        self.access_request(&id, caller)
    }

    /// Looks up the FHIR resource generated for a request, with the ownership rule
    /// applied to the owning request.
    pub fn get_fhir_resource(
        &self,
        conversion_request_id: &str,
        caller: Option<&str>,
    ) -> ConversionResult<Access<FhirResourceRecord>> {
        let request = match self.get_request(conversion_request_id, caller)? {
            Access::Found(request) => request,
            Access::Forbidden => return Ok(Access::Forbidden),
            Access::NotFound => return Ok(Access::NotFound),
        };

        match self.resources.get_by_request_id(&request.id)? {
            Some(record) => Ok(Access::Found(record)),
            None => Ok(Access::NotFound),
        }
    }

    /// Lists the conversion requests visible to `caller`, newest first.
    pub fn history(&self, caller: Option<&str>) -> Vec<ConversionRequest> {
        let mut requests = self.requests.list_for_caller(caller);
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        requests
    }

    /// Lists the requests visible to `caller` targeting one resource type, newest first.
    pub fn history_for_type(
        &self,
        resource_type: ResourceType,
        caller: Option<&str>,
    ) -> Vec<ConversionRequest> {
        let mut requests = self
            .requests
            .list_by_resource_type(resource_type)
            .into_iter()
            .filter(|request| request.accessible_by(caller))
            .collect::<Vec<_>>();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        requests
    }

    fn access_request(
        &self,
        id: &RecordUuid,
        caller: Option<&str>,
    ) -> ConversionResult<Access<ConversionRequest>> {
        match self.requests.get_by_id(id)? {
            None => Ok(Access::NotFound),
            Some(request) if request.accessible_by(caller) => Ok(Access::Found(request)),
            Some(_) => Ok(Access::Forbidden),
        }
    }
}

/// Maps a typed intake payload with the mapper for its resource type.
///
/// Dispatch is a match over the closed payload union; there is no runtime mapper
/// registry to miss.
fn map_payload(payload: &IntakePayload) -> Result<String, FhirError> {
    match payload {
        IntakePayload::Patient(input) => Patient::from_intake(input),
        IntakePayload::Practitioner(input) => Practitioner::from_intake(input),
        IntakePayload::Organization(input) => Organization::from_intake(input),
    }
}

/// Structurally validates generated FHIR JSON with the validator for its resource type.
fn validate_generated(resource_type: ResourceType, fhir_json: &str) -> Result<(), FhirError> {
    match resource_type {
        ResourceType::Patient => Patient::validate(fhir_json),
        ResourceType::Practitioner => Practitioner::validate(fhir_json),
        ResourceType::Organization => Organization::validate(fhir_json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ConversionStatus;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_service(temp_dir: &TempDir) -> ConversionService {
        let cfg = Arc::new(CoreConfig::new(temp_dir.path().to_path_buf()));
        ConversionService::new(cfg)
    }

    fn john_doe() -> Value {
        json!({
            "firstName": "John",
            "lastName": "Doe",
            "dateOfBirth": "1990-05-14",
            "gender": "male"
        })
    }

    #[test]
    fn converts_a_minimal_patient() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = test_service(&temp_dir);

        let outcome = service
            .convert(ResourceType::Patient, &john_doe(), None)
            .expect("convert should succeed");

        assert!(outcome.success);
        assert_eq!(outcome.message, "Conversion completed successfully");

        let resource = outcome.fhir_resource.expect("resource should be present");
        assert_eq!(resource["resourceType"], "Patient");
        assert_eq!(resource["name"][0]["family"], "Doe");
        assert_eq!(resource["name"][0]["given"][0], "John");
        assert_eq!(resource["gender"], "male");
        assert_eq!(resource["birthDate"], "1990-05-14");

        let id = outcome.id.unwrap();
        let request = match service.get_request(&id.to_string(), None).unwrap() {
            Access::Found(request) => request,
            other => panic!("expected stored request, got {other:?}"),
        };
        assert_eq!(request.status, ConversionStatus::Success);
        assert!(request.error_message.is_none());

        let resource_record = match service.get_fhir_resource(&id.to_string(), None).unwrap() {
            Access::Found(record) => record,
            other => panic!("expected stored resource, got {other:?}"),
        };
        assert_eq!(resource_record.conversion_request_id, id);
    }

    #[test]
    fn converts_minimal_payloads_for_all_resource_types() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = test_service(&temp_dir);

        let cases = [
            (ResourceType::Patient, john_doe()),
            (
                ResourceType::Practitioner,
                json!({"firstName": "Jane", "lastName": "Smith", "licenseNumber": "MD987654321"}),
            ),
            (
                ResourceType::Organization,
                json!({"name": "Gen Hosp", "registrationNumber": "ORG1"}),
            ),
        ];

        for (resource_type, data) in cases {
            let outcome = service
                .convert(resource_type, &data, None)
                .expect("convert should succeed");
            assert!(outcome.success, "{resource_type}: {}", outcome.message);
            assert_eq!(
                outcome.fhir_resource.unwrap()["resourceType"],
                resource_type.as_str()
            );
        }
    }

    #[test]
    fn rejected_input_persists_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = test_service(&temp_dir);

        let outcome = service
            .convert(
                ResourceType::Practitioner,
                &json!({"firstName": "Jane", "lastName": "Smith"}),
                None,
            )
            .expect("convert should succeed");

        assert!(!outcome.success);
        assert_eq!(outcome.message, "License number is required");
        assert!(outcome.id.is_none());
        assert!(service.history(None).is_empty(), "nothing persisted");
    }

    #[test]
    fn organization_identifier_uses_registration_number() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = test_service(&temp_dir);

        let outcome = service
            .convert(
                ResourceType::Organization,
                &json!({"name": "Gen Hosp", "registrationNumber": "ORG1"}),
                None,
            )
            .expect("convert should succeed");

        let resource = outcome.fhir_resource.unwrap();
        let identifier = resource["identifier"].as_array().unwrap();
        assert_eq!(identifier.len(), 1);
        assert_eq!(identifier[0]["value"], "ORG1");
        assert_eq!(identifier[0]["use"], "official");
    }

    #[test]
    fn snapshot_stores_typed_camel_case_input() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = test_service(&temp_dir);

        let outcome = service
            .convert(ResourceType::Patient, &john_doe(), None)
            .unwrap();
        let id = outcome.id.unwrap().to_string();

        let request = match service.get_request(&id, None).unwrap() {
            Access::Found(request) => request,
            other => panic!("expected request, got {other:?}"),
        };
        assert!(request.input_data_json.contains("\"firstName\":\"John\""));
        assert!(request.input_data_json.contains("\"dateOfBirth\":\"1990-05-14\""));
    }

    #[test]
    fn rerun_replaces_the_generated_resource() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = test_service(&temp_dir);

        let outcome = service
            .convert(ResourceType::Patient, &john_doe(), None)
            .unwrap();
        let id = outcome.id.unwrap().to_string();

        let original = match service.get_fhir_resource(&id, None).unwrap() {
            Access::Found(record) => record,
            other => panic!("expected resource, got {other:?}"),
        };

        let rerun = service.rerun(&id, None).expect("rerun should succeed");
        assert!(rerun.success, "{}", rerun.message);
        assert_eq!(rerun.message, "Re-run completed successfully");

        let replacement = match service.get_fhir_resource(&id, None).unwrap() {
            Access::Found(record) => record,
            other => panic!("expected resource, got {other:?}"),
        };

        // A fresh record replaces the old one, with structurally identical FHIR JSON
        assert_ne!(replacement.id, original.id);
        let before: Value = serde_json::from_str(&original.fhir_json).unwrap();
        let after: Value = serde_json::from_str(&replacement.fhir_json).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn rerun_of_unknown_id_reports_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = test_service(&temp_dir);

        let outcome = service
            .rerun("00000000000000000000000000000000", None)
            .expect("rerun should succeed");
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Conversion request not found");

        let outcome = service.rerun("not-an-id", None).unwrap();
        assert_eq!(outcome.message, "Conversion request not found");
    }

    #[test]
    fn rerun_of_missing_snapshot_reports_legacy_condition() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = test_service(&temp_dir);

        let request = service
            .requests
            .create(ResourceType::Patient, "".to_string(), None)
            .unwrap();

        let outcome = service.rerun(&request.id.to_string(), None).unwrap();
        assert!(!outcome.success);
        assert_eq!(
            outcome.message,
            "Re-run failed: No input data found in stored record"
        );
    }

    #[test]
    fn rerun_of_unreadable_snapshot_reports_legacy_condition() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = test_service(&temp_dir);

        let request = service
            .requests
            .create(ResourceType::Patient, "not json".to_string(), None)
            .unwrap();

        let outcome = service.rerun(&request.id.to_string(), None).unwrap();
        assert!(!outcome.success);
        assert_eq!(
            outcome.message,
            "This conversion was created before replay support was added and cannot be re-run."
        );

        // The legacy condition leaves the stored status untouched
        let stored = service.requests.get_by_id(&request.id).unwrap().unwrap();
        assert_eq!(stored.status, ConversionStatus::Pending);
    }

    #[test]
    fn ownership_distinguishes_forbidden_from_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = test_service(&temp_dir);

        let outcome = service
            .convert(ResourceType::Patient, &john_doe(), Some("alice"))
            .unwrap();
        let id = outcome.id.unwrap().to_string();

        assert!(matches!(
            service.get_request(&id, Some("bob")).unwrap(),
            Access::Forbidden
        ));
        assert!(matches!(
            service.get_request(&id, None).unwrap(),
            Access::Forbidden
        ));
        assert!(matches!(
            service.get_request(&id, Some("alice")).unwrap(),
            Access::Found(_)
        ));
        assert!(matches!(
            service
                .get_request("00000000000000000000000000000000", Some("bob"))
                .unwrap(),
            Access::NotFound
        ));
    }

    #[test]
    fn rerun_denied_for_foreign_caller() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = test_service(&temp_dir);

        let outcome = service
            .convert(ResourceType::Patient, &john_doe(), Some("alice"))
            .unwrap();
        let id = outcome.id.unwrap().to_string();

        let denied = service.rerun(&id, Some("bob")).unwrap();
        assert!(!denied.success);
        assert_eq!(denied.message, "Conversion request belongs to another caller");
        assert_eq!(denied.id.map(|i| i.to_string()), Some(id.clone()));

        let allowed = service.rerun(&id, Some("alice")).unwrap();
        assert!(allowed.success, "{}", allowed.message);
    }

    #[test]
    fn history_is_scoped_to_the_caller() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = test_service(&temp_dir);

        service
            .convert(ResourceType::Patient, &john_doe(), Some("alice"))
            .unwrap();
        service
            .convert(ResourceType::Patient, &john_doe(), Some("bob"))
            .unwrap();
        service
            .convert(ResourceType::Patient, &john_doe(), None)
            .unwrap();

        assert_eq!(service.history(Some("alice")).len(), 2);
        assert_eq!(service.history(Some("bob")).len(), 2);
        assert_eq!(service.history(None).len(), 1);
    }

    #[test]
    fn history_for_type_filters_resource_type() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = test_service(&temp_dir);

        service
            .convert(ResourceType::Patient, &john_doe(), None)
            .unwrap();
        service
            .convert(
                ResourceType::Organization,
                &json!({"name": "Gen Hosp", "registrationNumber": "ORG1"}),
                None,
            )
            .unwrap();

        let organizations = service.history_for_type(ResourceType::Organization, None);
        assert_eq!(organizations.len(), 1);
        assert_eq!(
            organizations[0].resource_type,
            ResourceType::Organization
        );
    }

    #[test]
    fn fhir_resource_lookup_reports_not_found_without_a_resource() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = test_service(&temp_dir);

        // A failed conversion persists a request but no resource. Force a failure by
        // storing a request directly with a blank snapshot.
        let request = service
            .requests
            .create(ResourceType::Patient, "".to_string(), None)
            .unwrap();

        assert!(matches!(
            service
                .get_fhir_resource(&request.id.to_string(), None)
                .unwrap(),
            Access::NotFound
        ));
    }
}
