//! Durable conversion records.
//!
//! This module defines the two persisted record types and their lifecycle:
//!
//! - [`ConversionRequest`] - one per conversion attempt, carrying the immutable snapshot
//!   of the intake payload (`inputDataJson`) that replay re-reads.
//! - [`FhirResourceRecord`] - the generated FHIR JSON for a successful conversion,
//!   linked 1:1 to its request. It is deleted and re-created wholesale on replay, never
//!   mutated in place.
//!
//! A request with status `Success` always has exactly one associated resource record;
//! `Pending` and `Failed` requests have none. The orchestrator enforces this, not the
//! store.
//!
//! Records serialize with camelCase field names; that is the shape written to
//! `request.json`/`resource.json` and returned over the API.

use crate::constants::MAPPING_VERSION;
use bridge_uuid::RecordUuid;
use chrono::{DateTime, Utc};
use intake_types::{
    IntakePayload, OrganizationInput, PatientInput, PractitionerInput, ResourceType,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status of a conversion request.
///
/// Transition table:
/// - `Pending` -> `Success` | `Failed` (exactly once per attempt)
/// - `Success` | `Failed` -> `Pending` (replay starts a fresh attempt on the same record)
///
/// Every transition is persisted before the pipeline returns, so a caller never observes
/// a request left `Pending` after `convert`/`rerun` completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ConversionStatus {
    Pending,
    Success,
    Failed,
}

/// One conversion attempt and its audit fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    /// Unique record identifier, assigned at creation.
    #[schema(value_type = String)]
    pub id: RecordUuid,

    /// The FHIR resource type this request converts to. Immutable after creation.
    #[schema(value_type = String)]
    pub resource_type: ResourceType,

    /// Snapshot of the typed intake payload as accepted by validation, serialized with
    /// camelCase field names. The sole source of truth for replay.
    pub input_data_json: String,

    pub status: ConversionStatus,

    /// Populated only on `Failed`; cleared on `Success`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Tag identifying which mapping ruleset produced the result.
    pub mapping_version: String,

    /// Set at creation, never updated.
    pub created_at: DateTime<Utc>,

    /// When present, restricts visibility to the owning caller. Absent on unowned
    /// (legacy) records, which stay readable by everyone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

impl ConversionRequest {
    /// Builds a fresh `Pending` request around an already-allocated identifier.
    pub(crate) fn pending(
        id: RecordUuid,
        resource_type: ResourceType,
        input_data_json: String,
        owner_id: Option<String>,
    ) -> Self {
        Self {
            id,
            resource_type,
            input_data_json,
            status: ConversionStatus::Pending,
            error_message: None,
            mapping_version: MAPPING_VERSION.to_string(),
            created_at: Utc::now(),
            owner_id,
        }
    }

    /// Terminal transition: the attempt produced a validated FHIR resource.
    pub fn mark_success(&mut self) {
        self.status = ConversionStatus::Success;
        self.error_message = None;
    }

    /// Terminal transition: the attempt failed, recording why.
    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.status = ConversionStatus::Failed;
        self.error_message = Some(message.into());
    }

    /// Replay transition: back to `Pending` with the previous failure reason cleared.
    pub fn reset_pending(&mut self) {
        self.status = ConversionStatus::Pending;
        self.error_message = None;
    }

    /// Whether `caller` may read or replay this record.
    ///
    /// Unowned records are visible to every caller; owned records only to their owner.
    /// An anonymous caller can therefore see unowned records but nothing owned.
    pub fn accessible_by(&self, caller: Option<&str>) -> bool {
        match self.owner_id.as_deref() {
            None => true,
            Some(owner) => caller == Some(owner),
        }
    }

    /// Re-reads the stored intake snapshot for replay.
    ///
    /// The two legacy conditions are first-class variants rather than caught parse
    /// errors, so they cannot be confused with an ordinary bug:
    /// [`StoredInput::Missing`] for records persisted before input snapshotting existed,
    /// and [`StoredInput::Unreadable`] for snapshots that no longer parse as the intake
    /// model.
    pub fn load_input(&self) -> StoredInput {
        if self.input_data_json.trim().is_empty() {
            return StoredInput::Missing;
        }

        let parsed = match self.resource_type {
            ResourceType::Patient => serde_json::from_str::<PatientInput>(&self.input_data_json)
                .map(IntakePayload::Patient),
            ResourceType::Practitioner => {
                serde_json::from_str::<PractitionerInput>(&self.input_data_json)
                    .map(IntakePayload::Practitioner)
            }
            ResourceType::Organization => {
                serde_json::from_str::<OrganizationInput>(&self.input_data_json)
                    .map(IntakePayload::Organization)
            }
        };

        match parsed {
            Ok(payload) => StoredInput::Snapshot(payload),
            Err(_) => StoredInput::Unreadable,
        }
    }
}

/// Result of re-reading a request's persisted intake snapshot.
#[derive(Clone, Debug, PartialEq)]
pub enum StoredInput {
    /// The snapshot parsed back into the typed intake payload.
    Snapshot(IntakePayload),
    /// The record predates input snapshotting and carries no payload.
    Missing,
    /// A snapshot exists but no longer parses as the intake model.
    Unreadable,
}

/// The generated FHIR resource for a successful conversion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FhirResourceRecord {
    /// Unique record identifier.
    #[schema(value_type = String)]
    pub id: RecordUuid,

    /// The conversion request this resource was generated for (1:1).
    #[schema(value_type = String)]
    pub conversion_request_id: RecordUuid,

    /// The serialized FHIR-compliant resource.
    pub fhir_json: String,

    pub created_at: DateTime<Utc>,
}

impl FhirResourceRecord {
    /// Builds a fresh resource record for a request.
    pub(crate) fn generated(conversion_request_id: RecordUuid, fhir_json: String) -> Self {
        Self {
            id: RecordUuid::new(),
            conversion_request_id,
            fhir_json,
            created_at: Utc::now(),
        }
    }
}

/// Ownership-aware lookup result.
///
/// `Forbidden` is distinguishable from `NotFound` precisely so the boundary layer can
/// answer 403 for a record that exists but belongs to another caller and 404 for one
/// that does not exist at all.
#[derive(Clone, Debug, PartialEq)]
pub enum Access<T> {
    Found(T),
    Forbidden,
    NotFound,
}

impl<T> Access<T> {
    /// Maps the `Found` value, preserving `Forbidden`/`NotFound`.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Access<U> {
        match self {
            Access::Found(value) => Access::Found(f(value)),
            Access::Forbidden => Access::Forbidden,
            Access::NotFound => Access::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_patient_request(input_json: &str) -> ConversionRequest {
        ConversionRequest::pending(
            RecordUuid::new(),
            ResourceType::Patient,
            input_json.to_string(),
            None,
        )
    }

    #[test]
    fn new_request_starts_pending_with_mapping_version() {
        let request = pending_patient_request("{}");

        assert_eq!(request.status, ConversionStatus::Pending);
        assert_eq!(request.mapping_version, "v1");
        assert!(request.error_message.is_none());
    }

    #[test]
    fn status_transitions_follow_the_table() {
        let mut request = pending_patient_request("{}");

        request.mark_failed("FHIR_VALIDATION_FAILED");
        assert_eq!(request.status, ConversionStatus::Failed);
        assert_eq!(
            request.error_message.as_deref(),
            Some("FHIR_VALIDATION_FAILED")
        );

        request.reset_pending();
        assert_eq!(request.status, ConversionStatus::Pending);
        assert!(request.error_message.is_none());

        request.mark_success();
        assert_eq!(request.status, ConversionStatus::Success);
        assert!(request.error_message.is_none());
    }

    #[test]
    fn serializes_with_camel_case_field_names() {
        let request = pending_patient_request(r#"{"firstName":"John"}"#);
        let json = serde_json::to_string(&request).unwrap();

        assert!(json.contains("\"resourceType\":\"Patient\""));
        assert!(json.contains("\"inputDataJson\""));
        assert!(json.contains("\"mappingVersion\":\"v1\""));
        assert!(json.contains("\"createdAt\""));
        // Absent optional fields are omitted entirely
        assert!(!json.contains("errorMessage"));
        assert!(!json.contains("ownerId"));

        let back: ConversionRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn load_input_returns_snapshot_for_parseable_json() {
        let request =
            pending_patient_request(r#"{"firstName":"John","lastName":"Doe","dateOfBirth":"1990-05-14"}"#);

        match request.load_input() {
            StoredInput::Snapshot(IntakePayload::Patient(p)) => {
                assert_eq!(p.first_name.as_deref(), Some("John"));
            }
            other => panic!("expected patient snapshot, got {other:?}"),
        }
    }

    #[test]
    fn load_input_flags_empty_snapshot_as_missing() {
        let request = pending_patient_request("   ");
        assert_eq!(request.load_input(), StoredInput::Missing);
    }

    #[test]
    fn load_input_flags_unparseable_snapshot() {
        let request = pending_patient_request("not json at all");
        assert_eq!(request.load_input(), StoredInput::Unreadable);
    }

    #[test]
    fn unowned_records_are_visible_to_everyone() {
        let request = pending_patient_request("{}");

        assert!(request.accessible_by(None));
        assert!(request.accessible_by(Some("alice")));
    }

    #[test]
    fn owned_records_are_visible_only_to_their_owner() {
        let mut request = pending_patient_request("{}");
        request.owner_id = Some("alice".to_string());

        assert!(request.accessible_by(Some("alice")));
        assert!(!request.accessible_by(Some("bob")));
        assert!(!request.accessible_by(None));
    }

    #[test]
    fn access_map_preserves_denials() {
        let found: Access<u8> = Access::Found(7);
        assert_eq!(found.map(|v| v + 1), Access::Found(8));

        let forbidden: Access<u8> = Access::Forbidden;
        assert_eq!(forbidden.map(|v| v + 1), Access::Forbidden);
    }
}
