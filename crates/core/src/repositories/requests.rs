//! Conversion request persistence.
//!
//! Requests are stored as `request.json` inside a sharded directory derived from the
//! record id:
//!
//! ```text
//! conversions/
//!   <s1>/
//!     <s2>/
//!       <uuid>/
//!         request.json     # ConversionRequest, camelCase JSON
//!         resource.json    # FhirResourceRecord, present only after success
//! ```
//!
//! where `s1` and `s2` are the first four hex characters of the id. Each write replaces
//! the whole file; there is no in-place mutation.
//!
//! ## Pure data operations
//!
//! This module contains **only** data operations. Ownership policy, status transitions,
//! and API-level concerns live in the orchestrator and the REST binary.

use crate::config::CoreConfig;
use crate::constants::REQUEST_FILENAME;
use crate::entities::ConversionRequest;
use crate::error::{ConversionError, ConversionResult};
use crate::repositories::helpers::{create_unique_record_dir, record_dirs};
use bridge_uuid::RecordUuid;
use intake_types::ResourceType;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// File-backed store for [`ConversionRequest`] records.
#[derive(Clone, Debug)]
pub struct ConversionRequestRepository {
    cfg: Arc<CoreConfig>,
}

impl ConversionRequestRepository {
    /// Creates a repository over the configured conversions directory.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Allocates an id, creates the record directory, and persists a fresh `Pending`
    /// request.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError` if directory allocation, serialization, or the file
    /// write fails.
    pub fn create(
        &self,
        resource_type: ResourceType,
        input_data_json: String,
        owner_id: Option<String>,
    ) -> ConversionResult<ConversionRequest> {
        let (id, record_dir) =
            create_unique_record_dir(&self.cfg.conversions_dir(), RecordUuid::new)?;

        let request = ConversionRequest::pending(id, resource_type, input_data_json, owner_id);
        write_request(&record_dir.join(REQUEST_FILENAME), &request)?;

        Ok(request)
    }

    /// Reads a request by id. Returns `Ok(None)` when no record exists.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError` if an existing record file cannot be read or parsed.
    pub fn get_by_id(&self, id: &RecordUuid) -> ConversionResult<Option<ConversionRequest>> {
        let path = self.request_path(id);
        if !path.is_file() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).map_err(ConversionError::FileRead)?;
        let request =
            serde_json::from_str(&contents).map_err(ConversionError::Deserialization)?;
        Ok(Some(request))
    }

    /// Rewrites the stored record for an existing request.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::InvalidInput` if no record directory exists for the
    /// request id, or a file error if the write fails.
    pub fn update(&self, request: &ConversionRequest) -> ConversionResult<()> {
        let record_dir = request.id.sharded_dir(&self.cfg.conversions_dir());
        if !record_dir.is_dir() {
            return Err(ConversionError::InvalidInput(format!(
                "no conversion record directory for id {}",
                request.id
            )));
        }

        write_request(&record_dir.join(REQUEST_FILENAME), request)
    }

    /// Lists all stored requests.
    ///
    /// Traverses the sharded directory structure and reads every `request.json`. Record
    /// files that cannot be parsed are logged as warnings and skipped; a missing
    /// conversions directory yields an empty list.
    pub fn list_all(&self) -> Vec<ConversionRequest> {
        let mut requests = Vec::new();

        for record_dir in record_dirs(&self.cfg.conversions_dir()) {
            let path = record_dir.join(REQUEST_FILENAME);
            if !path.is_file() {
                continue;
            }

            if let Ok(contents) = fs::read_to_string(&path) {
                match serde_json::from_str::<ConversionRequest>(&contents) {
                    Ok(request) => requests.push(request),
                    Err(e) => {
                        tracing::warn!(
                            "failed to parse request.json: {} - {}",
                            path.display(),
                            e
                        );
                    }
                }
            }
        }

        requests
    }

    /// Lists the requests visible to `caller` (owned by them, or unowned).
    pub fn list_for_caller(&self, caller: Option<&str>) -> Vec<ConversionRequest> {
        self.list_all()
            .into_iter()
            .filter(|request| request.accessible_by(caller))
            .collect()
    }

    /// Lists all stored requests targeting the given resource type.
    pub fn list_by_resource_type(&self, resource_type: ResourceType) -> Vec<ConversionRequest> {
        self.list_all()
            .into_iter()
            .filter(|request| request.resource_type == resource_type)
            .collect()
    }

    fn request_path(&self, id: &RecordUuid) -> PathBuf {
        id.sharded_dir(&self.cfg.conversions_dir())
            .join(REQUEST_FILENAME)
    }
}

fn write_request(path: &std::path::Path, request: &ConversionRequest) -> ConversionResult<()> {
    let json =
        serde_json::to_string_pretty(request).map_err(ConversionError::Serialization)?;
    fs::write(path, json).map_err(ConversionError::FileWrite)
}
