//! Generated FHIR resource persistence.
//!
//! A resource record lives as `resource.json` inside its conversion request's sharded
//! directory, which keeps the 1:1 relationship a filesystem fact: one directory, at most
//! one resource. Replay deletes the file and writes a fresh one; nothing is mutated in
//! place.

use crate::config::CoreConfig;
use crate::constants::RESOURCE_FILENAME;
use crate::entities::FhirResourceRecord;
use crate::error::{ConversionError, ConversionResult};
use bridge_uuid::RecordUuid;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// File-backed store for [`FhirResourceRecord`] records.
#[derive(Clone, Debug)]
pub struct FhirResourceRepository {
    cfg: Arc<CoreConfig>,
}

impl FhirResourceRepository {
    /// Creates a repository over the configured conversions directory.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Persists a freshly generated resource for the given request.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::InvalidInput` if no record directory exists for the
    /// request id, or a serialization/file error if the write fails.
    pub fn save(
        &self,
        conversion_request_id: &RecordUuid,
        fhir_json: String,
    ) -> ConversionResult<FhirResourceRecord> {
        let record_dir = conversion_request_id.sharded_dir(&self.cfg.conversions_dir());
        if !record_dir.is_dir() {
            return Err(ConversionError::InvalidInput(format!(
                "no conversion record directory for id {}",
                conversion_request_id
            )));
        }

        let record = FhirResourceRecord::generated(conversion_request_id.clone(), fhir_json);
        let json = serde_json::to_string_pretty(&record).map_err(ConversionError::Serialization)?;
        fs::write(record_dir.join(RESOURCE_FILENAME), json).map_err(ConversionError::FileWrite)?;

        Ok(record)
    }

    /// Reads the resource generated for a request, if any.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError` if an existing record file cannot be read or parsed.
    pub fn get_by_request_id(
        &self,
        conversion_request_id: &RecordUuid,
    ) -> ConversionResult<Option<FhirResourceRecord>> {
        let path = self.resource_path(conversion_request_id);
        if !path.is_file() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).map_err(ConversionError::FileRead)?;
        let record = serde_json::from_str(&contents).map_err(ConversionError::Deserialization)?;
        Ok(Some(record))
    }

    /// Deletes the resource generated for a request, if any.
    ///
    /// Returns `true` when a record was deleted, `false` when none existed.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::FileRemove` if an existing file cannot be deleted.
    pub fn delete_by_request_id(
        &self,
        conversion_request_id: &RecordUuid,
    ) -> ConversionResult<bool> {
        let path = self.resource_path(conversion_request_id);
        if !path.is_file() {
            return Ok(false);
        }

        fs::remove_file(&path).map_err(ConversionError::FileRemove)?;
        Ok(true)
    }

    fn resource_path(&self, conversion_request_id: &RecordUuid) -> PathBuf {
        conversion_request_id
            .sharded_dir(&self.cfg.conversions_dir())
            .join(RESOURCE_FILENAME)
    }
}
