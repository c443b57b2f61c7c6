//! Error taxonomy for the conversion core.
//!
//! `ConversionError` covers the *store-level* faults that should surface to the boundary
//! as 500-class failures. Ordinary pipeline outcomes (rejected input, failed FHIR
//! validation, missing records) are **not** errors: `ConversionService` reports them in
//! the returned [`ConversionOutcome`](crate::ConversionOutcome) so no exception-like path
//! ever escapes `convert`/`rerun`.

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to create record directory: {0}")]
    RecordDirCreation(std::io::Error),
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to delete record file: {0}")]
    FileRemove(std::io::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),

    #[error("record id error: {0}")]
    Uuid(#[from] bridge_uuid::UuidError),
}

pub type ConversionResult<T> = std::result::Result<T, ConversionError>;
