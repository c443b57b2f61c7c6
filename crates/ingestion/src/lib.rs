//! Document ingestion collaborators for fhir-bridge.
//!
//! This crate holds the two black-box services the conversion boundary consumes when a
//! caller uploads a scanned document instead of structured JSON:
//!
//! - [`OcrService`] - plain text extraction from a file path, dispatched on file
//!   extension. The current implementation simulates OCR with representative
//!   medical-document text.
//! - [`ExtractionService`] - a heuristic field extractor that scans OCR text for known
//!   keywords and produces an intake-shaped value with per-field confidence scores, an
//!   overall confidence, and human-readable warnings.
//!
//! Failures from either collaborator are named errors; the boundary surfaces them as
//! 400-class ingestion failures, never as conversion pipeline faults.

pub mod extraction;
pub mod ocr;

pub use extraction::{ExtractionResult, ExtractionService};
pub use ocr::OcrService;

/// Errors returned by the ingestion collaborators.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("File type {0} not supported for OCR")]
    UnsupportedFileType(String),

    #[error("OCR extraction failed: {0}")]
    Ocr(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("failed to serialize extracted data: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;
