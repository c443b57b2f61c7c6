//! Simulated OCR text extraction.
//!
//! Dispatches on the file extension and returns representative medical-document text.
//! The interface (a file path in, plain text out, named failures) is the contract a
//! real OCR engine would slot into.

use crate::{IngestError, IngestResult};
use std::path::Path;

/// OCR collaborator: extracts plain text from an uploaded document.
#[derive(Clone, Debug, Default)]
pub struct OcrService;

impl OcrService {
    /// Creates a new OCR service.
    pub fn new() -> Self {
        Self
    }

    /// Extracts text from the document at `file_path`.
    ///
    /// Supported extensions: `.pdf`, `.png`, `.jpg`, `.jpeg`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::UnsupportedFileType`] for any other extension.
    pub fn extract_text(&self, file_path: &Path) -> IngestResult<String> {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        tracing::info!("starting OCR extraction for file: {file_name}");

        let extension = file_path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let extracted = match extension.as_str() {
            "pdf" => pdf_text(),
            "png" | "jpg" | "jpeg" => image_text(),
            other => {
                return Err(IngestError::UnsupportedFileType(format!(".{other}")));
            }
        };

        tracing::info!(
            "OCR extraction completed, text length: {} characters",
            extracted.len()
        );
        Ok(extracted)
    }
}

/// Simulated text for a scanned patient-information image.
fn image_text() -> String {
    "PATIENT INFORMATION
Name: John Doe
Date of Birth: 1990-05-14
Gender: Male
Phone: +1-555-123-4567
Email: john.doe@example.com

ADDRESS:
123 Main Street
San Francisco, CA 94105
USA

MEDICAL RECORD NUMBER: MR123456789
VISIT DATE: 2026-07-30"
        .to_string()
}

/// Simulated text for a medical-report PDF.
fn pdf_text() -> String {
    "MEDICAL REPORT

PRACTITIONER INFORMATION
Dr. Jane Smith, MD
Specialization: Internal Medicine
License Number: MD987654321
Qualification: Doctor of Medicine

PATIENT: John Doe
DOB: 1990-05-14
VISIT: 2026-07-30

DIAGNOSIS: Routine checkup
NOTES: Patient in good health"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn extracts_text_for_supported_extensions() {
        let ocr = OcrService::new();

        for name in ["scan.pdf", "scan.png", "scan.jpg", "photo.JPEG"] {
            let text = ocr
                .extract_text(&PathBuf::from(name))
                .unwrap_or_else(|e| panic!("{name} should be supported: {e}"));
            assert!(!text.is_empty());
        }
    }

    #[test]
    fn pdf_and_image_produce_different_documents() {
        let ocr = OcrService::new();

        let pdf = ocr.extract_text(&PathBuf::from("report.pdf")).unwrap();
        let image = ocr.extract_text(&PathBuf::from("card.png")).unwrap();

        assert!(pdf.contains("License Number"));
        assert!(image.contains("PATIENT INFORMATION"));
        assert_ne!(pdf, image);
    }

    #[test]
    fn rejects_unsupported_extension() {
        let ocr = OcrService::new();

        let err = ocr
            .extract_text(&PathBuf::from("notes.docx"))
            .expect_err("docx should be rejected");
        match err {
            IngestError::UnsupportedFileType(ext) => assert_eq!(ext, ".docx"),
            other => panic!("expected UnsupportedFileType, got {other:?}"),
        }
    }
}
