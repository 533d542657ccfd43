//! Input classification: pick the extraction strategy from the declared media type.
//!
//! The declared type is trusted as-is. A file declared as `image/png` that
//! actually contains a PDF goes to OCR; a PDF declared as
//! `application/octet-stream` is not extracted at all.

use serde::{Deserialize, Serialize};

/// Media type that routes to text-layer extraction.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Extraction strategy selected for an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionMethod {
    /// Read the document's embedded text layer, page by page.
    PdfTextLayer,
    /// Recognise text from the image pixels.
    ImageOcr,
    /// No strategy applies; the run ends as an extraction failure.
    Unsupported,
}

/// Classify a declared media type.
///
/// Exact match on `application/pdf`, prefix match on `image`, anything else
/// is [`ExtractionMethod::Unsupported`].
pub fn classify(media_type: &str) -> ExtractionMethod {
    if media_type == PDF_MEDIA_TYPE {
        ExtractionMethod::PdfTextLayer
    } else if media_type.starts_with("image") {
        ExtractionMethod::ImageOcr
    } else {
        ExtractionMethod::Unsupported
    }
}
