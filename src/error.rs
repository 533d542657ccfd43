//! Error types for the edgequake-docspeak library.
//!
//! Two tiers of failure exist:
//!
//! * [`DocSpeakError`] is **fatal**: the run cannot start at all (input file
//!   missing, download failed, configuration invalid). Returned as
//!   `Err(DocSpeakError)` from the top-level entry points.
//!
//! * Stage errors are **recovered**: [`ExtractError`], [`ServiceError`] and
//!   [`SpeechError`] are produced at the boundary of each external
//!   collaborator. The pipeline logs them and converts them into a fixed
//!   outcome (extraction failed, fallback language, translation failed,
//!   no audio) so one failing collaborator never aborts the run.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-docspeak library.
#[derive(Debug, Error)]
pub enum DocSpeakError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output text file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The OCR or language backend could not be constructed.
    #[error("Backend '{backend}' is not configured.\n{hint}")]
    BackendNotConfigured { backend: String, hint: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Text extraction failed. Every extraction strategy reports through this
/// type, so the PDF and OCR paths fail the same way.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ExtractError {
    /// The declared media type routes to no extraction strategy.
    #[error("Unsupported media type '{media_type}'")]
    UnsupportedMediaType { media_type: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH to the directory containing libpdfium, or install it system-wide."
    )]
    PdfiumBindingFailed(String),

    /// The document could not be opened (corrupt, encrypted, not a PDF).
    #[error("Failed to open PDF: {detail}")]
    PdfOpenFailed { detail: String },

    /// A page's text layer could not be read. Aborts the whole document.
    #[error("Failed to read text layer of page {page}: {detail}")]
    PageTextFailed { page: usize, detail: String },

    /// Image bytes could not be decoded or re-encoded.
    #[error("Image decoding failed: {0}")]
    ImageDecodeFailed(String),

    /// The OCR engine failed to recognise the image.
    #[error("OCR engine '{engine}' failed: {detail}")]
    OcrFailed { engine: String, detail: String },

    /// Extraction ran but produced no text.
    #[error("Extraction produced no text")]
    EmptyText,

    /// A blocking extraction task panicked or was cancelled.
    #[error("Extraction task failed: {0}")]
    TaskFailed(String),
}

/// A call to the remote language-detection/translation service failed.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request could not be sent or the body could not be read.
    #[error("Request to '{url}' failed: {detail}")]
    Request { url: String, detail: String },

    /// The request exceeded the configured timeout.
    #[error("Request to '{url}' timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    /// The service answered with a non-success HTTP status.
    #[error("Service returned HTTP {status}")]
    HttpStatus { status: u16 },

    /// The response body is not the expected JSON shape.
    #[error("Malformed service response: {0}")]
    MalformedResponse(String),

    /// The body carried a non-200 `responseStatus` (quota, invalid pair, …).
    #[error("Service rejected the request (status {status}): {detail}")]
    Rejected { status: u16, detail: String },
}

/// Speech playback failed or is unavailable.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// No speech backend is available in this environment.
    #[error("Speech synthesis is not available: {0}")]
    Unavailable(String),

    /// The backend ran but reported failure.
    #[error("Speech synthesis failed: {0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_text_failed_display() {
        let e = ExtractError::PageTextFailed {
            page: 3,
            detail: "no text layer".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("page 3"), "got: {msg}");
        assert!(msg.contains("no text layer"));
    }

    #[test]
    fn unsupported_media_type_display() {
        let e = ExtractError::UnsupportedMediaType {
            media_type: "text/plain".into(),
        };
        assert!(e.to_string().contains("text/plain"));
    }

    #[test]
    fn timeout_display() {
        let e = ServiceError::Timeout {
            url: "https://api.example.com/get".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn rejected_display() {
        let e = ServiceError::Rejected {
            status: 403,
            detail: "QUOTA EXCEEDED".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("QUOTA"));
    }

    #[test]
    fn extract_error_serialises() {
        let e = ExtractError::OcrFailed {
            engine: "tesseract".into(),
            detail: "exit status 1".into(),
        };
        let json = serde_json::to_string(&e).expect("serialise");
        assert!(json.contains("OcrFailed"));
    }
}
