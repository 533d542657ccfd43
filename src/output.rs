//! Result types returned by a pipeline run.

use crate::error::ExtractError;
use crate::pipeline::classify::ExtractionMethod;
use crate::pipeline::present::Presentation;
use serde::{Deserialize, Serialize};

/// Everything a run produced.
///
/// `presentation.display_text` is the only thing meant for the display
/// surface; the rest is diagnostics for logs and `--json` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    /// Name of the uploaded file.
    pub file_name: String,
    /// Media type the file was classified by.
    pub media_type: String,
    /// Strategy the classifier picked.
    pub method: ExtractionMethod,
    pub presentation: Presentation,
    /// Why extraction failed, when it did.
    pub extraction_error: Option<ExtractError>,
    pub stats: RunStats,
}

impl PipelineOutput {
    /// The text block for the display surface.
    pub fn display_text(&self) -> &str {
        &self.presentation.display_text
    }
}

/// Timing and size figures for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Size of the uploaded payload.
    pub input_bytes: usize,
    /// Characters of extracted text (0 when extraction failed).
    pub extracted_chars: usize,
    pub extraction_duration_ms: u64,
    /// Detection + translation wall-clock time.
    pub language_duration_ms: u64,
    pub total_duration_ms: u64,
}
