//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to follow a run
//! as it moves through the linear state machine:
//!
//! ```text
//! FileSelected → Extracting → {ExtractionFailed | Extracted}
//!   → DetectingLanguage → {Translating | PresentingOriginal}
//!   → {Presented | TranslationFailed}
//! ```
//!
//! # Example
//!
//! ```rust
//! use edgequake_docspeak::{PipelineConfig, PipelineProgressCallback, PipelineStage};
//! use std::sync::{Arc, Mutex};
//!
//! struct StageLog(Mutex<Vec<PipelineStage>>);
//!
//! impl PipelineProgressCallback for StageLog {
//!     fn on_stage(&self, stage: PipelineStage) {
//!         self.0.lock().unwrap().push(stage);
//!     }
//! }
//!
//! let log = Arc::new(StageLog(Mutex::new(Vec::new())));
//! let config = PipelineConfig::builder()
//!     .progress_callback(log as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A state of the pipeline. Every run starts at `FileSelected` and ends in
/// one of the terminal states (`ExtractionFailed`, `PresentingOriginal`,
/// `Presented`, `TranslationFailed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    FileSelected,
    Extracting,
    ExtractionFailed,
    Extracted,
    DetectingLanguage,
    Translating,
    PresentingOriginal,
    Presented,
    TranslationFailed,
}

impl PipelineStage {
    /// True for states after which nothing else happens in the run.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PipelineStage::ExtractionFailed
                | PipelineStage::PresentingOriginal
                | PipelineStage::Presented
                | PipelineStage::TranslationFailed
        )
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PipelineStage::FileSelected => "file selected",
            PipelineStage::Extracting => "extracting text",
            PipelineStage::ExtractionFailed => "extraction failed",
            PipelineStage::Extracted => "text extracted",
            PipelineStage::DetectingLanguage => "detecting language",
            PipelineStage::Translating => "translating",
            PipelineStage::PresentingOriginal => "presenting original",
            PipelineStage::Presented => "presented",
            PipelineStage::TranslationFailed => "translation failed",
        };
        f.write_str(label)
    }
}

/// Called by the pipeline as it moves between stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called on every state transition, in order.
    fn on_stage(&self, stage: PipelineStage) {
        let _ = stage;
    }

    /// Called after each PDF page's text layer has been read.
    ///
    /// # Arguments
    /// * `page_num`   : 1-indexed page number
    /// * `total_pages`: page count of the document
    /// * `text_len`   : byte length of the page's joined text
    fn on_page_extracted(&self, page_num: usize, total_pages: usize, text_len: usize) {
        let _ = (page_num, total_pages, text_len);
    }

    /// Called once with the terminal stage the run ended in.
    fn on_run_complete(&self, terminal: PipelineStage) {
        let _ = terminal;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;
