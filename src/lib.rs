//! # edgequake-docspeak
//!
//! Extract text from an uploaded PDF or image, detect its language, translate
//! it when it is in the configured source language, and hand back display
//! text plus an utterance for speech output.
//!
//! ## Pipeline Overview
//!
//! ```text
//! UploadedFile (path / URL / bytes)
//!  │
//!  ├─ 1. Classify   media type → PDF text layer | image OCR | unsupported
//!  ├─ 2. Extract    pdfium text layer (spawn_blocking) or OCR engine
//!  ├─ 3. Detect     language service, falls back to the source language
//!  ├─ 4. Translate  only when detected == source language
//!  └─ 5. Present    fixed display text + optional utterance
//! ```
//!
//! Each run is independent and strictly sequential. Failures of the
//! extractor, OCR engine or language service never escape as errors: they
//! become one of the fixed outcomes (`Failed to extract text.`,
//! `Translation failed.`).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docspeak::{run, speak_utterance, CommandSynthesizer, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Spanish → English, Tesseract "spa" for images, MyMemory for translation
//!     let config = PipelineConfig::default();
//!     let output = run("carta.pdf", None, &config).await?;
//!     println!("{}", output.display_text());
//!     if let Some(ref utterance) = output.presentation.utterance {
//!         speak_utterance(&CommandSynthesizer::default(), utterance).await.ok();
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docspeak` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-docspeak = { version = "0.1", default-features = false }
//! ```
//!
//! ## External tools
//!
//! | Concern | Default backend | Swap via |
//! |---------|-----------------|----------|
//! | PDF text | pdfium shared library | [`PdfTextExtractor`] |
//! | Image OCR | `tesseract` CLI | [`OcrEngine`] ([`VisionOcrEngine`] for LLM OCR) |
//! | Detect / translate | MyMemory HTTP API | [`LanguageService`] |
//! | Speech | `espeak-ng` CLI | [`SpeechSynthesizer`] |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod prompts;
pub mod speech;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OcrEngineKind, PipelineConfig, PipelineConfigBuilder};
pub use error::{DocSpeakError, ExtractError, ServiceError, SpeechError};
pub use output::{PipelineOutput, RunStats};
pub use pipeline::classify::{classify, ExtractionMethod};
pub use pipeline::input::{resolve_input, UploadedFile};
pub use pipeline::language::{
    detect_language, translate_text, LanguageService, MyMemoryClient, TranslationResult,
};
pub use pipeline::ocr::{perform_ocr, OcrEngine, OcrOutput, TesseractEngine};
pub use pipeline::pdf::{extract_pdf_text, PdfTextExtractor, PdfiumExtractor};
pub use pipeline::present::{voice_locale, Outcome, Presentation, Utterance};
pub use pipeline::vision::VisionOcrEngine;
pub use process::{run, run_sync, run_to_file, Pipeline, PipelineBuilder};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, PipelineStage, ProgressCallback};
pub use speech::{
    spawn_speech, speak_utterance, CommandSynthesizer, SilentSynthesizer, SpeechSynthesizer,
};
