//! Pipeline orchestration: classify → extract → detect → translate → present.
//!
//! [`Pipeline::process`] is a pure async function from an [`UploadedFile`] to
//! a [`PipelineOutput`]: it never touches a display, never plays audio and
//! never fails. Every collaborator failure has already been turned into one
//! of the fixed outcomes by the time it returns. Stages run strictly one after
//! another; nothing is shared between runs.
//!
//! Speech is left to the caller (see [`crate::speech`]), which decides whether
//! to await playback, spawn it, or skip it.

use crate::config::{OcrEngineKind, PipelineConfig};
use crate::error::{DocSpeakError, ExtractError};
use crate::output::{PipelineOutput, RunStats};
use crate::pipeline::classify::{classify, ExtractionMethod};
use crate::pipeline::input::{self, UploadedFile};
use crate::pipeline::language::{detect_language, translate_text, LanguageService, MyMemoryClient};
use crate::pipeline::ocr::{perform_ocr, OcrEngine, TesseractEngine};
use crate::pipeline::pdf::{PdfTextExtractor, PdfiumExtractor};
use crate::pipeline::present::{Outcome, Presentation};
use crate::pipeline::vision::VisionOcrEngine;
use crate::progress::PipelineStage;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A configured pipeline with its external collaborators.
pub struct Pipeline {
    config: PipelineConfig,
    pdf: Arc<dyn PdfTextExtractor>,
    ocr: Arc<dyn OcrEngine>,
    language: Arc<dyn LanguageService>,
}

impl Pipeline {
    /// Build a pipeline with the default backends selected by `config`.
    pub fn new(config: PipelineConfig) -> Result<Self, DocSpeakError> {
        PipelineBuilder::new(config).build()
    }

    /// Start a builder to swap in custom backends.
    pub fn builder(config: PipelineConfig) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the whole pipeline on one uploaded file.
    pub async fn process(&self, file: &UploadedFile) -> PipelineOutput {
        let total_start = Instant::now();
        info!(
            "Processing '{}' ({}, {} bytes)",
            file.name,
            file.media_type,
            file.len()
        );
        self.stage(PipelineStage::FileSelected);

        // ── Step 1: Classify ─────────────────────────────────────────────
        let method = classify(&file.media_type);
        debug!("Classified {} as {:?}", file.media_type, method);

        // ── Step 2: Extract ──────────────────────────────────────────────
        self.stage(PipelineStage::Extracting);
        let extraction_start = Instant::now();
        let extracted = self.extract(file, method).await.and_then(|text| {
            if text.is_empty() {
                Err(ExtractError::EmptyText)
            } else {
                Ok(text)
            }
        });
        let mut stats = RunStats {
            input_bytes: file.len(),
            extraction_duration_ms: extraction_start.elapsed().as_millis() as u64,
            ..Default::default()
        };

        let extracted = match extracted {
            Ok(text) => text,
            Err(e) => {
                warn!("Text extraction failed: {}", e);
                stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
                return self.finish(
                    file,
                    method,
                    Presentation::extraction_failed(),
                    Some(e),
                    stats,
                );
            }
        };
        stats.extracted_chars = extracted.chars().count();
        self.stage(PipelineStage::Extracted);

        // ── Step 3: Detect language ──────────────────────────────────────
        let language_start = Instant::now();
        self.stage(PipelineStage::DetectingLanguage);
        let detected = detect_language(self.language.as_ref(), &extracted, &self.config).await;

        // ── Step 4: Translate (source language only) ─────────────────────
        let presentation = match detected {
            Some(tag) if tag == self.config.source_lang => {
                self.stage(PipelineStage::Translating);
                let translation =
                    translate_text(self.language.as_ref(), &extracted, &tag, &self.config).await;
                Presentation::after_translation(
                    extracted,
                    tag,
                    translation,
                    self.config.retain_original_on_failure,
                )
            }
            other => {
                info!(
                    "Detected {:?} (not '{}'); presenting original text",
                    other, self.config.source_lang
                );
                Presentation::original(extracted, other)
            }
        };
        stats.language_duration_ms = language_start.elapsed().as_millis() as u64;
        stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

        self.finish(file, method, presentation, None, stats)
    }

    /// Resolve a path or URL, then [`process`](Self::process) it.
    pub async fn process_input(
        &self,
        input_str: &str,
        media_type: Option<&str>,
    ) -> Result<PipelineOutput, DocSpeakError> {
        let file =
            input::resolve_input(input_str, media_type, self.config.request_timeout_secs).await?;
        Ok(self.process(&file).await)
    }

    async fn extract(
        &self,
        file: &UploadedFile,
        method: ExtractionMethod,
    ) -> Result<String, ExtractError> {
        match method {
            ExtractionMethod::PdfTextLayer => self.pdf.extract(&file.bytes, &self.config).await,
            ExtractionMethod::ImageOcr => {
                perform_ocr(self.ocr.as_ref(), file, &self.config.ocr_language).await
            }
            ExtractionMethod::Unsupported => Err(ExtractError::UnsupportedMediaType {
                media_type: file.media_type.clone(),
            }),
        }
    }

    fn finish(
        &self,
        file: &UploadedFile,
        method: ExtractionMethod,
        presentation: Presentation,
        extraction_error: Option<ExtractError>,
        stats: RunStats,
    ) -> PipelineOutput {
        let terminal = match presentation.outcome {
            Outcome::ExtractionFailed => PipelineStage::ExtractionFailed,
            Outcome::Original => PipelineStage::PresentingOriginal,
            Outcome::Translated => PipelineStage::Presented,
            Outcome::TranslationFailed => PipelineStage::TranslationFailed,
        };
        self.stage(terminal);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_run_complete(terminal);
        }
        info!("Run complete: {} in {}ms", terminal, stats.total_duration_ms);

        PipelineOutput {
            file_name: file.name.clone(),
            media_type: file.media_type.clone(),
            method,
            presentation,
            extraction_error,
            stats,
        }
    }

    fn stage(&self, stage: PipelineStage) {
        debug!("Stage: {}", stage);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage(stage);
        }
    }
}

/// Builder for [`Pipeline`]. Backends left unset are created from the config.
pub struct PipelineBuilder {
    config: PipelineConfig,
    pdf: Option<Arc<dyn PdfTextExtractor>>,
    ocr: Option<Arc<dyn OcrEngine>>,
    language: Option<Arc<dyn LanguageService>>,
}

impl PipelineBuilder {
    fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            pdf: None,
            ocr: None,
            language: None,
        }
    }

    pub fn pdf_extractor(mut self, pdf: Arc<dyn PdfTextExtractor>) -> Self {
        self.pdf = Some(pdf);
        self
    }

    pub fn ocr_engine(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn language_service(mut self, language: Arc<dyn LanguageService>) -> Self {
        self.language = Some(language);
        self
    }

    pub fn build(self) -> Result<Pipeline, DocSpeakError> {
        let pdf = self
            .pdf
            .unwrap_or_else(|| Arc::new(PdfiumExtractor) as Arc<dyn PdfTextExtractor>);

        let ocr = match self.ocr {
            Some(ocr) => ocr,
            None => match self.config.ocr_engine {
                OcrEngineKind::Tesseract => {
                    Arc::new(TesseractEngine::new(self.config.tesseract_program.clone()))
                        as Arc<dyn OcrEngine>
                }
                OcrEngineKind::Vision => Arc::new(VisionOcrEngine::from_config(&self.config)?),
            },
        };

        let language = match self.language {
            Some(language) => language,
            None => Arc::new(MyMemoryClient::from_config(&self.config)?) as Arc<dyn LanguageService>,
        };

        Ok(Pipeline {
            config: self.config,
            pdf,
            ocr,
            language,
        })
    }
}

/// Run the pipeline on a file path or URL with the default backends.
///
/// # Errors
/// Returns `Err(DocSpeakError)` only when the input cannot be read or a
/// backend cannot be constructed. Extraction, detection and translation
/// failures are reported through the returned presentation.
pub async fn run(
    input_str: impl AsRef<str>,
    media_type: Option<&str>,
    config: &PipelineConfig,
) -> Result<PipelineOutput, DocSpeakError> {
    let pipeline = Pipeline::new(config.clone())?;
    pipeline.process_input(input_str.as_ref(), media_type).await
}

/// Run the pipeline and write the display text to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn run_to_file(
    input_str: impl AsRef<str>,
    media_type: Option<&str>,
    output_path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<PipelineOutput, DocSpeakError> {
    let output = run(input_str, media_type, config).await?;
    write_display_text(output_path.as_ref(), output.display_text()).await?;
    Ok(output)
}

/// Synchronous wrapper around [`run`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_sync(
    input_str: impl AsRef<str>,
    media_type: Option<&str>,
    config: &PipelineConfig,
) -> Result<PipelineOutput, DocSpeakError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocSpeakError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run(input_str, media_type, config))
}

async fn write_display_text(path: &Path, text: &str) -> Result<(), DocSpeakError> {
    let write_err = |source| DocSpeakError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
    }

    let tmp_path = path.with_extension("txt.tmp");
    tokio::fs::write(&tmp_path, text).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}
