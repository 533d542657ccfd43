//! OCR extraction: recognise text from an uploaded image.
//!
//! Engines implement [`OcrEngine`]. The default [`TesseractEngine`] shells out
//! to the `tesseract` executable with a language-pack hint; the vision engine
//! in [`crate::pipeline::vision`] sends the image to a multimodal LLM instead.
//! Whatever the engine, a failure comes back as an [`ExtractError`] value, never
//! a panic, so the pipeline can present it like any other extraction failure.

use crate::error::ExtractError;
use crate::pipeline::input::UploadedFile;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Structured result of a recognition pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrOutput {
    /// Recognised text, verbatim from the engine.
    pub text: String,
}

/// An OCR backend.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine identifier used in logs and errors (e.g. "tesseract").
    fn name(&self) -> &str;

    /// Recognise the text in `image`.
    ///
    /// `language` is the recognition hint (a Tesseract pack name such as `spa`).
    async fn recognize(
        &self,
        image: &[u8],
        media_type: &str,
        language: &str,
    ) -> Result<OcrOutput, ExtractError>;
}

/// Run OCR on an uploaded image, logging the outcome.
pub async fn perform_ocr(
    engine: &dyn OcrEngine,
    file: &UploadedFile,
    language: &str,
) -> Result<String, ExtractError> {
    let start = Instant::now();
    info!(
        "Running OCR ({}, lang={}) on '{}'",
        engine.name(),
        language,
        file.name
    );

    match engine.recognize(&file.bytes, &file.media_type, language).await {
        Ok(output) => {
            debug!(
                "OCR produced {} bytes in {:?}",
                output.text.len(),
                start.elapsed()
            );
            Ok(output.text)
        }
        Err(e) => {
            warn!("Error performing OCR: {}", e);
            Err(e)
        }
    }
}

/// OCR through the `tesseract` command-line tool.
///
/// The image is written to a temp file (tesseract needs a path it can
/// re-open) and recognised with `tesseract <file> stdout -l <language>`.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    program: String,
}

impl TesseractEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(
        &self,
        image: &[u8],
        media_type: &str,
        language: &str,
    ) -> Result<OcrOutput, ExtractError> {
        let failed = |detail: String| ExtractError::OcrFailed {
            engine: self.name().to_string(),
            detail,
        };

        let tmp = tempfile::Builder::new()
            .prefix("docspeak-ocr-")
            .suffix(extension_for(media_type))
            .tempfile()
            .map_err(|e| failed(format!("tempfile: {e}")))?;
        tokio::fs::write(tmp.path(), image)
            .await
            .map_err(|e| failed(format!("tempfile write: {e}")))?;

        let output = Command::new(&self.program)
            .arg(tmp.path())
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    failed(format!(
                        "'{}' not found; install tesseract and the '{}' language pack",
                        self.program, language
                    ))
                } else {
                    failed(format!("failed to run '{}': {e}", self.program))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!("{}: {}", output.status, stderr.trim())));
        }

        Ok(OcrOutput {
            text: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// File suffix tesseract/leptonica can use to pick a decoder.
fn extension_for(media_type: &str) -> &'static str {
    match media_type {
        "image/png" => ".png",
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/bmp" => ".bmp",
        "image/tiff" => ".tif",
        _ => ".img",
    }
}
