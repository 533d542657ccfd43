//! Configuration types for the document-to-speech pipeline.
//!
//! Every knob lives in [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. The language pair that drives detection and the
//! translation gate is configuration, not a literal: the defaults (`es` → `en`)
//! reproduce the classic behaviour, and callers targeting another audience
//! change two fields instead of the pipeline.

use crate::error::DocSpeakError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default endpoint of the MyMemory translation API.
pub const DEFAULT_API_URL: &str = "https://api.mymemory.translated.net/get";

/// Language assumed for uploaded documents when detection cannot tell.
pub const DEFAULT_SOURCE_LANG: &str = "es";

/// Language every translation is requested into.
pub const DEFAULT_TARGET_LANG: &str = "en";

/// Tesseract language pack used as the OCR hint.
pub const DEFAULT_OCR_LANGUAGE: &str = "spa";

static RE_LANG_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{2,3}(-[A-Za-z]{2,4})?$").expect("valid regex"));

/// Configuration for one pipeline run.
///
/// # Example
/// ```rust
/// use edgequake_docspeak::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .source_lang("es")
///     .target_lang("en")
///     .request_timeout_secs(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.detection_langpair(), "es|en");
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Language the uploaded documents are assumed to be written in. Default: `"es"`.
    ///
    /// Sent as the source half of the detection language pair, used as the
    /// fallback tag when detection fails, and gates translation: only text
    /// detected as exactly this tag is translated.
    pub source_lang: String,

    /// Language translations are requested into. Default: `"en"`.
    pub target_lang: String,

    /// OCR language hint (Tesseract pack name). Default: `"spa"`.
    pub ocr_language: String,

    /// Which OCR engine handles image uploads. Default: [`OcrEngineKind::Tesseract`].
    pub ocr_engine: OcrEngineKind,

    /// Executable invoked by the Tesseract engine. Default: `"tesseract"`.
    pub tesseract_program: String,

    /// Vision OCR: LLM model identifier. If None, uses `gpt-4.1-nano`.
    pub model: Option<String>,

    /// Vision OCR: LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is detected from the environment.
    pub provider_name: Option<String>,

    /// Vision OCR: pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Vision OCR: sampling temperature. Default: 0.0.
    pub temperature: f32,

    /// Vision OCR: maximum tokens generated per image. Default: 4096.
    pub max_tokens: usize,

    /// Base URL of the language-detection/translation endpoint.
    pub api_url: String,

    /// Timeout for each remote HTTP request (detection, translation, download), in seconds. Default: 30.
    pub request_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Directory containing the pdfium shared library. If None, the system library is used.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Keep the original text on screen when translation fails. Default: false.
    ///
    /// When false the display text is exactly `"Translation failed."`; the
    /// original text is still available on the structured result.
    pub retain_original_on_failure: bool,

    /// Optional stage/page progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_lang: DEFAULT_SOURCE_LANG.to_string(),
            target_lang: DEFAULT_TARGET_LANG.to_string(),
            ocr_language: DEFAULT_OCR_LANGUAGE.to_string(),
            ocr_engine: OcrEngineKind::default(),
            tesseract_program: "tesseract".to_string(),
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 4096,
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 30,
            password: None,
            pdfium_lib_path: None,
            retain_original_on_failure: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("source_lang", &self.source_lang)
            .field("target_lang", &self.target_lang)
            .field("ocr_language", &self.ocr_language)
            .field("ocr_engine", &self.ocr_engine)
            .field("tesseract_program", &self.tesseract_program)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("api_url", &self.api_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("retain_original_on_failure", &self.retain_original_on_failure)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Language pair sent with the detection request, e.g. `"es|en"`.
    pub fn detection_langpair(&self) -> String {
        format!("{}|{}", self.source_lang, self.target_lang)
    }
}

/// Builder for [`PipelineConfig`].
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn source_lang(mut self, lang: impl Into<String>) -> Self {
        self.config.source_lang = lang.into();
        self
    }

    pub fn target_lang(mut self, lang: impl Into<String>) -> Self {
        self.config.target_lang = lang.into();
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn ocr_engine(mut self, kind: OcrEngineKind) -> Self {
        self.config.ocr_engine = kind;
        self
    }

    pub fn tesseract_program(mut self, program: impl Into<String>) -> Self {
        self.config.tesseract_program = program.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn retain_original_on_failure(mut self, v: bool) -> Self {
        self.config.retain_original_on_failure = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, DocSpeakError> {
        let c = &self.config;
        for (name, tag) in [("source", &c.source_lang), ("target", &c.target_lang)] {
            if !RE_LANG_TAG.is_match(tag) {
                return Err(DocSpeakError::InvalidConfig(format!(
                    "{name} language must be a short code like \"es\" or \"en\", got {tag:?}"
                )));
            }
        }
        if c.ocr_language.trim().is_empty() {
            return Err(DocSpeakError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if !(c.api_url.starts_with("http://") || c.api_url.starts_with("https://")) {
            return Err(DocSpeakError::InvalidConfig(format!(
                "API URL must be http(s), got {:?}",
                c.api_url
            )));
        }
        if c.request_timeout_secs == 0 {
            return Err(DocSpeakError::InvalidConfig(
                "Request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// OCR backend used for image uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OcrEngineKind {
    /// Local `tesseract` executable with a language pack hint. (default)
    #[default]
    Tesseract,
    /// Multimodal LLM transcription through edgequake-llm.
    Vision,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_reproduce_spanish_to_english() {
        let config = PipelineConfig::default();
        assert_eq!(config.source_lang, "es");
        assert_eq!(config.target_lang, "en");
        assert_eq!(config.ocr_language, "spa");
        assert_eq!(config.detection_langpair(), "es|en");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(!config.retain_original_on_failure);
    }

    #[test]
    fn builder_accepts_custom_pair() {
        let config = PipelineConfig::builder()
            .source_lang("fr")
            .target_lang("en")
            .ocr_language("fra")
            .build()
            .unwrap();
        assert_eq!(config.detection_langpair(), "fr|en");
        assert_eq!(config.ocr_language, "fra");
    }

    #[test]
    fn builder_rejects_bad_language_tag() {
        let err = PipelineConfig::builder()
            .target_lang("English")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("target language"), "got: {err}");
    }

    #[test]
    fn builder_rejects_non_http_url() {
        assert!(PipelineConfig::builder()
            .api_url("ftp://example.com")
            .build()
            .is_err());
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        assert!(PipelineConfig::builder()
            .request_timeout_secs(0)
            .build()
            .is_err());
    }

    #[test]
    fn region_subtags_are_allowed() {
        assert!(PipelineConfig::builder()
            .source_lang("pt-BR")
            .build()
            .is_ok());
    }

    #[test]
    fn debug_redacts_password() {
        let config = PipelineConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
