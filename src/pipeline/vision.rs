//! Vision-LLM OCR: read an image with a multimodal model.
//!
//! The image is normalised to PNG (providers reject WebP/TIFF/BMP), wrapped as
//! base64 [`ImageData`] and sent with a transcription prompt that carries the
//! OCR language hint. The reply is taken as the recognised text after
//! stripping an outer code fence, which models add despite the prompt.

use crate::config::PipelineConfig;
use crate::error::{DocSpeakError, ExtractError};
use crate::pipeline::ocr::{OcrEngine, OcrOutput};
use crate::prompts::ocr_system_prompt;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Model used when none is configured.
pub const DEFAULT_VISION_MODEL: &str = "gpt-4.1-nano";

/// OCR engine backed by an edgequake-llm provider.
pub struct VisionOcrEngine {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl VisionOcrEngine {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
        }
    }

    /// Build the engine from the provider settings in `config`.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, DocSpeakError> {
        let provider = resolve_provider(config)?;
        Ok(Self::new(provider, config.temperature, config.max_tokens))
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl OcrEngine for VisionOcrEngine {
    fn name(&self) -> &str {
        "vision"
    }

    async fn recognize(
        &self,
        image: &[u8],
        _media_type: &str,
        language: &str,
    ) -> Result<OcrOutput, ExtractError> {
        let start = Instant::now();
        let image_data = encode_image(image)?;

        let messages = vec![
            ChatMessage::system(ocr_system_prompt(language)),
            ChatMessage::user_with_images("", vec![image_data]),
        ];

        let response = self
            .provider
            .chat(&messages, Some(&self.options()))
            .await
            .map_err(|e| ExtractError::OcrFailed {
                engine: self.name().to_string(),
                detail: e.to_string(),
            })?;

        debug!(
            "Vision OCR: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        Ok(OcrOutput {
            text: strip_outer_fence(&response.content),
        })
    }
}

/// Decode arbitrary image bytes and re-encode them as a base64 PNG.
///
/// PNG is lossless, so small glyphs survive; `detail: "high"` lets
/// GPT-4-class models tile the image instead of reading a 512 px overview.
pub fn encode_image(bytes: &[u8]) -> Result<ImageData, ExtractError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ExtractError::ImageDecodeFailed(e.to_string()))?;

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| ExtractError::ImageDecodeFailed(e.to_string()))?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded {}x{} image → {} bytes base64", img.width(), img.height(), b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\n(.*)\n```\s*$").expect("valid regex"));

/// Remove a code fence wrapping the entire reply, if any.
fn strip_outer_fence(input: &str) -> String {
    match RE_OUTER_FENCE.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. a pre-built provider on the config,
/// 2. a named provider (`provider_name`) with the configured model,
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL` when both are set,
/// 4. full auto-detection from API-key environment variables.
fn resolve_provider(config: &PipelineConfig) -> Result<Arc<dyn LLMProvider>, DocSpeakError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_VISION_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_vision_provider(&prov, &env_model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| DocSpeakError::BackendNotConfigured {
            backend: "vision".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, DocSpeakError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        DocSpeakError::BackendNotConfigured {
            backend: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
