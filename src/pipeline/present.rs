//! Presenter: turn the pipeline's results into display text and an utterance.
//!
//! The display strings are fixed:
//!
//! | Outcome | Display text |
//! |---------|--------------|
//! | extraction failed | `Failed to extract text.` |
//! | not in source language | `Original Text:\n{original}` |
//! | translated | `Original Text:\n{original}\n\nTranslated Text:\n{translated}` |
//! | translation failed | `Translation failed.` |
//!
//! Only a successful translation produces an [`Utterance`]. The original text
//! is always kept on the [`Presentation`], even when the display text drops it.

use crate::pipeline::language::TranslationResult;
use serde::{Deserialize, Serialize};

/// Shown when no text could be extracted (or the type is unsupported).
pub const EXTRACTION_FAILED_TEXT: &str = "Failed to extract text.";

/// Shown when translation was attempted and failed.
pub const TRANSLATION_FAILED_TEXT: &str = "Translation failed.";

/// A request to speak `text` with a voice for `locale`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    /// BCP-47 locale, e.g. `en-US`.
    pub locale: String,
}

impl Utterance {
    /// Utterance for text in language `lang`, with the mapped voice locale.
    pub fn for_language(text: impl Into<String>, lang: &str) -> Self {
        Self {
            text: text.into(),
            locale: voice_locale(lang).to_string(),
        }
    }
}

/// Voice locale for a language tag. Unmapped tags fall back to `en-US`.
pub fn voice_locale(lang: &str) -> &'static str {
    match lang {
        "es" => "es-ES",
        "hi" => "hi-IN",
        _ => "en-US",
    }
}

/// Which terminal branch the run ended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    ExtractionFailed,
    /// Detected language differs from the source language; no translation.
    Original,
    Translated,
    TranslationFailed,
}

/// Final result of a run, ready for a display surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub outcome: Outcome,
    /// Complete text block for the display surface.
    pub display_text: String,
    /// Extracted text, when extraction succeeded.
    pub original: Option<String>,
    /// Language tag the translation gate saw (`None` if none was reported).
    pub detected_lang: Option<String>,
    /// Present whenever translation was attempted.
    pub translation: Option<TranslationResult>,
    /// Present only after a successful translation.
    pub utterance: Option<Utterance>,
}

impl Presentation {
    pub fn extraction_failed() -> Self {
        Self {
            outcome: Outcome::ExtractionFailed,
            display_text: EXTRACTION_FAILED_TEXT.to_string(),
            original: None,
            detected_lang: None,
            translation: None,
            utterance: None,
        }
    }

    /// `detected_lang` is `None` when the service reported no language.
    pub fn original(original: String, detected_lang: Option<String>) -> Self {
        Self {
            outcome: Outcome::Original,
            display_text: format!("Original Text:\n{original}"),
            original: Some(original),
            detected_lang,
            translation: None,
            utterance: None,
        }
    }

    /// Presentation after a translation attempt, successful or not.
    pub fn after_translation(
        original: String,
        detected_lang: String,
        translation: TranslationResult,
        retain_original_on_failure: bool,
    ) -> Self {
        match translation.text.clone() {
            Some(translated) => Self {
                outcome: Outcome::Translated,
                display_text: format!(
                    "Original Text:\n{original}\n\nTranslated Text:\n{translated}"
                ),
                utterance: Some(Utterance::for_language(
                    translated,
                    &translation.target_lang,
                )),
                original: Some(original),
                detected_lang: Some(detected_lang),
                translation: Some(translation),
            },
            None => Self {
                outcome: Outcome::TranslationFailed,
                display_text: if retain_original_on_failure {
                    format!("Original Text:\n{original}\n\n{TRANSLATION_FAILED_TEXT}")
                } else {
                    TRANSLATION_FAILED_TEXT.to_string()
                },
                original: Some(original),
                detected_lang: Some(detected_lang),
                translation: Some(translation),
                utterance: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translation(text: Option<&str>, target: &str) -> TranslationResult {
        TranslationResult {
            text: text.map(str::to_string),
            source_lang: "es".into(),
            target_lang: target.into(),
        }
    }

    #[test]
    fn voice_locale_mapping() {
        assert_eq!(voice_locale("en"), "en-US");
        assert_eq!(voice_locale("es"), "es-ES");
        assert_eq!(voice_locale("hi"), "hi-IN");
        assert_eq!(voice_locale("fr"), "en-US");
        assert_eq!(voice_locale(""), "en-US");
    }

    #[test]
    fn extraction_failed_text() {
        let p = Presentation::extraction_failed();
        assert_eq!(p.display_text, "Failed to extract text.");
        assert_eq!(p.outcome, Outcome::ExtractionFailed);
        assert!(p.utterance.is_none());
    }

    #[test]
    fn original_only() {
        let p = Presentation::original("Hello there".into(), Some("en".into()));
        assert_eq!(p.display_text, "Original Text:\nHello there");
        assert!(p.utterance.is_none());
        assert!(p.translation.is_none());
    }

    #[test]
    fn translated_block_and_utterance() {
        let p = Presentation::after_translation(
            "Hola".into(),
            "es".into(),
            translation(Some("Hello"), "en"),
            false,
        );
        assert_eq!(
            p.display_text,
            "Original Text:\nHola\n\nTranslated Text:\nHello"
        );
        assert_eq!(
            p.utterance,
            Some(Utterance {
                text: "Hello".into(),
                locale: "en-US".into()
            })
        );
    }

    #[test]
    fn translation_failed_hides_original_by_default() {
        let p = Presentation::after_translation(
            "Hola".into(),
            "es".into(),
            translation(None, "en"),
            false,
        );
        assert_eq!(p.display_text, "Translation failed.");
        assert_eq!(p.original.as_deref(), Some("Hola"));
        assert!(p.utterance.is_none());
    }

    #[test]
    fn translation_failed_can_retain_original() {
        let p = Presentation::after_translation(
            "Hola".into(),
            "es".into(),
            translation(None, "en"),
            true,
        );
        assert_eq!(p.display_text, "Original Text:\nHola\n\nTranslation failed.");
    }

    #[test]
    fn utterance_locale_follows_target() {
        let p = Presentation::after_translation(
            "Hello".into(),
            "en".into(),
            translation(Some("नमस्ते"), "hi"),
            false,
        );
        assert_eq!(p.utterance.unwrap().locale, "hi-IN");
    }
}
