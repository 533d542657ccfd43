//! Prompts for vision-LLM OCR.
//!
//! The vision engine has to behave like a plain OCR tool: return the text on
//! the image and nothing else. Keeping the prompt here lets tests inspect it
//! without a live provider.

/// System prompt for transcribing an image. `{language}` is replaced with the
/// human-readable language hint.
pub const OCR_SYSTEM_PROMPT: &str = r#"You are an OCR engine. Transcribe ALL text visible in the image exactly as written.

Rules:
1. The text is most likely written in {language}. Keep it in that language; do NOT translate.
2. Preserve line breaks and reading order as a human would read the page.
3. Do NOT describe the image, add commentary, or wrap the output in code fences.
4. If the image contains no text, output nothing."#;

/// Build the OCR system prompt for a Tesseract-style language hint.
pub fn ocr_system_prompt(ocr_language: &str) -> String {
    OCR_SYSTEM_PROMPT.replace("{language}", language_name(ocr_language))
}

/// Human-readable name for a Tesseract language pack code.
///
/// Unknown codes are passed through unchanged.
pub fn language_name(ocr_language: &str) -> &str {
    match ocr_language {
        "spa" => "Spanish",
        "eng" => "English",
        "fra" => "French",
        "deu" => "German",
        "ita" => "Italian",
        "por" => "Portuguese",
        "hin" => "Hindi",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_language_hint() {
        let prompt = ocr_system_prompt("spa");
        assert!(prompt.contains("written in Spanish"));
        assert!(!prompt.contains("{language}"));
    }

    #[test]
    fn unknown_codes_pass_through() {
        assert_eq!(language_name("jpn"), "jpn");
        assert!(ocr_system_prompt("jpn").contains("written in jpn"));
    }
}
