//! CLI binary for edgequake-docspeak.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig`, prints the display text and optionally speaks the
//! translation.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_docspeak::{
    run, run_to_file, speak_utterance, CommandSynthesizer, OcrEngineKind, Outcome,
    PipelineConfig, PipelineOutput, PipelineProgressCallback, PipelineStage, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner whose message follows the current
/// stage, with one log line per extracted PDF page.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("docspeak");
        bar.set_message("Reading input…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    /// Stop the spinner when the run ends without reaching a terminal stage.
    fn abandon(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

/// Clear the spinner before an error propagates, so it does not keep ticking
/// over the error report.
fn clear_progress_on_err<T, E>(
    result: Result<T, E>,
    progress: Option<&CliProgressCallback>,
) -> Result<T, E> {
    if result.is_err() {
        if let Some(cb) = progress {
            cb.abandon();
        }
    }
    result
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: PipelineStage) {
        let msg = match stage {
            PipelineStage::FileSelected => "File selected",
            PipelineStage::Extracting => "Extracting text…",
            PipelineStage::Extracted => "Text extracted",
            PipelineStage::DetectingLanguage => "Detecting language…",
            PipelineStage::Translating => "Translating…",
            _ => return,
        };
        self.bar.set_message(msg);
    }

    fn on_page_extracted(&self, page_num: usize, total_pages: usize, text_len: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total_pages,
            dim(&format!("{text_len:>5} bytes")),
        ));
    }

    fn on_run_complete(&self, terminal: PipelineStage) {
        self.bar.finish_and_clear();
        let mark = match terminal {
            PipelineStage::Presented | PipelineStage::PresentingOriginal => green("✔"),
            _ => red("✘"),
        };
        eprintln!("{} {}", mark, bold(&terminal.to_string()));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Spanish PDF → English text on stdout
  docspeak carta.pdf

  # Scanned page, read it aloud after translating
  docspeak --speak escaneo.png

  # French source, Tesseract French pack
  docspeak --source-lang fr --ocr-lang fra lettre.jpg

  # Transcribe images with a vision model instead of Tesseract
  docspeak --ocr-engine vision --model gpt-4.1-nano photo.jpg

  # Download and process, JSON result
  docspeak --json https://example.com/aviso.pdf > result.json

OUTCOMES:
  Failed to extract text.      no text could be read (or unsupported type)
  Original Text:\n…            detected language is not the source language
  Original Text / Translated   translation succeeded (spoken with --speak)
  Translation failed.          translation service failed

ENVIRONMENT VARIABLES:
  DOCSPEAK_SOURCE_LANG    Language that triggers translation (default: es)
  DOCSPEAK_TARGET_LANG    Translation target (default: en)
  DOCSPEAK_API_URL        Translation endpoint (default: MyMemory)
  PDFIUM_LIB_PATH         Directory containing libpdfium
  OPENAI_API_KEY          Needed only for --ocr-engine vision
  EDGEQUAKE_LLM_PROVIDER  Override vision provider
  EDGEQUAKE_MODEL         Override vision model ID
  RUST_LOG                Override the log filter

SETUP:
  PDF text needs the pdfium shared library (system path or PDFIUM_LIB_PATH).
  Image OCR needs `tesseract` plus the language pack (e.g. tesseract-ocr-spa).
  --speak needs `espeak-ng` (or another program via --speech-program).
"#;

/// Extract, translate and speak the text of PDFs and images.
#[derive(Parser, Debug)]
#[command(
    name = "docspeak",
    version,
    about = "Extract text from a PDF or image, translate it and read it aloud",
    long_about = "Extract text from a PDF (embedded text layer) or an image (OCR), detect its \
language, translate it when it is in the source language, and optionally speak the translation.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file path or HTTP/HTTPS URL.
    input: String,

    /// Write the display text to this file instead of stdout.
    #[arg(short, long, env = "DOCSPEAK_OUTPUT")]
    output: Option<PathBuf>,

    /// Override the media type guessed from the extension or Content-Type.
    #[arg(long, env = "DOCSPEAK_MEDIA_TYPE")]
    media_type: Option<String>,

    /// Language that triggers translation.
    #[arg(long, env = "DOCSPEAK_SOURCE_LANG", default_value = "es")]
    source_lang: String,

    /// Translation target language.
    #[arg(long, env = "DOCSPEAK_TARGET_LANG", default_value = "en")]
    target_lang: String,

    /// Tesseract language pack for image OCR.
    #[arg(long, env = "DOCSPEAK_OCR_LANG", default_value = "spa")]
    ocr_lang: String,

    /// OCR backend for images.
    #[arg(long, env = "DOCSPEAK_OCR_ENGINE", value_enum, default_value = "tesseract")]
    ocr_engine: OcrEngineArg,

    /// Vision model ID (only with --ocr-engine vision).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Vision provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Detection/translation endpoint.
    #[arg(long, env = "DOCSPEAK_API_URL")]
    api_url: Option<String>,

    /// Timeout in seconds for downloads and translation calls.
    #[arg(long, env = "DOCSPEAK_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "DOCSPEAK_PASSWORD")]
    password: Option<String>,

    /// Directory containing the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Speak the translated text once it is shown.
    #[arg(long, env = "DOCSPEAK_SPEAK")]
    speak: bool,

    /// Speech synthesizer executable.
    #[arg(long, env = "DOCSPEAK_SPEECH_PROGRAM", default_value = "espeak-ng")]
    speech_program: String,

    /// Keep the original text on screen when translation fails.
    #[arg(long, env = "DOCSPEAK_KEEP_ORIGINAL")]
    keep_original: bool,

    /// Output structured JSON (PipelineOutput) instead of the display text.
    #[arg(long, env = "DOCSPEAK_JSON")]
    json: bool,

    /// Disable progress spinner.
    #[arg(long, env = "DOCSPEAK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCSPEAK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCSPEAK_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OcrEngineArg {
    Tesseract,
    Vision,
}

impl From<OcrEngineArg> for OcrEngineKind {
    fn from(v: OcrEngineArg) -> Self {
        match v {
            OcrEngineArg::Tesseract => OcrEngineKind::Tesseract,
            OcrEngineArg::Vision => OcrEngineKind::Vision,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs; verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let cli_progress = show_progress.then(CliProgressCallback::new);
    let progress_cb = cli_progress
        .clone()
        .map(|cb| cb as Arc<dyn PipelineProgressCallback>);
    let config =
        clear_progress_on_err(build_config(&cli, progress_cb), cli_progress.as_deref())?;

    // ── Run pipeline ─────────────────────────────────────────────────────
    let media_type = cli.media_type.as_deref();
    let output = if let Some(ref output_path) = cli.output {
        let output = clear_progress_on_err(
            run_to_file(&cli.input, media_type, output_path, &config).await,
            cli_progress.as_deref(),
        )
        .context("Pipeline failed")?;
        if !cli.quiet {
            eprintln!(
                "{}  {}ms  →  {}",
                outcome_mark(&output),
                output.stats.total_duration_ms,
                bold(&output_path.display().to_string()),
            );
        }
        output
    } else {
        let output = clear_progress_on_err(
            run(&cli.input, media_type, &config).await,
            cli_progress.as_deref(),
        )
        .context("Pipeline failed")?;
        print_output(&output, cli.json)?;
        if !cli.quiet && !show_progress && !cli.json {
            eprintln!(
                "{} {} chars in {}ms",
                outcome_mark(&output),
                output.stats.extracted_chars,
                output.stats.total_duration_ms
            );
        }
        output
    };

    // ── Speech ───────────────────────────────────────────────────────────
    if cli.speak {
        match output.presentation.utterance {
            Some(ref utterance) => {
                let synth = CommandSynthesizer::new(cli.speech_program.clone());
                // Failure is already logged; the displayed text stands.
                let _ = speak_utterance(&synth, utterance).await;
            }
            None if !cli.quiet => {
                eprintln!("{}", dim("Nothing to speak (no translation)."));
            }
            None => {}
        }
    }

    Ok(())
}

fn outcome_mark(output: &PipelineOutput) -> String {
    match output.presentation.outcome {
        Outcome::Translated | Outcome::Original => green("✔"),
        Outcome::TranslationFailed => cyan("⚠"),
        Outcome::ExtractionFailed => red("✘"),
    }
}

fn print_output(output: &PipelineOutput, json: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if json {
        let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
    } else {
        writeln!(handle, "{}", output.display_text()).context("Failed to write to stdout")?;
    }
    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .source_lang(cli.source_lang.clone())
        .target_lang(cli.target_lang.clone())
        .ocr_language(cli.ocr_lang.clone())
        .ocr_engine(cli.ocr_engine.clone().into())
        .request_timeout_secs(cli.timeout)
        .retain_original_on_failure(cli.keep_original);

    if let Some(ref url) = cli.api_url {
        builder = builder.api_url(url.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(ref dir) = cli.pdfium_lib_path {
        builder = builder.pdfium_lib_path(dir.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgequake_docspeak::DocSpeakError;

    #[test]
    fn spinner_is_cleared_when_the_run_fails() {
        let cb = CliProgressCallback::new();
        let result: Result<(), DocSpeakError> = Err(DocSpeakError::InvalidInput {
            input: String::new(),
        });

        assert!(clear_progress_on_err(result, Some(cb.as_ref())).is_err());
        assert!(cb.bar.is_finished());
    }

    #[test]
    fn spinner_keeps_running_on_success() {
        let cb = CliProgressCallback::new();
        let result: Result<u8, DocSpeakError> = Ok(1);

        assert_eq!(clear_progress_on_err(result, Some(cb.as_ref())).unwrap(), 1);
        assert!(!cb.bar.is_finished());
        cb.abandon();
    }

    #[test]
    fn abandon_after_completion_is_harmless() {
        let cb = CliProgressCallback::new();
        cb.on_run_complete(PipelineStage::Presented);
        cb.abandon();
        assert!(cb.bar.is_finished());
    }
}
