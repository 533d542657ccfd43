//! Speech output: play an [`Utterance`] through a synthesis backend.
//!
//! Playback is an explicit async operation. Callers either await
//! [`speak_utterance`] to know when (and whether) playback finished, or call
//! [`spawn_speech`] and keep or drop the returned handle. A missing backend is
//! logged at `error` level and never fails the run.

use crate::error::SpeechError;
use crate::pipeline::present::Utterance;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// A text-to-speech backend.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Backend identifier used in logs (e.g. "espeak-ng").
    fn name(&self) -> &str;

    /// Speak the utterance, resolving once playback has finished.
    async fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError>;
}

/// Speak `utterance`, logging failures.
pub async fn speak_utterance(
    synth: &dyn SpeechSynthesizer,
    utterance: &Utterance,
) -> Result<(), SpeechError> {
    info!(
        "Speaking {} chars with {} ({})",
        utterance.text.chars().count(),
        synth.name(),
        utterance.locale
    );
    let result = synth.speak(utterance).await;
    if let Err(ref e) = result {
        error!("{}", e);
    }
    result
}

/// Start playback in the background. Dropping the handle does not cancel it.
pub fn spawn_speech(
    synth: Arc<dyn SpeechSynthesizer>,
    utterance: Utterance,
) -> JoinHandle<Result<(), SpeechError>> {
    tokio::spawn(async move { speak_utterance(synth.as_ref(), &utterance).await })
}

/// Speech through a command-line synthesizer (espeak-ng by default).
///
/// Runs `<program> -v <voice>` and writes the text to its stdin, so long
/// documents never hit argument-length limits.
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    program: String,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for CommandSynthesizer {
    fn default() -> Self {
        Self::new("espeak-ng")
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandSynthesizer {
    fn name(&self) -> &str {
        &self.program
    }

    async fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError> {
        let voice = espeak_voice(&utterance.locale);
        debug!("{} -v {}", self.program, voice);

        let mut child = Command::new(&self.program)
            .arg("-v")
            .arg(&voice)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SpeechError::Unavailable(format!(
                        "'{}' not found; install espeak-ng or pass --speech-program",
                        self.program
                    ))
                } else {
                    SpeechError::Failed(format!("failed to run '{}': {e}", self.program))
                }
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(utterance.text.as_bytes())
                .await
                .map_err(|e| SpeechError::Failed(format!("stdin: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| SpeechError::Failed(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeechError::Failed(format!(
                "{}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Backend for environments without audio. Always reports unavailability.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSynthesizer;

#[async_trait]
impl SpeechSynthesizer for SilentSynthesizer {
    fn name(&self) -> &str {
        "silent"
    }

    async fn speak(&self, _utterance: &Utterance) -> Result<(), SpeechError> {
        Err(SpeechError::Unavailable(
            "speech synthesis is disabled in this environment".into(),
        ))
    }
}

/// espeak-ng voice name for a BCP-47 locale.
///
/// English keeps its region (`en-us`); other languages use the bare language
/// voice (`es-ES` → `es`).
pub fn espeak_voice(locale: &str) -> String {
    let lower = locale.to_ascii_lowercase();
    match lower.split_once('-') {
        Some(("en", _)) => lower,
        Some((lang, _)) => lang.to_string(),
        None => lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<Utterance>>);

    #[async_trait]
    impl SpeechSynthesizer for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError> {
            self.0.lock().unwrap().push(utterance.clone());
            Ok(())
        }
    }

    fn hello() -> Utterance {
        Utterance::for_language("Hello", "en")
    }

    #[test]
    fn espeak_voices() {
        assert_eq!(espeak_voice("en-US"), "en-us");
        assert_eq!(espeak_voice("es-ES"), "es");
        assert_eq!(espeak_voice("hi-IN"), "hi");
        assert_eq!(espeak_voice("fr"), "fr");
    }

    #[test]
    fn silent_backend_is_unavailable() {
        let err = tokio_test::block_on(speak_utterance(&SilentSynthesizer, &hello())).unwrap_err();
        assert!(matches!(err, SpeechError::Unavailable(_)));
    }

    #[tokio::test]
    async fn missing_program_is_unavailable() {
        let synth = CommandSynthesizer::new("definitely-not-a-real-tts-binary");
        let err = synth.speak(&hello()).await.unwrap_err();
        assert!(matches!(err, SpeechError::Unavailable(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn spawned_speech_can_be_awaited() {
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let handle = spawn_speech(recorder.clone(), hello());
        handle.await.unwrap().unwrap();
        assert_eq!(*recorder.0.lock().unwrap(), vec![hello()]);
    }
}
