//! Language detection and translation against a remote service.
//!
//! Both operations hit the same MyMemory-style endpoint: an HTTP GET with
//! `q=<text>` and `langpair=<source>|<target>`, answered with JSON carrying
//! `responseData.detectedLanguage` and `responseData.translatedText`.
//!
//! Neither operation ever propagates an error to the pipeline:
//!
//! * [`detect_language`] falls back to the configured source language
//!   (default `"es"`) when the call fails. A well-formed answer that names no
//!   language is passed through as `None`, which never matches the source
//!   language. The detection request itself always carries the configured
//!   pair, so the service's answer is a hint shaped by that assumption rather
//!   than ground truth.
//! * [`translate_text`] returns a [`TranslationResult`] whose `text` is `None`
//!   on failure, so callers can tell "translation unavailable" apart from
//!   "text unchanged".

use crate::config::PipelineConfig;
use crate::error::{DocSpeakError, ServiceError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A remote capability that detects and translates text.
#[async_trait]
pub trait LanguageService: Send + Sync {
    /// Ask the service which language `text` is in.
    ///
    /// `Ok(None)` means the service answered but reported no language.
    async fn detect(&self, text: &str, langpair: &str) -> Result<Option<String>, ServiceError>;

    /// Translate `text` from `source` into `target`.
    async fn translate(&self, text: &str, source: &str, target: &str)
        -> Result<String, ServiceError>;
}

/// Outcome of a translation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResult {
    /// Translated text, or `None` when the service failed.
    pub text: Option<String>,
    /// Source language the request was made from.
    pub source_lang: String,
    /// Target language the request was made into.
    pub target_lang: String,
}

/// Detect the language of `text`.
///
/// Returns whatever tag the service reports (`None` when it reports none),
/// or the configured source language when the call itself fails.
pub async fn detect_language(
    service: &dyn LanguageService,
    text: &str,
    config: &PipelineConfig,
) -> Option<String> {
    let langpair = config.detection_langpair();
    match service.detect(text, &langpair).await {
        Ok(Some(tag)) => {
            info!("Detected language: {}", tag);
            Some(tag)
        }
        Ok(None) => {
            info!("Language service reported no language");
            None
        }
        Err(e) => {
            warn!(
                "Error detecting language: {}; assuming '{}'",
                e, config.source_lang
            );
            Some(config.source_lang.clone())
        }
    }
}

/// Translate `text` into the configured target language.
///
/// An empty `detected_lang` falls back to the configured source language.
/// An empty translation counts as failure.
pub async fn translate_text(
    service: &dyn LanguageService,
    text: &str,
    detected_lang: &str,
    config: &PipelineConfig,
) -> TranslationResult {
    let source = if detected_lang.is_empty() {
        config.source_lang.as_str()
    } else {
        detected_lang
    };
    let target = config.target_lang.as_str();

    let text = match service.translate(text, source, target).await {
        Ok(translated) if !translated.is_empty() => {
            debug!("Translated {} → {} bytes", text.len(), translated.len());
            Some(translated)
        }
        Ok(_) => {
            warn!("Error translating text: service returned an empty translation");
            None
        }
        Err(e) => {
            warn!("Error translating text: {}", e);
            None
        }
    };

    TranslationResult {
        text,
        source_lang: source.to_string(),
        target_lang: target.to_string(),
    }
}

// ── MyMemory client ──────────────────────────────────────────────────────

/// HTTP client for the MyMemory `get` endpoint.
#[derive(Debug, Clone)]
pub struct MyMemoryClient {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct MyMemoryResponse {
    #[serde(rename = "responseData")]
    response_data: Option<ResponseData>,
    #[serde(rename = "responseStatus", default)]
    response_status: Option<Value>,
    #[serde(rename = "responseDetails", default)]
    response_details: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    #[serde(rename = "translatedText", default)]
    translated_text: Option<Value>,
    #[serde(rename = "detectedLanguage", default)]
    detected_language: Option<Value>,
}

impl MyMemoryClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, DocSpeakError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DocSpeakError::BackendNotConfigured {
                backend: "mymemory".to_string(),
                hint: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout_secs,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, DocSpeakError> {
        Self::new(config.api_url.clone(), config.request_timeout_secs)
    }

    /// Send one `q` + `langpair` query and return the parsed `responseData`.
    async fn query(&self, text: &str, langpair: &str) -> Result<ResponseData, ServiceError> {
        debug!("GET {} langpair={} ({} bytes)", self.base_url, langpair, text.len());

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", text), ("langpair", langpair)])
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let parsed: MyMemoryResponse = response.json().await.map_err(|e| self.request_error(e))?;
        response_data(parsed)
    }

    fn request_error(&self, e: reqwest::Error) -> ServiceError {
        if e.is_decode() {
            ServiceError::MalformedResponse(e.to_string())
        } else if e.is_timeout() {
            ServiceError::Timeout {
                url: self.base_url.clone(),
                secs: self.timeout_secs,
            }
        } else {
            ServiceError::Request {
                url: self.base_url.clone(),
                detail: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl LanguageService for MyMemoryClient {
    async fn detect(&self, text: &str, langpair: &str) -> Result<Option<String>, ServiceError> {
        let data = self.query(text, langpair).await?;
        optional_string_field(data.detected_language, "responseData.detectedLanguage")
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, ServiceError> {
        let langpair = format!("{}|{}", source, target);
        let data = self.query(text, &langpair).await?;
        string_field(data.translated_text, "responseData.translatedText")
    }
}

/// Parse a raw MyMemory body.
#[cfg(test)]
fn parse_response(body: &[u8]) -> Result<ResponseData, ServiceError> {
    let parsed: MyMemoryResponse = serde_json::from_slice(body)
        .map_err(|e| ServiceError::MalformedResponse(e.to_string()))?;
    response_data(parsed)
}

/// Unwrap `responseData`, rejecting non-200 `responseStatus` values.
fn response_data(parsed: MyMemoryResponse) -> Result<ResponseData, ServiceError> {
    if let Some(status) = parsed.response_status.as_ref().and_then(status_code) {
        if status != 200 {
            let detail = match parsed.response_details {
                Some(Value::String(s)) => s,
                Some(other) => other.to_string(),
                None => String::new(),
            };
            return Err(ServiceError::Rejected { status, detail });
        }
    }

    parsed
        .response_data
        .ok_or_else(|| ServiceError::MalformedResponse("missing responseData".into()))
}

/// `responseStatus` arrives as a number or a numeric string.
fn status_code(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Null, missing and empty values are `None`; other non-strings are malformed.
fn optional_string_field(value: Option<Value>, path: &str) -> Result<Option<String>, ServiceError> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(Some(s)),
        Some(Value::String(_)) | Some(Value::Null) | None => Ok(None),
        Some(other) => Err(ServiceError::MalformedResponse(format!(
            "{path} is not a string: {other}"
        ))),
    }
}

fn string_field(value: Option<Value>, path: &str) -> Result<String, ServiceError> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(Value::String(_)) => Err(ServiceError::MalformedResponse(format!("{path} is empty"))),
        Some(Value::Null) | None => {
            Err(ServiceError::MalformedResponse(format!("missing {path}")))
        }
        Some(other) => Err(ServiceError::MalformedResponse(format!(
            "{path} is not a string: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one HTTP response and hand back the raw request.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16 * 1024];
            let n = sock.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
            request
        });
        (format!("http://{addr}/get"), handle)
    }

    #[tokio::test]
    async fn detect_reads_detected_language_and_sends_pair() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"responseData":{"translatedText":"Hello","detectedLanguage":"es"},"responseStatus":200}"#,
        )
        .await;
        let client = MyMemoryClient::new(url, 5).unwrap();

        let tag = client.detect("Hola mundo", "es|en").await.unwrap();
        assert_eq!(tag.as_deref(), Some("es"));

        let request = server.await.unwrap();
        let request_line = request.lines().next().unwrap();
        assert!(request_line.starts_with("GET /get?"), "got: {request_line}");
        assert!(request_line.contains("q=Hola+mundo"), "got: {request_line}");
        assert!(request_line.contains("langpair=es%7Cen"), "got: {request_line}");
    }

    #[tokio::test]
    async fn translate_reads_translated_text() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"responseData":{"translatedText":"Hello world"},"responseStatus":"200"}"#,
        )
        .await;
        let client = MyMemoryClient::new(url, 5).unwrap();

        let text = client.translate("Hola mundo", "es", "en").await.unwrap();
        assert_eq!(text, "Hello world");
        let request = server.await.unwrap();
        assert!(request.contains("langpair=es%7Cen"));
    }

    #[tokio::test]
    async fn http_error_status_is_reported() {
        let (url, _server) = serve_once("503 Service Unavailable", "{}").await;
        let client = MyMemoryClient::new(url, 5).unwrap();
        let err = client.translate("x", "es", "en").await.unwrap_err();
        assert!(matches!(err, ServiceError::HttpStatus { status: 503 }));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let (url, _server) = serve_once("200 OK", "<html>busy</html>").await;
        let client = MyMemoryClient::new(url, 5).unwrap();
        let err = client.detect("x", "es|en").await.unwrap_err();
        assert!(matches!(err, ServiceError::MalformedResponse(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn connection_refused_is_a_request_error() {
        let client = MyMemoryClient::new("http://127.0.0.1:1/get", 5).unwrap();
        let err = client.detect("x", "es|en").await.unwrap_err();
        assert!(matches!(err, ServiceError::Request { .. }), "got: {err:?}");
    }

    #[test]
    fn rejected_status_in_body() {
        let body = br#"{"responseData":{"translatedText":"MYMEMORY WARNING: YOU USED ALL AVAILABLE FREE TRANSLATIONS"},"responseStatus":429,"responseDetails":"quota"}"#;
        let err = parse_response(body).unwrap_err();
        match err {
            ServiceError::Rejected { status, detail } => {
                assert_eq!(status, 429);
                assert_eq!(detail, "quota");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn malformed_bodies() {
        assert!(matches!(
            parse_response(b"<html>"),
            Err(ServiceError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response(br#"{"responseStatus":200}"#),
            Err(ServiceError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn null_detected_language_is_reported_as_none() {
        let (url, _server) = serve_once(
            "200 OK",
            r#"{"responseData":{"translatedText":"Hola","detectedLanguage":null},"responseStatus":200}"#,
        )
        .await;
        let client = MyMemoryClient::new(url, 5).unwrap();
        assert_eq!(client.detect("Hola", "es|en").await.unwrap(), None);
    }

    #[test]
    fn detected_language_field_shapes() {
        fn field(body: &[u8]) -> Result<Option<String>, ServiceError> {
            let data = parse_response(body).unwrap();
            optional_string_field(data.detected_language, "x")
        }
        assert_eq!(field(br#"{"responseData":{}}"#).unwrap(), None);
        assert_eq!(field(br#"{"responseData":{"detectedLanguage":""}}"#).unwrap(), None);
        assert_eq!(
            field(br#"{"responseData":{"detectedLanguage":"en"}}"#).unwrap(),
            Some("en".to_string())
        );
        assert!(field(br#"{"responseData":{"detectedLanguage":7}}"#).is_err());
    }

    #[test]
    fn missing_translation_is_malformed() {
        let data = parse_response(br#"{"responseData":{"translatedText":null}}"#).unwrap();
        assert!(string_field(data.translated_text, "x").is_err());
    }

    // ── Fallback policy ──────────────────────────────────────────────────

    struct Scripted {
        detect: Result<Option<&'static str>, ()>,
        translate: Result<&'static str, ()>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageService for Scripted {
        async fn detect(
            &self,
            _text: &str,
            langpair: &str,
        ) -> Result<Option<String>, ServiceError> {
            self.calls.lock().unwrap().push(format!("detect {langpair}"));
            self.detect
                .map(|tag| tag.map(str::to_string))
                .map_err(|_| ServiceError::HttpStatus { status: 500 })
        }

        async fn translate(
            &self,
            _text: &str,
            source: &str,
            target: &str,
        ) -> Result<String, ServiceError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("translate {source}|{target}"));
            self.translate
                .map(str::to_string)
                .map_err(|_| ServiceError::MalformedResponse("bad".into()))
        }
    }

    fn scripted(
        detect: Result<Option<&'static str>, ()>,
        translate: Result<&'static str, ()>,
    ) -> Scripted {
        Scripted {
            detect,
            translate,
            calls: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn detection_failure_falls_back_to_source_language() {
        let service = scripted(Err(()), Ok("unused"));
        let tag = detect_language(&service, "Bonjour", &PipelineConfig::default()).await;
        assert_eq!(tag.as_deref(), Some("es"));
    }

    #[tokio::test]
    async fn unreported_language_is_passed_through() {
        let service = scripted(Ok(None), Ok("unused"));
        let tag = detect_language(&service, "x", &PipelineConfig::default()).await;
        assert_eq!(tag, None);
    }

    #[tokio::test]
    async fn detection_uses_configured_pair() {
        let service = scripted(Ok(Some("fr")), Ok("unused"));
        let config = PipelineConfig::builder()
            .source_lang("fr")
            .target_lang("de")
            .build()
            .unwrap();
        let tag = detect_language(&service, "Bonjour", &config).await;
        assert_eq!(tag.as_deref(), Some("fr"));
        assert_eq!(*service.calls.lock().unwrap(), vec!["detect fr|de"]);
    }

    #[tokio::test]
    async fn empty_detected_tag_translates_from_source_language() {
        let service = scripted(Ok(Some("es")), Ok("Hello"));
        let result = translate_text(&service, "Hola", "", &PipelineConfig::default()).await;
        assert_eq!(result.text.as_deref(), Some("Hello"));
        assert_eq!(result.source_lang, "es");
        assert_eq!(result.target_lang, "en");
        assert_eq!(*service.calls.lock().unwrap(), vec!["translate es|en"]);
    }

    #[tokio::test]
    async fn translation_failure_is_none() {
        let service = scripted(Ok(Some("es")), Err(()));
        let result = translate_text(&service, "Hola", "es", &PipelineConfig::default()).await;
        assert_eq!(result.text, None);
    }

    #[tokio::test]
    async fn empty_translation_is_failure() {
        let service = scripted(Ok(Some("es")), Ok(""));
        let result = translate_text(&service, "Hola", "es", &PipelineConfig::default()).await;
        assert_eq!(result.text, None);
    }
}
