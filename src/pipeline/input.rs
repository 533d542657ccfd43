//! Input resolution: turn a user-supplied path or URL into an [`UploadedFile`].
//!
//! The pipeline only ever looks at two things: the bytes and the declared
//! media type. For local files the declared type is guessed from the
//! extension; for URLs it is the `Content-Type` the server sent. Either can be
//! overridden by the caller. No magic-byte sniffing happens here or later.

use crate::error::DocSpeakError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Media type used when nothing better is known.
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// A single uploaded document: payload plus declared media type.
#[derive(Clone, Serialize)]
pub struct UploadedFile {
    /// Display name (file name or last URL segment).
    pub name: String,
    /// Declared media type, e.g. `application/pdf` or `image/png`.
    pub media_type: String,
    /// Raw file contents.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Guess a media type from a file name's extension.
pub fn media_type_for_name(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("txt") => "text/plain",
        _ => UNKNOWN_MEDIA_TYPE,
    }
}

/// Resolve the input string to an [`UploadedFile`].
///
/// `media_type` overrides whatever would otherwise be declared.
pub async fn resolve_input(
    input: &str,
    media_type: Option<&str>,
    timeout_secs: u64,
) -> Result<UploadedFile, DocSpeakError> {
    if input.trim().is_empty() {
        return Err(DocSpeakError::InvalidInput {
            input: input.to_string(),
        });
    }

    let mut file = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(input).await?
    };

    if let Some(mt) = media_type {
        file.media_type = mt.to_string();
    }
    debug!(
        "Resolved '{}' as {} ({} bytes)",
        file.name,
        file.media_type,
        file.len()
    );
    Ok(file)
}

/// Read a local file into memory.
async fn read_local(path_str: &str) -> Result<UploadedFile, DocSpeakError> {
    let path = PathBuf::from(path_str);

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DocSpeakError::FileNotFound { path: path.clone() },
        std::io::ErrorKind::PermissionDenied => {
            DocSpeakError::PermissionDenied { path: path.clone() }
        }
        _ => DocSpeakError::Internal(format!("Failed to read '{}': {}", path.display(), e)),
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path_str.to_string());
    let media_type = media_type_for_name(&name);

    Ok(UploadedFile::new(name, media_type, bytes))
}

/// Download a URL into memory, declaring the server's `Content-Type`.
async fn download_url(url: &str, timeout_secs: u64) -> Result<UploadedFile, DocSpeakError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocSpeakError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DocSpeakError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DocSpeakError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(DocSpeakError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let name = filename_from_url(url);
    let media_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(normalise_content_type)
        .unwrap_or_else(|| media_type_for_name(&name).to_string());

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DocSpeakError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes ({})", bytes.len(), media_type);
    Ok(UploadedFile::new(name, media_type, bytes.to_vec()))
}

/// Strip parameters (`; charset=…`) and lowercase a `Content-Type` value.
fn normalise_content_type(value: &str) -> Option<String> {
    let essence = value.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    if essence.is_empty() {
        None
    } else {
        Some(essence)
    }
}

/// Extract a reasonable file name from the URL path.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
    }

    "download".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn media_type_from_extension() {
        assert_eq!(media_type_for_name("scan.PDF"), "application/pdf");
        assert_eq!(media_type_for_name("photo.jpeg"), "image/jpeg");
        assert_eq!(media_type_for_name("photo.JPG"), "image/jpeg");
        assert_eq!(media_type_for_name("page.tiff"), "image/tiff");
        assert_eq!(media_type_for_name("notes.txt"), "text/plain");
        assert_eq!(media_type_for_name("README"), UNKNOWN_MEDIA_TYPE);
    }

    #[test]
    fn content_type_parameters_are_stripped() {
        assert_eq!(
            normalise_content_type("Application/PDF; charset=binary").as_deref(),
            Some("application/pdf")
        );
        assert_eq!(normalise_content_type("  ;x=y"), None);
    }

    #[test]
    fn filename_from_url_path() {
        assert_eq!(filename_from_url("https://example.com/a/b/receipt.png"), "receipt.png");
        assert_eq!(filename_from_url("https://example.com/"), "download");
    }

    #[tokio::test]
    async fn resolve_local_file_guesses_media_type() {
        let mut tmp = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        tmp.write_all(b"not really a png").unwrap();

        let file = resolve_input(tmp.path().to_str().unwrap(), None, 5)
            .await
            .expect("local file resolves");
        assert_eq!(file.media_type, "image/png");
        assert_eq!(file.bytes, b"not really a png");
    }

    #[tokio::test]
    async fn media_type_override_wins() {
        let mut tmp = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        tmp.write_all(b"%PDF-1.7").unwrap();

        let file = resolve_input(tmp.path().to_str().unwrap(), Some("application/pdf"), 5)
            .await
            .unwrap();
        assert_eq!(file.media_type, "application/pdf");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = resolve_input("/definitely/not/here.pdf", None, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, DocSpeakError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn empty_input_is_invalid() {
        let err = resolve_input("  ", None, 5).await.unwrap_err();
        assert!(matches!(err, DocSpeakError::InvalidInput { .. }));
    }
}
