//! PDF text-layer extraction via pdfium.
//!
//! Only text that is already embedded in the document is read; scanned pages
//! without a text layer yield empty strings. Within a page, text fragments are
//! joined with one ASCII space; pages are joined with one `\n`, in ascending
//! page order. A failure on any page aborts the whole document.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which uses thread-local state
//! and blocks while parsing. The whole open-and-read sequence runs on the
//! blocking pool so the async executor never stalls.

use crate::config::PipelineConfig;
use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// A document that exposes its text layer page by page.
///
/// Pages are 1-indexed. Implemented for pdfium documents; tests implement it
/// over in-memory fragment lists.
pub trait TextLayerDocument {
    /// Total number of pages.
    fn page_count(&self) -> usize;

    /// Text fragments of page `page_num` (1-indexed), in document order.
    fn page_fragments(&self, page_num: usize) -> Result<Vec<String>, ExtractError>;
}

impl TextLayerDocument for Vec<Vec<String>> {
    fn page_count(&self) -> usize {
        self.len()
    }

    fn page_fragments(&self, page_num: usize) -> Result<Vec<String>, ExtractError> {
        page_num
            .checked_sub(1)
            .and_then(|idx| self.get(idx))
            .cloned()
            .ok_or_else(|| ExtractError::PageTextFailed {
                page: page_num,
                detail: format!("page out of range (document has {} pages)", self.len()),
            })
    }
}

/// Read every page's fragments and assemble the document text.
///
/// Pages are visited strictly in order `1..=N`; the first failing page
/// aborts with its error.
pub fn join_text_layer<D: TextLayerDocument + ?Sized>(
    doc: &D,
    progress: Option<&ProgressCallback>,
) -> Result<String, ExtractError> {
    let total = doc.page_count();
    let mut pages = Vec::with_capacity(total);

    for page_num in 1..=total {
        let page_text = doc.page_fragments(page_num)?.join(" ");
        debug!("Page {}/{}: {} bytes of text", page_num, total, page_text.len());
        if let Some(cb) = progress {
            cb.on_page_extracted(page_num, total, page_text.len());
        }
        pages.push(page_text);
    }

    Ok(pages.join("\n"))
}

/// A PDF text-layer backend, as seen by the pipeline.
#[async_trait]
pub trait PdfTextExtractor: Send + Sync {
    /// Open `bytes` as a PDF and return its assembled text layer.
    async fn extract(&self, bytes: &[u8], config: &PipelineConfig) -> Result<String, ExtractError>;
}

/// The pdfium-backed extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumExtractor;

#[async_trait]
impl PdfTextExtractor for PdfiumExtractor {
    async fn extract(&self, bytes: &[u8], config: &PipelineConfig) -> Result<String, ExtractError> {
        extract_pdf_text(bytes.to_vec(), config).await
    }
}

/// Extract the text layer of a PDF held in memory.
pub async fn extract_pdf_text(
    bytes: Vec<u8>,
    config: &PipelineConfig,
) -> Result<String, ExtractError> {
    let lib_path = config.pdfium_lib_path.clone();
    let password = config.password.clone();
    let progress = config.progress_callback.clone();

    tokio::task::spawn_blocking(move || {
        extract_pdf_text_blocking(&bytes, lib_path.as_deref(), password.as_deref(), progress)
    })
    .await
    .map_err(|e| ExtractError::TaskFailed(format!("PDF task panicked: {}", e)))?
}

/// Blocking implementation of text-layer extraction.
fn extract_pdf_text_blocking(
    bytes: &[u8],
    lib_path: Option<&Path>,
    password: Option<&str>,
    progress: Option<ProgressCallback>,
) -> Result<String, ExtractError> {
    let pdfium = bind_pdfium(lib_path)?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| {
            let detail = format!("{:?}", e);
            if detail.contains("Password") || detail.contains("password") {
                ExtractError::PdfOpenFailed {
                    detail: if password.is_some() {
                        "wrong password".to_string()
                    } else {
                        "document is encrypted; a password is required".to_string()
                    },
                }
            } else {
                ExtractError::PdfOpenFailed { detail }
            }
        })?;

    let doc = PdfiumDocument { document };
    info!("PDF loaded: {} pages", doc.page_count());

    join_text_layer(&doc, progress.as_ref())
}

/// Bind to pdfium from an explicit directory, or the system library.
fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, ExtractError> {
    let bindings = match lib_path {
        Some(dir) => {
            debug!("Binding pdfium from {}", dir.display());
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ExtractError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// pdfium document adapter. Fragments are pdfium's text segments.
struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl TextLayerDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_fragments(&self, page_num: usize) -> Result<Vec<String>, ExtractError> {
        let page = self
            .document
            .pages()
            .get((page_num - 1) as u16)
            .map_err(|e| ExtractError::PageTextFailed {
                page: page_num,
                detail: format!("{:?}", e),
            })?;

        let text = page.text().map_err(|e| ExtractError::PageTextFailed {
            page: page_num,
            detail: format!("{:?}", e),
        })?;

        let fragments = text
            .segments()
            .iter()
            .map(|segment| segment.text())
            .collect();
        Ok(fragments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::PipelineProgressCallback;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn doc(pages: &[&[&str]]) -> Vec<Vec<String>> {
        pages
            .iter()
            .map(|p| p.iter().map(|f| f.to_string()).collect())
            .collect()
    }

    #[test]
    fn fragments_joined_by_space_pages_by_newline() {
        let d = doc(&[&["Hola", "mundo"], &["Segunda", "página", "aquí"]]);
        let text = join_text_layer(&d, None).unwrap();
        assert_eq!(text, "Hola mundo\nSegunda página aquí");
    }

    #[test]
    fn single_page_has_no_trailing_newline() {
        let d = doc(&[&["solo"]]);
        assert_eq!(join_text_layer(&d, None).unwrap(), "solo");
    }

    #[test]
    fn empty_pages_keep_their_separator() {
        let d = doc(&[&[], &["texto"], &[]]);
        assert_eq!(join_text_layer(&d, None).unwrap(), "\ntexto\n");
    }

    #[test]
    fn zero_pages_is_empty_text() {
        let d: Vec<Vec<String>> = Vec::new();
        assert_eq!(join_text_layer(&d, None).unwrap(), "");
    }

    struct FailingPage {
        bad_page: usize,
        visited: AtomicUsize,
    }

    impl TextLayerDocument for FailingPage {
        fn page_count(&self) -> usize {
            4
        }

        fn page_fragments(&self, page_num: usize) -> Result<Vec<String>, ExtractError> {
            self.visited.fetch_add(1, Ordering::SeqCst);
            if page_num == self.bad_page {
                Err(ExtractError::PageTextFailed {
                    page: page_num,
                    detail: "broken".into(),
                })
            } else {
                Ok(vec![format!("p{page_num}")])
            }
        }
    }

    #[test]
    fn bad_page_aborts_whole_document() {
        let d = FailingPage {
            bad_page: 2,
            visited: AtomicUsize::new(0),
        };
        let err = join_text_layer(&d, None).unwrap_err();
        assert!(matches!(err, ExtractError::PageTextFailed { page: 2, .. }));
        assert_eq!(d.visited.load(Ordering::SeqCst), 2, "pages after the bad one are not read");
    }

    struct PageCounter(AtomicUsize);

    impl PipelineProgressCallback for PageCounter {
        fn on_page_extracted(&self, page_num: usize, total_pages: usize, _text_len: usize) {
            assert!(page_num <= total_pages);
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn progress_reports_every_page() {
        let counter = Arc::new(PageCounter(AtomicUsize::new(0)));
        let cb: ProgressCallback = counter.clone();
        let d = doc(&[&["a"], &["b"], &["c"]]);
        join_text_layer(&d, Some(&cb)).unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn missing_pdfium_library_is_a_value() {
        let config = PipelineConfig::builder()
            .pdfium_lib_path("/definitely/not/a/pdfium/dir")
            .build()
            .unwrap();
        let err = PdfiumExtractor
            .extract(b"%PDF-1.4\n", &config)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::PdfiumBindingFailed(_)), "got: {err:?}");
    }

    #[test]
    fn vec_document_rejects_page_zero() {
        let d = doc(&[&["a"]]);
        assert!(d.page_fragments(0).is_err());
        assert!(d.page_fragments(2).is_err());
    }
}
