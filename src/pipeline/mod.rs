//! Pipeline stages for document text extraction and translation.
//!
//! Each submodule implements exactly one step. Every external collaborator
//! (pdfium, OCR engine, language service) sits behind a trait so a stage can
//! be tested with a fake.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ classify ──▶ pdf | ocr/vision ──▶ language ──▶ present
//! (path/URL)  (media type)   (extract text)     (detect/translate) (display text)
//! ```
//!
//! 1. [`input`]   : resolve a path or URL into an [`input::UploadedFile`]
//! 2. [`classify`]: pick the extraction method from the media type
//! 3. [`pdf`]     : read the embedded text layer; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 4. [`ocr`]     : OCR images through Tesseract; [`vision`] offers a
//!    multimodal LLM engine behind the same trait
//! 5. [`language`]: detection and translation over HTTP
//! 6. [`present`] : fixed display strings and the speech utterance

pub mod classify;
pub mod input;
pub mod language;
pub mod ocr;
pub mod pdf;
pub mod present;
pub mod vision;
