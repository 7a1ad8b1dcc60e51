//! Document-to-text extraction.
//!
//! [`extract_text`] detects the file type from the filename and hands the bytes to
//! one format-specific extractor:
//!
//! - **Text** (`text`): UTF-8, falling back to Latin-1
//! - **PDF** (`crate::pdf`): Pdfium, falling back to lopdf
//! - **DOCX** (`docx`): paragraphs from `word/document.xml`
//! - **XLSX/XLS** (`excel`): per-sheet tab-separated rows
//! - **Images** (`image`): OCR through an [`OcrBackend`]
//!
//! Every failure is reported as an extraction-pipeline error
//! (`Parsing`, `Ocr` or `UnsupportedFormat`).

pub mod text;

#[cfg(feature = "office")]
pub mod docx;

#[cfg(feature = "excel")]
pub mod excel;

#[cfg(feature = "ocr")]
pub mod image;

use crate::core::formats::{FileType, detect_file_type, file_extension};
use crate::error::{DoclexError, Result};
use crate::ocr::OcrBackend;

/// Text pulled out of a document, tagged with the detected type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub file_type: FileType,
}

/// Extract plain text from an uploaded document.
///
/// Plain text is returned as decoded; the output of every other extractor is
/// trimmed. Whitespace-only results are rejected.
///
/// # Errors
///
/// - `UnsupportedFormat` for unknown types or formats compiled out of this build
/// - `Parsing` / `Ocr` when the extractor fails or yields no text
pub async fn extract_text(filename: &str, content: &[u8], ocr: &dyn OcrBackend) -> Result<ExtractedText> {
    let file_type = detect_file_type(filename);
    tracing::debug!("Extracting text from '{}' as {}", filename, file_type);

    let text = match file_type {
        FileType::Text => text::decode_text(content)?,
        FileType::Pdf => extract_pdf(content).await?,
        FileType::Docx => extract_docx(content).await?,
        FileType::Xlsx => extract_xlsx(content, file_extension(filename)).await?,
        FileType::Image => extract_image(content, ocr).await?,
        FileType::Unknown => {
            return Err(DoclexError::UnsupportedFormat(format!(
                "Unsupported file type: {}",
                file_type
            )));
        }
    };

    if text.trim().is_empty() {
        return Err(DoclexError::parsing(format!(
            "No text could be extracted from the {} file",
            file_type
        )));
    }

    Ok(ExtractedText { text, file_type })
}

/// Run a CPU-bound parser off the async worker threads.
#[cfg(any(feature = "pdf", feature = "office", feature = "excel"))]
async fn run_blocking<F>(task: F) -> Result<String>
where
    F: FnOnce() -> Result<String> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| DoclexError::Other(format!("Extraction task failed: {}", e)))?
}

#[cfg(feature = "pdf")]
async fn extract_pdf(content: &[u8]) -> Result<String> {
    let bytes = content.to_vec();
    run_blocking(move || crate::pdf::extract_pdf_text(&bytes)).await
}

#[cfg(not(feature = "pdf"))]
async fn extract_pdf(_content: &[u8]) -> Result<String> {
    Err(DoclexError::UnsupportedFormat(
        "PDF support is not enabled in this build".to_string(),
    ))
}

#[cfg(feature = "office")]
async fn extract_docx(content: &[u8]) -> Result<String> {
    let bytes = content.to_vec();
    run_blocking(move || docx::extract_docx_text(&bytes)).await
}

#[cfg(not(feature = "office"))]
async fn extract_docx(_content: &[u8]) -> Result<String> {
    Err(DoclexError::UnsupportedFormat(
        "DOCX support is not enabled in this build".to_string(),
    ))
}

#[cfg(feature = "excel")]
async fn extract_xlsx(content: &[u8], extension: String) -> Result<String> {
    let bytes = content.to_vec();
    run_blocking(move || excel::extract_excel_text(&bytes, &extension)).await
}

#[cfg(not(feature = "excel"))]
async fn extract_xlsx(_content: &[u8], _extension: String) -> Result<String> {
    Err(DoclexError::UnsupportedFormat(
        "Spreadsheet support is not enabled in this build".to_string(),
    ))
}

#[cfg(feature = "ocr")]
async fn extract_image(content: &[u8], ocr: &dyn OcrBackend) -> Result<String> {
    image::extract_image_text(content, ocr).await
}

#[cfg(not(feature = "ocr"))]
async fn extract_image(_content: &[u8], _ocr: &dyn OcrBackend) -> Result<String> {
    Err(DoclexError::UnsupportedFormat(
        "Image OCR support is not enabled in this build".to_string(),
    ))
}
