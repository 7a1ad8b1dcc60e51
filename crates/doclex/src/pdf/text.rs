//! PDF text extraction.
//!
//! Pdfium is the primary parser. Any failure there (library missing, document
//! rejected, page text unavailable) falls back to `lopdf`. Only when both parsers
//! fail is an error returned.

use super::bindings::bind_pdfium;
use super::error::{PdfError, Result};
use crate::error::DoclexError;
use pdfium_render::prelude::*;

/// Extract the text of every page, pages separated by a newline, trimmed.
pub fn extract_pdf_text(pdf_bytes: &[u8]) -> crate::Result<String> {
    match extract_text_with_pdfium(pdf_bytes) {
        Ok(text) => Ok(text),
        Err(primary) => {
            tracing::warn!("Pdfium text extraction failed, falling back to lopdf: {}", primary);
            extract_text_with_lopdf(pdf_bytes).map_err(|fallback| {
                DoclexError::parsing_with_source(
                    format!("Failed to extract text from PDF: {}; fallback parser: {}", primary, fallback),
                    fallback,
                )
            })
        }
    }
}

pub fn extract_text_with_pdfium(pdf_bytes: &[u8]) -> Result<String> {
    let pdfium = Pdfium::new(bind_pdfium()?);

    let document = pdfium.load_pdf_from_byte_slice(pdf_bytes, None).map_err(|e| {
        let err_msg = e.to_string();
        if err_msg.contains("password") || err_msg.contains("Password") {
            PdfError::PasswordRequired
        } else {
            PdfError::InvalidPdf(err_msg)
        }
    })?;

    let mut content = String::new();
    for (page_idx, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| PdfError::TextExtractionFailed(format!("Page {} text extraction failed: {}", page_idx + 1, e)))?;

        if page_idx > 0 {
            content.push('\n');
        }
        content.push_str(&text.all());
    }

    Ok(content.trim().to_string())
}

pub fn extract_text_with_lopdf(pdf_bytes: &[u8]) -> Result<String> {
    let document = lopdf::Document::load_mem(pdf_bytes)?;

    let mut content = String::new();
    for (idx, page_number) in document.get_pages().keys().enumerate() {
        let page_text = document
            .extract_text(&[*page_number])
            .map_err(|e| PdfError::TextExtractionFailed(format!("Page {} text extraction failed: {}", page_number, e)))?;

        if idx > 0 && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(&page_text);
    }

    Ok(content.trim().to_string())
}
