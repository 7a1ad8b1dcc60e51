//! Failures of a single PDF parser.
//!
//! These never leave the `pdf` module on their own: `extract_pdf_text` folds the
//! Pdfium and lopdf errors into one `DoclexError::Parsing`.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PdfError {
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    #[error("PDF is password-protected")]
    PasswordRequired,

    /// Pdfium could not be bound; lopdf still gets a chance.
    #[error("Pdfium unavailable: {0}")]
    LibraryUnavailable(String),

    #[error("Text extraction failed: {0}")]
    TextExtractionFailed(String),

    #[error("I/O error while reading PDF: {0}")]
    Io(String),
}

impl From<lopdf::Error> for PdfError {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(io_err) => PdfError::Io(io_err.to_string()),
            _ => PdfError::InvalidPdf(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, PdfError>;
