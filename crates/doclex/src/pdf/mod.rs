//! PDF text extraction with a two-parser fallback chain.
//!
//! - **Primary**: `pdfium-render` bound to the system Pdfium library
//! - **Fallback**: `lopdf`, pure Rust, used whenever Pdfium fails or is missing
//!
//! # Example
//!
//! ```rust,no_run
//! use doclex::pdf::extract_pdf_text;
//!
//! # fn example() -> doclex::Result<()> {
//! let pdf_bytes = std::fs::read("document.pdf")?;
//! let text = extract_pdf_text(&pdf_bytes)?;
//! println!("{}", text);
//! # Ok(())
//! # }
//! ```
mod bindings;
pub mod error;
pub mod text;

pub use error::PdfError;
pub use text::{extract_pdf_text, extract_text_with_lopdf, extract_text_with_pdfium};
