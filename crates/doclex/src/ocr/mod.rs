//! OCR backends.
//!
//! Image text recognition sits behind the [`OcrBackend`] trait so the HTTP layer
//! and tests can swap the engine. The default backend shells out to the
//! Tesseract CLI.

mod tesseract;

pub use tesseract::TesseractBackend;

use crate::Result;
use async_trait::async_trait;

/// Trait for OCR engines.
///
/// Implementations receive a PNG-encoded RGB image and return the recognized
/// text. They must be `Send + Sync` because one instance is shared by all
/// request handlers.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use doclex::ocr::OcrBackend;
///
/// struct FixedOcr;
///
/// #[async_trait]
/// impl OcrBackend for FixedOcr {
///     fn name(&self) -> &str {
///         "fixed"
///     }
///
///     async fn recognize(&self, _png_bytes: &[u8]) -> doclex::Result<String> {
///         Ok("Invoice #42".to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Backend name, used in logs.
    fn name(&self) -> &str;

    /// Recognize text in a PNG image.
    async fn recognize(&self, png_bytes: &[u8]) -> Result<String>;
}
