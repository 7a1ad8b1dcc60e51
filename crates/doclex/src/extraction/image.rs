//! Image text extraction via OCR.
//!
//! Images are decoded with the `image` crate, normalized to 8-bit RGB, re-encoded
//! as PNG and handed to an [`OcrBackend`].

use crate::error::{DoclexError, Result};
use crate::ocr::OcrBackend;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Decode any supported image and re-encode it as an RGB PNG.
pub fn normalize_to_rgb_png(bytes: &[u8]) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| DoclexError::ocr_with_source(format!("Failed to decode image: {}", e), e))?;

    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());

    let mut buffer = Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| DoclexError::ocr_with_source(format!("Failed to encode image: {}", e), e))?;

    Ok(buffer.into_inner())
}

/// Run OCR over an image and return the trimmed text.
pub async fn extract_image_text(bytes: &[u8], backend: &dyn OcrBackend) -> Result<String> {
    let png = normalize_to_rgb_png(bytes).map_err(wrap_ocr_error)?;

    tracing::debug!("Running OCR backend '{}' on {} byte image", backend.name(), png.len());

    let text = backend.recognize(&png).await.map_err(wrap_ocr_error)?;
    Ok(text.trim().to_string())
}

fn wrap_ocr_error(err: DoclexError) -> DoclexError {
    DoclexError::ocr(format!("Failed to extract text from image using OCR: {}", err.reason()))
}
