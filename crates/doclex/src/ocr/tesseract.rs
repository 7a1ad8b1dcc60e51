//! Tesseract OCR through the `tesseract` command-line tool.
//!
//! The image is written to a scratch file, Tesseract is asked to print the text to
//! stdout, and the process is killed if it outlives the configured timeout.

use super::OcrBackend;
use crate::core::config::Settings;
use crate::error::{DoclexError, Result};
use async_trait::async_trait;
use std::io::Write;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{Duration, timeout};

#[derive(Debug, Clone)]
pub struct TesseractBackend {
    binary: String,
    language: String,
    timeout_secs: u64,
}

impl TesseractBackend {
    pub fn new(binary: impl Into<String>, language: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
            timeout_secs,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.tesseract_path.clone(),
            settings.ocr_language.clone(),
            settings.ocr_timeout_secs,
        )
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

#[async_trait]
impl OcrBackend for TesseractBackend {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, png_bytes: &[u8]) -> Result<String> {
        // Removed when dropped, on every return path.
        let mut scratch = tempfile::Builder::new().prefix("doclex_ocr_").suffix(".png").tempfile()?;
        scratch.write_all(png_bytes)?;
        scratch.flush()?;

        let child = Command::new(&self.binary)
            .arg(scratch.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DoclexError::ocr_with_source(format!("Failed to execute Tesseract at '{}': {}", self.binary, e), e)
            })?;

        let output = match timeout(Duration::from_secs(self.timeout_secs), child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(DoclexError::ocr(format!("Failed to wait for Tesseract: {}", e)));
            }
            Err(_) => {
                return Err(DoclexError::ocr(format!(
                    "Tesseract timed out after {} seconds",
                    self.timeout_secs
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DoclexError::ocr(format!(
                "Tesseract exited with code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
