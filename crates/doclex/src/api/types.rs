//! API request and response types.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::config::Settings;
use crate::ocr::OcrBackend;
use crate::service::ExtractionService;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` when the engine is available and an API key is set, `degraded` otherwise
    pub status: String,
    pub version: String,
    pub extraction_library_available: bool,
    pub api_key_configured: bool,
}

/// Supported model catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub gemini_models: Vec<String>,
    pub openai_models: Vec<String>,
    pub default_model: String,
    pub note: String,
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Error type name
    pub error_type: String,
    /// Error message
    pub message: String,
    /// HTTP status code
    pub status_code: u16,
}

/// API server state.
///
/// Everything in here is read-only and shared by all handlers.
#[derive(Clone)]
pub struct ApiState {
    pub settings: Arc<Settings>,
    pub service: Arc<ExtractionService>,
    pub ocr: Arc<dyn OcrBackend>,
}

impl ApiState {
    pub fn new(settings: Arc<Settings>, service: Arc<ExtractionService>, ocr: Arc<dyn OcrBackend>) -> Self {
        Self {
            settings,
            service,
            ocr,
        }
    }

    /// Production wiring: HTTP extraction engine and the Tesseract CLI.
    pub fn from_settings(settings: Settings) -> crate::Result<Self> {
        let settings = Arc::new(settings);
        let service = ExtractionService::from_settings(Arc::clone(&settings))?;
        let ocr = crate::ocr::TesseractBackend::from_settings(&settings);
        Ok(Self::new(settings, Arc::new(service), Arc::new(ocr)))
    }
}
