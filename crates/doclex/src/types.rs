//! Result types returned by the extraction service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entity in a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionEntity {
    pub extraction_class: String,
    pub extraction_text: String,
    /// Character offset of the entity start. `0` when the engine could not locate it.
    pub start_char: usize,
    /// Character offset of the entity end. Defaults to the entity text length
    /// when the engine could not locate it.
    pub end_char: usize,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// Details about how an extraction was run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    pub model_used: String,
    pub processing_time_seconds: f64,
    pub extraction_passes: usize,
    pub max_workers: usize,
    /// Length of the input text in characters.
    pub text_length: usize,
    pub visualization_html: Option<String>,
}

/// Response body of the extraction endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub success: bool,
    pub message: String,
    pub filename: String,
    /// Detected input type tag (`text`, `pdf`, `docx`, `xlsx`, `image`).
    pub file_type: String,
    /// Length of the extracted text in characters.
    pub text_length: usize,
    pub entities: Vec<ExtractionEntity>,
    pub entity_count: usize,
    pub model_used: String,
    /// Total request wall time, text extraction included.
    pub processing_time_seconds: f64,
    pub visualization_html: Option<String>,
}

impl ExtractionResponse {
    pub const SUCCESS_MESSAGE: &'static str = "Extraction completed successfully";

    pub fn success(
        filename: impl Into<String>,
        file_type: impl Into<String>,
        entities: Vec<ExtractionEntity>,
        metadata: ProcessingMetadata,
        processing_time_seconds: f64,
    ) -> Self {
        Self {
            success: true,
            message: Self::SUCCESS_MESSAGE.to_string(),
            filename: filename.into(),
            file_type: file_type.into(),
            text_length: metadata.text_length,
            entity_count: entities.len(),
            entities,
            model_used: metadata.model_used,
            processing_time_seconds,
            visualization_html: metadata.visualization_html,
        }
    }
}
