//! Entity extraction over already-extracted text.
//!
//! [`ExtractionService`] resolves request defaults from [`Settings`], picks the
//! provider and API key for the model, builds the few-shot example and calls the
//! [`ExtractionLibrary`] once. A best-effort HTML visualization is attached to
//! successful results.

use crate::core::config::Settings;
use crate::error::{DoclexError, Result};
use crate::langextract::{
    AnnotatedDocument, ApiKeySource, ExemplarTable, ExtractParams, ExtractionLibrary, LangExtract, Provider,
    save_annotated_documents,
};
use crate::types::{ExtractionEntity, ProcessingMetadata};
use std::sync::Arc;
use std::time::Instant;

/// Number of leading document characters used as the example text.
const SAMPLE_CHARS: usize = 200;

pub const MISSING_API_KEY_MESSAGE: &str = "No API key configured. Please set LANGEXTRACT_API_KEY or OPENAI_API_KEY";

/// One entity-extraction request. `None` fields take the configured defaults.
#[derive(Debug, Clone, Default)]
pub struct ExtractionRequest {
    pub text: String,
    pub prompt_description: String,
    pub extraction_classes: Vec<String>,
    pub model_id: Option<String>,
    pub max_workers: Option<usize>,
    pub extraction_passes: Option<usize>,
}

impl ExtractionRequest {
    pub fn new(text: impl Into<String>, prompt_description: impl Into<String>, extraction_classes: Vec<String>) -> Self {
        Self {
            text: text.into(),
            prompt_description: prompt_description.into(),
            extraction_classes,
            ..Default::default()
        }
    }
}

/// Split a comma-separated class list, trimming whitespace and dropping empties.
pub fn parse_extraction_classes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|class| !class.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Clone)]
pub struct ExtractionService {
    settings: Arc<Settings>,
    exemplars: Arc<ExemplarTable>,
    library: Arc<dyn ExtractionLibrary>,
}

impl ExtractionService {
    pub fn new(settings: Arc<Settings>, exemplars: Arc<ExemplarTable>, library: Arc<dyn ExtractionLibrary>) -> Self {
        Self {
            settings,
            exemplars,
            library,
        }
    }

    /// Service backed by the HTTP engine and the built-in exemplar table.
    pub fn from_settings(settings: Arc<Settings>) -> Result<Self> {
        let library = LangExtract::from_settings(&settings)?;
        Ok(Self::new(
            settings,
            Arc::new(ExemplarTable::standard()),
            Arc::new(library),
        ))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// `(library_available, api_key_configured)`.
    pub fn check_availability(&self) -> (bool, bool) {
        (self.library.is_available(), self.settings.has_api_key())
    }

    /// Extract entities from `request.text`.
    ///
    /// # Errors
    ///
    /// - `Configuration` when no API key is configured; the engine is not called
    /// - `LangExtract` for any engine failure, prefixed with
    ///   `"LangExtract processing failed: "`
    pub async fn process(&self, request: ExtractionRequest) -> Result<(Vec<ExtractionEntity>, ProcessingMetadata)> {
        let started = Instant::now();

        let model_id = request
            .model_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| self.settings.default_model.clone());
        let max_workers = request
            .max_workers
            .filter(|n| *n > 0)
            .unwrap_or(self.settings.max_workers);
        let extraction_passes = request
            .extraction_passes
            .filter(|n| *n > 0)
            .unwrap_or(self.settings.extraction_passes);

        if !self.settings.has_api_key() {
            return Err(DoclexError::configuration(MISSING_API_KEY_MESSAGE));
        }

        let profile = Provider::resolve(&model_id).profile();
        let api_key = match profile.api_key_source {
            ApiKeySource::LangExtract => self.settings.langextract_api_key.clone(),
            ApiKeySource::OpenAi => self.settings.openai_api_key.clone(),
        };

        let sample: String = request.text.chars().take(SAMPLE_CHARS).collect();
        let examples = self
            .exemplars
            .build_examples(&request.extraction_classes, Some(&sample));

        tracing::info!(
            "Extracting {:?} with model '{}' ({} provider, {} passes, {} workers)",
            request.extraction_classes,
            model_id,
            profile.provider,
            extraction_passes,
            max_workers
        );

        let text_length = request.text.chars().count();
        let params = ExtractParams {
            text: request.text,
            prompt_description: request.prompt_description,
            examples,
            model_id: model_id.clone(),
            api_key,
            profile,
            max_workers,
            extraction_passes,
            max_char_buffer: self.settings.max_char_buffer,
        };

        let document = self.library.extract(params).await.map_err(|e| {
            let message = format!("LangExtract processing failed: {}", e.reason());
            tracing::error!("{}", message);
            DoclexError::lang_extract_with_source(message, e)
        })?;

        let entities: Vec<ExtractionEntity> = document
            .extractions
            .iter()
            .map(|extraction| {
                let interval = extraction.char_interval.unwrap_or_default();
                ExtractionEntity {
                    extraction_class: extraction.extraction_class.clone(),
                    extraction_text: extraction.extraction_text.clone(),
                    start_char: interval.start_pos.unwrap_or(0),
                    end_char: interval
                        .end_pos
                        .unwrap_or_else(|| extraction.extraction_text.chars().count()),
                    attributes: extraction.attributes.clone(),
                }
            })
            .collect();

        let visualization_html = if document.extractions.is_empty() {
            None
        } else {
            self.render_visualization(&document).await
        };

        let metadata = ProcessingMetadata {
            model_used: model_id,
            processing_time_seconds: started.elapsed().as_secs_f64(),
            extraction_passes,
            max_workers,
            text_length,
            visualization_html,
        };

        tracing::info!(
            "Extracted {} entities in {:.2}s",
            entities.len(),
            metadata.processing_time_seconds
        );

        Ok((entities, metadata))
    }

    /// Persist the document to a scratch JSONL file and ask the engine for HTML.
    ///
    /// Failures are logged and produce `None`.
    async fn render_visualization(&self, document: &AnnotatedDocument) -> Option<String> {
        match self.visualize_via_scratch_file(document).await {
            Ok(html) => Some(html),
            Err(e) => {
                tracing::warn!("Failed to generate visualization: {}", e);
                None
            }
        }
    }

    async fn visualize_via_scratch_file(&self, document: &AnnotatedDocument) -> Result<String> {
        // Removed when dropped, on every return path.
        let scratch = tempfile::Builder::new()
            .prefix("doclex_viz_")
            .suffix(".jsonl")
            .tempfile()?;
        save_annotated_documents(std::slice::from_ref(document), scratch.path())?;
        self.library.visualize(scratch.path()).await
    }
}
