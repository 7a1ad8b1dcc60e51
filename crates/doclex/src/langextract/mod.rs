//! LLM-backed entity extraction.
//!
//! The engine splits a document into chunks, asks a hosted model (Gemini or
//! OpenAI) to extract entities from each chunk using a few-shot prompt, locates
//! every answer in the source text and merges repeated passes.
//!
//! [`ExtractionLibrary`] is the seam the service talks to; [`LangExtract`] is
//! the HTTP-backed implementation. Tests substitute their own.

pub mod annotator;
pub mod chunking;
pub mod client;
pub mod data;
pub mod examples;
pub mod io;
pub mod prompt;
pub mod provider;
pub mod resolver;
pub mod visualize;

pub use annotator::{AnnotateOptions, Annotator};
pub use client::{ClientOptions, LanguageModel};
pub use data::{AnnotatedDocument, CharInterval, ExampleData, Extraction};
pub use examples::{DEFAULT_SAMPLE_TEXT, ExemplarTable};
pub use io::{load_annotated_documents, save_annotated_documents};
pub use provider::{ApiKeySource, Provider, ProviderProfile};

use crate::core::config::Settings;
use crate::error::{DoclexError, Result};
use async_trait::async_trait;
use prompt::PromptBuilder;
use std::path::{Path, PathBuf};

/// Everything needed for one engine call.
#[derive(Debug, Clone)]
pub struct ExtractParams {
    pub text: String,
    pub prompt_description: String,
    pub examples: Vec<ExampleData>,
    pub model_id: String,
    pub api_key: String,
    pub profile: ProviderProfile,
    pub max_workers: usize,
    pub extraction_passes: usize,
    pub max_char_buffer: usize,
}

#[async_trait]
pub trait ExtractionLibrary: Send + Sync {
    /// Extract entities from `params.text`.
    async fn extract(&self, params: ExtractParams) -> Result<AnnotatedDocument>;

    /// Render the first document of a JSONL file as HTML.
    async fn visualize(&self, jsonl_path: &Path) -> Result<String>;

    /// Whether the engine can be used at all.
    fn is_available(&self) -> bool;
}

/// Production engine talking to the Gemini and OpenAI HTTP APIs.
#[derive(Clone)]
pub struct LangExtract {
    http: reqwest::Client,
    options: ClientOptions,
}

impl LangExtract {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let http = options.build_http_client()?;
        Ok(Self { http, options })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(ClientOptions::from_settings(settings))
    }
}

#[async_trait]
impl ExtractionLibrary for LangExtract {
    async fn extract(&self, params: ExtractParams) -> Result<AnnotatedDocument> {
        if params.api_key.is_empty() {
            return Err(DoclexError::configuration(format!(
                "No API key configured for {} models. Please set {}",
                params.profile.provider,
                params.profile.api_key_source.env_var()
            )));
        }

        let model = client::create_model(
            self.http.clone(),
            &self.options,
            &params.profile,
            &params.model_id,
            &params.api_key,
        );
        let prompt = PromptBuilder::new(params.prompt_description, params.examples, params.profile.fence_output);
        let annotator = Annotator::new(model, prompt);

        annotator
            .annotate(
                &params.text,
                AnnotateOptions {
                    max_char_buffer: params.max_char_buffer,
                    max_workers: params.max_workers,
                    extraction_passes: params.extraction_passes,
                },
            )
            .await
    }

    async fn visualize(&self, jsonl_path: &Path) -> Result<String> {
        let path: PathBuf = jsonl_path.to_path_buf();
        let documents = tokio::task::spawn_blocking(move || load_annotated_documents(&path))
            .await
            .map_err(|e| DoclexError::Other(format!("Visualization task failed: {}", e)))??;

        let document = documents
            .first()
            .ok_or_else(|| DoclexError::serialization(format!("No documents in {}", jsonl_path.display())))?;
        Ok(visualize::render_html(document))
    }

    fn is_available(&self) -> bool {
        true
    }
}
