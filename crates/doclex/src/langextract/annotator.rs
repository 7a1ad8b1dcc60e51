//! Chunked, concurrent, multi-pass annotation of one document.

use super::chunking::{TextChunk, chunk_text};
use super::client::LanguageModel;
use super::data::{AnnotatedDocument, Extraction};
use super::prompt::PromptBuilder;
use super::resolver::{align_extractions, parse_model_output};
use crate::error::{DoclexError, Result};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Limits for one annotation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotateOptions {
    pub max_char_buffer: usize,
    pub max_workers: usize,
    pub extraction_passes: usize,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            max_char_buffer: 1000,
            max_workers: 10,
            extraction_passes: 1,
        }
    }
}

pub struct Annotator {
    model: Arc<dyn LanguageModel>,
    prompt: Arc<PromptBuilder>,
}

impl Annotator {
    pub fn new(model: Arc<dyn LanguageModel>, prompt: PromptBuilder) -> Self {
        Self {
            model,
            prompt: Arc::new(prompt),
        }
    }

    /// Run every pass over `text` and merge the results.
    pub async fn annotate(&self, text: &str, options: AnnotateOptions) -> Result<AnnotatedDocument> {
        let chunks = chunk_text(text, options.max_char_buffer);
        let passes = options.extraction_passes.max(1);

        tracing::debug!(
            "Annotating {} chars in {} chunks with '{}' ({} passes, {} workers)",
            text.chars().count(),
            chunks.len(),
            self.model.model_id(),
            passes,
            options.max_workers
        );

        let mut merged: Vec<Extraction> = Vec::new();
        for pass in 0..passes {
            let found = self.run_pass(&chunks, options.max_workers).await?;
            tracing::debug!("Pass {} produced {} extractions", pass + 1, found.len());
            if pass == 0 {
                merged = found;
            } else {
                merge_pass(&mut merged, found);
            }
        }

        sort_by_position(&mut merged);

        let mut document = AnnotatedDocument::new(text);
        document.extractions = merged;
        Ok(document)
    }

    /// One pass over all chunks; at most `max_workers` model calls in flight.
    async fn run_pass(&self, chunks: &[TextChunk], max_workers: usize) -> Result<Vec<Extraction>> {
        let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
        let mut tasks = JoinSet::new();

        for chunk in chunks.iter().filter(|chunk| !chunk.is_blank()) {
            let chunk = chunk.clone();
            let model = Arc::clone(&self.model);
            let prompt = Arc::clone(&self.prompt);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| DoclexError::Other(format!("Worker pool closed: {}", e)))?;

                let raw = model.infer(&prompt.render(&chunk.text)).await?;
                let mut extractions = parse_model_output(&raw)?;
                align_extractions(&mut extractions, &chunk.text, chunk.char_offset);
                Ok::<_, DoclexError>((chunk.index, extractions))
            });
        }

        let mut per_chunk: Vec<(usize, Vec<Extraction>)> = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            let result = joined.map_err(|e| DoclexError::Other(format!("Chunk task failed: {}", e)))?;
            // Returning drops the set, which aborts the remaining chunks.
            per_chunk.push(result?);
        }

        per_chunk.sort_by_key(|(index, _)| *index);
        Ok(per_chunk.into_iter().flat_map(|(_, extractions)| extractions).collect())
    }
}

/// Add extractions from a later pass that do not collide with accepted ones.
///
/// Aligned extractions are rejected when they overlap any accepted aligned span.
/// Unaligned extractions are rejected when the same class and text was already
/// accepted.
pub fn merge_pass(accepted: &mut Vec<Extraction>, candidates: Vec<Extraction>) {
    for candidate in candidates {
        let collides = match candidate.char_interval.filter(|interval| interval.bounds().is_some()) {
            Some(interval) => accepted
                .iter()
                .filter_map(|existing| existing.char_interval)
                .any(|existing| existing.overlaps(&interval)),
            None => accepted.iter().any(|existing| {
                existing.extraction_class == candidate.extraction_class
                    && existing.extraction_text == candidate.extraction_text
            }),
        };

        if !collides {
            accepted.push(candidate);
        }
    }
}

/// Order by start position with unaligned extractions last. The sort is stable,
/// so ties keep chunk order.
fn sort_by_position(extractions: &mut [Extraction]) {
    extractions.sort_by_key(|extraction| extraction.span().map_or(usize::MAX, |(start, _)| start));
}
