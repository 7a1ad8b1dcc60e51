//! Doclex - Document Entity Extraction
//!
//! Doclex pulls plain text out of uploaded documents and asks a large language
//! model to extract structured entities from it. It ships as a library and as an
//! HTTP service.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use doclex::{ExtractionRequest, ExtractionService, Settings};
//!
//! # #[tokio::main]
//! # async fn main() -> doclex::Result<()> {
//! let service = ExtractionService::from_settings(Arc::new(Settings::load()?))?;
//! let request = ExtractionRequest::new(
//!     "John Smith visited New York on January 15, 2024.",
//!     "Extract people, places and dates",
//!     vec!["person".into(), "location".into(), "date".into()],
//! );
//! let (entities, metadata) = service.process(request).await?;
//! println!("{} entities via {}", entities.len(), metadata.model_used);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core Module** (`core`): settings, file type detection and upload validation
//! - **Extraction** (`extraction`): text from TXT, PDF, DOCX, XLSX/XLS and images
//! - **OCR** (`ocr`): pluggable OCR backends, Tesseract CLI by default
//! - **Engine** (`langextract`): chunked, multi-pass LLM extraction with alignment
//! - **Service** (`service`): request defaults, provider routing, visualization
//! - **API** (`api`): Axum HTTP server

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod extraction;
pub mod langextract;
pub mod ocr;
pub mod service;
pub mod types;

#[cfg(feature = "api")]
pub mod api;

#[cfg(feature = "pdf")]
pub mod pdf;

pub use error::{DoclexError, Result};

pub use core::config::Settings;
pub use core::formats::{FileType, detect_file_type, validate_file};
pub use extraction::{ExtractedText, extract_text};
pub use langextract::{ExemplarTable, ExtractParams, ExtractionLibrary, LangExtract};
pub use service::{ExtractionRequest, ExtractionService, parse_extraction_classes};
pub use types::{ExtractionEntity, ExtractionResponse, ProcessingMetadata};
