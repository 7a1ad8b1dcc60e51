//! Error types for Doclex.
//!
//! Every fallible operation in the crate returns [`DoclexError`]. The variants
//! fall into four groups that the HTTP layer maps to status codes:
//!
//! - **Input rejected** (`Validation`): size, type or allow-list checks failed.
//! - **Extraction pipeline** (`Parsing`, `Ocr`, `UnsupportedFormat`): the
//!   document could not be turned into text.
//! - **Entity extraction** (`Configuration`, `LangExtract`): the language model
//!   call could not be made or failed.
//! - **Everything else** (`Io`, `Serialization`, `Other`):
//!   unexpected failures whose details are not shown to API clients.
//!
//! `Io` errors bubble up unchanged through `?`.
//!
//! # Example
//!
//! ```rust
//! use doclex::{DoclexError, Result};
//!
//! fn check_prompt(prompt: &str) -> Result<()> {
//!     if prompt.trim().is_empty() {
//!         return Err(DoclexError::validation("Prompt description must not be empty"));
//!     }
//!     Ok(())
//! }
//! ```
use thiserror::Error;

/// Result type alias using `DoclexError`.
pub type Result<T> = std::result::Result<T, DoclexError>;

/// Main error type for all Doclex operations.
#[derive(Debug, Error)]
pub enum DoclexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parsing error: {message}")]
    Parsing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("OCR error: {message}")]
    Ocr {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{message}")]
    LangExtract {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    Other(String),
}

impl DoclexError {
    /// The bare reason carried by the error, without the variant prefix.
    ///
    /// API responses report this text so clients see the same wording the
    /// validators and extractors produced.
    pub fn reason(&self) -> String {
        match self {
            DoclexError::Parsing { message, .. }
            | DoclexError::Ocr { message, .. }
            | DoclexError::Validation { message, .. }
            | DoclexError::Configuration { message, .. }
            | DoclexError::LangExtract { message, .. }
            | DoclexError::Serialization { message, .. } => message.clone(),
            DoclexError::UnsupportedFormat(message)
            | DoclexError::Other(message) => message.clone(),
            DoclexError::Io(err) => err.to_string(),
        }
    }

    /// Whether this error came from the document-to-text pipeline.
    pub fn is_extraction_failure(&self) -> bool {
        matches!(
            self,
            DoclexError::Parsing { .. } | DoclexError::Ocr { .. } | DoclexError::UnsupportedFormat(_)
        )
    }
}

impl From<serde_json::Error> for DoclexError {
    fn from(err: serde_json::Error) -> Self {
        DoclexError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        paste::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl DoclexError {
    error_constructor!(parsing, Parsing);
    error_constructor!(ocr, Ocr);
    error_constructor!(validation, Validation);
    error_constructor!(configuration, Configuration);
    error_constructor!(lang_extract, LangExtract);
    error_constructor!(serialization, Serialization);
}
