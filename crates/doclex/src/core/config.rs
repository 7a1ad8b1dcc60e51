//! Configuration loading and management.
//!
//! [`Settings`] is loaded once at startup and shared read-only afterwards.
//! Values come from three layers, later layers winning:
//!
//! 1. Built-in defaults.
//! 2. An optional `doclex.toml` discovered in the current or a parent directory
//!    (or an explicit TOML/YAML/JSON file).
//! 3. Environment variables (`LANGEXTRACT_API_KEY`, `MAX_FILE_SIZE_MB`, ...).

use crate::{DoclexError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file searched for by [`Settings::discover`].
pub const CONFIG_FILE_NAME: &str = "doclex.toml";

/// Process-wide service settings.
///
/// # Example
///
/// ```rust
/// use doclex::core::config::Settings;
///
/// let settings = Settings::default();
/// assert_eq!(settings.max_file_size_bytes(), 10 * 1024 * 1024);
/// assert_eq!(settings.default_model, "gemini-2.5-flash");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Key used for Gemini models
    #[serde(default)]
    pub langextract_api_key: String,

    /// Key used for OpenAI models
    #[serde(default)]
    pub openai_api_key: String,

    /// Upload ceiling in megabytes
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: usize,

    /// Comma-separated extension allow-list
    #[serde(default = "default_allowed_file_types")]
    pub allowed_file_types: String,

    #[serde(default = "default_model")]
    pub default_model: String,

    /// Concurrent model calls per request
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    #[serde(default = "default_extraction_passes")]
    pub extraction_passes: usize,

    /// Largest chunk, in characters, sent to the model in one call
    #[serde(default = "default_max_char_buffer")]
    pub max_char_buffer: usize,

    #[serde(default = "default_app_title")]
    pub app_title: String,

    #[serde(default = "default_app_description")]
    pub app_description: String,

    #[serde(default = "default_app_version")]
    pub app_version: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Explicit CORS origins (empty = allow all)
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Tesseract executable
    #[serde(default = "default_tesseract_path")]
    pub tesseract_path: String,

    /// Tesseract language code (e.g. "eng", "eng+deu")
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,

    #[serde(default = "default_ocr_timeout_secs")]
    pub ocr_timeout_secs: u64,

    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,

    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    /// Timeout for a single model call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_file_size_mb() -> usize {
    10
}

fn default_allowed_file_types() -> String {
    "txt,pdf,docx,xlsx,png,jpg,jpeg".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_max_workers() -> usize {
    10
}

fn default_extraction_passes() -> usize {
    2
}

fn default_max_char_buffer() -> usize {
    1000
}

fn default_app_title() -> String {
    "LangExtract Document Processing API".to_string()
}

fn default_app_description() -> String {
    "Extract structured information from documents using LLM-backed entity extraction".to_string()
}

fn default_app_version() -> String {
    "1.0.0".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_tesseract_path() -> String {
    "tesseract".to_string()
}

fn default_ocr_language() -> String {
    "eng".to_string()
}

fn default_ocr_timeout_secs() -> u64 {
    120
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            langextract_api_key: String::new(),
            openai_api_key: String::new(),
            max_file_size_mb: default_max_file_size_mb(),
            allowed_file_types: default_allowed_file_types(),
            default_model: default_model(),
            max_workers: default_max_workers(),
            extraction_passes: default_extraction_passes(),
            max_char_buffer: default_max_char_buffer(),
            app_title: default_app_title(),
            app_description: default_app_description(),
            app_version: default_app_version(),
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            tesseract_path: default_tesseract_path(),
            ocr_language: default_ocr_language(),
            ocr_timeout_secs: default_ocr_timeout_secs(),
            gemini_base_url: default_gemini_base_url(),
            openai_base_url: default_openai_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Settings {
    /// Upload ceiling in bytes.
    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// Allow-list as lower-cased extensions without dots.
    pub fn allowed_file_types_list(&self) -> Vec<String> {
        self.allowed_file_types
            .split(',')
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }

    /// Whether either provider key is set.
    pub fn has_api_key(&self) -> bool {
        !self.langextract_api_key.is_empty() || !self.openai_api_key.is_empty()
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            DoclexError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| DoclexError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            DoclexError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        serde_yaml_ng::from_str(&content)
            .map_err(|e| DoclexError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            DoclexError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| DoclexError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a file, choosing the parser by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "toml" => Self::from_toml_file(path),
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            other => Err(DoclexError::validation(format!(
                "Unsupported config file format '{}' for {}. Use .toml, .yaml or .json",
                other,
                path.display()
            ))),
        }
    }

    /// Discover `doclex.toml` in the current directory or its parents.
    ///
    /// # Returns
    ///
    /// - `Some(settings)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(DoclexError::Io)?;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Discovered file (or defaults) with environment overrides applied.
    pub fn load() -> Result<Self> {
        let mut settings = match Self::discover()? {
            Some(settings) => {
                tracing::info!("Loaded settings from discovered {}", CONFIG_FILE_NAME);
                settings
            }
            None => {
                tracing::debug!("No {} found, using default settings", CONFIG_FILE_NAME);
                Self::default()
            }
        };
        settings.apply_env();
        Ok(settings)
    }

    /// Override fields from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Override fields from an arbitrary variable lookup.
    ///
    /// Numeric values that fail to parse are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let string_var = |name: &str| lookup(name).map(|value| value.trim().to_string());

        if let Some(value) = string_var("LANGEXTRACT_API_KEY") {
            self.langextract_api_key = value;
        }
        if let Some(value) = string_var("OPENAI_API_KEY") {
            self.openai_api_key = value;
        }
        if let Some(value) = parse_var(&lookup, "MAX_FILE_SIZE_MB") {
            self.max_file_size_mb = value;
        }
        if let Some(value) = string_var("ALLOWED_FILE_TYPES").filter(|v| !v.is_empty()) {
            self.allowed_file_types = value;
        }
        if let Some(value) = string_var("DEFAULT_MODEL").filter(|v| !v.is_empty()) {
            self.default_model = value;
        }
        if let Some(value) = parse_var(&lookup, "MAX_WORKERS") {
            self.max_workers = value;
        }
        if let Some(value) = parse_var(&lookup, "EXTRACTION_PASSES") {
            self.extraction_passes = value;
        }
        if let Some(value) = parse_var(&lookup, "MAX_CHAR_BUFFER") {
            self.max_char_buffer = value;
        }
        if let Some(value) = string_var("APP_TITLE").filter(|v| !v.is_empty()) {
            self.app_title = value;
        }
        if let Some(value) = string_var("APP_DESCRIPTION").filter(|v| !v.is_empty()) {
            self.app_description = value;
        }
        if let Some(value) = string_var("APP_VERSION").filter(|v| !v.is_empty()) {
            self.app_version = value;
        }
        if let Some(value) = string_var("DOCLEX_HOST").filter(|v| !v.is_empty()) {
            self.host = value;
        }
        if let Some(value) = parse_var(&lookup, "DOCLEX_PORT") {
            self.port = value;
        }
        if let Some(value) = string_var("DOCLEX_CORS_ORIGINS") {
            self.cors_origins = value
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(value) = string_var("TESSERACT_PATH").filter(|v| !v.is_empty()) {
            self.tesseract_path = value;
        }
        if let Some(value) = string_var("OCR_LANGUAGE").filter(|v| !v.is_empty()) {
            self.ocr_language = value;
        }
        if let Some(value) = parse_var(&lookup, "OCR_TIMEOUT_SECS") {
            self.ocr_timeout_secs = value;
        }
        if let Some(value) = string_var("GEMINI_BASE_URL").filter(|v| !v.is_empty()) {
            self.gemini_base_url = value;
        }
        if let Some(value) = string_var("OPENAI_BASE_URL").filter(|v| !v.is_empty()) {
            self.openai_base_url = value;
        }
        if let Some(value) = parse_var(&lookup, "REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = value;
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Failed to parse {}='{}', keeping configured value", name, raw);
            None
        }
    }
}
