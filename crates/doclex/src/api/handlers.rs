//! API request handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json,
    extract::{Form, FromRequest, Multipart, Request, State},
    http::{
        HeaderMap, StatusCode,
        header::{CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::Html,
};
use serde::Deserialize;

use crate::core::config::Settings;
use crate::core::formats::validate_file;
use crate::extraction::extract_text;
use crate::service::{ExtractionRequest, parse_extraction_classes};
use crate::types::ExtractionResponse;

use super::{
    error::ApiError,
    server::body_limit_bytes,
    types::{ApiState, HealthResponse, ModelsResponse},
};

/// Filename reported for raw text submissions.
pub const TEXT_INPUT_FILENAME: &str = "text_input";

const GEMINI_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-pro", "gemini-1.5-flash", "gemini-1.5-pro"];
const OPENAI_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-3.5-turbo"];
const MODELS_NOTE: &str = "Gemini models require LANGEXTRACT_API_KEY, OpenAI models require OPENAI_API_KEY";

/// Form fields shared by both extraction endpoints.
#[derive(Debug, Default, Deserialize)]
struct ExtractionForm {
    #[serde(skip)]
    file: Option<(String, Vec<u8>)>,
    text: Option<String>,
    prompt_description: Option<String>,
    extraction_classes: Option<String>,
    model_id: Option<String>,
    max_workers: Option<String>,
    extraction_passes: Option<String>,
}

fn file_too_large(settings: &Settings) -> ApiError {
    ApiError::bad_request(format!("File size exceeds {}MB limit", settings.max_file_size_mb))
}

fn text_too_large(settings: &Settings) -> ApiError {
    ApiError::bad_request(format!("Text length exceeds {}MB limit", settings.max_file_size_mb))
}

/// Whether the declared `Content-Length` is already over the body limit.
fn declares_oversized_body(headers: &HeaderMap, settings: &Settings) -> bool {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .is_some_and(|length| length > body_limit_bytes(settings) as u64)
}

/// Map a body read failure, reporting the size reason when the limit was hit.
fn body_read_error(status: StatusCode, message: String, too_large: impl Fn() -> ApiError) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        too_large()
    } else {
        ApiError::bad_request(message)
    }
}

impl ExtractionForm {
    async fn from_multipart(mut multipart: Multipart, too_large: impl Fn() -> ApiError) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| body_read_error(e.status(), format!("Invalid multipart body: {}", e), &too_large))?
        {
            let name = field.name().unwrap_or("").to_string();

            if name == "file" {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| body_read_error(e.status(), format!("Failed to read uploaded file: {}", e), &too_large))?;
                form.file = Some((filename, data.to_vec()));
                continue;
            }

            let slot = match name.as_str() {
                "text" => &mut form.text,
                "prompt_description" => &mut form.prompt_description,
                "extraction_classes" => &mut form.extraction_classes,
                "model_id" => &mut form.model_id,
                "max_workers" => &mut form.max_workers,
                "extraction_passes" => &mut form.extraction_passes,
                _ => continue,
            };
            let value = field
                .text()
                .await
                .map_err(|e| body_read_error(e.status(), format!("Failed to read field '{}': {}", name, e), &too_large))?;
            *slot = Some(value);
        }

        Ok(form)
    }

    /// Build the service request for `text`.
    fn into_request(self, text: String) -> Result<ExtractionRequest, ApiError> {
        let prompt_description = self
            .prompt_description
            .filter(|prompt| !prompt.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("Missing required field: prompt_description"))?;

        let raw_classes = self
            .extraction_classes
            .ok_or_else(|| ApiError::bad_request("Missing required field: extraction_classes"))?;
        let extraction_classes = parse_extraction_classes(&raw_classes);
        if extraction_classes.is_empty() {
            return Err(ApiError::bad_request("At least one extraction class is required"));
        }

        Ok(ExtractionRequest {
            text,
            prompt_description,
            extraction_classes,
            model_id: self.model_id.filter(|id| !id.trim().is_empty()),
            max_workers: parse_count("max_workers", self.max_workers)?,
            extraction_passes: parse_count("extraction_passes", self.extraction_passes)?,
        })
    }
}

/// Parse an optional positive integer form field; blank means unset.
fn parse_count(name: &str, raw: Option<String>) -> Result<Option<usize>, ApiError> {
    let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
        return Ok(None);
    };
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(Some(value)),
        _ => Err(ApiError::bad_request(format!(
            "{} must be a positive integer, got '{}'",
            name, raw
        ))),
    }
}

/// Info page.
///
/// GET /
pub async fn root_handler(State(state): State<ApiState>) -> Html<String> {
    let settings = &state.settings;
    let title = html_escape::encode_text(&settings.app_title);
    let description = html_escape::encode_text(&settings.app_description);
    let version = html_escape::encode_text(&settings.app_version);

    Html(format!(
        r#"<!DOCTYPE html>
<html>
    <head>
        <meta charset="utf-8">
        <title>{title}</title>
    </head>
    <body>
        <h1>{title}</h1>
        <p>{description}</p>
        <p>Version {version}</p>
        <h2>Available Endpoints:</h2>
        <ul>
            <li><a href="/health">GET /health</a> - Health check</li>
            <li><a href="/models">GET /models</a> - Supported models</li>
            <li>POST /extract - Extract entities from an uploaded document</li>
            <li>POST /extract-text - Extract entities from raw text</li>
        </ul>
        <h2>Supported File Types:</h2>
        <p>TXT, PDF, DOCX, XLSX, PNG, JPG, JPEG</p>
        <h2>Features:</h2>
        <ul>
            <li>Text extraction from multiple file formats</li>
            <li>OCR for images using Tesseract</li>
            <li>Structured information extraction with large language models</li>
            <li>Support for Gemini and OpenAI models</li>
            <li>Interactive visualization of results</li>
        </ul>
    </body>
</html>
"#
    ))
}

/// Health check endpoint handler.
///
/// GET /health
pub async fn health_handler(State(state): State<ApiState>) -> Json<HealthResponse> {
    let (library_available, api_key_configured) = state.service.check_availability();
    let status = if library_available && api_key_configured {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: state.settings.app_version.clone(),
        extraction_library_available: library_available,
        api_key_configured,
    })
}

/// Model catalog.
///
/// GET /models
pub async fn models_handler(State(state): State<ApiState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        gemini_models: GEMINI_MODELS.iter().map(|m| m.to_string()).collect(),
        openai_models: OPENAI_MODELS.iter().map(|m| m.to_string()).collect(),
        default_model: state.settings.default_model.clone(),
        note: MODELS_NOTE.to_string(),
    })
}

/// Document extraction endpoint handler.
///
/// POST /extract
///
/// Multipart fields:
/// - `file`: the document
/// - `prompt_description`: what to extract
/// - `extraction_classes`: comma-separated entity classes
/// - `model_id`, `max_workers`, `extraction_passes` (optional)
///
/// Size, type and allow-list failures and documents that yield no text are
/// rejected with 400; engine failures are reported with 500. The form fields
/// are checked before any text is extracted.
pub async fn extract_handler(
    State(state): State<ApiState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<ExtractionResponse>, ApiError> {
    let started = Instant::now();
    let settings = &state.settings;

    if declares_oversized_body(&headers, settings) {
        return Err(file_too_large(settings));
    }

    let mut form = ExtractionForm::from_multipart(multipart, || file_too_large(settings)).await?;

    let (filename, content) = form
        .file
        .take()
        .ok_or_else(|| ApiError::bad_request("Missing required field: file"))?;
    let mut request = form.into_request(String::new())?;

    validate_file(&filename, &content, settings)?;
    let extracted = extract_text(&filename, &content, state.ocr.as_ref()).await?;
    drop(content);

    tracing::info!(
        "Extracted {} characters from '{}' ({})",
        extracted.text.chars().count(),
        filename,
        extracted.file_type
    );

    request.text = extracted.text;
    let (entities, metadata) = state.service.process(request).await?;

    Ok(Json(ExtractionResponse::success(
        filename,
        extracted.file_type.as_str(),
        entities,
        metadata,
        started.elapsed().as_secs_f64(),
    )))
}

/// Raw text extraction endpoint handler.
///
/// POST /extract-text
///
/// Accepts the same fields as `/extract` with `text` in place of `file`, sent
/// either as `application/x-www-form-urlencoded` or `multipart/form-data`.
pub async fn extract_text_handler(
    State(state): State<ApiState>,
    request: Request,
) -> Result<Json<ExtractionResponse>, ApiError> {
    let started = Instant::now();
    let settings = Arc::clone(&state.settings);

    if declares_oversized_body(request.headers(), &settings) {
        return Err(text_too_large(&settings));
    }

    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().starts_with("multipart/form-data"));

    let mut form = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| body_read_error(e.status(), e.body_text(), || text_too_large(&settings)))?;
        ExtractionForm::from_multipart(multipart, || text_too_large(&settings)).await?
    } else {
        let Form(form) = Form::<ExtractionForm>::from_request(request, &state)
            .await
            .map_err(|e| body_read_error(e.status(), e.body_text(), || text_too_large(&settings)))?;
        form
    };

    let text = form
        .text
        .take()
        .ok_or_else(|| ApiError::bad_request("Missing required field: text"))?;

    if text.len() > settings.max_file_size_bytes() {
        return Err(text_too_large(&settings));
    }
    if text.trim().is_empty() {
        return Err(ApiError::bad_request("Text must not be empty"));
    }

    let request = form.into_request(text)?;
    let (entities, metadata) = state.service.process(request).await?;

    Ok(Json(ExtractionResponse::success(
        TEXT_INPUT_FILENAME,
        crate::core::formats::FileType::Text.as_str(),
        entities,
        metadata,
        started.elapsed().as_secs_f64(),
    )))
}
