//! Integration tests for the API module.

#![cfg(feature = "api")]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use doclex::{
    DoclexError, ExemplarTable, ExtractParams, ExtractionLibrary, ExtractionResponse, ExtractionService, Result,
    Settings,
    api::{ApiState, ErrorResponse, HealthResponse, ModelsResponse, create_router_with_state},
    langextract::{AnnotatedDocument, Extraction},
    ocr::OcrBackend,
};

const SENTENCE: &str = "John Smith visited New York on January 15, 2024.";

/// Engine stub: one extraction per requested class, located in the text when possible.
#[derive(Default)]
struct EchoLibrary {
    calls: AtomicUsize,
    fail_visualize: bool,
}

#[async_trait]
impl ExtractionLibrary for EchoLibrary {
    async fn extract(&self, params: ExtractParams) -> Result<AnnotatedDocument> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let canned = [
            ("person", "John Smith"),
            ("location", "New York"),
            ("date", "January 15, 2024"),
        ];

        let mut document = AnnotatedDocument::new(params.text.clone());
        for example in params.examples.iter().flat_map(|e| &e.extractions) {
            let class = example.extraction_class.as_str();
            let text = canned
                .iter()
                .find(|(name, _)| *name == class)
                .map(|(_, text)| *text)
                .unwrap_or("unknown");
            let mut extraction = Extraction::new(class, text);
            if let Some(byte) = params.text.find(text) {
                let start = params.text[..byte].chars().count();
                extraction = extraction.with_interval(start, start + text.chars().count());
            }
            document.extractions.push(extraction);
        }
        Ok(document)
    }

    async fn visualize(&self, jsonl_path: &Path) -> Result<String> {
        if self.fail_visualize {
            return Err(DoclexError::Other("renderer unavailable".to_string()));
        }
        let raw = std::fs::read_to_string(jsonl_path)?;
        Ok(format!("<html><!-- {} bytes --></html>", raw.len()))
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[derive(Default)]
struct FixedOcr {
    calls: AtomicUsize,
}

#[async_trait]
impl OcrBackend for FixedOcr {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn recognize(&self, _png_bytes: &[u8]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SENTENCE.to_string())
    }
}

fn settings_with_key() -> Settings {
    Settings {
        langextract_api_key: "test-key".to_string(),
        max_file_size_mb: 1,
        ..Default::default()
    }
}

fn app_with(settings: Settings, library: Arc<EchoLibrary>) -> Router {
    app_with_ocr(settings, library, Arc::new(FixedOcr::default()))
}

fn app_with_ocr(settings: Settings, library: Arc<EchoLibrary>, ocr: Arc<FixedOcr>) -> Router {
    let settings = Arc::new(settings);
    let service = ExtractionService::new(Arc::clone(&settings), Arc::new(ExemplarTable::standard()), library);
    create_router_with_state(ApiState::new(settings, Arc::new(service), ocr))
}

fn app() -> Router {
    app_with(settings_with_key(), Arc::new(EchoLibrary::default()))
}

const BOUNDARY: &str = "----doclexboundary";

/// Multipart body with text fields and an optional file part.
fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((filename, content)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

fn form_request(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let encoded: Vec<String> = fields
        .iter()
        .map(|(name, value)| format!("{}={}", name, urlencode(value)))
        .collect();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(encoded.join("&")))
        .unwrap()
}

fn urlencode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}

async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn text_fields(text: &str) -> Vec<(&str, &str)> {
    vec![
        ("text", text),
        ("prompt_description", "Extract people, places and dates"),
        ("extraction_classes", "person, location,date"),
    ]
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health: HealthResponse = json_body(response).await;
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, "1.0.0");
    assert!(health.extraction_library_available);
    assert!(health.api_key_configured);
}

#[tokio::test]
async fn test_health_degraded_without_key() {
    let response = app_with(Settings::default(), Arc::new(EchoLibrary::default()))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let health: HealthResponse = json_body(response).await;
    assert_eq!(health.status, "degraded");
    assert!(!health.api_key_configured);
}

#[tokio::test]
async fn test_models_endpoint() {
    let response = app()
        .oneshot(Request::builder().uri("/models").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let models: ModelsResponse = json_body(response).await;
    assert!(models.gemini_models.contains(&"gemini-2.5-flash".to_string()));
    assert!(models.openai_models.contains(&"gpt-4o".to_string()));
    assert_eq!(models.default_model, "gemini-2.5-flash");
    assert!(models.note.contains("OPENAI_API_KEY"));
}

#[tokio::test]
async fn test_root_page() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("LangExtract Document Processing API"));
    assert!(html.contains("TXT, PDF, DOCX, XLSX, PNG, JPG, JPEG"));
}

#[tokio::test]
async fn test_extract_text_form_end_to_end() {
    let response = app()
        .oneshot(form_request("/extract-text", &text_fields(SENTENCE)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result: ExtractionResponse = json_body(response).await;
    assert!(result.success);
    assert_eq!(result.message, "Extraction completed successfully");
    assert_eq!(result.entity_count, 3);
    assert_eq!(result.file_type, "text");
    assert_eq!(result.filename, "text_input");
    assert_eq!(result.text_length, SENTENCE.chars().count());
    assert_eq!(result.model_used, "gemini-2.5-flash");

    let classes: Vec<&str> = result.entities.iter().map(|e| e.extraction_class.as_str()).collect();
    assert_eq!(classes, vec!["person", "location", "date"]);
    assert_eq!((result.entities[1].start_char, result.entities[1].end_char), (19, 27));
    assert!(result.visualization_html.is_some());
}

#[tokio::test]
async fn test_extract_text_multipart() {
    let body = multipart_body(&text_fields(SENTENCE), None);
    let response = app().oneshot(multipart_request("/extract-text", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result: ExtractionResponse = json_body(response).await;
    assert_eq!(result.entity_count, 3);
}

#[tokio::test]
async fn test_extract_text_too_long() {
    let text = "a".repeat(1024 * 1024 + 1);
    let body = multipart_body(&text_fields(&text), None);
    let response = app().oneshot(multipart_request("/extract-text", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorResponse = json_body(response).await;
    assert!(!error.success);
    assert_eq!(error.message, "Text length exceeds 1MB limit");
    assert_eq!(error.status_code, 400);
}

#[tokio::test]
async fn test_extract_text_without_classes() {
    let fields = [
        ("text", SENTENCE),
        ("prompt_description", "Extract"),
        ("extraction_classes", " , "),
    ];
    let response = app().oneshot(form_request("/extract-text", &fields)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_api_key_is_server_error_and_engine_not_called() {
    let library = Arc::new(EchoLibrary::default());
    let app = app_with(Settings::default(), library.clone());

    let response = app
        .oneshot(form_request("/extract-text", &text_fields(SENTENCE)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let error: ErrorResponse = json_body(response).await;
    assert_eq!(error.error_type, "ConfigurationError");
    assert!(error.message.contains("No API key configured"));
    assert_eq!(library.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_visualization_failure_still_succeeds() {
    let library = Arc::new(EchoLibrary {
        fail_visualize: true,
        ..Default::default()
    });
    let response = app_with(settings_with_key(), library)
        .oneshot(form_request("/extract-text", &text_fields(SENTENCE)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result: ExtractionResponse = json_body(response).await;
    assert!(result.success);
    assert_eq!(result.entity_count, 3);
    assert!(result.visualization_html.is_none());
}

#[tokio::test]
async fn test_extract_text_file_upload() {
    let body = multipart_body(
        &[
            ("prompt_description", "Extract people"),
            ("extraction_classes", "person"),
            ("model_id", "gemini-2.5-pro"),
            ("max_workers", "2"),
        ],
        Some(("notes.txt", SENTENCE.as_bytes())),
    );
    let response = app().oneshot(multipart_request("/extract", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result: ExtractionResponse = json_body(response).await;
    assert_eq!(result.filename, "notes.txt");
    assert_eq!(result.file_type, "text");
    assert_eq!(result.entity_count, 1);
    assert_eq!(result.model_used, "gemini-2.5-pro");
}

#[cfg(feature = "ocr")]
#[tokio::test]
async fn test_extract_image_upload_uses_ocr() {
    let mut png = std::io::Cursor::new(Vec::new());
    image::DynamicImage::new_rgb8(8, 8)
        .write_to(&mut png, image::ImageFormat::Png)
        .unwrap();

    let body = multipart_body(
        &[("prompt_description", "Extract dates"), ("extraction_classes", "date")],
        Some(("scan.png", png.get_ref().as_slice())),
    );
    let response = app().oneshot(multipart_request("/extract", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result: ExtractionResponse = json_body(response).await;
    assert_eq!(result.file_type, "image");
    assert_eq!(result.text_length, SENTENCE.chars().count());
}

#[tokio::test]
async fn test_extract_unsupported_type() {
    let body = multipart_body(
        &[("prompt_description", "x"), ("extraction_classes", "person")],
        Some(("archive.zip", &b"PK\x03\x04"[..])),
    );
    let response = app().oneshot(multipart_request("/extract", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorResponse = json_body(response).await;
    assert_eq!(error.message, "Unsupported file type: .zip");
}

#[tokio::test]
async fn test_extract_oversized_file() {
    let content = vec![b'a'; 1024 * 1024 + 10];
    let body = multipart_body(
        &[("prompt_description", "x"), ("extraction_classes", "person")],
        Some(("big.txt", content.as_slice())),
    );
    let response = app().oneshot(multipart_request("/extract", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorResponse = json_body(response).await;
    assert_eq!(error.message, "File size exceeds 1MB limit");
}

fn three_mib_upload() -> Vec<u8> {
    let content = vec![b'a'; 3 * 1024 * 1024];
    multipart_body(
        &[("prompt_description", "x"), ("extraction_classes", "person")],
        Some(("big.txt", content.as_slice())),
    )
}

#[tokio::test]
async fn test_upload_over_body_limit_streamed() {
    let response = app()
        .oneshot(multipart_request("/extract", three_mib_upload()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorResponse = json_body(response).await;
    assert_eq!(error.error_type, "ValidationError");
    assert_eq!(error.message, "File size exceeds 1MB limit");
}

#[tokio::test]
async fn test_upload_over_body_limit_by_content_length() {
    let body = three_mib_upload();
    let mut request = multipart_request("/extract", body.clone());
    request
        .headers_mut()
        .insert("content-length", body.len().to_string().parse().unwrap());

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorResponse = json_body(response).await;
    assert_eq!(error.message, "File size exceeds 1MB limit");
}

#[tokio::test]
async fn test_text_form_over_body_limit() {
    let text = "a".repeat(3 * 1024 * 1024);
    let response = app()
        .oneshot(form_request("/extract-text", &text_fields(&text)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorResponse = json_body(response).await;
    assert_eq!(error.message, "Text length exceeds 1MB limit");
}

#[tokio::test]
async fn test_form_fields_checked_before_ocr() {
    let ocr = Arc::new(FixedOcr::default());
    let app = app_with_ocr(settings_with_key(), Arc::new(EchoLibrary::default()), ocr.clone());

    let body = multipart_body(
        &[("prompt_description", "Extract dates"), ("extraction_classes", " , ")],
        Some(("scan.png", &b"\x89PNG\r\n\x1a\n"[..])),
    );
    let response = app.oneshot(multipart_request("/extract", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorResponse = json_body(response).await;
    assert_eq!(error.message, "At least one extraction class is required");
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_extract_type_not_allowed() {
    let settings = Settings {
        allowed_file_types: "txt".to_string(),
        ..settings_with_key()
    };
    let body = multipart_body(
        &[("prompt_description", "x"), ("extraction_classes", "person")],
        Some(("report.pdf", &b"%PDF-1.4"[..])),
    );
    let response = app_with(settings, Arc::new(EchoLibrary::default()))
        .oneshot(multipart_request("/extract", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorResponse = json_body(response).await;
    assert_eq!(error.message, "File type 'pdf' not allowed. Allowed types: txt");
}

#[tokio::test]
async fn test_extract_blank_document_is_bad_request() {
    let body = multipart_body(
        &[("prompt_description", "x"), ("extraction_classes", "person")],
        Some(("blank.txt", &b"   \n"[..])),
    );
    let response = app().oneshot(multipart_request("/extract", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_extract_without_file() {
    let body = multipart_body(&[("prompt_description", "x"), ("extraction_classes", "person")], None);
    let response = app().oneshot(multipart_request("/extract", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorResponse = json_body(response).await;
    assert_eq!(error.message, "Missing required field: file");
}
