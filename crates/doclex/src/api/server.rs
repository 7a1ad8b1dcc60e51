//! API server setup and configuration.

use std::net::{IpAddr, SocketAddr};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::core::config::Settings;
use crate::{DoclexError, Result};

use super::{
    handlers::{extract_handler, extract_text_handler, health_handler, models_handler, root_handler},
    types::ApiState,
};

/// Room for the non-file form fields on top of the upload ceiling.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Request body limit for the given settings.
///
/// Handlers reject bodies over this limit with the same size reason that
/// upload validation reports.
pub fn body_limit_bytes(settings: &Settings) -> usize {
    settings.max_file_size_bytes().saturating_add(FORM_OVERHEAD_BYTES)
}

fn cors_layer(settings: &Settings) -> CorsLayer {
    if settings.cors_origins.is_empty() {
        tracing::warn!(
            "CORS configured to allow all origins (default). For production, set DOCLEX_CORS_ORIGINS \
             to a comma-separated list of allowed origins (e.g. 'https://app.example.com')"
        );
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = settings
        .cors_origins
        .iter()
        .filter_map(|origin| origin.trim().parse::<HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("DOCLEX_CORS_ORIGINS set but no origin is valid - falling back to permissive CORS");
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        tracing::info!("CORS configured with {} explicit allowed origin(s)", origins.len());
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Create the API router with production wiring.
///
/// This is public to allow embedding the router in another application.
pub fn create_router(settings: Settings) -> Result<Router> {
    Ok(create_router_with_state(ApiState::from_settings(settings)?))
}

/// Create the API router around prepared state.
///
/// Tests use this to inject their own extraction engine and OCR backend.
pub fn create_router_with_state(state: ApiState) -> Router {
    let limit = body_limit_bytes(&state.settings);
    let cors = cors_layer(&state.settings);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/models", get(models_handler))
        .route("/extract", post(extract_handler))
        .route("/extract-text", post(extract_text_handler))
        .layer(DefaultBodyLimit::max(limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the API server on `host:port` with discovered settings.
///
/// Settings come from `doclex.toml` (current or parent directories) with
/// environment overrides applied.
pub async fn serve(host: impl AsRef<str>, port: u16) -> Result<()> {
    let settings = Settings::load()?;
    serve_with_settings(host, port, settings).await
}

/// Start the API server with explicit settings.
pub async fn serve_with_settings(host: impl AsRef<str>, port: u16, settings: Settings) -> Result<()> {
    let ip: IpAddr = host
        .as_ref()
        .parse()
        .map_err(|e| DoclexError::validation(format!("Invalid host address: {}", e)))?;

    let addr = SocketAddr::new(ip, port);

    if !settings.has_api_key() {
        tracing::warn!("No API key configured; extraction requests will fail until LANGEXTRACT_API_KEY or OPENAI_API_KEY is set");
    }
    tracing::info!(
        "Upload size limit: {} MB, default model: {}",
        settings.max_file_size_mb,
        settings.default_model
    );

    let app = create_router(settings)?;

    tracing::info!("Starting Doclex API server on http://{}:{}", ip, port);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(DoclexError::Io)?;

    axum::serve(listener, app)
        .await
        .map_err(|e| DoclexError::Other(e.to_string()))?;

    Ok(())
}

/// Start the API server on the configured host and port.
pub async fn serve_default() -> Result<()> {
    let settings = Settings::load()?;
    let host = settings.host.clone();
    let port = settings.port;
    serve_with_settings(host, port, settings).await
}
