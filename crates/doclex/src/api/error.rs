//! Mapping of [`DoclexError`] to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::DoclexError;

use super::types::ErrorResponse;

/// Message sent in place of internal error details.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// An error paired with the status it is reported under.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: DoclexError,
}

impl ApiError {
    /// 400 Bad Request.
    pub fn validation(error: DoclexError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }

    /// 500 Internal Server Error.
    pub fn internal(error: DoclexError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error,
        }
    }

    /// Shorthand for a 400 with a validation message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::validation(DoclexError::validation(message))
    }

    fn error_type(&self) -> &'static str {
        match &self.error {
            DoclexError::Validation { .. } => "ValidationError",
            DoclexError::Parsing { .. } => "ParsingError",
            DoclexError::Ocr { .. } => "OCRError",
            DoclexError::UnsupportedFormat(_) => "UnsupportedFormatError",
            DoclexError::Configuration { .. } => "ConfigurationError",
            DoclexError::LangExtract { .. } => "LangExtractError",
            DoclexError::Io(_)
            | DoclexError::Serialization { .. }
            | DoclexError::Other(_) => "InternalError",
        }
    }

    /// Whether the reason may be shown to the client.
    fn is_reportable(&self) -> bool {
        matches!(
            self.error,
            DoclexError::Validation { .. }
                | DoclexError::Parsing { .. }
                | DoclexError::Ocr { .. }
                | DoclexError::UnsupportedFormat(_)
                | DoclexError::Configuration { .. }
                | DoclexError::LangExtract { .. }
        )
    }
}

impl From<DoclexError> for ApiError {
    fn from(error: DoclexError) -> Self {
        match &error {
            DoclexError::Validation { .. } => Self::validation(error),
            _ if error.is_extraction_failure() => Self::validation(error),
            _ => Self::internal(error),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = if self.is_reportable() {
            self.error.reason()
        } else {
            tracing::error!("Unhandled error while processing request: {}", self.error);
            INTERNAL_ERROR_MESSAGE.to_string()
        };

        if self.status.is_client_error() {
            tracing::info!("Rejected request ({}): {}", self.status.as_u16(), message);
        }

        let body = ErrorResponse {
            success: false,
            error_type: self.error_type().to_string(),
            message,
            status_code: self.status.as_u16(),
        };

        (self.status, Json(body)).into_response()
    }
}
