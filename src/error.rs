//! Error types for the monitoring backend.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Result type alias for monitoring operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for monitoring backend operations
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed request input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed metrics exposition text
    #[error("Parse error: {0}")]
    Parse(String),

    /// External row store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Map the error to an HTTP status code.
    ///
    /// Malformed exposition text is a client problem, so `Parse` maps to
    /// 400 alongside `Validation`. Everything else is a server-side failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::Parse(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = Error::Validation("Missing required fields".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_maps_to_bad_request() {
        let err = Error::Parse("bad line".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_storage_maps_to_internal_error() {
        let err = Error::Storage("connection reset".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
