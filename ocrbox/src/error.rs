use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::api::v1::response::ApiResponse;

#[derive(Error, Debug)]
pub enum OcrboxError {
    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("{0}")]
    Ocr(String),

    #[error("{0}")]
    OcrInit(String),

    #[error("OCR unavailable: {0}")]
    OcrUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl IntoResponse for OcrboxError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::from(self).into_response()
    }
}

pub type Result<T> = std::result::Result<T, OcrboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ocr_errors_display_message_verbatim() {
        let err = OcrboxError::OcrInit("Failed to initialize OCR worker: no tessdata".into());
        assert_eq!(
            err.to_string(),
            "Failed to initialize OCR worker: no tessdata"
        );
    }

    #[test]
    fn test_unauthorized_maps_to_401_without_detail() {
        let response = OcrboxError::Unauthorized("no identity".into()).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_ocr_unavailable_maps_to_service_unavailable() {
        let response = OcrboxError::OcrUnavailable("engine cap".into()).into_response();
        assert_eq!(
            response.status(),
            axum::http::StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_validation_error_maps_to_bad_request() {
        let response = OcrboxError::Validation("bad".into()).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_persistence_error_maps_to_service_unavailable() {
        let response = OcrboxError::Persistence("store down".into()).into_response();
        assert_eq!(
            response.status(),
            axum::http::StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
