//! # V1 API Response Envelope & Error Contract
//!
//! Every v1 endpoint returns an [`ApiResponse<T>`] envelope with three
//! optional top-level fields:
//!
//! ```json
//! {
//!   "data": { ... },                 // present on success, absent on error
//!   "meta": { "total": 42 },         // optional list metadata
//!   "error": { "code": "not_found", "message": "..." }  // present on error only
//! }
//! ```
//!
//! ## ID Formats
//!
//! - **resultId**: nanoid, 21 characters (e.g. `"V1StGXR8_Z5jdHi6B-myT"`)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::OcrboxError;

/// Machine-readable error code included in every error response.
///
/// Serialized as a snake_case string on the wire (e.g. `"invalid_request"`).
/// Each variant maps to a fixed HTTP status code via [`ErrorCode::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed request or failed validation (size, MIME type, encoding).
    /// HTTP 400.
    InvalidRequest,
    /// Missing or invalid API key. HTTP 401.
    Unauthorized,
    /// The requested result does not exist or belongs to another user. HTTP 404.
    NotFound,
    /// The engine ran but could not recognize the image. HTTP 422.
    ProcessingFailed,
    /// An unexpected server-side error occurred. Internal details are never
    /// leaked to the client. HTTP 500.
    InternalError,
    /// OCR engine, object storage or result store is unavailable; retrying
    /// later may succeed. HTTP 503.
    ServiceUnavailable,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ProcessingFailed => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::NotFound => write!(f, "not_found"),
            Self::ProcessingFailed => write!(f, "processing_failed"),
            Self::InternalError => write!(f, "internal_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
        }
    }
}

/// Structured error payload within the API envelope.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    /// Machine-readable error classification.
    pub code: ErrorCode,
    /// Human-readable description safe to display to end users.
    pub message: String,
}

/// Metadata included in list responses.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    /// Number of items in `data`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Limit that was applied after clamping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Canonical v1 API response envelope.
///
/// On success, `data` is present and `error` is absent. On error, `error` is
/// present and `data` is absent. The HTTP status comes from the error code,
/// or from the constructor on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    /// HTTP status to use in the response. Not serialized on the wire.
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success response with data (HTTP 200).
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            meta: None,
            error: None,
            status: StatusCode::OK,
        }
    }

    /// Success response with data and list metadata (HTTP 200).
    pub fn success_with_meta(data: T, meta: ResponseMeta) -> Self {
        Self {
            data: Some(data),
            meta: Some(meta),
            error: None,
            status: StatusCode::OK,
        }
    }

    /// Resource created response (HTTP 201).
    pub fn created(data: T) -> Self {
        Self {
            data: Some(data),
            meta: None,
            error: None,
            status: StatusCode::CREATED,
        }
    }

    /// Error response. HTTP status is derived from the [`ErrorCode`].
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        let status = code.status();
        Self {
            data: None,
            meta: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
            status,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        match serde_json::to_value(&self) {
            Ok(body) => (status, Json(body)).into_response(),
            Err(_) => {
                let body = serde_json::json!({
                    "error": {
                        "code": "internal_error",
                        "message": "An internal error occurred"
                    }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl<T: Serialize> From<OcrboxError> for ApiResponse<T> {
    /// Convert an [`OcrboxError`] into a v1 [`ApiResponse`].
    ///
    /// Pipeline failures keep their message since it tells the caller which
    /// stage failed. For `internal_error` a generic message is returned and
    /// the real error is logged via `tracing::error!`.
    fn from(err: OcrboxError) -> Self {
        match err {
            OcrboxError::NotFound(msg) => ApiResponse::error(ErrorCode::NotFound, msg),

            OcrboxError::Validation(msg) => ApiResponse::error(ErrorCode::InvalidRequest, msg),

            ref e @ OcrboxError::Base64(_) => {
                ApiResponse::error(ErrorCode::InvalidRequest, e.to_string())
            }

            OcrboxError::Json(e) => {
                ApiResponse::error(ErrorCode::InvalidRequest, format!("Invalid JSON: {e}"))
            }

            OcrboxError::Unauthorized(_) => {
                ApiResponse::error(ErrorCode::Unauthorized, "Authentication required")
            }

            OcrboxError::Ocr(msg) => ApiResponse::error(ErrorCode::ProcessingFailed, msg),

            ref e @ (OcrboxError::OcrInit(_)
            | OcrboxError::OcrUnavailable(_)
            | OcrboxError::Storage(_)
            | OcrboxError::Persistence(_)) => {
                tracing::warn!(error = %e, "Dependency unavailable");
                ApiResponse::error(ErrorCode::ServiceUnavailable, e.to_string())
            }

            ref internal @ (OcrboxError::Database(_)
            | OcrboxError::Processing(_)
            | OcrboxError::Http(_)
            | OcrboxError::Io(_)
            | OcrboxError::Internal(_)) => {
                tracing::error!(error = %internal, "Internal error mapped to v1 response");
                ApiResponse::error(ErrorCode::InternalError, "An internal error occurred")
            }
        }
    }
}
