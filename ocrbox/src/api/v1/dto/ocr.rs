//! OCR request/response DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{
    BatchImage, BatchItemError, BatchItemSuccess, BatchOutcome, OcrRequest, OcrResultRecord,
    ProcessedImage,
};
use crate::ocr::{decode_image_data, resolve_mime_type, EngineRegistry};

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/ocr:process`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessImageRequest {
    /// Raw base64 or a `data:<mime>;base64,` URL.
    pub image_data_base64: String,
    /// Original file name, used for the stored object key.
    pub file_name: String,
    /// Declared MIME type. Falls back to the data URL prefix, then to
    /// content sniffing.
    pub mime_type: Option<String>,
    /// Tesseract language code. Defaults to the server's default language.
    pub language: Option<String>,
}

impl ProcessImageRequest {
    /// Decode the payload and resolve language and MIME type.
    pub fn into_ocr_request(self, engines: &EngineRegistry) -> Result<OcrRequest> {
        let decoded = decode_image_data(&self.image_data_base64)?;
        let language = engines.resolve_language(self.language.as_deref())?;
        let mime_type = resolve_mime_type(
            self.mime_type.as_deref(),
            decoded.declared_mime_type.as_deref(),
            &decoded.bytes,
        );
        Ok(OcrRequest::new(
            decoded.bytes,
            self.file_name,
            mime_type,
            language,
        ))
    }
}

/// One image of a `POST /v1/ocr:batch` request.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchImageItem {
    /// Raw base64 or a `data:<mime>;base64,` URL.
    pub image_data: String,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub language: Option<String>,
}

impl From<BatchImageItem> for BatchImage {
    fn from(item: BatchImageItem) -> Self {
        BatchImage {
            file_name: item.file_name,
            mime_type: item.mime_type,
            language: item.language,
            image_data: item.image_data,
        }
    }
}

/// Request body for `POST /v1/ocr:batch`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessBatchRequest {
    pub images: Vec<BatchImageItem>,
}

/// Query parameters for `GET /v1/ocr/results`.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Maximum number of results, newest first. Default 50, clamped to 1..=200.
    pub limit: Option<u32>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

/// Response for a single processed image.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessImageResponse {
    pub text: String,
    /// Integer percentage, 0-100.
    pub confidence: u32,
    pub language: String,
    pub processing_time_ms: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub image_url: String,
    pub result_id: String,
}

impl From<ProcessedImage> for ProcessImageResponse {
    fn from(processed: ProcessedImage) -> Self {
        let outcome = processed.outcome;
        Self {
            text: outcome.text,
            confidence: outcome.confidence,
            language: outcome.language,
            processing_time_ms: outcome.processing_time_ms,
            success: outcome.success,
            error: outcome.error,
            image_url: processed.image_url,
            result_id: processed.result_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchResultItem {
    pub file_name: String,
    pub text: String,
    pub confidence: u32,
    pub processing_time_ms: u64,
    pub image_url: String,
    pub result_id: String,
    pub success: bool,
}

impl From<BatchItemSuccess> for BatchResultItem {
    fn from(item: BatchItemSuccess) -> Self {
        Self {
            file_name: item.file_name,
            text: item.text,
            confidence: item.confidence,
            processing_time_ms: item.processing_time_ms,
            image_url: item.image_url,
            result_id: item.result_id,
            success: item.success,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchErrorItem {
    pub file_name: String,
    pub error: String,
}

impl From<BatchItemError> for BatchErrorItem {
    fn from(item: BatchItemError) -> Self {
        Self {
            file_name: item.file_name,
            error: item.error,
        }
    }
}

/// Response for `POST /v1/ocr:batch`.
///
/// `totalProcessed + totalFailed` always equals the number of submitted images.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub results: Vec<BatchResultItem>,
    pub errors: Vec<BatchErrorItem>,
    pub total_processed: usize,
    pub total_failed: usize,
}

impl From<BatchOutcome> for BatchResponse {
    fn from(outcome: BatchOutcome) -> Self {
        Self {
            results: outcome.results.into_iter().map(Into::into).collect(),
            errors: outcome.errors.into_iter().map(Into::into).collect(),
            total_processed: outcome.total_processed,
            total_failed: outcome.total_failed,
        }
    }
}

/// A persisted OCR result.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OcrResultResponse {
    pub id: String,
    pub image_file_name: String,
    pub image_url: String,
    pub extracted_text: String,
    pub confidence: u32,
    pub language: String,
    pub processing_time_ms: u64,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl From<OcrResultRecord> for OcrResultResponse {
    fn from(record: OcrResultRecord) -> Self {
        Self {
            id: record.id,
            image_file_name: record.image_file_name,
            image_url: record.image_url,
            extracted_text: record.extracted_text,
            confidence: record.confidence,
            language: record.language,
            processing_time_ms: record.processing_time_ms,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Response for `DELETE /v1/ocr/results/{resultId}`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResultResponse {
    /// `false` when no result with that id belongs to the caller.
    pub success: bool,
}
