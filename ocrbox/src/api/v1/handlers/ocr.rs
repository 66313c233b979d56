//! v1 OCR handlers.
//!
//! Single-image and batch recognition, multipart upload, and the caller's
//! result history. All responses are wrapped in [`ApiResponse`] envelopes;
//! every route here sits behind the auth middleware.

use axum::extract::{Multipart, Path, State};
use axum_extra::extract::Query;

use crate::api::extractors::{AppJson, AuthUser};
use crate::api::v1::dto::{
    BatchResponse, DeleteResultResponse, HistoryQuery, OcrResultResponse, ProcessBatchRequest,
    ProcessImageRequest, ProcessImageResponse,
};
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode, ResponseMeta};
use crate::api::AppState;
use crate::models::{BatchImage, OcrRequest};
use crate::ocr::resolve_mime_type;
use crate::services::history_limit;

const OCTET_STREAM: &str = "application/octet-stream";

/// `POST /api/v1/ocr:process`
///
/// Validates, recognizes, uploads and persists one base64 encoded image.
#[utoipa::path(
    post,
    path = "/api/v1/ocr:process",
    tag = "ocr",
    operation_id = "ocr.process",
    request_body = ProcessImageRequest,
    responses(
        (status = 200, description = "Image processed", body = ProcessImageResponse),
        (status = 400, description = "Invalid image or request", body = ApiError),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
        (status = 422, description = "Recognition failed", body = ApiError),
        (status = 503, description = "Engine, storage or result store unavailable", body = ApiError),
    )
)]
pub async fn process_image(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<ProcessImageRequest>,
) -> ApiResponse<ProcessImageResponse> {
    let request = match req.into_ocr_request(state.ocr.engines()) {
        Ok(request) => request,
        Err(e) => return e.into(),
    };

    match state.ocr.process_image(&user.id, request).await {
        Ok(processed) => ApiResponse::success(processed.into()),
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/ocr:batch`
///
/// Processes every image in order. A failing image lands in `errors` and
/// does not fail the request.
#[utoipa::path(
    post,
    path = "/api/v1/ocr:batch",
    tag = "ocr",
    operation_id = "ocr.batch",
    request_body = ProcessBatchRequest,
    responses(
        (status = 200, description = "Batch processed", body = BatchResponse),
        (status = 400, description = "Malformed request or batch too large", body = ApiError),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
    )
)]
pub async fn process_batch(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<ProcessBatchRequest>,
) -> ApiResponse<BatchResponse> {
    let items: Vec<BatchImage> = req.images.into_iter().map(Into::into).collect();

    match state.ocr.process_batch(&user.id, items).await {
        Ok(outcome) => ApiResponse::success(outcome.into()),
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/ocr:upload`
///
/// Multipart variant of `ocr:process`: a `file` part plus an optional
/// `language` field.
#[utoipa::path(
    post,
    path = "/api/v1/ocr:upload",
    tag = "ocr",
    operation_id = "ocr.upload",
    request_body(content_type = "multipart/form-data", content = String, description = "Image file with optional language field"),
    responses(
        (status = 200, description = "Image processed", body = ProcessImageResponse),
        (status = 400, description = "Invalid image or request", body = ApiError),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
        (status = 422, description = "Recognition failed", body = ApiError),
        (status = 503, description = "Engine, storage or result store unavailable", body = ApiError),
    )
)]
pub async fn upload_image(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> ApiResponse<ProcessImageResponse> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut file_content_type: Option<String> = None;
    let mut language: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return ApiResponse::error(
                    ErrorCode::InvalidRequest,
                    format!("Invalid multipart body: {e}"),
                );
            }
        };
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(str::to_string);
                file_content_type = field
                    .content_type()
                    .filter(|ct| *ct != OCTET_STREAM)
                    .map(str::to_string);

                match field.bytes().await {
                    Ok(bytes) => file_bytes = Some(bytes.to_vec()),
                    Err(e) => {
                        return ApiResponse::error(
                            ErrorCode::InvalidRequest,
                            format!("Failed to read file: {e}"),
                        );
                    }
                }
            }
            "language" => match field.text().await {
                Ok(text) => language = Some(text),
                Err(e) => {
                    return ApiResponse::error(
                        ErrorCode::InvalidRequest,
                        format!("Invalid language field: {e}"),
                    );
                }
            },
            _ => {}
        }
    }

    let Some(bytes) = file_bytes else {
        return ApiResponse::error(ErrorCode::InvalidRequest, "Missing required 'file' field");
    };
    if bytes.is_empty() {
        return ApiResponse::error(ErrorCode::InvalidRequest, "Image data is empty");
    }

    let file_name = file_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "upload".to_string());
    let language = match state.ocr.engines().resolve_language(language.as_deref()) {
        Ok(language) => language,
        Err(e) => return e.into(),
    };
    let mime_type = upload_mime_type(file_content_type.as_deref(), &file_name, &bytes);

    let request = OcrRequest::new(bytes, file_name, mime_type, language);
    match state.ocr.process_image(&user.id, request).await {
        Ok(processed) => ApiResponse::success(processed.into()),
        Err(e) => e.into(),
    }
}

/// Part content type, then magic bytes, then the file extension.
fn upload_mime_type(part_content_type: Option<&str>, file_name: &str, bytes: &[u8]) -> String {
    if part_content_type.is_none() && infer::get(bytes).is_none() {
        if let Some(guessed) = mime_guess::from_path(file_name).first_raw() {
            return guessed.to_string();
        }
    }
    resolve_mime_type(part_content_type, None, bytes)
}

/// `GET /api/v1/ocr/results`
///
/// The caller's results, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/ocr/results",
    tag = "ocr",
    operation_id = "ocr.results.list",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Result history", body = Vec<OcrResultResponse>),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
    )
)]
pub async fn list_results(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> ApiResponse<Vec<OcrResultResponse>> {
    let limit = history_limit(query.limit);

    match state.ocr.history(&user.id, Some(limit)).await {
        Ok(records) => {
            let total = records.len() as u64;
            let items = records.into_iter().map(Into::into).collect();
            ApiResponse::success_with_meta(
                items,
                ResponseMeta {
                    total: Some(total),
                    limit: Some(limit),
                },
            )
        }
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/ocr/results/{resultId}`
#[utoipa::path(
    get,
    path = "/api/v1/ocr/results/{resultId}",
    tag = "ocr",
    operation_id = "ocr.results.get",
    params(("resultId" = String, Path, description = "Result ID")),
    responses(
        (status = 200, description = "Result found", body = OcrResultResponse),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
        (status = 404, description = "Result not found", body = ApiError),
    )
)]
pub async fn get_result(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResponse<OcrResultResponse> {
    match state.ocr.get_result(&user.id, &id).await {
        Ok(record) => ApiResponse::success(record.into()),
        Err(e) => e.into(),
    }
}

/// `DELETE /api/v1/ocr/results/{resultId}`
///
/// Owner-scoped. Unknown ids and ids owned by someone else both answer
/// `{ "success": false }`.
#[utoipa::path(
    delete,
    path = "/api/v1/ocr/results/{resultId}",
    tag = "ocr",
    operation_id = "ocr.results.delete",
    params(("resultId" = String, Path, description = "Result ID")),
    responses(
        (status = 200, description = "Deletion outcome", body = DeleteResultResponse),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
    )
)]
pub async fn delete_result(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResponse<DeleteResultResponse> {
    match state.ocr.delete_result(&user.id, &id).await {
        Ok(success) => ApiResponse::success(DeleteResultResponse { success }),
        Err(e) => e.into(),
    }
}
