use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ocrbox API",
        version = "1.0.0",
        description = "Self-hostable OCR service. Extract text from images and keep a per-user history.",
    ),
    paths(
        handlers::health::health_check,
        handlers::ocr::process_image,
        handlers::ocr::process_batch,
        handlers::ocr::upload_image,
        handlers::ocr::list_results,
        handlers::ocr::get_result,
        handlers::ocr::delete_result,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        response::ResponseMeta,
        // OCR
        dto::ProcessImageRequest,
        dto::ProcessImageResponse,
        dto::BatchImageItem,
        dto::ProcessBatchRequest,
        dto::BatchResponse,
        dto::BatchResultItem,
        dto::BatchErrorItem,
        dto::OcrResultResponse,
        dto::DeleteResultResponse,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::DatabaseStatus,
        handlers::health::OcrStatus,
        handlers::health::StorageStatus,
        crate::ocr::EngineStatus,
        crate::ocr::EngineState,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "ocr", description = "Text recognition and result history (auth required)"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(utoipa::openapi::security::Http::new(
                utoipa::openapi::security::HttpAuthScheme::Bearer,
            )),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
