use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::v1::response::ApiResponse;
use crate::ocr::EngineStatus;

/// Health data returned inside the v1 envelope.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub database: DatabaseStatus,
    pub ocr: OcrStatus,
    pub storage: StorageStatus,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DatabaseStatus {
    pub status: String,
    pub backend: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OcrStatus {
    pub backend: String,
    pub default_language: String,
    /// Engines created so far. Empty until the first recognition.
    pub engines: Vec<EngineStatus>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct StorageStatus {
    pub backend: String,
}

/// `GET /api/v1/health`
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthData> {
    let database = DatabaseStatus {
        status: match state.db.sync().await {
            Ok(()) => "ok".to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                "error".to_string()
            }
        },
        backend: state.db.name().to_string(),
    };

    let engines = state.ocr.engines();
    let ocr = OcrStatus {
        backend: engines.backend_name().to_string(),
        default_language: engines.default_language().to_string(),
        engines: engines.statuses().await,
    };

    ApiResponse::success(HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        ocr,
        storage: StorageStatus {
            backend: state.ocr.storage_name().to_string(),
        },
    })
}
