use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::v1;
use super::AppState;
use crate::config::StorageBackendKind;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let v1 = v1::router::v1_router(state.clone());

    let mut router = Router::new().nest("/api/v1", v1);

    // Local uploads are served read-only from the same origin as the API.
    if state.config.storage.backend == StorageBackendKind::Local {
        router = router.nest_service("/files", ServeDir::new(&state.config.storage.local_dir));
    }

    let max_body_bytes = state.config.server.max_body_bytes;

    router
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
