use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;
use super::middleware::v1_auth_middleware;

pub fn v1_router(state: AppState) -> Router<AppState> {
    let results = Router::new()
        .route("/", get(handlers::ocr::list_results))
        .route(
            "/{resultId}",
            get(handlers::ocr::get_result).delete(handlers::ocr::delete_result),
        );

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router());

    let protected_routes = Router::new()
        .route("/ocr:process", post(handlers::ocr::process_image))
        .route("/ocr:batch", post(handlers::ocr::process_batch))
        .route("/ocr:upload", post(handlers::ocr::upload_image))
        .nest("/ocr/results", results)
        .route_layer(middleware::from_fn_with_state(state, v1_auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
