//! # V1 API Key Authentication Middleware
//!
//! Protects all v1 API routes (except explicitly public ones like `/health`)
//! with Bearer token authentication. Validates the token against the
//! `OCRBOX_API_KEYS` configuration and attaches the matching user identity to
//! the request, so handlers scope every read and write to that user.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::extractors::AuthUser;
use crate::api::state::AppState;

use super::response::{ApiResponse, ErrorCode};

/// Axum middleware that enforces Bearer token authentication for v1 API routes.
///
/// # Behavior
///
/// - If `OCRBOX_API_KEYS` is empty/unset → returns 401 with JSON error envelope.
///   The server still starts, but protected routes are locked down.
/// - If the `Authorization: Bearer <token>` header is missing or malformed → 401.
/// - If the token is not in the configured key list → 401.
/// - If the token is valid → inserts [`AuthUser`] into the request extensions
///   and passes the request through to the next handler.
///
/// Rejection happens before the body is read, so no image is decoded or
/// recognized for an unauthenticated caller.
pub async fn v1_auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let api_keys = &state.config.server.api_keys;
    if api_keys.is_empty() {
        return ApiResponse::<()>::error(
            ErrorCode::Unauthorized,
            "API keys not configured. Set OCRBOX_API_KEYS to enable access.",
        )
        .into_response();
    }

    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => token.trim(),
            _ => {
                return ApiResponse::<()>::error(
                    ErrorCode::Unauthorized,
                    "Invalid authorization header format. Expected: Bearer <token>",
                )
                .into_response();
            }
        },
        None => {
            return ApiResponse::<()>::error(
                ErrorCode::Unauthorized,
                "Missing authorization header",
            )
            .into_response();
        }
    };

    let Some(api_key) = api_keys.iter().find(|k| k.key == token) else {
        return ApiResponse::<()>::error(ErrorCode::Unauthorized, "Invalid API key")
            .into_response();
    };

    let user = AuthUser {
        id: api_key.user_id.clone(),
    };
    request.extensions_mut().insert(user);
    next.run(request).await
}
