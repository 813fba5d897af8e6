//! Authentication middleware for protected endpoints.
//!
//! Extracts the HS256 bearer token issued by the platform, verifies it and
//! injects the resulting [`Principal`] into request extensions.
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use courtside::Principal;
//!
//! async fn protected_handler(Extension(principal): Extension<Principal>) -> String {
//!     format!("Authenticated as user {}", principal.user_id)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use courtside::auth::AuthError;
use serde_json::json;

use super::AppState;
use crate::logging::log_security_event;

/// Validate the bearer token and inject the caller's `Principal`.
///
/// - **Success**: calls the next handler with `Principal` in extensions
/// - **Missing or malformed header**: `401 Unauthorized`
/// - **Invalid or expired token**: `401 Unauthorized`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let result = match token {
        Some(token) => state.verifier.verify(token),
        None => Err(AuthError::MissingToken),
    };

    match result {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            let mut response = next.run(request).await;
            // Lets the request logger attribute the call
            response.extensions_mut().insert(principal);
            response
        }
        Err(e) => {
            log_security_event("token_rejected", None, &e.to_string());
            unauthorized(&e)
        }
    }
}

fn unauthorized(error: &AuthError) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "status": "error",
            "message": error.client_message(),
            "kind": "authentication_error",
            "code": "unauthenticated",
            "details": null,
        })),
    )
        .into_response()
}
