//! HTTP API for the matchmaking server.
//!
//! # Modules
//!
//! - [`matchmaking`]: host operations on an event's matches and courts
//! - [`middleware`]: bearer-token authentication for protected endpoints
//! - [`request_id`]: request id propagation
//!
//! # Endpoints Overview
//!
//! All `/matchmaking` routes require `Authorization: Bearer <jwt>` and the
//! caller must host the event or be an admin.
//!
//! ```text
//! GET  /health                                      - Storage health (public)
//! GET  /matchmaking/{event}/status                  - Matches and waiting players
//! POST /matchmaking/{event}/generate                - Pair the pool
//! POST /matchmaking/{event}/fair-matches            - Pair with defaults
//! POST /matchmaking/{event}/save                    - Persist a host lineup
//! POST /matchmaking/{event}/override-player         - Swap one player
//! POST /matchmaking/{event}/assign-court            - Put a match on a court
//! POST /matchmaking/{event}/release-court/{court}   - Free a scheduled court
//! GET  /matchmaking/{event}/court-status            - Court occupancy
//! POST /matchmaking/{event}/start-match/{match}     - Scheduled -> Ongoing
//! POST /matchmaking/{event}/end-match/{match}       - Ongoing -> Completed
//! POST /matchmaking/{event}/revoke-court/{match}    - Scheduled -> Pending
//! POST /matchmaking/{event}/cancel-match/{match}    - Any live state -> Cancelled
//! GET  /matchmaking/{event}/audit                   - Override audit trail
//! ```
//!
//! Every response uses the same envelope: `{"status": "success", "data": ...}`
//! or `{"status": "error", "message", "kind", "code", "details"}`.

pub mod matchmaking;
pub mod middleware;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use courtside::{AnyMatchStore, MatchmakingManager, TokenVerifier};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; both fields are cheap handles.
#[derive(Clone)]
pub struct AppState {
    pub manager: MatchmakingManager<AnyMatchStore>,
    pub verifier: Arc<TokenVerifier>,
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use cs_server::api::{create_router, AppState};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let state: AppState = unimplemented!();
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/{event_id}/status", get(matchmaking::status))
        .route("/{event_id}/generate", post(matchmaking::generate))
        .route("/{event_id}/fair-matches", post(matchmaking::fair_matches))
        .route("/{event_id}/save", post(matchmaking::save))
        .route("/{event_id}/override-player", post(matchmaking::override_player))
        .route("/{event_id}/assign-court", post(matchmaking::assign_court))
        .route(
            "/{event_id}/release-court/{court}",
            post(matchmaking::release_court),
        )
        .route("/{event_id}/court-status", get(matchmaking::court_status))
        .route(
            "/{event_id}/start-match/{match_id}",
            post(matchmaking::start_match),
        )
        .route("/{event_id}/end-match/{match_id}", post(matchmaking::end_match))
        .route(
            "/{event_id}/revoke-court/{match_id}",
            post(matchmaking::revoke_court),
        )
        .route(
            "/{event_id}/cancel-match/{match_id}",
            post(matchmaking::cancel_match),
        )
        .route("/{event_id}/audit", get(matchmaking::audit_log))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/matchmaking", protected_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the match store answers, `503 Service Unavailable`
/// otherwise.
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","storage":"memory","version":"0.1.0","timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let healthy = match state.manager.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Storage health check failed");
            false
        }
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "storage": state.manager.store().backend_name(),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
