//! Matchmaking API handlers.
//!
//! Every handler takes the authenticated [`Principal`] injected by the auth
//! middleware and forwards to [`MatchmakingManager`], which checks that the
//! caller hosts the event (or is an admin).
//!
//! # Examples
//!
//! Generate doubles matches:
//! ```bash
//! curl -X POST http://localhost:6969/matchmaking/1/generate \
//!   -H "Authorization: Bearer TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"mode": "doubles", "skill_tolerance": 150}'
//! ```
//!
//! Swap a registered player for a guest:
//! ```bash
//! curl -X POST http://localhost:6969/matchmaking/1/override-player \
//!   -H "Authorization: Bearer TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"match_id": 7, "replace": 12, "replacement": "guest_3"}'
//! ```

use axum::{
    Json,
    extract::{Extension, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use courtside::engine::{CourtStatus, GenerateOptions, GenerationReport, MatchmakingStatus};
use courtside::overrides::OverrideAudit;
use courtside::{
    ErrorKind, EventId, Match, MatchId, MatchStatus, MatchmakingError, PlayerRef, Principal,
    SavedMatch,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::AppState;
use crate::metrics;

/// Successful response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub data: T,
}

fn success<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        status: "success",
        data,
    })
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub matches: Vec<SavedMatch>,
}

#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    pub match_id: MatchId,
    /// Player currently in the match
    pub replace: PlayerRef,
    pub replacement: PlayerRef,
}

#[derive(Debug, Deserialize)]
pub struct AssignCourtRequest {
    pub match_id: MatchId,
    pub court_number: u32,
}

/// Handler failure rendered as the error envelope
#[derive(Debug)]
pub enum ApiError {
    Matchmaking(MatchmakingError),
    Payload(JsonRejection),
}

impl From<MatchmakingError> for ApiError {
    fn from(error: MatchmakingError) -> Self {
        ApiError::Matchmaking(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Payload(rejection)
    }
}

/// HTTP status for an engine error
pub fn status_for(error: &MatchmakingError) -> StatusCode {
    match error {
        MatchmakingError::CourtInUse { .. } => StatusCode::BAD_REQUEST,
        MatchmakingError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => match error.kind() {
            ErrorKind::Validation | ErrorKind::InsufficientData => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::StateConflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Matchmaking(error) => {
                let status = status_for(&error);
                match error.kind() {
                    ErrorKind::Internal => tracing::error!(error = %error, "Matchmaking request failed"),
                    ErrorKind::InsufficientData => tracing::debug!(error = %error, "Not enough players"),
                    _ => tracing::info!(code = error.code(), error = %error, "Matchmaking request rejected"),
                }
                if matches!(error, MatchmakingError::CourtInUse { .. }) {
                    metrics::court_conflicts_total();
                }

                let body = json!({
                    "status": "error",
                    "message": error.client_message(),
                    "kind": error.kind().as_str(),
                    "code": error.code(),
                    "details": error.details(),
                });
                (status, Json(body)).into_response()
            }
            ApiError::Payload(rejection) => {
                let body = json!({
                    "status": "error",
                    "message": rejection.body_text(),
                    "kind": ErrorKind::Validation.as_str(),
                    "code": "invalid_payload",
                    "details": Value::Null,
                });
                (rejection.status(), Json(body)).into_response()
            }
        }
    }
}

/// `GET /matchmaking/{event}/status`
pub async fn status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(event_id): Path<EventId>,
) -> ApiResult<MatchmakingStatus> {
    let status = state.manager.status(&principal, event_id).await?;
    Ok(success(status))
}

/// `POST /matchmaking/{event}/generate`
///
/// Body: `{"mode": "singles"|"doubles", "max_courts": n, "skill_tolerance": n}`,
/// every field optional.
pub async fn generate(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(event_id): Path<EventId>,
    payload: Result<Json<GenerateOptions>, JsonRejection>,
) -> ApiResult<GenerationReport> {
    let Json(options) = payload?;
    let report = state.manager.generate(&principal, event_id, options).await?;
    record_generated(&report.matches);
    Ok(success(report))
}

/// `POST /matchmaking/{event}/fair-matches`
pub async fn fair_matches(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(event_id): Path<EventId>,
) -> ApiResult<GenerationReport> {
    let report = state.manager.fair_matches(&principal, event_id).await?;
    record_generated(&report.matches);
    Ok(success(report))
}

/// `POST /matchmaking/{event}/save`
pub async fn save(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(event_id): Path<EventId>,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> ApiResult<Vec<Match>> {
    let Json(request) = payload?;
    let saved = state
        .manager
        .save_matches(&principal, event_id, request.matches)
        .await?;
    record_generated(&saved);
    for m in saved.iter().filter(|m| m.status == MatchStatus::Scheduled) {
        metrics::match_transitions_total(m.status);
    }
    Ok(success(saved))
}

/// `POST /matchmaking/{event}/override-player`
pub async fn override_player(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(event_id): Path<EventId>,
    payload: Result<Json<OverrideRequest>, JsonRejection>,
) -> ApiResult<Match> {
    let Json(request) = payload?;
    let updated = state
        .manager
        .override_player(
            &principal,
            event_id,
            request.match_id,
            request.replace,
            request.replacement,
        )
        .await?;
    metrics::overrides_applied_total();
    Ok(success(updated))
}

/// `POST /matchmaking/{event}/assign-court`
pub async fn assign_court(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(event_id): Path<EventId>,
    payload: Result<Json<AssignCourtRequest>, JsonRejection>,
) -> ApiResult<Match> {
    let Json(request) = payload?;
    let updated = state
        .manager
        .assign_court(&principal, event_id, request.match_id, request.court_number)
        .await?;
    metrics::match_transitions_total(updated.status);
    Ok(success(updated))
}

/// `POST /matchmaking/{event}/release-court/{court}`
///
/// `data` is the match that held the court, or `null` if it was already free.
pub async fn release_court(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((event_id, court)): Path<(EventId, u32)>,
) -> ApiResult<Option<Match>> {
    let released = state.manager.release_court(&principal, event_id, court).await?;
    if let Some(m) = &released {
        metrics::match_transitions_total(m.status);
    }
    Ok(success(released))
}

/// `GET /matchmaking/{event}/court-status`
pub async fn court_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(event_id): Path<EventId>,
) -> ApiResult<CourtStatus> {
    let status = state.manager.court_status(&principal, event_id).await?;
    Ok(success(status))
}

/// `POST /matchmaking/{event}/start-match/{match}`
pub async fn start_match(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((event_id, match_id)): Path<(EventId, MatchId)>,
) -> ApiResult<Match> {
    let updated = state.manager.start_match(&principal, event_id, match_id).await?;
    metrics::match_transitions_total(updated.status);
    Ok(success(updated))
}

/// `POST /matchmaking/{event}/end-match/{match}`
pub async fn end_match(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((event_id, match_id)): Path<(EventId, MatchId)>,
) -> ApiResult<Match> {
    let updated = state.manager.end_match(&principal, event_id, match_id).await?;
    metrics::match_transitions_total(updated.status);
    Ok(success(updated))
}

/// `POST /matchmaking/{event}/revoke-court/{match}`
pub async fn revoke_court(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((event_id, match_id)): Path<(EventId, MatchId)>,
) -> ApiResult<Match> {
    let updated = state.manager.revoke_court(&principal, event_id, match_id).await?;
    metrics::match_transitions_total(updated.status);
    Ok(success(updated))
}

/// `POST /matchmaking/{event}/cancel-match/{match}`
pub async fn cancel_match(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((event_id, match_id)): Path<(EventId, MatchId)>,
) -> ApiResult<Match> {
    let updated = state.manager.cancel_match(&principal, event_id, match_id).await?;
    metrics::match_transitions_total(updated.status);
    Ok(success(updated))
}

/// `GET /matchmaking/{event}/audit`
pub async fn audit_log(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(event_id): Path<EventId>,
) -> ApiResult<Vec<OverrideAudit>> {
    let entries = state.manager.audit_log(&principal, event_id).await?;
    Ok(success(entries))
}

fn record_generated(matches: &[Match]) {
    for m in matches {
        metrics::matches_generated(m.mode, 1);
    }
}
