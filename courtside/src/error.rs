//! Matchmaking error types.

use serde_json::{Value, json};
use thiserror::Error;

use crate::matches::models::{EventId, MatchId, MatchStatus};
use crate::pool::models::PlayerRef;

/// Broad error category, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input
    Validation,
    /// Caller is not the event's host or an admin
    Authorization,
    /// Court in use, player already booked, illegal lifecycle transition
    StateConflict,
    /// Event, match or player absent
    NotFound,
    /// Too few eligible participants to pair
    InsufficientData,
    /// Storage or collaborator failure
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::Authorization => "authorization_error",
            ErrorKind::StateConflict => "state_conflict_error",
            ErrorKind::NotFound => "not_found_error",
            ErrorKind::InsufficientData => "insufficient_data_error",
            ErrorKind::Internal => "internal_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Matchmaking errors
#[derive(Debug, Error)]
pub enum MatchmakingError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Directory collaborator failed
    #[error("Directory error: {0}")]
    Directory(String),

    /// Storage operation exceeded its deadline
    #[error("Storage operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Parameter rejected before any work began
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Player reference could not be parsed
    #[error("Invalid player reference: {0}")]
    InvalidPlayerRef(String),

    /// Court number outside `[1, max_courts]`
    #[error("Court {court} is out of range (event has {max_courts} courts)")]
    CourtOutOfRange { court: u32, max_courts: u32 },

    /// Caller is neither host nor admin
    #[error("User {user_id} may not manage event {event_id}")]
    Forbidden { event_id: EventId, user_id: i64 },

    /// Event not found
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// Match not found
    #[error("Match {match_id} not found in event {event_id}")]
    MatchNotFound { event_id: EventId, match_id: MatchId },

    /// Player is not eligible in the event's participant pool
    #[error("Player {0} is not an eligible participant")]
    PlayerNotEligible(PlayerRef),

    /// Not enough eligible participants to pair
    #[error("Insufficient participants: need {needed}, have {available}")]
    InsufficientParticipants { needed: usize, available: usize },

    /// Court already held by another scheduled or ongoing match
    #[error("Court {court} is in use by match {held_by}")]
    CourtInUse { court: u32, held_by: MatchId },

    /// Lifecycle transition not allowed from the current status
    #[error("Cannot {action} match {match_id} while it is {from}")]
    InvalidTransition {
        match_id: MatchId,
        from: MatchStatus,
        action: &'static str,
    },

    /// Player does not occupy a slot of the match
    #[error("Player {player} is not in match {match_id}")]
    PlayerNotInMatch { match_id: MatchId, player: PlayerRef },

    /// Override replacement already bound to a non-terminal match
    #[error("Player {player} is already booked in match {booked_in}")]
    ReplacementAlreadyBooked { player: PlayerRef, booked_in: MatchId },

    /// Player listed twice or already bound when materializing matches
    #[error("Player {player} is already booked")]
    PlayerAlreadyBooked {
        player: PlayerRef,
        booked_in: Option<MatchId>,
    },

    /// Match is completed or cancelled
    #[error("Match {match_id} is {status} and can no longer change")]
    MatchTerminal { match_id: MatchId, status: MatchStatus },
}

impl MatchmakingError {
    /// Category of the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatchmakingError::Database(_)
            | MatchmakingError::Directory(_)
            | MatchmakingError::Timeout(_) => ErrorKind::Internal,
            MatchmakingError::InvalidParameter { .. }
            | MatchmakingError::InvalidPlayerRef(_)
            | MatchmakingError::CourtOutOfRange { .. } => ErrorKind::Validation,
            MatchmakingError::Forbidden { .. } => ErrorKind::Authorization,
            MatchmakingError::EventNotFound(_)
            | MatchmakingError::MatchNotFound { .. }
            | MatchmakingError::PlayerNotEligible(_) => ErrorKind::NotFound,
            MatchmakingError::InsufficientParticipants { .. } => ErrorKind::InsufficientData,
            MatchmakingError::CourtInUse { .. }
            | MatchmakingError::InvalidTransition { .. }
            | MatchmakingError::PlayerNotInMatch { .. }
            | MatchmakingError::ReplacementAlreadyBooked { .. }
            | MatchmakingError::PlayerAlreadyBooked { .. }
            | MatchmakingError::MatchTerminal { .. } => ErrorKind::StateConflict,
        }
    }

    /// Machine-readable variant code
    pub fn code(&self) -> &'static str {
        match self {
            MatchmakingError::Database(_) => "database",
            MatchmakingError::Directory(_) => "directory",
            MatchmakingError::Timeout(_) => "timeout",
            MatchmakingError::InvalidParameter { .. } => "invalid_parameter",
            MatchmakingError::InvalidPlayerRef(_) => "invalid_player_ref",
            MatchmakingError::CourtOutOfRange { .. } => "court_out_of_range",
            MatchmakingError::Forbidden { .. } => "forbidden",
            MatchmakingError::EventNotFound(_) => "event_not_found",
            MatchmakingError::MatchNotFound { .. } => "match_not_found",
            MatchmakingError::PlayerNotEligible(_) => "player_not_eligible",
            MatchmakingError::InsufficientParticipants { .. } => "insufficient_participants",
            MatchmakingError::CourtInUse { .. } => "court_in_use",
            MatchmakingError::InvalidTransition { .. } => "invalid_transition",
            MatchmakingError::PlayerNotInMatch { .. } => "player_not_in_match",
            MatchmakingError::ReplacementAlreadyBooked { .. } => "replacement_already_booked",
            MatchmakingError::PlayerAlreadyBooked { .. } => "player_already_booked",
            MatchmakingError::MatchTerminal { .. } => "match_terminal",
        }
    }

    /// Structured context for clients to re-render actionable state
    pub fn details(&self) -> Value {
        match self {
            MatchmakingError::InvalidParameter { name, .. } => json!({ "parameter": name }),
            MatchmakingError::CourtOutOfRange { court, max_courts } => {
                json!({ "court_number": court, "max_courts": max_courts })
            }
            MatchmakingError::EventNotFound(event_id) | MatchmakingError::Forbidden { event_id, .. } => {
                json!({ "event_id": event_id })
            }
            MatchmakingError::MatchNotFound { match_id, .. } => json!({ "match_id": match_id }),
            MatchmakingError::PlayerNotEligible(player) => json!({ "player": player.to_string() }),
            MatchmakingError::InsufficientParticipants { needed, available } => {
                json!({ "needed": needed, "available": available })
            }
            MatchmakingError::CourtInUse { court, held_by } => {
                json!({ "court_number": court, "held_by_match": held_by })
            }
            MatchmakingError::InvalidTransition { match_id, from, action } => {
                json!({ "match_id": match_id, "status": from, "action": action })
            }
            MatchmakingError::PlayerNotInMatch { match_id, player } => {
                json!({ "match_id": match_id, "player": player.to_string() })
            }
            MatchmakingError::ReplacementAlreadyBooked { player, booked_in } => {
                json!({ "player": player.to_string(), "booked_in_match": booked_in })
            }
            MatchmakingError::PlayerAlreadyBooked { player, booked_in } => {
                json!({ "player": player.to_string(), "booked_in_match": booked_in })
            }
            MatchmakingError::MatchTerminal { match_id, status } => {
                json!({ "match_id": match_id, "status": status })
            }
            _ => Value::Null,
        }
    }

    /// Get a client-safe error message that doesn't leak internals
    pub fn client_message(&self) -> String {
        match self {
            // Don't expose SQL or collaborator details
            MatchmakingError::Database(_) | MatchmakingError::Directory(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for matchmaking operations
pub type MatchmakingResult<T> = Result<T, MatchmakingError>;
