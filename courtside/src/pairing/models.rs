//! Pairing inputs and outputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MatchmakingError, MatchmakingResult};
use crate::matches::models::{EventId, MatchMode, MatchStatus, NewMatch};
use crate::pool::models::Player;

/// Default maximum rating gap between paired players or teams
pub const DEFAULT_SKILL_TOLERANCE: i64 = 200;

/// Parameters of one generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingParams {
    pub mode: MatchMode,
    /// Upper bound on proposals; signed so that bad input reaches validation
    pub max_courts: i64,
    pub skill_tolerance: i64,
}

impl PairingParams {
    /// Reject non-positive tolerance or court count before any pairing work
    pub fn validate(&self) -> MatchmakingResult<()> {
        if self.skill_tolerance <= 0 {
            return Err(MatchmakingError::InvalidParameter {
                name: "skill_tolerance",
                reason: format!("must be positive, got {}", self.skill_tolerance),
            });
        }
        if self.max_courts <= 0 {
            return Err(MatchmakingError::InvalidParameter {
                name: "max_courts",
                reason: format!("must be positive, got {}", self.max_courts),
            });
        }
        Ok(())
    }
}

/// A proposed match before persistence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchProposal {
    pub mode: MatchMode,
    pub slot1: Vec<Player>,
    pub slot2: Vec<Player>,
    /// Absolute rating gap between the sides (team averages in doubles)
    pub rating_gap: f64,
}

impl MatchProposal {
    /// Pending match draft for this proposal
    pub fn to_draft(&self, event_id: EventId, duration_minutes: u32, now: DateTime<Utc>) -> NewMatch {
        NewMatch {
            event_id,
            mode: self.mode,
            slot1: self.slot1.iter().map(|p| p.id).collect(),
            slot2: self.slot2.iter().map(|p| p.id).collect(),
            court_number: None,
            status: MatchStatus::Pending,
            estimated_duration_minutes: duration_minutes,
            created_at: now,
        }
    }
}

/// Proposals plus everyone left unpaired
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PairingOutcome {
    pub proposals: Vec<MatchProposal>,
    pub waiting: Vec<Player>,
}
