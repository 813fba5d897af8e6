//! Engine request and response models.

use serde::{Deserialize, Serialize};

use crate::courts::CourtSlot;
use crate::error::{MatchmakingError, MatchmakingResult};
use crate::matches::models::{EventId, Match, MatchMode};
use crate::pairing::DEFAULT_SKILL_TOLERANCE;
use crate::pool::models::{Player, PlayerRef, PoolEntry};

/// Values used when a request leaves a parameter out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineDefaults {
    pub mode: MatchMode,
    pub skill_tolerance: i64,
    pub match_duration_minutes: u32,
}

impl Default for EngineDefaults {
    fn default() -> Self {
        Self {
            mode: MatchMode::Singles,
            skill_tolerance: DEFAULT_SKILL_TOLERANCE,
            match_duration_minutes: 30,
        }
    }
}

/// Generation options; unset fields fall back to engine defaults and the
/// event's court count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub mode: Option<MatchMode>,
    pub max_courts: Option<i64>,
    pub skill_tolerance: Option<i64>,
}

/// Matches persisted by a generation run plus the players left waiting
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub event_id: EventId,
    pub matches: Vec<Match>,
    pub waiting: Vec<Player>,
}

/// Host-supplied match for a direct save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedMatch {
    pub slot1: Vec<PlayerRef>,
    pub slot2: Vec<PlayerRef>,
    #[serde(default)]
    pub court_number: Option<u32>,
}

impl SavedMatch {
    /// Both slots must hold the same number of players, one or two
    pub fn mode(&self) -> MatchmakingResult<MatchMode> {
        if self.slot1.len() != self.slot2.len() {
            return Err(MatchmakingError::InvalidParameter {
                name: "slots",
                reason: format!(
                    "slot sizes differ ({} vs {})",
                    self.slot1.len(),
                    self.slot2.len()
                ),
            });
        }
        MatchMode::from_team_size(self.slot1.len()).ok_or_else(|| MatchmakingError::InvalidParameter {
            name: "slots",
            reason: format!("each slot needs 1 or 2 players, got {}", self.slot1.len()),
        })
    }
}

/// Current matches and waiting players
#[derive(Debug, Clone, Serialize)]
pub struct MatchmakingStatus {
    pub event_id: EventId,
    pub matches: Vec<Match>,
    pub waiting: Vec<PoolEntry>,
}

/// Per-court occupancy with the queues that feed it
#[derive(Debug, Clone, Serialize)]
pub struct CourtStatus {
    pub event_id: EventId,
    pub max_courts: u32,
    pub courts: Vec<CourtSlot>,
    pub next_free_court: Option<u32>,
    /// Pending matches, oldest first
    pub pending: Vec<Match>,
    pub waiting: Vec<PoolEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_match_mode() {
        let singles = SavedMatch {
            slot1: vec![PlayerRef::User(1)],
            slot2: vec![PlayerRef::Guest(1)],
            court_number: None,
        };
        assert_eq!(singles.mode().unwrap(), MatchMode::Singles);

        let lopsided = SavedMatch {
            slot1: vec![PlayerRef::User(1), PlayerRef::User(2)],
            ..singles.clone()
        };
        assert!(lopsided.mode().is_err());

        let empty = SavedMatch {
            slot1: vec![],
            slot2: vec![],
            court_number: None,
        };
        assert!(matches!(
            empty.mode(),
            Err(MatchmakingError::InvalidParameter { name: "slots", .. })
        ));
    }

    #[test]
    fn test_saved_match_accepts_tagged_refs() {
        let raw = r#"{"slot1": ["guest_3"], "slot2": [12], "court_number": 2}"#;
        let saved: SavedMatch = serde_json::from_str(raw).unwrap();
        assert_eq!(saved.slot1, vec![PlayerRef::Guest(3)]);
        assert_eq!(saved.slot2, vec![PlayerRef::User(12)]);
        assert_eq!(saved.court_number, Some(2));
    }
}
