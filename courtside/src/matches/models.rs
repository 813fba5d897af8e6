//! Match data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::MatchmakingError;
use crate::pool::models::PlayerRef;

/// Event ID type
pub type EventId = i64;

/// Match ID type
pub type MatchId = i64;

/// Match lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// Created, no court yet
    Pending,
    /// Court reserved, not started
    Scheduled,
    /// In progress
    Ongoing,
    /// Finished normally
    Completed,
    /// Abandoned; kept for the audit trail
    Cancelled,
}

impl MatchStatus {
    /// Completed and Cancelled accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Cancelled)
    }

    /// Statuses that bind players to the match
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Statuses that occupy the match's court
    pub fn holds_court(&self) -> bool {
        matches!(self, MatchStatus::Scheduled | MatchStatus::Ongoing)
    }

    /// Legal edges of the lifecycle state machine
    pub fn can_transition_to(&self, next: MatchStatus) -> bool {
        use MatchStatus::*;
        matches!(
            (self, next),
            (Pending, Scheduled)
                | (Pending, Cancelled)
                | (Scheduled, Ongoing)
                | (Scheduled, Pending)
                | (Scheduled, Cancelled)
                | (Ongoing, Completed)
                | (Ongoing, Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Ongoing => "ongoing",
            MatchStatus::Completed => "completed",
            MatchStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = MatchmakingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "scheduled" => Ok(MatchStatus::Scheduled),
            "ongoing" => Ok(MatchStatus::Ongoing),
            "completed" => Ok(MatchStatus::Completed),
            "cancelled" => Ok(MatchStatus::Cancelled),
            other => Err(MatchmakingError::Directory(format!(
                "unknown match status '{other}'"
            ))),
        }
    }
}

/// Singles (1v1) or doubles (2v2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Singles,
    Doubles,
}

impl MatchMode {
    /// Players per side
    pub fn team_size(&self) -> usize {
        match self {
            MatchMode::Singles => 1,
            MatchMode::Doubles => 2,
        }
    }

    /// Minimum pool size needed to form one match
    pub fn min_players(&self) -> usize {
        self.team_size() * 2
    }

    pub fn from_team_size(size: usize) -> Option<Self> {
        match size {
            1 => Some(MatchMode::Singles),
            2 => Some(MatchMode::Doubles),
            _ => None,
        }
    }
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMode::Singles => write!(f, "singles"),
            MatchMode::Doubles => write!(f, "doubles"),
        }
    }
}

impl FromStr for MatchMode {
    type Err = MatchmakingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "singles" => Ok(MatchMode::Singles),
            "doubles" => Ok(MatchMode::Doubles),
            other => Err(MatchmakingError::InvalidParameter {
                name: "mode",
                reason: format!("unknown mode '{other}'"),
            }),
        }
    }
}

/// Which side of a match a player occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Slot1,
    Slot2,
}

/// Persisted match
///
/// Each slot holds one player in singles or a two-player team in doubles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub event_id: EventId,
    pub mode: MatchMode,
    pub slot1: Vec<PlayerRef>,
    pub slot2: Vec<PlayerRef>,
    pub court_number: Option<u32>,
    pub status: MatchStatus,
    pub estimated_duration_minutes: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Match {
    /// All players of both slots
    pub fn players(&self) -> impl Iterator<Item = &PlayerRef> {
        self.slot1.iter().chain(self.slot2.iter())
    }

    pub fn contains(&self, player: &PlayerRef) -> bool {
        self.players().any(|p| p == player)
    }

    pub fn slot_of(&self, player: &PlayerRef) -> Option<Slot> {
        if self.slot1.contains(player) {
            Some(Slot::Slot1)
        } else if self.slot2.contains(player) {
            Some(Slot::Slot2)
        } else {
            None
        }
    }

    /// Court currently occupied by this match, if any
    pub fn occupied_court(&self) -> Option<u32> {
        if self.status.holds_court() {
            self.court_number
        } else {
            None
        }
    }
}

/// Match staged within a transaction, before the store assigns its ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatch {
    pub event_id: EventId,
    pub mode: MatchMode,
    pub slot1: Vec<PlayerRef>,
    pub slot2: Vec<PlayerRef>,
    pub court_number: Option<u32>,
    pub status: MatchStatus,
    pub estimated_duration_minutes: u32,
    pub created_at: DateTime<Utc>,
}

impl NewMatch {
    pub fn players(&self) -> impl Iterator<Item = &PlayerRef> {
        self.slot1.iter().chain(self.slot2.iter())
    }

    /// Attach the store-assigned ID
    pub fn into_match(self, id: MatchId) -> Match {
        Match {
            id,
            event_id: self.event_id,
            mode: self.mode,
            slot1: self.slot1,
            slot2: self.slot2,
            court_number: self.court_number,
            status: self.status,
            estimated_duration_minutes: self.estimated_duration_minutes,
            created_at: self.created_at,
            started_at: None,
            ended_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(MatchStatus::Completed.is_terminal());
        assert!(MatchStatus::Cancelled.is_terminal());
        assert!(!MatchStatus::Pending.is_terminal());
        assert!(MatchStatus::Scheduled.holds_court());
        assert!(MatchStatus::Ongoing.holds_court());
        assert!(!MatchStatus::Pending.holds_court());
    }

    #[test]
    fn test_no_transition_leaves_terminal_states() {
        let all = [
            MatchStatus::Pending,
            MatchStatus::Scheduled,
            MatchStatus::Ongoing,
            MatchStatus::Completed,
            MatchStatus::Cancelled,
        ];
        for terminal in [MatchStatus::Completed, MatchStatus::Cancelled] {
            for next in all {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_forward_edges() {
        assert!(MatchStatus::Pending.can_transition_to(MatchStatus::Scheduled));
        assert!(MatchStatus::Scheduled.can_transition_to(MatchStatus::Ongoing));
        assert!(MatchStatus::Ongoing.can_transition_to(MatchStatus::Completed));
        assert!(MatchStatus::Scheduled.can_transition_to(MatchStatus::Pending));
        assert!(!MatchStatus::Pending.can_transition_to(MatchStatus::Ongoing));
        assert!(!MatchStatus::Scheduled.can_transition_to(MatchStatus::Completed));
        assert!(!MatchStatus::Ongoing.can_transition_to(MatchStatus::Pending));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Doubles".parse::<MatchMode>().unwrap(), MatchMode::Doubles);
        assert_eq!(MatchMode::Singles.min_players(), 2);
        assert_eq!(MatchMode::Doubles.min_players(), 4);
        assert!("triples".parse::<MatchMode>().is_err());
    }
}
