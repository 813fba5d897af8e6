//! Participant pool data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

use crate::error::MatchmakingError;

/// Registered user ID type
pub type UserId = i64;

/// Guest player ID type
pub type GuestId = i64;

/// Prefix that marks a guest id in textual player references
pub const GUEST_PREFIX: &str = "guest_";

/// Prefix that optionally marks a registered user id
pub const USER_PREFIX: &str = "user_";

/// Where a player comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerOrigin {
    Registered,
    Guest,
}

impl std::fmt::Display for PlayerOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerOrigin::Registered => write!(f, "registered"),
            PlayerOrigin::Guest => write!(f, "guest"),
        }
    }
}

/// Reference to a match participant: a registered user id XOR a guest id.
///
/// Textual form is `"<id>"` (or `"user_<id>"`) for users and `"guest_<id>"`
/// for guests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlayerRef {
    User(UserId),
    Guest(GuestId),
}

impl PlayerRef {
    pub fn origin(&self) -> PlayerOrigin {
        match self {
            PlayerRef::User(_) => PlayerOrigin::Registered,
            PlayerRef::Guest(_) => PlayerOrigin::Guest,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            PlayerRef::User(id) | PlayerRef::Guest(id) => *id,
        }
    }

    /// Registered user id, if any
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            PlayerRef::User(id) => Some(*id),
            PlayerRef::Guest(_) => None,
        }
    }

    /// Guest id, if any
    pub fn guest_id(&self) -> Option<GuestId> {
        match self {
            PlayerRef::Guest(id) => Some(*id),
            PlayerRef::User(_) => None,
        }
    }
}

impl std::fmt::Display for PlayerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerRef::User(id) => write!(f, "{id}"),
            PlayerRef::Guest(id) => write!(f, "{GUEST_PREFIX}{id}"),
        }
    }
}

impl FromStr for PlayerRef {
    type Err = MatchmakingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || MatchmakingError::InvalidPlayerRef(s.to_string());

        let (raw, guest) = if let Some(rest) = trimmed.strip_prefix(GUEST_PREFIX) {
            (rest, true)
        } else if let Some(rest) = trimmed.strip_prefix(USER_PREFIX) {
            (rest, false)
        } else {
            (trimmed, false)
        };

        let id: i64 = raw.parse().map_err(|_| invalid())?;
        if id <= 0 {
            return Err(invalid());
        }

        Ok(if guest {
            PlayerRef::Guest(id)
        } else {
            PlayerRef::User(id)
        })
    }
}

impl Serialize for PlayerRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PlayerRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Number(id) => id.to_string(),
            Raw::Text(text) => text,
        };
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Uniform read model of an eligible participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerRef,
    pub origin: PlayerOrigin,
    pub name: String,
    /// Skill rating; for guests this is the host-entered estimated MMR
    pub skill_rating: i32,
    pub matches_played: u32,
}

/// Registration status of a registered participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    CheckedIn,
    Cancelled,
}

impl RegistrationStatus {
    /// Only confirmed or checked-in registrants can be matched
    pub fn is_matchable(&self) -> bool {
        matches!(
            self,
            RegistrationStatus::Confirmed | RegistrationStatus::CheckedIn
        )
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationStatus::Pending => write!(f, "pending"),
            RegistrationStatus::Confirmed => write!(f, "confirmed"),
            RegistrationStatus::CheckedIn => write!(f, "checked_in"),
            RegistrationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for RegistrationStatus {
    type Err = MatchmakingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RegistrationStatus::Pending),
            "confirmed" => Ok(RegistrationStatus::Confirmed),
            "checked_in" => Ok(RegistrationStatus::CheckedIn),
            "cancelled" => Ok(RegistrationStatus::Cancelled),
            other => Err(MatchmakingError::Directory(format!(
                "unknown registration status '{other}'"
            ))),
        }
    }
}

/// Registered participant as reported by the event directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registrant {
    pub user_id: UserId,
    pub name: String,
    pub skill_rating: i32,
    pub matches_played: u32,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
}

/// Host-entered guest player as reported by the guest directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestPlayer {
    pub id: GuestId,
    pub event_id: i64,
    pub name: String,
    pub estimated_mmr: i32,
    #[serde(default)]
    pub matches_played: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl GuestPlayer {
    /// A guest is eligible while not soft-deleted and not yet expired
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        self.deleted_at.is_none() && self.expires_at.is_none_or(|expires| now < expires)
    }
}

/// Event lifecycle status as tracked by the event directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Open,
    Ongoing,
    Completed,
    Cancelled,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Draft => write!(f, "draft"),
            EventStatus::Open => write!(f, "open"),
            EventStatus::Ongoing => write!(f, "ongoing"),
            EventStatus::Completed => write!(f, "completed"),
            EventStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for EventStatus {
    type Err = MatchmakingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(EventStatus::Draft),
            "open" => Ok(EventStatus::Open),
            "ongoing" => Ok(EventStatus::Ongoing),
            "completed" => Ok(EventStatus::Completed),
            "cancelled" => Ok(EventStatus::Cancelled),
            other => Err(MatchmakingError::Directory(format!(
                "unknown event status '{other}'"
            ))),
        }
    }
}

/// Read-only event context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventContext {
    pub id: i64,
    pub host_id: UserId,
    pub max_courts: u32,
    pub status: EventStatus,
}

/// Pool member together with its waiting-queue position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolEntry {
    pub player: Player,
    /// Last match end, or registration time if never matched
    pub waiting_since: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_parse_player_refs() {
        assert_eq!("12".parse::<PlayerRef>().unwrap(), PlayerRef::User(12));
        assert_eq!("user_12".parse::<PlayerRef>().unwrap(), PlayerRef::User(12));
        assert_eq!("guest_7".parse::<PlayerRef>().unwrap(), PlayerRef::Guest(7));
        assert!("guest_".parse::<PlayerRef>().is_err());
        assert!("bob".parse::<PlayerRef>().is_err());
        assert!("-3".parse::<PlayerRef>().is_err());
    }

    #[test]
    fn test_player_ref_display_round_trip() {
        assert_eq!(PlayerRef::Guest(7).to_string(), "guest_7");
        assert_eq!(PlayerRef::User(12).to_string(), "12");
    }

    #[test]
    fn test_player_ref_json_accepts_numbers_and_strings() {
        let user: PlayerRef = serde_json::from_str("42").unwrap();
        let guest: PlayerRef = serde_json::from_str("\"guest_3\"").unwrap();
        assert_eq!(user, PlayerRef::User(42));
        assert_eq!(guest, PlayerRef::Guest(3));
        assert_eq!(serde_json::to_string(&guest).unwrap(), "\"guest_3\"");
    }

    #[test]
    fn test_user_and_guest_with_same_id_differ() {
        assert_ne!(PlayerRef::User(5), PlayerRef::Guest(5));
        assert!(PlayerRef::User(5) < PlayerRef::Guest(5));
    }

    #[test]
    fn test_guest_eligibility() {
        let now = Utc::now();
        let mut guest = GuestPlayer {
            id: 1,
            event_id: 1,
            name: "Walk-in".to_string(),
            estimated_mmr: 1200,
            matches_played: 0,
            created_at: now - Duration::hours(1),
            deleted_at: None,
            expires_at: None,
        };
        assert!(guest.is_eligible(now));

        guest.expires_at = Some(now + Duration::minutes(5));
        assert!(guest.is_eligible(now));

        guest.expires_at = Some(now);
        assert!(!guest.is_eligible(now));

        guest.expires_at = None;
        guest.deleted_at = Some(now - Duration::minutes(1));
        assert!(!guest.is_eligible(now));
    }

    #[test]
    fn test_registration_status_matchable() {
        assert!(RegistrationStatus::Confirmed.is_matchable());
        assert!(RegistrationStatus::CheckedIn.is_matchable());
        assert!(!RegistrationStatus::Pending.is_matchable());
        assert!(!RegistrationStatus::Cancelled.is_matchable());
    }
}
