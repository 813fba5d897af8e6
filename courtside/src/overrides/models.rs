//! Override audit models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::matches::models::{EventId, MatchId};
use crate::pool::models::PlayerRef;

/// Audit trail entry for a manual player swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideAudit {
    pub id: i64,
    pub event_id: EventId,
    pub match_id: MatchId,
    pub removed_player: PlayerRef,
    pub added_player: PlayerRef,
    /// Host or admin who applied the override
    pub admin_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Audit entry recorded inside a transaction, before the store assigns its ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOverrideAudit {
    pub event_id: EventId,
    pub match_id: MatchId,
    pub removed_player: PlayerRef,
    pub added_player: PlayerRef,
    pub admin_id: i64,
    pub created_at: DateTime<Utc>,
}

impl NewOverrideAudit {
    pub fn into_audit(self, id: i64) -> OverrideAudit {
        OverrideAudit {
            id,
            event_id: self.event_id,
            match_id: self.match_id,
            removed_player: self.removed_player,
            added_player: self.added_player,
            admin_id: self.admin_id,
            created_at: self.created_at,
        }
    }
}
