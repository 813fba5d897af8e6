//! Host-initiated player swaps.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::models::NewOverrideAudit;
use crate::error::{MatchmakingError, MatchmakingResult};
use crate::matches::ledger::EventLedger;
use crate::matches::models::{Match, MatchId};
use crate::pool::models::{EventContext, PlayerRef};
use crate::pool::Roster;
use crate::store::MatchStore;

/// One requested swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerOverride {
    pub match_id: MatchId,
    pub replace: PlayerRef,
    pub replacement: PlayerRef,
    pub admin_id: i64,
}

impl EventLedger {
    /// Replace one player of a match in place and record the audit entry.
    ///
    /// Every check runs before the slot is touched, so a failed override
    /// leaves both slots and the replacement's booking unchanged.
    pub(crate) fn override_player(
        &mut self,
        request: PlayerOverride,
        now: DateTime<Utc>,
    ) -> MatchmakingResult<&Match> {
        let PlayerOverride {
            match_id,
            replace,
            replacement,
            admin_id,
        } = request;

        let target = self.find(match_id)?;
        if target.status.is_terminal() {
            return Err(MatchmakingError::MatchTerminal {
                match_id,
                status: target.status,
            });
        }
        if !target.contains(&replace) {
            return Err(MatchmakingError::PlayerNotInMatch {
                match_id,
                player: replace,
            });
        }
        if replace == replacement {
            return Err(MatchmakingError::InvalidParameter {
                name: "replacement",
                reason: "replacement is the player being replaced".to_string(),
            });
        }
        if let Some(booking) = self.booking_of(&replacement) {
            return Err(MatchmakingError::ReplacementAlreadyBooked {
                player: replacement,
                booked_in: booking.match_id().unwrap_or(match_id),
            });
        }

        let event_id = self.event_id();
        let m = self.find_mut(match_id)?;
        for slot in m.slot1.iter_mut().chain(m.slot2.iter_mut()) {
            if *slot == replace {
                *slot = replacement;
            }
        }

        self.record_audit(NewOverrideAudit {
            event_id,
            match_id,
            removed_player: replace,
            added_player: replacement,
            admin_id,
            created_at: now,
        });
        self.find(match_id)
    }
}

/// Validates and applies manual pairing changes
pub struct OverrideCoordinator<S> {
    store: Arc<S>,
}

impl<S> Clone for OverrideCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: MatchStore> OverrideCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Swap a player; the booking check is repeated inside the transaction
    pub async fn override_player(
        &self,
        event: &EventContext,
        roster: &Roster,
        request: PlayerOverride,
    ) -> MatchmakingResult<Match> {
        let now = Utc::now();
        if roster.lookup(&request.replacement, now).is_none() {
            return Err(MatchmakingError::PlayerNotEligible(request.replacement));
        }

        let committed = self
            .store
            .transact(event.id, event.max_courts, move |ledger| {
                ledger.override_player(request, now).cloned()
            })
            .await?;

        log::info!(
            target: "audit",
            "Override in event {} match {}: {} replaced by {} (by user {})",
            event.id,
            request.match_id,
            request.replace,
            request.replacement,
            request.admin_id
        );
        Ok(committed.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::ledger::fixtures::singles;
    use crate::matches::models::{MatchMode, MatchStatus};

    const A: PlayerRef = PlayerRef::User(1);
    const B: PlayerRef = PlayerRef::User(2);
    const C: PlayerRef = PlayerRef::User(3);
    const D: PlayerRef = PlayerRef::User(4);
    const G: PlayerRef = PlayerRef::Guest(1);

    fn swap(match_id: MatchId, replace: PlayerRef, replacement: PlayerRef) -> PlayerOverride {
        PlayerOverride {
            match_id,
            replace,
            replacement,
            admin_id: 10,
        }
    }

    fn ledger() -> EventLedger {
        EventLedger::new(
            1,
            2,
            vec![
                singles(1, A, B, MatchStatus::Pending),
                singles(2, C, D, MatchStatus::Scheduled),
            ],
        )
    }

    #[test]
    fn test_override_replaces_in_place_and_audits() {
        let mut ledger = ledger();
        let m = ledger.override_player(swap(1, B, G), Utc::now()).unwrap();
        assert_eq!(m.id, 1);
        assert_eq!(m.slot2, vec![G]);

        let changes = ledger.into_changes();
        assert_eq!(changes.updated.len(), 1);
        assert_eq!(changes.audit.len(), 1);
        assert_eq!(changes.audit[0].removed_player, B);
        assert_eq!(changes.audit[0].added_player, G);
        assert_eq!(changes.audit[0].admin_id, 10);
    }

    #[test]
    fn test_guest_cannot_join_second_match() {
        let mut ledger = ledger();
        ledger.override_player(swap(1, B, G), Utc::now()).unwrap();
        let err = ledger
            .override_player(swap(2, D, G), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            MatchmakingError::ReplacementAlreadyBooked { player: G, booked_in: 1 }
        ));
        assert_eq!(ledger.find(2).unwrap().slot2, vec![D]);
    }

    #[test]
    fn test_player_must_be_in_match() {
        let mut ledger = ledger();
        let err = ledger
            .override_player(swap(1, C, G), Utc::now())
            .unwrap_err();
        assert!(matches!(err, MatchmakingError::PlayerNotInMatch { player: C, .. }));
        assert!(ledger.into_changes().is_empty());
    }

    #[test]
    fn test_terminal_match_is_rejected_first() {
        let mut ledger = EventLedger::new(1, 2, vec![singles(1, A, B, MatchStatus::Completed)]);
        let err = ledger
            .override_player(swap(1, PlayerRef::User(99), G), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            MatchmakingError::MatchTerminal { status: MatchStatus::Completed, .. }
        ));
    }

    #[test]
    fn test_player_freed_by_completed_match_can_be_added() {
        let mut ledger = EventLedger::new(
            1,
            2,
            vec![
                singles(1, A, G, MatchStatus::Completed),
                singles(2, C, D, MatchStatus::Pending),
            ],
        );
        let m = ledger.override_player(swap(2, C, G), Utc::now()).unwrap();
        assert_eq!(m.slot1, vec![G]);
    }

    #[test]
    fn test_doubles_swap_keeps_partner() {
        let mut m = singles(1, A, B, MatchStatus::Ongoing);
        m.mode = MatchMode::Doubles;
        m.slot1 = vec![A, C];
        m.slot2 = vec![B, D];
        let mut ledger = EventLedger::new(1, 2, vec![m]);
        let m = ledger.override_player(swap(1, C, G), Utc::now()).unwrap();
        assert_eq!(m.slot1, vec![A, G]);
        assert_eq!(m.slot2, vec![B, D]);
    }

    #[test]
    fn test_swapping_player_with_itself_is_invalid() {
        let mut ledger = ledger();
        let err = ledger
            .override_player(swap(1, A, A), Utc::now())
            .unwrap_err();
        assert!(matches!(err, MatchmakingError::InvalidParameter { name: "replacement", .. }));
    }
}
