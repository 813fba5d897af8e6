//! Per-event working set of matches.
//!
//! An `EventLedger` is loaded by a [`MatchStore`](crate::store::MatchStore)
//! under per-event mutual exclusion, mutated by synchronous domain
//! operations, and written back all-or-nothing. Every invariant check that
//! guards shared state (double booking, court exclusivity, lifecycle edges)
//! runs against the ledger, so checks and writes happen in one indivisible
//! step.

use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};

use super::models::{EventId, Match, MatchId, MatchStatus, NewMatch};
use crate::error::{MatchmakingError, MatchmakingResult};
use crate::overrides::models::NewOverrideAudit;
use crate::pool::models::PlayerRef;

/// Where a player is currently bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Booking {
    /// Bound to a persisted non-terminal match
    Match(MatchId),
    /// Bound to a match staged in the current transaction
    Staged,
}

impl Booking {
    pub fn match_id(&self) -> Option<MatchId> {
        match self {
            Booking::Match(id) => Some(*id),
            Booking::Staged => None,
        }
    }
}

/// Writes produced by a committed ledger
#[derive(Debug, Default)]
pub struct LedgerChanges {
    pub inserted: Vec<NewMatch>,
    pub updated: Vec<Match>,
    pub audit: Vec<NewOverrideAudit>,
}

impl LedgerChanges {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.audit.is_empty()
    }
}

/// Mutable view over one event's matches
#[derive(Debug)]
pub struct EventLedger {
    event_id: EventId,
    max_courts: u32,
    matches: Vec<Match>,
    staged: Vec<NewMatch>,
    dirty: BTreeSet<MatchId>,
    audit: Vec<NewOverrideAudit>,
}

impl EventLedger {
    pub fn new(event_id: EventId, max_courts: u32, matches: Vec<Match>) -> Self {
        Self {
            event_id,
            max_courts,
            matches,
            staged: Vec::new(),
            dirty: BTreeSet::new(),
            audit: Vec::new(),
        }
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn max_courts(&self) -> u32 {
        self.max_courts
    }

    /// Persisted matches, including any in-transaction edits
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// Matches staged for insertion in this transaction
    pub fn staged(&self) -> &[NewMatch] {
        &self.staged
    }

    pub fn find(&self, match_id: MatchId) -> MatchmakingResult<&Match> {
        self.matches
            .iter()
            .find(|m| m.id == match_id)
            .ok_or(MatchmakingError::MatchNotFound {
                event_id: self.event_id,
                match_id,
            })
    }

    /// Mutable access; marks the match for write-back
    pub(crate) fn find_mut(&mut self, match_id: MatchId) -> MatchmakingResult<&mut Match> {
        let event_id = self.event_id;
        let found = self
            .matches
            .iter_mut()
            .find(|m| m.id == match_id)
            .ok_or(MatchmakingError::MatchNotFound { event_id, match_id })?;
        self.dirty.insert(match_id);
        Ok(found)
    }

    /// Current non-terminal binding of a player
    pub fn booking_of(&self, player: &PlayerRef) -> Option<Booking> {
        if let Some(m) = self
            .matches
            .iter()
            .find(|m| m.status.is_active() && m.contains(player))
        {
            return Some(Booking::Match(m.id));
        }
        self.staged
            .iter()
            .any(|m| m.status.is_active() && m.players().any(|p| p == player))
            .then_some(Booking::Staged)
    }

    /// Every player bound to a non-terminal match
    pub fn bound_players(&self) -> HashSet<PlayerRef> {
        self.matches
            .iter()
            .filter(|m| m.status.is_active())
            .flat_map(|m| m.players().copied())
            .chain(
                self.staged
                    .iter()
                    .filter(|m| m.status.is_active())
                    .flat_map(|m| m.players().copied()),
            )
            .collect()
    }

    /// Latest `ended_at` per player across finished matches
    pub fn last_match_ends(&self) -> HashMap<PlayerRef, DateTime<Utc>> {
        let mut ends: HashMap<PlayerRef, DateTime<Utc>> = HashMap::new();
        for m in self.matches.iter().filter(|m| m.status.is_terminal()) {
            let Some(ended_at) = m.ended_at else { continue };
            for player in m.players() {
                ends.entry(*player)
                    .and_modify(|t| *t = (*t).max(ended_at))
                    .or_insert(ended_at);
            }
        }
        ends
    }

    /// Stage a new match after re-checking bookings and court occupancy.
    pub(crate) fn stage(&mut self, draft: NewMatch) -> MatchmakingResult<()> {
        let mut seen = HashSet::new();
        for player in draft.players() {
            if !seen.insert(*player) {
                return Err(MatchmakingError::PlayerAlreadyBooked {
                    player: *player,
                    booked_in: None,
                });
            }
            if let Some(booking) = self.booking_of(player) {
                return Err(MatchmakingError::PlayerAlreadyBooked {
                    player: *player,
                    booked_in: booking.match_id(),
                });
            }
        }

        if let Some(court) = draft.court_number {
            self.check_court_range(court)?;
            if let Some(held_by) = self.court_holder(court) {
                return Err(MatchmakingError::CourtInUse { court, held_by });
            }
            if self
                .staged
                .iter()
                .any(|m| m.status.holds_court() && m.court_number == Some(court))
            {
                return Err(MatchmakingError::InvalidParameter {
                    name: "court_number",
                    reason: format!("court {court} is listed more than once"),
                });
            }
        }

        self.staged.push(draft);
        Ok(())
    }

    pub(crate) fn record_audit(&mut self, entry: NewOverrideAudit) {
        self.audit.push(entry);
    }

    /// Consume the ledger into the writes it produced
    pub fn into_changes(self) -> LedgerChanges {
        let dirty = self.dirty;
        LedgerChanges {
            inserted: self.staged,
            updated: self
                .matches
                .into_iter()
                .filter(|m| dirty.contains(&m.id))
                .collect(),
            audit: self.audit,
        }
    }

    /// Move a match along a legal lifecycle edge, or fail leaving it untouched.
    pub(crate) fn transition(
        &mut self,
        match_id: MatchId,
        next: MatchStatus,
        action: &'static str,
    ) -> MatchmakingResult<&mut Match> {
        let current = self.find(match_id)?.status;
        if !current.can_transition_to(next) {
            return Err(MatchmakingError::InvalidTransition {
                match_id,
                from: current,
                action,
            });
        }
        let m = self.find_mut(match_id)?;
        m.status = next;
        Ok(m)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::matches::models::MatchMode;

    pub fn singles(id: MatchId, a: PlayerRef, b: PlayerRef, status: MatchStatus) -> Match {
        Match {
            id,
            event_id: 1,
            mode: MatchMode::Singles,
            slot1: vec![a],
            slot2: vec![b],
            court_number: None,
            status,
            estimated_duration_minutes: 30,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
        }
    }

    pub fn draft(a: PlayerRef, b: PlayerRef, court: Option<u32>) -> NewMatch {
        NewMatch {
            event_id: 1,
            mode: MatchMode::Singles,
            slot1: vec![a],
            slot2: vec![b],
            court_number: court,
            status: if court.is_some() {
                MatchStatus::Scheduled
            } else {
                MatchStatus::Pending
            },
            estimated_duration_minutes: 30,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    const A: PlayerRef = PlayerRef::User(1);
    const B: PlayerRef = PlayerRef::User(2);
    const C: PlayerRef = PlayerRef::User(3);
    const G: PlayerRef = PlayerRef::Guest(1);

    #[test]
    fn test_booking_ignores_terminal_matches() {
        let ledger = EventLedger::new(
            1,
            2,
            vec![
                singles(1, A, B, MatchStatus::Completed),
                singles(2, C, G, MatchStatus::Pending),
            ],
        );
        assert_eq!(ledger.booking_of(&A), None);
        assert_eq!(ledger.booking_of(&G), Some(Booking::Match(2)));
        assert_eq!(ledger.bound_players().len(), 2);
    }

    #[test]
    fn test_stage_rejects_booked_player() {
        let mut ledger = EventLedger::new(1, 2, vec![singles(1, A, B, MatchStatus::Scheduled)]);
        let err = ledger.stage(draft(A, C, None)).unwrap_err();
        assert!(matches!(
            err,
            MatchmakingError::PlayerAlreadyBooked { booked_in: Some(1), .. }
        ));
        assert!(ledger.staged().is_empty());
    }

    #[test]
    fn test_stage_rejects_player_twice_in_same_draft() {
        let mut ledger = EventLedger::new(1, 2, vec![]);
        let err = ledger.stage(draft(A, A, None)).unwrap_err();
        assert!(matches!(
            err,
            MatchmakingError::PlayerAlreadyBooked { booked_in: None, .. }
        ));
    }

    #[test]
    fn test_staged_players_count_as_booked() {
        let mut ledger = EventLedger::new(1, 2, vec![]);
        ledger.stage(draft(A, B, None)).unwrap();
        assert_eq!(ledger.booking_of(&A), Some(Booking::Staged));
        assert!(ledger.stage(draft(B, C, None)).is_err());
    }

    #[test]
    fn test_stage_with_court_checks_range_and_duplicates() {
        let mut ledger = EventLedger::new(1, 2, vec![]);
        let err = ledger.stage(draft(A, B, Some(3))).unwrap_err();
        assert!(matches!(err, MatchmakingError::CourtOutOfRange { court: 3, max_courts: 2 }));

        ledger.stage(draft(A, B, Some(1))).unwrap();
        let err = ledger.stage(draft(C, G, Some(1))).unwrap_err();
        assert!(matches!(err, MatchmakingError::InvalidParameter { name: "court_number", .. }));
    }

    #[test]
    fn test_failed_transition_leaves_match_untouched() {
        let mut ledger = EventLedger::new(1, 2, vec![singles(1, A, B, MatchStatus::Pending)]);
        let err = ledger
            .transition(1, MatchStatus::Completed, "end")
            .unwrap_err();
        assert!(matches!(
            err,
            MatchmakingError::InvalidTransition { from: MatchStatus::Pending, .. }
        ));
        assert_eq!(ledger.find(1).unwrap().status, MatchStatus::Pending);
        assert!(ledger.into_changes().is_empty());
    }

    #[test]
    fn test_into_changes_only_returns_dirty_matches() {
        let mut ledger = EventLedger::new(
            1,
            2,
            vec![
                singles(1, A, B, MatchStatus::Pending),
                singles(2, C, G, MatchStatus::Pending),
            ],
        );
        ledger.transition(2, MatchStatus::Cancelled, "cancel").unwrap();
        let changes = ledger.into_changes();
        assert_eq!(changes.updated.len(), 1);
        assert_eq!(changes.updated[0].id, 2);
        assert!(changes.inserted.is_empty());
    }

    #[test]
    fn test_last_match_ends_takes_latest() {
        let early = Utc::now() - chrono::Duration::minutes(30);
        let late = Utc::now();
        let mut first = singles(1, A, B, MatchStatus::Completed);
        first.ended_at = Some(early);
        let mut second = singles(2, A, C, MatchStatus::Cancelled);
        second.ended_at = Some(late);

        let ledger = EventLedger::new(1, 2, vec![first, second]);
        let ends = ledger.last_match_ends();
        assert_eq!(ends[&A], late);
        assert_eq!(ends[&B], early);
    }
}
