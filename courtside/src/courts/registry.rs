//! Court occupancy derived from match state.
//!
//! A court is occupied while exactly one match holding its number is
//! Scheduled or Ongoing. The registry keeps no storage of its own; it checks
//! and claims courts inside a store transaction so that check-and-occupy is a
//! single step per event.

use serde::Serialize;
use std::sync::Arc;

use crate::error::{MatchmakingError, MatchmakingResult};
use crate::matches::ledger::EventLedger;
use crate::matches::models::{EventId, Match, MatchId, MatchStatus};
use crate::pool::models::{EventContext, PlayerRef};
use crate::store::MatchStore;

/// Occupancy of one court
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourtSlot {
    pub court_number: u32,
    pub occupied: bool,
    pub match_id: Option<MatchId>,
    pub status: Option<MatchStatus>,
    pub players: Vec<PlayerRef>,
}

/// Per-court occupancy for courts `1..=max_courts`
pub fn court_occupancy(max_courts: u32, matches: &[Match]) -> Vec<CourtSlot> {
    (1..=max_courts)
        .map(|court_number| {
            match matches
                .iter()
                .find(|m| m.occupied_court() == Some(court_number))
            {
                Some(m) => CourtSlot {
                    court_number,
                    occupied: true,
                    match_id: Some(m.id),
                    status: Some(m.status),
                    players: m.players().copied().collect(),
                },
                None => CourtSlot {
                    court_number,
                    occupied: false,
                    match_id: None,
                    status: None,
                    players: Vec::new(),
                },
            }
        })
        .collect()
}

impl EventLedger {
    /// Reject court numbers outside `[1, max_courts]`
    pub fn check_court_range(&self, court: u32) -> MatchmakingResult<()> {
        if court == 0 || court > self.max_courts() {
            return Err(MatchmakingError::CourtOutOfRange {
                court,
                max_courts: self.max_courts(),
            });
        }
        Ok(())
    }

    /// Match currently holding a court
    pub fn court_holder(&self, court: u32) -> Option<MatchId> {
        self.matches()
            .iter()
            .find(|m| m.occupied_court() == Some(court))
            .map(|m| m.id)
    }

    pub fn is_court_free(&self, court: u32) -> bool {
        self.court_holder(court).is_none()
    }

    /// Claim a court for a Pending match and move it to Scheduled.
    ///
    /// On any failure the match keeps its status and court.
    pub(crate) fn occupy_court(&mut self, court: u32, match_id: MatchId) -> MatchmakingResult<&Match> {
        self.check_court_range(court)?;

        let current = self.find(match_id)?.status;
        if current != MatchStatus::Pending {
            return Err(MatchmakingError::InvalidTransition {
                match_id,
                from: current,
                action: "assign a court to",
            });
        }

        if let Some(held_by) = self.court_holder(court) {
            return Err(MatchmakingError::CourtInUse { court, held_by });
        }

        let m = self.transition(match_id, MatchStatus::Scheduled, "assign a court to")?;
        m.court_number = Some(court);
        Ok(m)
    }

    /// Return a Scheduled match to Pending, freeing its court.
    pub(crate) fn revoke_court(&mut self, match_id: MatchId) -> MatchmakingResult<&Match> {
        let m = self.transition(match_id, MatchStatus::Pending, "revoke the court of")?;
        m.court_number = None;
        Ok(m)
    }

    /// Free a court by revoking its Scheduled holder.
    ///
    /// Ongoing holders must be ended or cancelled instead.
    pub(crate) fn release_court(&mut self, court: u32) -> MatchmakingResult<Option<&Match>> {
        self.check_court_range(court)?;
        match self.court_holder(court) {
            Some(match_id) => self.revoke_court(match_id).map(Some),
            None => Ok(None),
        }
    }
}

/// Query/validation facade over court occupancy
pub struct CourtRegistry<S> {
    store: Arc<S>,
}

impl<S> Clone for CourtRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: MatchStore> CourtRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Snapshot read; may be stale by the time the caller acts on it
    pub async fn is_court_free(&self, event: &EventContext, court: u32) -> MatchmakingResult<bool> {
        let matches = self.store.snapshot(event.id).await?;
        let ledger = EventLedger::new(event.id, event.max_courts, matches);
        ledger.check_court_range(court)?;
        Ok(ledger.is_court_free(court))
    }

    /// Atomically occupy a court for a Pending match
    pub async fn occupy(
        &self,
        event: &EventContext,
        court: u32,
        match_id: MatchId,
    ) -> MatchmakingResult<Match> {
        let committed = self
            .store
            .transact(event.id, event.max_courts, move |ledger| {
                ledger.occupy_court(court, match_id).cloned()
            })
            .await;

        match committed {
            Ok(committed) => {
                log::info!(
                    target: "audit",
                    "Court {} assigned to match {} in event {}",
                    court,
                    match_id,
                    event.id
                );
                Ok(committed.value)
            }
            Err(e) => {
                if let MatchmakingError::CourtInUse { held_by, .. } = &e {
                    log::info!(
                        "Court {} in event {} refused for match {}: held by match {}",
                        court,
                        event.id,
                        match_id,
                        held_by
                    );
                }
                Err(e)
            }
        }
    }

    /// Free a court held by a Scheduled match; returns the reverted match
    pub async fn release(&self, event: &EventContext, court: u32) -> MatchmakingResult<Option<Match>> {
        let committed = self
            .store
            .transact(event.id, event.max_courts, move |ledger| {
                Ok(ledger.release_court(court)?.cloned())
            })
            .await?;
        if let Some(m) = &committed.value {
            log::info!(
                target: "audit",
                "Court {} released by match {} in event {}",
                court,
                m.id,
                event.id
            );
        }
        Ok(committed.value)
    }

    /// Per-court occupancy snapshot
    pub async fn occupancy(&self, event_id: EventId, max_courts: u32) -> MatchmakingResult<Vec<CourtSlot>> {
        let matches = self.store.snapshot(event_id).await?;
        Ok(court_occupancy(max_courts, &matches))
    }
}

/// Lowest-numbered free court
pub fn first_free_court(max_courts: u32, matches: &[Match]) -> Option<u32> {
    court_occupancy(max_courts, matches)
        .into_iter()
        .find(|slot| !slot.occupied)
        .map(|slot| slot.court_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::ledger::fixtures::singles;

    const A: PlayerRef = PlayerRef::User(1);
    const B: PlayerRef = PlayerRef::User(2);
    const C: PlayerRef = PlayerRef::User(3);
    const D: PlayerRef = PlayerRef::User(4);

    fn ledger() -> EventLedger {
        EventLedger::new(
            1,
            2,
            vec![
                singles(1, A, B, MatchStatus::Pending),
                singles(2, C, D, MatchStatus::Pending),
            ],
        )
    }

    #[test]
    fn test_occupy_moves_match_to_scheduled() {
        let mut ledger = ledger();
        let m = ledger.occupy_court(1, 1).unwrap();
        assert_eq!(m.status, MatchStatus::Scheduled);
        assert_eq!(m.court_number, Some(1));
        assert_eq!(ledger.court_holder(1), Some(1));
    }

    #[test]
    fn test_second_occupant_gets_court_in_use() {
        let mut ledger = ledger();
        ledger.occupy_court(1, 1).unwrap();
        let err = ledger.occupy_court(1, 2).unwrap_err();
        assert!(matches!(err, MatchmakingError::CourtInUse { court: 1, held_by: 1 }));
        let b = ledger.find(2).unwrap();
        assert_eq!(b.status, MatchStatus::Pending);
        assert_eq!(b.court_number, None);
    }

    #[test]
    fn test_court_out_of_range() {
        let mut ledger = ledger();
        assert!(matches!(
            ledger.occupy_court(0, 1).unwrap_err(),
            MatchmakingError::CourtOutOfRange { court: 0, .. }
        ));
        assert!(matches!(
            ledger.occupy_court(3, 1).unwrap_err(),
            MatchmakingError::CourtOutOfRange { court: 3, max_courts: 2 }
        ));
    }

    #[test]
    fn test_only_pending_matches_take_courts() {
        let mut ledger = ledger();
        ledger.occupy_court(1, 1).unwrap();
        let err = ledger.occupy_court(2, 1).unwrap_err();
        assert!(matches!(
            err,
            MatchmakingError::InvalidTransition { from: MatchStatus::Scheduled, .. }
        ));
        assert_eq!(ledger.find(1).unwrap().court_number, Some(1));
    }

    #[test]
    fn test_completed_match_frees_court() {
        let mut done = singles(3, A, B, MatchStatus::Completed);
        done.court_number = Some(1);
        let mut ledger = EventLedger::new(1, 2, vec![done, singles(4, C, D, MatchStatus::Pending)]);
        assert!(ledger.is_court_free(1));
        ledger.occupy_court(1, 4).unwrap();
    }

    #[test]
    fn test_release_reverts_scheduled_holder() {
        let mut ledger = ledger();
        ledger.occupy_court(2, 1).unwrap();
        let released = ledger.release_court(2).unwrap().cloned().unwrap();
        assert_eq!(released.status, MatchStatus::Pending);
        assert_eq!(released.court_number, None);
        assert!(ledger.is_court_free(2));
        assert!(ledger.release_court(2).unwrap().is_none());
    }

    #[test]
    fn test_release_refuses_ongoing_holder() {
        let mut ongoing = singles(1, A, B, MatchStatus::Ongoing);
        ongoing.court_number = Some(1);
        let mut ledger = EventLedger::new(1, 2, vec![ongoing]);
        let err = ledger.release_court(1).unwrap_err();
        assert!(matches!(
            err,
            MatchmakingError::InvalidTransition { from: MatchStatus::Ongoing, .. }
        ));
    }

    #[test]
    fn test_court_occupancy_view() {
        let mut ledger = ledger();
        ledger.occupy_court(2, 2).unwrap();
        let view = court_occupancy(2, ledger.matches());
        assert_eq!(view.len(), 2);
        assert!(!view[0].occupied);
        assert_eq!(view[1].match_id, Some(2));
        assert_eq!(view[1].players, vec![C, D]);
        assert_eq!(first_free_court(2, ledger.matches()), Some(1));
    }
}
