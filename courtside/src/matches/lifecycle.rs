//! Match lifecycle: pending → scheduled → ongoing → completed/cancelled.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::ledger::EventLedger;
use super::models::{Match, MatchId, MatchStatus};
use crate::completion::{CompletionSink, MatchCompleted};
use crate::courts::CourtRegistry;
use crate::error::{MatchmakingError, MatchmakingResult};
use crate::pool::models::EventContext;
use crate::store::MatchStore;

impl EventLedger {
    /// Scheduled → Ongoing
    pub(crate) fn start_match(&mut self, match_id: MatchId, now: DateTime<Utc>) -> MatchmakingResult<&Match> {
        let m = self.transition(match_id, MatchStatus::Ongoing, "start")?;
        m.started_at = Some(now);
        Ok(m)
    }

    /// Ongoing → Completed; the court frees as soon as the status leaves Ongoing
    pub(crate) fn end_match(&mut self, match_id: MatchId, now: DateTime<Utc>) -> MatchmakingResult<&Match> {
        let m = self.transition(match_id, MatchStatus::Completed, "end")?;
        m.ended_at = Some(now);
        Ok(m)
    }

    /// Any non-terminal status → Cancelled
    pub(crate) fn cancel_match(&mut self, match_id: MatchId, now: DateTime<Utc>) -> MatchmakingResult<&Match> {
        let current = self.find(match_id)?.status;
        if current.is_terminal() {
            return Err(MatchmakingError::MatchTerminal {
                match_id,
                status: current,
            });
        }
        let m = self.transition(match_id, MatchStatus::Cancelled, "cancel")?;
        m.ended_at = Some(now);
        Ok(m)
    }
}

/// Owns the per-match state machine
pub struct LifecycleManager<S> {
    store: Arc<S>,
    courts: CourtRegistry<S>,
    sink: Arc<dyn CompletionSink>,
}

impl<S> Clone for LifecycleManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            courts: self.courts.clone(),
            sink: self.sink.clone(),
        }
    }
}

impl<S: MatchStore> LifecycleManager<S> {
    pub fn new(store: Arc<S>, courts: CourtRegistry<S>, sink: Arc<dyn CompletionSink>) -> Self {
        Self { store, courts, sink }
    }

    /// Assign a court to a Pending match; the match stays Pending on failure
    pub async fn assign_court(
        &self,
        event: &EventContext,
        match_id: MatchId,
        court: u32,
    ) -> MatchmakingResult<Match> {
        self.courts.occupy(event, court, match_id).await
    }

    /// Return a Scheduled match to Pending without starting it
    pub async fn revoke_court(&self, event: &EventContext, match_id: MatchId) -> MatchmakingResult<Match> {
        let committed = self
            .store
            .transact(event.id, event.max_courts, move |ledger| {
                ledger.revoke_court(match_id).cloned()
            })
            .await?;
        log::info!(
            target: "audit",
            "Court assignment revoked for match {} in event {}",
            match_id,
            event.id
        );
        Ok(committed.value)
    }

    pub async fn start_match(&self, event: &EventContext, match_id: MatchId) -> MatchmakingResult<Match> {
        let now = Utc::now();
        let committed = self
            .store
            .transact(event.id, event.max_courts, move |ledger| {
                ledger.start_match(match_id, now).cloned()
            })
            .await?;
        log::info!(target: "audit", "Match {} in event {} started", match_id, event.id);
        Ok(committed.value)
    }

    /// End an Ongoing match and emit its completion notification
    pub async fn end_match(&self, event: &EventContext, match_id: MatchId) -> MatchmakingResult<Match> {
        let now = Utc::now();
        let committed = self
            .store
            .transact(event.id, event.max_courts, move |ledger| {
                ledger.end_match(match_id, now).cloned()
            })
            .await?;
        let ended = committed.value;
        log::info!(target: "audit", "Match {} in event {} completed", match_id, event.id);

        // The transition already committed; a sink failure must not undo it.
        if let Err(e) = self.sink.deliver(MatchCompleted::from_match(&ended, now)).await {
            log::error!(
                "Failed to deliver completion of match {} in event {}: {}",
                match_id,
                event.id,
                e
            );
        }
        Ok(ended)
    }

    pub async fn cancel_match(&self, event: &EventContext, match_id: MatchId) -> MatchmakingResult<Match> {
        let now = Utc::now();
        let committed = self
            .store
            .transact(event.id, event.max_courts, move |ledger| {
                ledger.cancel_match(match_id, now).cloned()
            })
            .await?;
        log::info!(target: "audit", "Match {} in event {} cancelled", match_id, event.id);
        Ok(committed.value)
    }
}
