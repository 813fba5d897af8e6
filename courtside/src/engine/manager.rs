//! Matchmaking manager: the entry point for every host operation.

use chrono::Utc;
use std::sync::Arc;

use super::models::{
    CourtStatus, EngineDefaults, GenerateOptions, GenerationReport, MatchmakingStatus, SavedMatch,
};
use crate::auth::Principal;
use crate::completion::CompletionSink;
use crate::courts::{CourtRegistry, court_occupancy, first_free_court};
use crate::error::{MatchmakingError, MatchmakingResult};
use crate::matches::ledger::EventLedger;
use crate::matches::lifecycle::LifecycleManager;
use crate::matches::models::{EventId, Match, MatchId, MatchStatus, NewMatch};
use crate::overrides::{OverrideAudit, OverrideCoordinator, PlayerOverride};
use crate::pairing::{PairingParams, generate_matches};
use crate::pool::models::{EventContext, PlayerRef};
use crate::pool::ParticipantPool;
use crate::store::MatchStore;

/// Coordinates pool, pairing, courts, lifecycle and overrides for one store
pub struct MatchmakingManager<S> {
    store: Arc<S>,
    pool: ParticipantPool,
    courts: CourtRegistry<S>,
    lifecycle: LifecycleManager<S>,
    overrides: OverrideCoordinator<S>,
    defaults: EngineDefaults,
}

impl<S> Clone for MatchmakingManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            pool: self.pool.clone(),
            courts: self.courts.clone(),
            lifecycle: self.lifecycle.clone(),
            overrides: self.overrides.clone(),
            defaults: self.defaults,
        }
    }
}

impl<S: MatchStore> MatchmakingManager<S> {
    pub fn new(
        store: Arc<S>,
        pool: ParticipantPool,
        sink: Arc<dyn CompletionSink>,
        defaults: EngineDefaults,
    ) -> Self {
        let courts = CourtRegistry::new(store.clone());
        Self {
            lifecycle: LifecycleManager::new(store.clone(), courts.clone(), sink),
            overrides: OverrideCoordinator::new(store.clone()),
            courts,
            pool,
            store,
            defaults,
        }
    }

    pub fn defaults(&self) -> &EngineDefaults {
        &self.defaults
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Resolve the event and require the caller to be its host or an admin
    async fn authorize(&self, principal: &Principal, event_id: EventId) -> MatchmakingResult<EventContext> {
        let event = self.pool.event(event_id).await?;
        if !principal.can_manage(&event) {
            log::warn!(
                "User {} denied matchmaking access to event {}",
                principal.user_id,
                event_id
            );
            return Err(MatchmakingError::Forbidden {
                event_id,
                user_id: principal.user_id,
            });
        }
        Ok(event)
    }

    /// Current matches and waiting players
    pub async fn status(&self, principal: &Principal, event_id: EventId) -> MatchmakingResult<MatchmakingStatus> {
        let event = self.authorize(principal, event_id).await?;
        let roster = self.pool.roster(event_id).await?;
        let matches = self.store.snapshot(event_id).await?;

        let ledger = EventLedger::new(event_id, event.max_courts, matches);
        let waiting = roster.eligible(Utc::now(), &ledger);
        Ok(MatchmakingStatus {
            event_id,
            matches: ledger.matches().to_vec(),
            waiting,
        })
    }

    /// Pair the current pool and persist the proposals as Pending matches.
    ///
    /// Eligibility is recomputed inside the event transaction, so concurrent
    /// runs cannot book the same player twice.
    pub async fn generate(
        &self,
        principal: &Principal,
        event_id: EventId,
        options: GenerateOptions,
    ) -> MatchmakingResult<GenerationReport> {
        let event = self.authorize(principal, event_id).await?;
        let params = PairingParams {
            mode: options.mode.unwrap_or(self.defaults.mode),
            // Proposals beyond the event's courts could never be serviced
            max_courts: options
                .max_courts
                .map_or(i64::from(event.max_courts), |requested| {
                    requested.min(i64::from(event.max_courts))
                }),
            skill_tolerance: options.skill_tolerance.unwrap_or(self.defaults.skill_tolerance),
        };
        params.validate()?;

        let roster = self.pool.roster(event_id).await?;
        let duration = self.defaults.match_duration_minutes;
        let now = Utc::now();

        let result = self
            .store
            .transact(event_id, event.max_courts, move |ledger| {
                let players = roster
                    .eligible(now, ledger)
                    .into_iter()
                    .map(|entry| entry.player)
                    .collect();
                let outcome = generate_matches(players, &params)?;
                for proposal in &outcome.proposals {
                    ledger.stage(proposal.to_draft(event_id, duration, now))?;
                }
                Ok(outcome.waiting)
            })
            .await;

        let committed = match result {
            Ok(committed) => committed,
            Err(e @ MatchmakingError::InsufficientParticipants { .. }) => {
                log::debug!("Event {} cannot generate matches: {}", event_id, e);
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        log::info!(
            "Generated {} {} matches for event {} ({} waiting)",
            committed.inserted.len(),
            params.mode,
            event_id,
            committed.value.len()
        );
        Ok(GenerationReport {
            event_id,
            matches: committed.inserted,
            waiting: committed.value,
        })
    }

    /// Generate with default mode and tolerance
    pub async fn fair_matches(&self, principal: &Principal, event_id: EventId) -> MatchmakingResult<GenerationReport> {
        self.generate(principal, event_id, GenerateOptions::default()).await
    }

    /// Persist a host-supplied lineup and flag the event as ongoing
    pub async fn save_matches(
        &self,
        principal: &Principal,
        event_id: EventId,
        lineup: Vec<SavedMatch>,
    ) -> MatchmakingResult<Vec<Match>> {
        let event = self.authorize(principal, event_id).await?;
        if lineup.is_empty() {
            return Err(MatchmakingError::InvalidParameter {
                name: "matches",
                reason: "at least one match is required".to_string(),
            });
        }

        let roster = self.pool.roster(event_id).await?;
        let now = Utc::now();
        let mut drafts = Vec::with_capacity(lineup.len());
        for saved in lineup {
            let mode = saved.mode()?;
            if let Some(player) = saved
                .slot1
                .iter()
                .chain(saved.slot2.iter())
                .find(|p| roster.lookup(p, now).is_none())
            {
                return Err(MatchmakingError::PlayerNotEligible(*player));
            }
            drafts.push(NewMatch {
                event_id,
                mode,
                status: if saved.court_number.is_some() {
                    MatchStatus::Scheduled
                } else {
                    MatchStatus::Pending
                },
                slot1: saved.slot1,
                slot2: saved.slot2,
                court_number: saved.court_number,
                estimated_duration_minutes: self.defaults.match_duration_minutes,
                created_at: now,
            });
        }

        let committed = self
            .store
            .transact(event_id, event.max_courts, move |ledger| {
                for draft in drafts {
                    ledger.stage(draft)?;
                }
                Ok(())
            })
            .await?;

        // The lineup is committed; a directory failure here only delays the
        // event status change.
        if let Err(e) = self.pool.mark_event_ongoing(event_id).await {
            log::warn!("Failed to mark event {} ongoing: {}", event_id, e);
        }

        log::info!(
            "Saved {} host matches for event {}",
            committed.inserted.len(),
            event_id
        );
        Ok(committed.inserted)
    }

    /// Swap one player of a match
    pub async fn override_player(
        &self,
        principal: &Principal,
        event_id: EventId,
        match_id: MatchId,
        replace: PlayerRef,
        replacement: PlayerRef,
    ) -> MatchmakingResult<Match> {
        let event = self.authorize(principal, event_id).await?;
        let roster = self.pool.roster(event_id).await?;
        self.overrides
            .override_player(
                &event,
                &roster,
                PlayerOverride {
                    match_id,
                    replace,
                    replacement,
                    admin_id: principal.user_id,
                },
            )
            .await
    }

    pub async fn assign_court(
        &self,
        principal: &Principal,
        event_id: EventId,
        match_id: MatchId,
        court: u32,
    ) -> MatchmakingResult<Match> {
        let event = self.authorize(principal, event_id).await?;
        self.lifecycle.assign_court(&event, match_id, court).await
    }

    pub async fn revoke_court(&self, principal: &Principal, event_id: EventId, match_id: MatchId) -> MatchmakingResult<Match> {
        let event = self.authorize(principal, event_id).await?;
        self.lifecycle.revoke_court(&event, match_id).await
    }

    /// Free a court held by a Scheduled match
    pub async fn release_court(&self, principal: &Principal, event_id: EventId, court: u32) -> MatchmakingResult<Option<Match>> {
        let event = self.authorize(principal, event_id).await?;
        self.courts.release(&event, court).await
    }

    /// Per-court occupancy, pending queue and waiting list
    pub async fn court_status(&self, principal: &Principal, event_id: EventId) -> MatchmakingResult<CourtStatus> {
        let event = self.authorize(principal, event_id).await?;
        let roster = self.pool.roster(event_id).await?;
        let matches = self.store.snapshot(event_id).await?;

        let ledger = EventLedger::new(event_id, event.max_courts, matches);
        let waiting = roster.eligible(Utc::now(), &ledger);

        let mut pending: Vec<Match> = ledger
            .matches()
            .iter()
            .filter(|m| m.status == MatchStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(CourtStatus {
            event_id,
            max_courts: event.max_courts,
            courts: court_occupancy(event.max_courts, ledger.matches()),
            next_free_court: first_free_court(event.max_courts, ledger.matches()),
            pending,
            waiting,
        })
    }

    pub async fn start_match(&self, principal: &Principal, event_id: EventId, match_id: MatchId) -> MatchmakingResult<Match> {
        let event = self.authorize(principal, event_id).await?;
        self.lifecycle.start_match(&event, match_id).await
    }

    pub async fn end_match(&self, principal: &Principal, event_id: EventId, match_id: MatchId) -> MatchmakingResult<Match> {
        let event = self.authorize(principal, event_id).await?;
        self.lifecycle.end_match(&event, match_id).await
    }

    pub async fn cancel_match(&self, principal: &Principal, event_id: EventId, match_id: MatchId) -> MatchmakingResult<Match> {
        let event = self.authorize(principal, event_id).await?;
        self.lifecycle.cancel_match(&event, match_id).await
    }

    /// Override audit trail, oldest first
    pub async fn audit_log(&self, principal: &Principal, event_id: EventId) -> MatchmakingResult<Vec<OverrideAudit>> {
        self.authorize(principal, event_id).await?;
        self.store.audit_log(event_id).await
    }

    pub async fn health_check(&self) -> MatchmakingResult<()> {
        self.store.health_check().await
    }
}
