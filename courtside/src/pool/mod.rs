//! Participant pool: the uniform `Player` view over registrants and guests.

pub mod directory;
pub mod models;
pub mod postgres;

pub use directory::{
    DirectorySeed, EventDirectory, GuestDirectory, InMemoryEventDirectory, InMemoryGuestDirectory,
};
pub use models::{
    EventContext, EventStatus, GuestPlayer, Player, PlayerOrigin, PlayerRef, PoolEntry, Registrant,
    RegistrationStatus,
};
pub use postgres::PgDirectory;

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::{MatchmakingError, MatchmakingResult};
use crate::matches::ledger::EventLedger;
use crate::matches::models::EventId;

/// Registrants and guests of one event as read from the directories
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub registrants: Vec<Registrant>,
    pub guests: Vec<GuestPlayer>,
}

impl Roster {
    fn registrant_player(r: &Registrant) -> Player {
        Player {
            id: PlayerRef::User(r.user_id),
            origin: PlayerOrigin::Registered,
            name: r.name.clone(),
            skill_rating: r.skill_rating,
            matches_played: r.matches_played,
        }
    }

    fn guest_player(g: &GuestPlayer) -> Player {
        Player {
            id: PlayerRef::Guest(g.id),
            origin: PlayerOrigin::Guest,
            name: g.name.clone(),
            skill_rating: g.estimated_mmr,
            matches_played: g.matches_played,
        }
    }

    /// Eligible participants with the time they joined the pool
    fn candidates(&self, now: DateTime<Utc>) -> impl Iterator<Item = (Player, DateTime<Utc>)> + '_ {
        let registered = self
            .registrants
            .iter()
            .filter(|r| r.status.is_matchable())
            .map(|r| (Self::registrant_player(r), r.registered_at));
        let guests = self
            .guests
            .iter()
            .filter(move |g| g.is_eligible(now))
            .map(|g| (Self::guest_player(g), g.created_at));
        registered.chain(guests)
    }

    /// Resolve a reference to an eligible player, ignoring current bookings
    pub fn lookup(&self, player: &PlayerRef, now: DateTime<Utc>) -> Option<Player> {
        match player {
            PlayerRef::User(id) => self
                .registrants
                .iter()
                .find(|r| r.user_id == *id && r.status.is_matchable())
                .map(Self::registrant_player),
            PlayerRef::Guest(id) => self
                .guests
                .iter()
                .find(|g| g.id == *id && g.is_eligible(now))
                .map(Self::guest_player),
        }
    }

    /// Eligible players not bound to a non-terminal match, longest-waiting first
    pub fn eligible(&self, now: DateTime<Utc>, ledger: &EventLedger) -> Vec<PoolEntry> {
        let bound = ledger.bound_players();
        let last_ends = ledger.last_match_ends();

        let mut entries: Vec<PoolEntry> = self
            .candidates(now)
            .filter(|(player, _)| !bound.contains(&player.id))
            .map(|(player, joined_at)| {
                let waiting_since = last_ends
                    .get(&player.id)
                    .map_or(joined_at, |ended| (*ended).max(joined_at));
                PoolEntry {
                    player,
                    waiting_since,
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            a.waiting_since
                .cmp(&b.waiting_since)
                .then_with(|| a.player.id.cmp(&b.player.id))
        });
        entries
    }
}

/// Adapter over the event and guest directories
#[derive(Clone)]
pub struct ParticipantPool {
    events: Arc<dyn EventDirectory>,
    guests: Arc<dyn GuestDirectory>,
}

impl ParticipantPool {
    pub fn new(events: Arc<dyn EventDirectory>, guests: Arc<dyn GuestDirectory>) -> Self {
        Self { events, guests }
    }

    /// Load the event context, failing with `EventNotFound`
    pub async fn event(&self, event_id: EventId) -> MatchmakingResult<EventContext> {
        self.events
            .find_event(event_id)
            .await?
            .ok_or(MatchmakingError::EventNotFound(event_id))
    }

    pub async fn roster(&self, event_id: EventId) -> MatchmakingResult<Roster> {
        let registrants = self.events.registrants(event_id).await?;
        let guests = self.guests.guests_for_event(event_id).await?;
        Ok(Roster {
            registrants,
            guests,
        })
    }

    pub async fn mark_event_ongoing(&self, event_id: EventId) -> MatchmakingResult<()> {
        self.events.mark_event_ongoing(event_id).await
    }
}
