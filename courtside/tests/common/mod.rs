//! Shared setup for engine integration tests.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use courtside::completion::{ChannelSink, MatchCompleted};
use courtside::engine::{EngineDefaults, MatchmakingManager};
use courtside::pool::{
    EventContext, EventStatus, GuestPlayer, InMemoryEventDirectory, InMemoryGuestDirectory,
    ParticipantPool, Registrant, RegistrationStatus,
};
use courtside::{InMemoryMatchStore, Principal};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

pub const EVENT: i64 = 1;
pub const HOST: Principal = Principal {
    user_id: 100,
    is_admin: false,
};

pub struct Harness {
    pub manager: MatchmakingManager<InMemoryMatchStore>,
    pub events: Arc<InMemoryEventDirectory>,
    pub guests: Arc<InMemoryGuestDirectory>,
    pub completions: UnboundedReceiver<MatchCompleted>,
}

/// Event 1 hosted by user 100, with confirmed registrants `1..=n` rated as given
pub fn harness(ratings: &[i32], max_courts: u32) -> Harness {
    let events = Arc::new(InMemoryEventDirectory::new());
    let guests = Arc::new(InMemoryGuestDirectory::new());
    events
        .insert_event(EventContext {
            id: EVENT,
            host_id: HOST.user_id,
            max_courts,
            status: EventStatus::Open,
        })
        .unwrap();

    let base = Utc::now() - Duration::hours(1);
    for (i, rating) in ratings.iter().enumerate() {
        let user_id = i as i64 + 1;
        events
            .add_registrant(
                EVENT,
                Registrant {
                    user_id,
                    name: format!("player{user_id}"),
                    skill_rating: *rating,
                    matches_played: 0,
                    status: RegistrationStatus::CheckedIn,
                    registered_at: base + Duration::seconds(user_id),
                },
            )
            .unwrap();
    }

    let (sink, completions) = ChannelSink::new();
    let pool = ParticipantPool::new(events.clone(), guests.clone());
    let manager = MatchmakingManager::new(
        Arc::new(InMemoryMatchStore::new()),
        pool,
        Arc::new(sink),
        EngineDefaults::default(),
    );

    Harness {
        manager,
        events,
        guests,
        completions,
    }
}

pub fn guest(id: i64, mmr: i32) -> GuestPlayer {
    GuestPlayer {
        id,
        event_id: EVENT,
        name: format!("guest{id}"),
        estimated_mmr: mmr,
        matches_played: 0,
        created_at: Utc::now() - Duration::minutes(30),
        deleted_at: None,
        expires_at: None,
    }
}
