//! Directory collaborator traits for dependency injection.
//!
//! The engine never owns events, registrations or guests. It reads them
//! through these traits so storage schema stays outside the algorithms.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use super::models::{EventContext, EventStatus, GuestId, GuestPlayer, Registrant, RegistrationStatus, UserId};
use crate::error::{MatchmakingError, MatchmakingResult};

/// Read access to events and their registered participants
#[async_trait]
pub trait EventDirectory: Send + Sync {
    /// Find event by ID
    async fn find_event(&self, event_id: i64) -> MatchmakingResult<Option<EventContext>>;

    /// All registrants of an event, regardless of status
    async fn registrants(&self, event_id: i64) -> MatchmakingResult<Vec<Registrant>>;

    /// Flag the event as ongoing once the host commits a lineup
    async fn mark_event_ongoing(&self, event_id: i64) -> MatchmakingResult<()>;
}

/// Read access to host-entered guest players
#[async_trait]
pub trait GuestDirectory: Send + Sync {
    /// All guests of an event, including soft-deleted and expired ones
    async fn guests_for_event(&self, event_id: i64) -> MatchmakingResult<Vec<GuestPlayer>>;
}

fn poisoned<T>(_: T) -> MatchmakingError {
    MatchmakingError::Directory("directory lock poisoned".to_string())
}

/// In-memory event directory for development and tests
#[derive(Default)]
pub struct InMemoryEventDirectory {
    events: RwLock<HashMap<i64, EventContext>>,
    registrants: RwLock<HashMap<i64, Vec<Registrant>>>,
}

impl InMemoryEventDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_event(&self, event: EventContext) -> MatchmakingResult<()> {
        self.events.write().map_err(poisoned)?.insert(event.id, event);
        Ok(())
    }

    pub fn add_registrant(&self, event_id: i64, registrant: Registrant) -> MatchmakingResult<()> {
        let mut registrants = self.registrants.write().map_err(poisoned)?;
        let list = registrants.entry(event_id).or_default();
        list.retain(|r| r.user_id != registrant.user_id);
        list.push(registrant);
        Ok(())
    }

    /// Change a registrant's status (check-in, cancellation)
    pub fn set_registration_status(
        &self,
        event_id: i64,
        user_id: UserId,
        status: RegistrationStatus,
    ) -> MatchmakingResult<()> {
        let mut registrants = self.registrants.write().map_err(poisoned)?;
        if let Some(r) = registrants
            .get_mut(&event_id)
            .and_then(|list| list.iter_mut().find(|r| r.user_id == user_id))
        {
            r.status = status;
        }
        Ok(())
    }

    pub fn event_status(&self, event_id: i64) -> Option<EventStatus> {
        self.events
            .read()
            .ok()
            .and_then(|events| events.get(&event_id).map(|e| e.status))
    }
}

#[async_trait]
impl EventDirectory for InMemoryEventDirectory {
    async fn find_event(&self, event_id: i64) -> MatchmakingResult<Option<EventContext>> {
        Ok(self.events.read().map_err(poisoned)?.get(&event_id).cloned())
    }

    async fn registrants(&self, event_id: i64) -> MatchmakingResult<Vec<Registrant>> {
        Ok(self
            .registrants
            .read()
            .map_err(poisoned)?
            .get(&event_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn mark_event_ongoing(&self, event_id: i64) -> MatchmakingResult<()> {
        let mut events = self.events.write().map_err(poisoned)?;
        let event = events
            .get_mut(&event_id)
            .ok_or(MatchmakingError::EventNotFound(event_id))?;
        event.status = EventStatus::Ongoing;
        Ok(())
    }
}

/// In-memory guest directory for development and tests
#[derive(Default)]
pub struct InMemoryGuestDirectory {
    guests: RwLock<HashMap<i64, Vec<GuestPlayer>>>,
}

impl InMemoryGuestDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_guest(&self, guest: GuestPlayer) -> MatchmakingResult<()> {
        let mut guests = self.guests.write().map_err(poisoned)?;
        let list = guests.entry(guest.event_id).or_default();
        list.retain(|g| g.id != guest.id);
        list.push(guest);
        Ok(())
    }

    pub fn soft_delete(
        &self,
        event_id: i64,
        guest_id: GuestId,
        at: chrono::DateTime<chrono::Utc>,
    ) -> MatchmakingResult<()> {
        let mut guests = self.guests.write().map_err(poisoned)?;
        if let Some(g) = guests
            .get_mut(&event_id)
            .and_then(|list| list.iter_mut().find(|g| g.id == guest_id))
        {
            g.deleted_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl GuestDirectory for InMemoryGuestDirectory {
    async fn guests_for_event(&self, event_id: i64) -> MatchmakingResult<Vec<GuestPlayer>> {
        Ok(self
            .guests
            .read()
            .map_err(poisoned)?
            .get(&event_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Registrant row in a seed file
#[derive(Debug, Deserialize)]
pub struct SeedRegistrant {
    pub event_id: i64,
    #[serde(flatten)]
    pub registrant: Registrant,
}

/// JSON fixture used to populate the in-memory directories
#[derive(Debug, Default, Deserialize)]
pub struct DirectorySeed {
    #[serde(default)]
    pub events: Vec<EventContext>,
    #[serde(default)]
    pub registrants: Vec<SeedRegistrant>,
    #[serde(default)]
    pub guests: Vec<GuestPlayer>,
}

impl DirectorySeed {
    /// Read a seed file from disk
    pub fn load(path: &Path) -> MatchmakingResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            MatchmakingError::Directory(format!("cannot read seed {}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| MatchmakingError::Directory(format!("invalid seed file: {e}")))
    }

    /// Populate both directories
    pub fn apply(
        self,
        events: &InMemoryEventDirectory,
        guests: &InMemoryGuestDirectory,
    ) -> MatchmakingResult<()> {
        for event in self.events {
            events.insert_event(event)?;
        }
        for seed in self.registrants {
            events.add_registrant(seed.event_id, seed.registrant)?;
        }
        for guest in self.guests {
            guests.add_guest(guest)?;
        }
        Ok(())
    }
}
