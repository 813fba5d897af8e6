//! Match storage with per-event transactions.
//!
//! Reads are plain snapshots. Writes go through [`MatchStore::transact`],
//! which hands a synchronous operation an [`EventLedger`] holding every match
//! of the event. Transactions for the same event never interleave, and a
//! failed operation writes nothing.

use async_trait::async_trait;

use crate::error::MatchmakingResult;
use crate::matches::ledger::EventLedger;
use crate::matches::models::{EventId, Match};
use crate::overrides::models::OverrideAudit;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryMatchStore;
pub use postgres::PgMatchStore;

/// Result of a committed transaction
#[derive(Debug)]
pub struct Committed<T> {
    /// Value returned by the ledger operation
    pub value: T,
    /// Matches created by the transaction, with their assigned IDs
    pub inserted: Vec<Match>,
}

/// Trait for match storage backends
#[async_trait]
pub trait MatchStore: Send + Sync + 'static {
    /// All matches of an event, possibly stale by the time they are used
    async fn snapshot(&self, event_id: EventId) -> MatchmakingResult<Vec<Match>>;

    /// Run `op` against the event's ledger and commit its changes atomically.
    ///
    /// If `op` fails nothing is written and its error is returned unchanged.
    async fn transact<T, F>(
        &self,
        event_id: EventId,
        max_courts: u32,
        op: F,
    ) -> MatchmakingResult<Committed<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut EventLedger) -> MatchmakingResult<T> + Send + 'static;

    /// Override audit trail of an event, oldest first
    async fn audit_log(&self, event_id: EventId) -> MatchmakingResult<Vec<OverrideAudit>>;

    /// Check the backend is reachable
    async fn health_check(&self) -> MatchmakingResult<()>;
}

/// Runtime-selected storage backend
pub enum AnyMatchStore {
    Memory(InMemoryMatchStore),
    Postgres(PgMatchStore),
}

impl AnyMatchStore {
    pub fn backend_name(&self) -> &'static str {
        match self {
            AnyMatchStore::Memory(_) => "memory",
            AnyMatchStore::Postgres(_) => "postgres",
        }
    }
}

#[async_trait]
impl MatchStore for AnyMatchStore {
    async fn snapshot(&self, event_id: EventId) -> MatchmakingResult<Vec<Match>> {
        match self {
            AnyMatchStore::Memory(store) => store.snapshot(event_id).await,
            AnyMatchStore::Postgres(store) => store.snapshot(event_id).await,
        }
    }

    async fn transact<T, F>(
        &self,
        event_id: EventId,
        max_courts: u32,
        op: F,
    ) -> MatchmakingResult<Committed<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut EventLedger) -> MatchmakingResult<T> + Send + 'static,
    {
        match self {
            AnyMatchStore::Memory(store) => store.transact(event_id, max_courts, op).await,
            AnyMatchStore::Postgres(store) => store.transact(event_id, max_courts, op).await,
        }
    }

    async fn audit_log(&self, event_id: EventId) -> MatchmakingResult<Vec<OverrideAudit>> {
        match self {
            AnyMatchStore::Memory(store) => store.audit_log(event_id).await,
            AnyMatchStore::Postgres(store) => store.audit_log(event_id).await,
        }
    }

    async fn health_check(&self) -> MatchmakingResult<()> {
        match self {
            AnyMatchStore::Memory(store) => store.health_check().await,
            AnyMatchStore::Postgres(store) => store.health_check().await,
        }
    }
}

impl From<InMemoryMatchStore> for AnyMatchStore {
    fn from(store: InMemoryMatchStore) -> Self {
        AnyMatchStore::Memory(store)
    }
}

impl From<PgMatchStore> for AnyMatchStore {
    fn from(store: PgMatchStore) -> Self {
        AnyMatchStore::Postgres(store)
    }
}
