//! In-memory match store for development and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::{Mutex, RwLock};

use super::{Committed, MatchStore};
use crate::error::MatchmakingResult;
use crate::matches::ledger::EventLedger;
use crate::matches::models::{EventId, Match};
use crate::overrides::models::OverrideAudit;

#[derive(Debug, Default)]
struct EventRecords {
    matches: Vec<Match>,
    audit: Vec<OverrideAudit>,
}

/// Store keeping each event's matches behind its own mutex
#[derive(Debug)]
pub struct InMemoryMatchStore {
    events: RwLock<HashMap<EventId, Arc<Mutex<EventRecords>>>>,
    next_match_id: AtomicI64,
    next_audit_id: AtomicI64,
}

impl Default for InMemoryMatchStore {
    fn default() -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
            next_match_id: AtomicI64::new(1),
            next_audit_id: AtomicI64::new(1),
        }
    }
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn records(&self, event_id: EventId) -> Arc<Mutex<EventRecords>> {
        if let Some(records) = self.events.read().await.get(&event_id) {
            return records.clone();
        }
        self.events
            .write()
            .await
            .entry(event_id)
            .or_default()
            .clone()
    }
}

#[async_trait]
impl MatchStore for InMemoryMatchStore {
    async fn snapshot(&self, event_id: EventId) -> MatchmakingResult<Vec<Match>> {
        let records = self.records(event_id).await;
        let guard = records.lock().await;
        Ok(guard.matches.clone())
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
        let records = self.records(event_id).await;
        let mut guard = records.lock().await;

        let mut ledger = EventLedger::new(event_id, max_courts, guard.matches.clone());
        let value = op(&mut ledger)?;
        let changes = ledger.into_changes();

        for updated in changes.updated {
            if let Some(slot) = guard.matches.iter_mut().find(|m| m.id == updated.id) {
                *slot = updated;
            }
        }

        let mut inserted = Vec::with_capacity(changes.inserted.len());
        for draft in changes.inserted {
            let id = self.next_match_id.fetch_add(1, Ordering::SeqCst);
            let m = draft.into_match(id);
            guard.matches.push(m.clone());
            inserted.push(m);
        }

        for entry in changes.audit {
            let id = self.next_audit_id.fetch_add(1, Ordering::SeqCst);
            guard.audit.push(entry.into_audit(id));
        }

        Ok(Committed { value, inserted })
    }

    async fn audit_log(&self, event_id: EventId) -> MatchmakingResult<Vec<OverrideAudit>> {
        let records = self.records(event_id).await;
        let guard = records.lock().await;
        Ok(guard.audit.clone())
    }

    async fn health_check(&self) -> MatchmakingResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatchmakingError;
    use crate::matches::ledger::fixtures::draft;
    use crate::matches::models::MatchStatus;
    use crate::pool::models::PlayerRef;

    const A: PlayerRef = PlayerRef::User(1);
    const B: PlayerRef = PlayerRef::User(2);

    #[tokio::test]
    async fn test_transact_assigns_ids() {
        let store = InMemoryMatchStore::new();
        let committed = store
            .transact(1, 2, |ledger| ledger.stage(draft(A, B, None)))
            .await
            .unwrap();
        assert_eq!(committed.inserted.len(), 1);
        assert_eq!(committed.inserted[0].id, 1);

        let snapshot = store.snapshot(1).await.unwrap();
        assert_eq!(snapshot, committed.inserted);
        assert!(store.snapshot(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_transaction_writes_nothing() {
        let store = InMemoryMatchStore::new();
        let result = store
            .transact(1, 2, |ledger| {
                ledger.stage(draft(A, B, None))?;
                ledger.stage(draft(B, PlayerRef::User(3), None))
            })
            .await;
        assert!(matches!(result, Err(MatchmakingError::PlayerAlreadyBooked { .. })));
        assert!(store.snapshot(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_updates_are_written_back() {
        let store = InMemoryMatchStore::new();
        let committed = store
            .transact(1, 2, |ledger| ledger.stage(draft(A, B, None)))
            .await
            .unwrap();
        let id = committed.inserted[0].id;

        store
            .transact(1, 2, move |ledger| {
                ledger.transition(id, MatchStatus::Cancelled, "cancel").map(|_| ())
            })
            .await
            .unwrap();
        assert_eq!(store.snapshot(1).await.unwrap()[0].status, MatchStatus::Cancelled);
    }
}
