//! Matches, their per-event ledger and lifecycle.

pub mod ledger;
pub mod lifecycle;
pub mod models;

pub use ledger::{Booking, EventLedger, LedgerChanges};
pub use lifecycle::LifecycleManager;
pub use models::{EventId, Match, MatchId, MatchMode, MatchStatus, NewMatch, Slot};
