//! # Courtside
//!
//! Matchmaking and court assignment for live sports events.
//!
//! Given the checked-in participants of an event (registered users and
//! host-entered guests), the engine pairs players into balanced matches by
//! skill rating, allocates a fixed set of courts without double-booking, lets
//! the host swap players or reassign courts mid-event, and tracks every match
//! from creation to completion.
//!
//! ## Core Modules
//!
//! - [`pool`]: participant pool and the directory collaborators it reads
//! - [`pairing`]: deterministic skill-banded pairing
//! - [`courts`]: court occupancy derived from match state
//! - [`matches`]: the per-event ledger and the match lifecycle
//! - [`overrides`]: manual player swaps with an audit trail
//! - [`engine`]: authorized entry point tying the above together
//! - [`store`]: in-memory and PostgreSQL match storage
//!
//! ## Consistency
//!
//! Every write for an event runs inside [`store::MatchStore::transact`], which
//! serializes operations per event and commits all-or-nothing. Double-booking,
//! court exclusivity and lifecycle checks all happen inside that transaction.
//!
//! ## Example
//!
//! ```
//! use courtside::pairing::{PairingParams, generate_matches};
//! use courtside::pool::{Player, PlayerOrigin, PlayerRef};
//! use courtside::MatchMode;
//!
//! let players: Vec<Player> = [1000, 1100, 1200, 1300]
//!     .into_iter()
//!     .enumerate()
//!     .map(|(i, rating)| Player {
//!         id: PlayerRef::User(i as i64 + 1),
//!         origin: PlayerOrigin::Registered,
//!         name: format!("player{i}"),
//!         skill_rating: rating,
//!         matches_played: 0,
//!     })
//!     .collect();
//!
//! let params = PairingParams {
//!     mode: MatchMode::Singles,
//!     max_courts: 2,
//!     skill_tolerance: 200,
//! };
//! let outcome = generate_matches(players, &params).unwrap();
//! assert_eq!(outcome.proposals.len(), 2);
//! assert!(outcome.waiting.is_empty());
//! ```

/// Host principal verification.
pub mod auth;

/// Match completion notifications.
pub mod completion;

/// Court registry.
pub mod courts;

/// PostgreSQL connection pool and timeouts.
pub mod db;

/// Authorized matchmaking facade.
pub mod engine;

/// Error taxonomy.
pub mod error;

/// Matches, ledger and lifecycle.
pub mod matches;

/// Manual overrides.
pub mod overrides;

/// Pairing algorithm.
pub mod pairing;

/// Participant pool and directories.
pub mod pool;

/// Match storage.
pub mod store;

pub use auth::{Principal, TokenVerifier};
pub use completion::{ChannelSink, CompletionSink, LogSink, MatchCompleted};
pub use engine::{EngineDefaults, GenerateOptions, MatchmakingManager, SavedMatch};
pub use error::{ErrorKind, MatchmakingError, MatchmakingResult};
pub use matches::{EventId, Match, MatchId, MatchMode, MatchStatus};
pub use pool::{ParticipantPool, PlayerRef};
pub use store::{AnyMatchStore, InMemoryMatchStore, MatchStore, PgMatchStore};
