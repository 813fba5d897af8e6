//! Pairing algorithm: balanced 1v1 and 2v2 proposals from the pool.
//!
//! Pure functions only; persisting proposals is the engine's job.

pub mod algorithm;
pub mod models;

pub use algorithm::{generate_matches, sort_players};
pub use models::{DEFAULT_SKILL_TOLERANCE, MatchProposal, PairingOutcome, PairingParams};
