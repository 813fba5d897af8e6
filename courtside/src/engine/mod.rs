//! Matchmaking engine facade.
//!
//! [`MatchmakingManager`] authorizes the caller against the event, then
//! drives the participant pool, pairing algorithm, court registry, lifecycle
//! manager and override coordinator.

pub mod manager;
pub mod models;

pub use manager::MatchmakingManager;
pub use models::{
    CourtStatus, EngineDefaults, GenerateOptions, GenerationReport, MatchmakingStatus, SavedMatch,
};
