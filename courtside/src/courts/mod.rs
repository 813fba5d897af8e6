//! Court registry.

pub mod registry;

pub use registry::{CourtRegistry, CourtSlot, court_occupancy, first_free_court};
