//! Override coordinator: manual player swaps with an audit trail.

pub mod coordinator;
pub mod models;

pub use coordinator::{OverrideCoordinator, PlayerOverride};
pub use models::{NewOverrideAudit, OverrideAudit};
