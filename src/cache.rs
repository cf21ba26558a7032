//! Refresh-and-publish cycle: per-source state, the snapshot store, and the orchestrator.

pub mod orchestrator;
pub mod state;
pub mod store;
