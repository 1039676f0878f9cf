//! Bounded-concurrency batch scheduling.

/// Outcome aggregation and progress reporting.
pub mod report;
/// The slot-pool scheduler.
pub mod scheduler;
pub(crate) mod state;
