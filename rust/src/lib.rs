//! Venue-aware event scheduling engine.
//!
//! Picks the subset of events that maximizes attendance, revenue, or a
//! normalized blend of both, such that:
//! 1. No two chosen events overlap in the same venue
//! 2. Every chosen event's prerequisites are chosen and finish before it starts
//!
//! The pipeline per run is: catalog indexing, dependency validation,
//! scoring, venue indexing, joint optimization, schedule reconstruction.
//! Runs share no state, so independent requests can be served in parallel.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod logging;
pub mod models;
pub mod optimizer;
#[cfg(feature = "python")]
mod python;
pub mod reconstruct;
pub mod scoring;
pub mod validation;
pub mod venue_index;

pub use config::EngineConfig;
pub use engine::{run_schedule, ScheduleError, Scheduler};
pub use models::{Event, EventId, Objective, ScheduleOutcome, ScheduleRequest, Score, Timestamp};
pub use scoring::{NormalizationBounds, ScoringModel, HYBRID_SCALE};
pub use validation::ValidationError;
