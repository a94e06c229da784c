//! Core data types for the event scheduling engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Event identifier, unique within one catalog.
pub type EventId = i64;

/// Point in time. Units are opaque to the engine; only ordering matters.
pub type Timestamp = i64;

/// Objective value accumulated by the optimizer.
pub type Score = u64;

/// A time-bounded event bound to a venue.
///
/// The event occupies its venue over the half-open interval `[start, end)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub start: Timestamp,
    pub end: Timestamp,
    pub attendance: u64,
    pub revenue: u64,
    pub venue: String,
    /// Prerequisite event IDs. Duplicates are tolerated and counted once.
    #[serde(default)]
    pub prerequisites: Vec<EventId>,
}

impl Event {
    pub fn new(
        id: EventId,
        start: Timestamp,
        end: Timestamp,
        attendance: u64,
        revenue: u64,
        venue: impl Into<String>,
    ) -> Self {
        Self {
            id,
            start,
            end,
            attendance,
            revenue,
            venue: venue.into(),
            prerequisites: Vec::new(),
        }
    }

    /// Builder-style helper to declare prerequisites.
    pub fn with_prerequisites(mut self, prerequisites: impl IntoIterator<Item = EventId>) -> Self {
        self.prerequisites = prerequisites.into_iter().collect();
        self
    }

    /// True when both events share a venue and their intervals overlap.
    ///
    /// Back-to-back events (`a.end == b.start`) do not conflict.
    pub fn conflicts_with(&self, other: &Event) -> bool {
        self.venue == other.venue && self.start < other.end && other.start < self.end
    }
}

/// What the optimizer maximizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Objective {
    /// Sum of attendance.
    #[default]
    Attendance,
    /// Sum of revenue.
    Revenue,
    /// Normalized blend: `alpha` weights attendance, `1 - alpha` weights revenue.
    Hybrid { alpha: f64 },
}

impl Objective {
    pub fn name(&self) -> &'static str {
        match self {
            Objective::Attendance => "attendance",
            Objective::Revenue => "revenue",
            Objective::Hybrid { .. } => "hybrid",
        }
    }
}

/// A scheduling request: the catalog plus the objective to maximize.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub events: Vec<Event>,
    #[serde(default)]
    pub objective: Objective,
}

/// A successful scheduling run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    /// Sum of the chosen events' weights under the requested objective.
    pub total_score: Score,
    /// Chosen events ordered by end time (ties by start, then id).
    pub events: Vec<Event>,
    /// Highest-scoring event of the DP pass, if any event scored above zero.
    pub best_terminal: Option<EventId>,
    /// False only when the exact search hit its node limit.
    pub proven_optimal: bool,
    pub algorithm_metadata: HashMap<String, String>,
}

impl ScheduleOutcome {
    /// Outcome for a catalog with nothing worth scheduling.
    pub fn empty() -> Self {
        Self {
            proven_optimal: true,
            ..Self::default()
        }
    }

    /// IDs of the chosen events, in schedule order.
    pub fn event_ids(&self) -> Vec<EventId> {
        self.events.iter().map(|e| e.id).collect()
    }
}
