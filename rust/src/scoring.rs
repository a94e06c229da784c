//! Per-event weights for each objective.
//!
//! Hybrid weights blend max-normalized attendance and revenue and are
//! scaled to integers so they accumulate exactly in the optimizer.

use crate::models::{Event, Objective, Score};

/// Fixed-point scale applied to hybrid blends (six decimal digits).
pub const HYBRID_SCALE: f64 = 1_000_000.0;

/// Catalog-wide maxima used to normalize hybrid weights.
///
/// Both bounds are floored at 1 so an all-zero column never divides by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizationBounds {
    pub max_attendance: u64,
    pub max_revenue: u64,
}

impl NormalizationBounds {
    pub fn from_events(events: &[Event]) -> Self {
        events.iter().fold(Self::default(), |bounds, e| Self {
            max_attendance: bounds.max_attendance.max(e.attendance),
            max_revenue: bounds.max_revenue.max(e.revenue),
        })
    }
}

impl Default for NormalizationBounds {
    fn default() -> Self {
        Self {
            max_attendance: 1,
            max_revenue: 1,
        }
    }
}

/// Scoring configuration for one run.
///
/// Built once before optimization; the bounds never change mid-run.
#[derive(Debug, Clone, Copy)]
pub struct ScoringModel {
    objective: Objective,
    bounds: NormalizationBounds,
}

impl ScoringModel {
    /// Create a model. A hybrid `alpha` outside `[0, 1]` is clamped.
    ///
    /// Non-finite `alpha` must be rejected by the caller.
    pub fn new(objective: Objective, bounds: NormalizationBounds) -> Self {
        let objective = match objective {
            Objective::Hybrid { alpha } => Objective::Hybrid {
                alpha: alpha.clamp(0.0, 1.0),
            },
            other => other,
        };
        Self { objective, bounds }
    }

    /// Convenience constructor computing bounds from the catalog.
    pub fn for_events(objective: Objective, events: &[Event]) -> Self {
        Self::new(objective, NormalizationBounds::from_events(events))
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn bounds(&self) -> NormalizationBounds {
        self.bounds
    }

    /// Weight of a single event under this model's objective.
    pub fn weight(&self, event: &Event) -> Score {
        match self.objective {
            Objective::Attendance => event.attendance,
            Objective::Revenue => event.revenue,
            Objective::Hybrid { alpha } => {
                let norm_att = event.attendance as f64 / self.bounds.max_attendance as f64;
                let norm_rev = event.revenue as f64 / self.bounds.max_revenue as f64;
                let blended = alpha * norm_att + (1.0 - alpha) * norm_rev;
                // `as` truncates toward zero and saturates
                (blended * HYBRID_SCALE) as Score
            }
        }
    }

    /// Weights of every event, indexed like the slice.
    pub fn weights(&self, events: &[Event]) -> Vec<Score> {
        events.iter().map(|e| self.weight(e)).collect()
    }
}
