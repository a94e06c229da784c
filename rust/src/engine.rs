//! Scheduling engine: validation, scoring, optimization, reconstruction.

use std::collections::HashMap;
use thiserror::Error;

use crate::catalog::EventCatalog;
use crate::config::EngineConfig;
use crate::log_changes;
use crate::models::{Event, Objective, ScheduleOutcome, ScheduleRequest, Score};
use crate::optimizer::JointOptimizer;
use crate::reconstruct::{order_by_finish, reconstruct};
use crate::scoring::ScoringModel;
use crate::validation::{validate, ValidationError};

/// Errors that can occur during a scheduling run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Hybrid alpha must be a finite number, got {0}")]
    InvalidAlpha(f64),
    #[error("Total event weight exceeds the score range")]
    ScoreOverflow,
}

/// Stateless scheduler. Every run rebuilds its bounds, index and tables, so
/// one instance may be shared across threads.
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    config: EngineConfig,
}

impl Scheduler {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Compute the best feasible schedule for `events`.
    ///
    /// # Returns
    /// * `Ok(ScheduleOutcome)` with the chosen events ordered by finish time;
    ///   an empty catalog yields an empty schedule with score 0
    /// * `Err(ScheduleError)` if the catalog is structurally invalid
    pub fn run(&self, events: &[Event]) -> Result<ScheduleOutcome, ScheduleError> {
        let verbosity = self.config.verbosity;
        let objective = self.checked_objective()?;

        let mut metadata = HashMap::new();
        metadata.insert("algorithm".to_string(), "dp_branch_and_bound".to_string());
        metadata.insert("objective".to_string(), objective.name().to_string());

        if events.is_empty() {
            log_changes!(verbosity, "empty catalog, nothing to schedule");
            record_totals(&mut metadata, &[]);
            return Ok(ScheduleOutcome {
                algorithm_metadata: metadata,
                ..ScheduleOutcome::empty()
            });
        }

        let catalog = EventCatalog::new(events)?;
        let graph = validate(&catalog)?;

        let scoring = ScoringModel::for_events(objective, events);
        if let Objective::Hybrid { .. } = objective {
            let bounds = scoring.bounds();
            metadata.insert("max_attendance".to_string(), bounds.max_attendance.to_string());
            metadata.insert("max_revenue".to_string(), bounds.max_revenue.to_string());
        }
        let weights = scoring.weights(events);
        weights
            .iter()
            .try_fold(0 as Score, |acc, &w| acc.checked_add(w))
            .ok_or(ScheduleError::ScoreOverflow)?;

        let optimizer = JointOptimizer::new(&catalog, &graph, weights, verbosity);
        metadata.insert("venues".to_string(), optimizer.venue_count().to_string());
        let result = optimizer.optimize(self.config.max_search_nodes);

        metadata.insert("dp_best_score".to_string(), result.dp.best_score.to_string());
        let anchored = reconstruct(result.dp.best_terminal, &result.dp.parents, &graph.prerequisites);
        metadata.insert("dp_terminal_events".to_string(), anchored.len().to_string());
        metadata.insert(
            "incumbent_score".to_string(),
            result.incumbent_score.to_string(),
        );
        metadata.insert("search_nodes".to_string(), result.search_nodes.to_string());

        let scheduled = order_by_finish(&catalog, &result.chosen);
        record_totals(&mut metadata, &scheduled);
        log_changes!(
            verbosity,
            "scheduled {} of {} events, score {}",
            scheduled.len(),
            events.len(),
            result.score
        );

        Ok(ScheduleOutcome {
            total_score: result.score,
            events: scheduled,
            best_terminal: result.dp.best_terminal.map(|idx| catalog.event(idx).id),
            proven_optimal: result.proven_optimal,
            algorithm_metadata: metadata,
        })
    }

    /// Reject non-finite alpha; clamp the rest with a warning.
    fn checked_objective(&self) -> Result<Objective, ScheduleError> {
        match self.config.objective {
            Objective::Hybrid { alpha } if !alpha.is_finite() => {
                Err(ScheduleError::InvalidAlpha(alpha))
            }
            Objective::Hybrid { alpha } if !(0.0..=1.0).contains(&alpha) => {
                tracing::warn!(alpha, "hybrid alpha outside [0, 1], clamping");
                Ok(Objective::Hybrid {
                    alpha: alpha.clamp(0.0, 1.0),
                })
            }
            objective => Ok(objective),
        }
    }
}

/// Raw attendance and revenue of the chosen events, whatever the objective.
fn record_totals(metadata: &mut HashMap<String, String>, scheduled: &[Event]) {
    let attendance: u128 = scheduled.iter().map(|e| u128::from(e.attendance)).sum();
    let revenue: u128 = scheduled.iter().map(|e| u128::from(e.revenue)).sum();
    metadata.insert("total_attendance".to_string(), attendance.to_string());
    metadata.insert("total_revenue".to_string(), revenue.to_string());
}

/// Run one request with default engine settings for its objective.
pub fn run_schedule(request: &ScheduleRequest) -> Result<ScheduleOutcome, ScheduleError> {
    Scheduler::new(EngineConfig::new(request.objective)).run(&request.events)
}
