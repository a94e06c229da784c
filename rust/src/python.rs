//! PyO3 bindings for the scheduling engine.
//!
//! Wrapper classes mirror the core models so the engine itself stays free of
//! Python types.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::collections::HashMap;

use crate::config::{EngineConfig, DEFAULT_MAX_SEARCH_NODES};
use crate::engine::Scheduler;
use crate::models::{Event, Objective, ScheduleOutcome};

/// An event as seen from Python.
#[pyclass(name = "Event")]
#[derive(Clone, Debug)]
pub struct PyEvent {
    #[pyo3(get, set)]
    pub id: i64,
    #[pyo3(get, set)]
    pub start: i64,
    #[pyo3(get, set)]
    pub end: i64,
    #[pyo3(get, set)]
    pub attendance: u64,
    #[pyo3(get, set)]
    pub revenue: u64,
    #[pyo3(get, set)]
    pub venue: String,
    #[pyo3(get, set)]
    pub prerequisites: Vec<i64>,
}

#[pymethods]
impl PyEvent {
    #[new]
    #[pyo3(signature = (id, start, end, attendance, revenue, venue, prerequisites=None))]
    fn new(
        id: i64,
        start: i64,
        end: i64,
        attendance: u64,
        revenue: u64,
        venue: String,
        prerequisites: Option<Vec<i64>>,
    ) -> Self {
        Self {
            id,
            start,
            end,
            attendance,
            revenue,
            venue,
            prerequisites: prerequisites.unwrap_or_default(),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Event(id={}, start={}, end={}, venue={:?}, deps={:?})",
            self.id, self.start, self.end, self.venue, self.prerequisites
        )
    }
}

impl From<PyEvent> for Event {
    fn from(e: PyEvent) -> Self {
        Event {
            id: e.id,
            start: e.start,
            end: e.end,
            attendance: e.attendance,
            revenue: e.revenue,
            venue: e.venue,
            prerequisites: e.prerequisites,
        }
    }
}

impl From<Event> for PyEvent {
    fn from(e: Event) -> Self {
        PyEvent {
            id: e.id,
            start: e.start,
            end: e.end,
            attendance: e.attendance,
            revenue: e.revenue,
            venue: e.venue,
            prerequisites: e.prerequisites,
        }
    }
}

/// Result of a scheduling run.
#[pyclass(name = "ScheduleOutcome")]
#[derive(Clone, Debug)]
pub struct PyScheduleOutcome {
    #[pyo3(get)]
    pub total_score: u64,
    #[pyo3(get)]
    pub events: Vec<PyEvent>,
    #[pyo3(get)]
    pub best_terminal: Option<i64>,
    #[pyo3(get)]
    pub proven_optimal: bool,
    #[pyo3(get)]
    pub algorithm_metadata: HashMap<String, String>,
}

#[pymethods]
impl PyScheduleOutcome {
    fn __repr__(&self) -> String {
        format!(
            "ScheduleOutcome(total_score={}, events={}, proven_optimal={})",
            self.total_score,
            self.events.len(),
            self.proven_optimal
        )
    }
}

impl From<ScheduleOutcome> for PyScheduleOutcome {
    fn from(outcome: ScheduleOutcome) -> Self {
        Self {
            total_score: outcome.total_score,
            events: outcome.events.into_iter().map(PyEvent::from).collect(),
            best_terminal: outcome.best_terminal,
            proven_optimal: outcome.proven_optimal,
            algorithm_metadata: outcome.algorithm_metadata,
        }
    }
}

fn parse_objective(objective: &str, alpha: f64) -> PyResult<Objective> {
    match objective {
        "attendance" => Ok(Objective::Attendance),
        "revenue" => Ok(Objective::Revenue),
        "hybrid" => Ok(Objective::Hybrid { alpha }),
        other => Err(PyValueError::new_err(format!(
            "Unknown objective: {other} (expected attendance, revenue or hybrid)"
        ))),
    }
}

/// Compute the best feasible schedule.
///
/// # Arguments
/// * `events` - Catalog of events
/// * `objective` - "attendance", "revenue" or "hybrid"
/// * `alpha` - Attendance share of the hybrid blend (ignored otherwise)
/// * `max_search_nodes` - Branch-and-bound node budget (0 = DP incumbent only)
/// * `verbosity` - 0=silent, 1=changes, 2=checks, 3=debug
///
/// # Raises
/// * ValueError for unknown objectives and invalid catalogs
#[pyfunction]
#[pyo3(signature = (events, objective="attendance", alpha=0.5, max_search_nodes=DEFAULT_MAX_SEARCH_NODES, verbosity=0))]
fn run_schedule(
    events: Vec<PyEvent>,
    objective: &str,
    alpha: f64,
    max_search_nodes: u64,
    verbosity: u8,
) -> PyResult<PyScheduleOutcome> {
    let config = EngineConfig::new(parse_objective(objective, alpha)?)
        .with_max_search_nodes(max_search_nodes)
        .with_verbosity(verbosity);
    let events: Vec<Event> = events.into_iter().map(Event::from).collect();

    Scheduler::new(config)
        .run(&events)
        .map(PyScheduleOutcome::from)
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// The venue_planner Python module.
#[pymodule]
fn venue_planner(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyEvent>()?;
    m.add_class::<PyScheduleOutcome>()?;
    m.add_function(wrap_pyfunction!(run_schedule, m)?)?;
    Ok(())
}
