//! Dependency graph validation and topological ordering.
//!
//! Checks run in a fixed sequence and stop at the first failure:
//! 1. Every interval has `end >= start`
//! 2. Every prerequisite ID resolves to a catalog event
//! 3. The prerequisite graph is acyclic (Kahn's algorithm)
//! 4. Every prerequisite ends no later than its dependent starts
//!
//! Timing is only meaningful once the graph is known to be a DAG, so it is
//! checked last.

use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use thiserror::Error;

use crate::catalog::{EventCatalog, EventIdx};
use crate::models::{EventId, Timestamp};

/// Structural defects in a catalog. None of them are retryable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Duplicate event ID: {0}")]
    DuplicateEventId(EventId),
    #[error("Event {event_id} ends at {end} before it starts at {start}")]
    InvalidInterval {
        event_id: EventId,
        start: Timestamp,
        end: Timestamp,
    },
    #[error("Event {event_id} depends on unknown event {dependency_id}")]
    UnknownDependency {
        event_id: EventId,
        dependency_id: EventId,
    },
    /// Each listed event depends on the next; the last depends on the first.
    #[error("Dependency cycle detected among events {cycle:?}")]
    DependencyCycle { cycle: Vec<EventId> },
    #[error(
        "Event {event_id} starts at {event_start} before its dependency {dependency_id} ends at {dependency_end}"
    )]
    TimingViolation {
        event_id: EventId,
        dependency_id: EventId,
        event_start: Timestamp,
        dependency_end: Timestamp,
    },
}

/// Prerequisite graph over dense event indices.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Prerequisites per event, deduplicated, in declared order.
    pub prerequisites: Vec<Vec<EventIdx>>,
    /// Reverse edges: prerequisite -> events that depend on it.
    pub dependents: Vec<Vec<EventIdx>>,
    /// Number of distinct prerequisites per event.
    pub in_degree: Vec<usize>,
}

impl DependencyGraph {
    /// Resolve every declared prerequisite against the catalog.
    pub fn build(catalog: &EventCatalog<'_>) -> Result<Self, ValidationError> {
        let n = catalog.len();
        let mut prerequisites: Vec<Vec<EventIdx>> = vec![Vec::new(); n];
        let mut dependents: Vec<Vec<EventIdx>> = vec![Vec::new(); n];
        let mut in_degree = vec![0; n];

        for (idx, event) in catalog.events().iter().enumerate() {
            let mut seen: FxHashSet<EventIdx> = FxHashSet::default();
            for &dep_id in &event.prerequisites {
                let dep_idx =
                    catalog
                        .position(dep_id)
                        .ok_or(ValidationError::UnknownDependency {
                            event_id: event.id,
                            dependency_id: dep_id,
                        })?;
                if seen.insert(dep_idx) {
                    prerequisites[idx].push(dep_idx);
                    dependents[dep_idx].push(idx);
                    in_degree[idx] += 1;
                }
            }
        }

        Ok(Self {
            prerequisites,
            dependents,
            in_degree,
        })
    }

    fn len(&self) -> usize {
        self.prerequisites.len()
    }
}

/// A catalog that passed every check, with its processing order.
#[derive(Debug, Clone)]
pub struct ValidatedGraph {
    /// Topological order: every prerequisite precedes its dependents.
    pub order: Vec<EventIdx>,
    /// Prerequisites per event, deduplicated.
    pub prerequisites: Vec<Vec<EventIdx>>,
}

/// Perform topological sort using Kahn's algorithm.
///
/// Among ready events the one with the smallest `(end, start, id)` goes
/// first, which makes the order deterministic and as close to finish-time
/// order as the edges allow.
///
/// # Returns
/// * `Ok(order)` covering every event
/// * `Err(ValidationError::DependencyCycle)` naming one offending cycle
pub fn topological_order(
    catalog: &EventCatalog<'_>,
    graph: &DependencyGraph,
) -> Result<Vec<EventIdx>, ValidationError> {
    let mut in_degree = graph.in_degree.clone();
    let key = |idx: EventIdx| {
        let e = catalog.event(idx);
        Reverse((e.end, e.start, e.id, idx))
    };

    let mut ready: BinaryHeap<_> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &degree)| degree == 0)
        .map(|(idx, _)| key(idx))
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    while let Some(Reverse((_, _, _, idx))) = ready.pop() {
        order.push(idx);
        for &next in &graph.dependents[idx] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(key(next));
            }
        }
    }

    if order.len() != graph.len() {
        let mut remaining = vec![true; graph.len()];
        for &idx in &order {
            remaining[idx] = false;
        }
        return Err(ValidationError::DependencyCycle {
            cycle: find_cycle(catalog, graph, &remaining),
        });
    }

    Ok(order)
}

/// Extract one concrete cycle from the events Kahn could not release.
///
/// Every such event still has an unreleased prerequisite, so following
/// prerequisite links from any of them must revisit a node.
fn find_cycle(
    catalog: &EventCatalog<'_>,
    graph: &DependencyGraph,
    remaining: &[bool],
) -> Vec<EventId> {
    let Some(start) = (0..graph.len())
        .filter(|&idx| remaining[idx])
        .min_by_key(|&idx| catalog.event(idx).id)
    else {
        return Vec::new();
    };

    let mut path: Vec<EventIdx> = Vec::new();
    let mut position: FxHashMap<EventIdx, usize> = FxHashMap::default();
    let mut current = start;

    let cycle_start = loop {
        if let Some(&pos) = position.get(&current) {
            break pos;
        }
        position.insert(current, path.len());
        path.push(current);
        match graph.prerequisites[current]
            .iter()
            .copied()
            .find(|&dep| remaining[dep])
        {
            Some(dep) => current = dep,
            // Unreachable for a node left over by Kahn; report the path walked.
            None => break 0,
        }
    };

    let mut cycle: Vec<EventId> = path[cycle_start..]
        .iter()
        .map(|&idx| catalog.event(idx).id)
        .collect();
    if let Some(min_pos) = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, &id)| id)
        .map(|(pos, _)| pos)
    {
        cycle.rotate_left(min_pos);
    }
    cycle
}

/// Require `prerequisite.end <= event.start` for every edge.
///
/// Walks events in catalog order and prerequisites in declared order, so the
/// reported violation is stable across runs.
pub fn check_timing(
    catalog: &EventCatalog<'_>,
    graph: &DependencyGraph,
) -> Result<(), ValidationError> {
    for (idx, event) in catalog.events().iter().enumerate() {
        for &dep_idx in &graph.prerequisites[idx] {
            let dep = catalog.event(dep_idx);
            if dep.end > event.start {
                return Err(ValidationError::TimingViolation {
                    event_id: event.id,
                    dependency_id: dep.id,
                    event_start: event.start,
                    dependency_end: dep.end,
                });
            }
        }
    }
    Ok(())
}

/// Run every structural check and produce the processing order.
pub fn validate(catalog: &EventCatalog<'_>) -> Result<ValidatedGraph, ValidationError> {
    for event in catalog.events() {
        if event.end < event.start {
            return Err(ValidationError::InvalidInterval {
                event_id: event.id,
                start: event.start,
                end: event.end,
            });
        }
    }

    let graph = DependencyGraph::build(catalog)?;
    let order = topological_order(catalog, &graph)?;
    check_timing(catalog, &graph)?;

    Ok(ValidatedGraph {
        order,
        prerequisites: graph.prerequisites,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Event;

    fn make_event(id: EventId, start: i64, end: i64, deps: Vec<EventId>) -> Event {
        Event::new(id, start, end, 10, 10, "A").with_prerequisites(deps)
    }

    fn order_ids(events: &[Event]) -> Vec<EventId> {
        let catalog = EventCatalog::new(events).unwrap();
        let validated = validate(&catalog).unwrap();
        validated
            .order
            .iter()
            .map(|&idx| catalog.event(idx).id)
            .collect()
    }

    #[test]
    fn test_order_respects_dependencies() {
        // 3 finishes first but depends on nothing; 1 must precede 2
        let events = vec![
            make_event(2, 5, 6, vec![1]),
            make_event(1, 0, 4, vec![]),
            make_event(3, 0, 1, vec![]),
        ];
        assert_eq!(order_ids(&events), vec![3, 1, 2]);
    }

    #[test]
    fn test_order_breaks_ties_by_start_then_id() {
        let events = vec![
            make_event(9, 2, 5, vec![]),
            make_event(7, 1, 5, vec![]),
            make_event(8, 1, 5, vec![]),
        ];
        assert_eq!(order_ids(&events), vec![7, 8, 9]);
    }

    #[test]
    fn test_zero_length_chain_ordered_by_edges() {
        // Both events sit at t=3; the edge decides, not the id
        let events = vec![make_event(1, 3, 3, vec![2]), make_event(2, 3, 3, vec![])];
        assert_eq!(order_ids(&events), vec![2, 1]);
    }

    #[test]
    fn test_duplicate_prerequisites_counted_once() {
        let events = vec![make_event(1, 0, 1, vec![]), make_event(2, 1, 2, vec![1, 1, 1])];
        let catalog = EventCatalog::new(&events).unwrap();
        let graph = DependencyGraph::build(&catalog).unwrap();

        assert_eq!(graph.prerequisites[1], vec![0]);
        assert_eq!(graph.in_degree[1], 1);
        assert_eq!(graph.dependents[0], vec![1]);
    }

    #[test]
    fn test_unknown_dependency() {
        let events = vec![make_event(1, 0, 1, vec![]), make_event(2, 1, 2, vec![1, 42])];
        let catalog = EventCatalog::new(&events).unwrap();
        assert_eq!(
            validate(&catalog).unwrap_err(),
            ValidationError::UnknownDependency {
                event_id: 2,
                dependency_id: 42
            }
        );
    }

    #[test]
    fn test_two_event_cycle() {
        let events = vec![make_event(1, 0, 1, vec![2]), make_event(2, 0, 1, vec![1])];
        let catalog = EventCatalog::new(&events).unwrap();
        assert_eq!(
            validate(&catalog).unwrap_err(),
            ValidationError::DependencyCycle { cycle: vec![1, 2] }
        );
    }

    #[test]
    fn test_cycle_excludes_downstream_events() {
        // 4 depends on the 1 -> 3 -> 2 -> 1 cycle but is not part of it
        let events = vec![
            make_event(4, 9, 10, vec![2]),
            make_event(3, 0, 1, vec![2]),
            make_event(2, 0, 1, vec![1]),
            make_event(1, 0, 1, vec![3]),
            make_event(5, 0, 1, vec![]),
        ];
        let catalog = EventCatalog::new(&events).unwrap();
        assert_eq!(
            validate(&catalog).unwrap_err(),
            ValidationError::DependencyCycle {
                cycle: vec![1, 3, 2]
            }
        );
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let events = vec![make_event(1, 0, 1, vec![1])];
        let catalog = EventCatalog::new(&events).unwrap();
        assert_eq!(
            validate(&catalog).unwrap_err(),
            ValidationError::DependencyCycle { cycle: vec![1] }
        );
    }

    #[test]
    fn test_timing_violation_reports_values() {
        let events = vec![make_event(1, 0, 5, vec![]), make_event(2, 4, 8, vec![1])];
        let catalog = EventCatalog::new(&events).unwrap();
        assert_eq!(
            validate(&catalog).unwrap_err(),
            ValidationError::TimingViolation {
                event_id: 2,
                dependency_id: 1,
                event_start: 4,
                dependency_end: 5,
            }
        );
    }

    #[test]
    fn test_back_to_back_dependency_is_valid() {
        let events = vec![make_event(1, 0, 5, vec![]), make_event(2, 5, 8, vec![1])];
        assert_eq!(order_ids(&events), vec![1, 2]);
    }

    #[test]
    fn test_cycle_reported_before_timing() {
        // Timing is also broken here, but the cycle must win
        let events = vec![make_event(1, 0, 9, vec![2]), make_event(2, 0, 9, vec![1])];
        let catalog = EventCatalog::new(&events).unwrap();
        assert!(matches!(
            validate(&catalog),
            Err(ValidationError::DependencyCycle { .. })
        ));
    }

    #[test]
    fn test_inverted_interval() {
        let events = vec![make_event(1, 5, 4, vec![])];
        let catalog = EventCatalog::new(&events).unwrap();
        assert_eq!(
            validate(&catalog).unwrap_err(),
            ValidationError::InvalidInterval {
                event_id: 1,
                start: 5,
                end: 4
            }
        );
    }

    #[test]
    fn test_error_messages() {
        let err = ValidationError::UnknownDependency {
            event_id: 3,
            dependency_id: 7,
        };
        assert_eq!(err.to_string(), "Event 3 depends on unknown event 7");
        let err = ValidationError::DependencyCycle { cycle: vec![1, 2] };
        assert_eq!(
            err.to_string(),
            "Dependency cycle detected among events [1, 2]"
        );
    }
}
