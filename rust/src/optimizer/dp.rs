//! DP pass over the topological order.
//!
//! For every event the pass builds an anchored schedule: the event itself,
//! the anchored schedule of its best compatible same-venue predecessor, and
//! the anchored schedules of all its prerequisites. Shared members are
//! counted once, and a combination that double-books a venue is never
//! recorded.
//!
//! An event that extends a single schedule is scored in O(log M) from the
//! table. Only events where several schedules meet pay for a walk over
//! their union.

use crate::catalog::{EventCatalog, EventIdx};
use crate::models::Score;
use crate::reconstruct::ScheduleWalker;
use crate::venue_index::VenueIndex;
use crate::{log_changes, log_checks};

use super::ledger::is_feasible;

/// Write-once DP state for one run.
#[derive(Debug, Clone)]
pub struct DpTable {
    /// Score of the best anchored schedule ending with each event, or `None`
    /// when the event could not anchor a feasible schedule.
    pub scores: Vec<Option<Score>>,
    /// Venue parent chosen for each event.
    pub parents: Vec<Option<EventIdx>>,
    /// Strictly highest-scoring event, first in topological order on ties.
    pub best_terminal: Option<EventIdx>,
    pub best_score: Score,
}

impl DpTable {
    fn new(len: usize) -> Self {
        Self {
            scores: vec![None; len],
            parents: vec![None; len],
            best_terminal: None,
            best_score: 0,
        }
    }
}

/// Fill the DP table, visiting events in `order`.
///
/// `order` must be topological so every prerequisite is final before any
/// dependent reads it. Scores are recorded into `venues` as they are
/// computed, which is what makes them visible as predecessors.
pub fn fill_table(
    catalog: &EventCatalog<'_>,
    order: &[EventIdx],
    prerequisites: &[Vec<EventIdx>],
    weights: &[Score],
    venues: &mut VenueIndex,
    verbosity: u8,
) -> DpTable {
    let mut table = DpTable::new(catalog.len());
    let mut walker = ScheduleWalker::new(catalog.len());

    for &idx in order {
        let event = catalog.event(idx);

        if let Some(&missing) = prerequisites[idx]
            .iter()
            .find(|&&dep| table.scores[dep].is_none())
        {
            log_checks!(
                verbosity,
                "event {} skipped: prerequisite {} has no feasible schedule",
                event.id,
                catalog.event(missing).id
            );
            continue;
        }

        let candidate = venues
            .best_compatible(idx, event.start)
            .map(|(parent, _)| parent);

        let anchored = match single_source(idx, candidate, &table.parents, prerequisites) {
            // Every member of an anchored schedule ends no later than its
            // anchor, so extending one schedule by a later-starting event
            // keeps it feasible and adds no shared member.
            Some(source) => {
                let base = source.and_then(|s| table.scores[s]).unwrap_or(0);
                Some((candidate, weights[idx] + base))
            }
            None => {
                let mut found: Option<(Option<EventIdx>, Score)> = None;
                for parent in [candidate, None] {
                    let members = walker.walk(idx, parent, &table.parents, prerequisites);
                    if is_feasible(catalog, venues, &members) {
                        // Bounded by the catalog total, which the engine checked for overflow
                        found = Some((parent, members.iter().map(|&m| weights[m]).sum()));
                        break;
                    }
                    if let Some(parent) = parent {
                        log_checks!(
                            verbosity,
                            "event {}: venue parent {} conflicts with its prerequisites",
                            event.id,
                            catalog.event(parent).id
                        );
                    }
                    if candidate.is_none() {
                        break;
                    }
                }
                found
            }
        };

        let Some((parent, score)) = anchored else {
            log_checks!(
                verbosity,
                "event {} skipped: prerequisites double-book a venue",
                event.id
            );
            continue;
        };

        table.scores[idx] = Some(score);
        table.parents[idx] = parent;
        venues.record(idx, score);

        log_checks!(
            verbosity,
            "event {}: dp={} parent={:?}",
            event.id,
            score,
            parent.map(|p| catalog.event(p).id)
        );

        if score > table.best_score {
            table.best_score = score;
            table.best_terminal = Some(idx);
        }
    }

    log_changes!(
        verbosity,
        "dp pass: best score {} ending at {:?}",
        table.best_score,
        table.best_terminal.map(|idx| catalog.event(idx).id)
    );

    table
}

/// The one schedule `idx` extends, if it extends at most one.
///
/// `Some(None)` means the event stands alone. A venue parent linked directly
/// from the prerequisite (or the other way round) lies inside the outer
/// schedule, so the pair collapses to that one. `None` means several
/// schedules meet at `idx` and their union has to be walked and checked.
fn single_source(
    idx: EventIdx,
    candidate: Option<EventIdx>,
    parents: &[Option<EventIdx>],
    prerequisites: &[Vec<EventIdx>],
) -> Option<Option<EventIdx>> {
    let links_to = |outer: EventIdx, inner: EventIdx| {
        outer == inner || parents[outer] == Some(inner) || prerequisites[outer].contains(&inner)
    };
    match (candidate, prerequisites[idx].as_slice()) {
        (candidate, []) => Some(candidate),
        (None, &[dep]) => Some(Some(dep)),
        (Some(parent), &[dep]) if links_to(dep, parent) => Some(Some(dep)),
        (Some(parent), &[dep]) if links_to(parent, dep) => Some(Some(parent)),
        _ => None,
    }
}
