//! Depth-first branch and bound over include/exclude decisions.
//!
//! Events are decided in topological order, so an event's prerequisites are
//! always decided before it. The search keeps an explicit trail of decisions
//! instead of recursing, and undoes them in LIFO order on backtrack.

use crate::catalog::{EventCatalog, EventIdx};
use crate::log_debug;
use crate::models::Score;
use crate::venue_index::VenueIndex;

use super::ledger::VenueLedger;

/// Read-only problem data shared by the bound and the search.
pub struct SearchSpace<'s, 'a> {
    pub catalog: &'s EventCatalog<'a>,
    pub venues: &'s VenueIndex,
    pub order: &'s [EventIdx],
    pub prerequisites: &'s [Vec<EventIdx>],
    pub weights: &'s [Score],
}

/// Best schedule found plus search statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub chosen: Vec<bool>,
    pub score: Score,
    pub nodes: u64,
    /// True when the whole tree was explored or pruned.
    pub complete: bool,
}

/// Weighted-interval-scheduling optimum of each venue, ignoring prerequisites.
///
/// Dropping the prerequisite constraint can only enlarge the feasible set, so
/// this is an upper bound on what each venue can contribute.
pub fn venue_optima(space: &SearchSpace<'_, '_>) -> Vec<Score> {
    space
        .venues
        .groups()
        .iter()
        .map(|group| {
            // best[k] = optimum over the first k members (sorted by end)
            let mut best: Vec<Score> = vec![0; group.members.len() + 1];
            for (k, &idx) in group.members.iter().enumerate() {
                let start = space.catalog.event(idx).start;
                let compatible = group.compatible_prefix(start).min(k);
                best[k + 1] = best[k].max(space.weights[idx] + best[compatible]);
            }
            best[group.members.len()]
        })
        .collect()
}

/// `bounds[pos]` caps the score obtainable from `order[pos..]`.
///
/// Per venue the cap is the smaller of the remaining weight and the venue's
/// interval-scheduling optimum.
pub fn suffix_bounds(space: &SearchSpace<'_, '_>) -> Vec<Score> {
    let optima = venue_optima(space);
    let mut remaining: Vec<Score> = vec![0; optima.len()];
    let mut bounds: Vec<Score> = vec![0; space.order.len() + 1];
    let mut total: Score = 0;

    for pos in (0..space.order.len()).rev() {
        let idx = space.order[pos];
        let venue = space.venues.venue_of(idx);
        total -= remaining[venue].min(optima[venue]);
        remaining[venue] += space.weights[idx];
        total += remaining[venue].min(optima[venue]);
        bounds[pos] = total;
    }
    bounds
}

/// Search for a schedule strictly better than the incumbent.
///
/// Stops after `max_nodes` nodes; the returned schedule is then the best
/// found so far and `complete` is false.
pub fn branch_and_bound(
    space: &SearchSpace<'_, '_>,
    incumbent: Vec<bool>,
    incumbent_score: Score,
    max_nodes: u64,
    verbosity: u8,
) -> SearchOutcome {
    let n = space.order.len();
    let bounds = suffix_bounds(space);

    let mut best = SearchOutcome {
        chosen: incumbent,
        score: incumbent_score,
        nodes: 0,
        complete: true,
    };
    if incumbent_score >= bounds[0] {
        return best;
    }

    let mut chosen = vec![false; n];
    let mut ledger = VenueLedger::new(space.venues.venue_count());
    let mut score: Score = 0;
    // (position, included)
    let mut trail: Vec<(usize, bool)> = Vec::with_capacity(n);
    let mut pos = 0;

    'search: loop {
        if best.nodes >= max_nodes {
            best.complete = false;
            break;
        }
        best.nodes += 1;

        if pos == n {
            if score > best.score {
                log_debug!(verbosity, "search: improved to {} at node {}", score, best.nodes);
                best.score = score;
                best.chosen.clone_from(&chosen);
            }
        } else if score + bounds[pos] > best.score {
            let idx = space.order[pos];
            let includable = space.prerequisites[idx].iter().all(|&dep| chosen[dep])
                && ledger.fits(space.catalog, space.venues, idx);
            if includable {
                chosen[idx] = true;
                ledger.push(space.venues, idx);
                score += space.weights[idx];
            }
            trail.push((pos, includable));
            pos += 1;
            continue;
        }

        // Backtrack to the deepest include and flip it to exclude
        loop {
            match trail.pop() {
                None => break 'search,
                Some((p, true)) => {
                    let idx = space.order[p];
                    chosen[idx] = false;
                    ledger.pop(space.venues, idx);
                    score -= space.weights[idx];
                    trail.push((p, false));
                    pos = p + 1;
                    continue 'search;
                }
                Some((_, false)) => {}
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Event, EventId};
    use crate::validation::{validate, ValidatedGraph};

    fn make_event(id: EventId, start: i64, end: i64, w: u64, venue: &str) -> Event {
        Event::new(id, start, end, w, 0, venue)
    }

    fn solve(events: &[Event], max_nodes: u64) -> (SearchOutcome, Vec<Score>) {
        let catalog = EventCatalog::new(events).unwrap();
        let ValidatedGraph {
            order,
            prerequisites,
        } = validate(&catalog).unwrap();
        let venues = VenueIndex::build(&catalog);
        let weights: Vec<Score> = events.iter().map(|e| e.attendance).collect();
        let space = SearchSpace {
            catalog: &catalog,
            venues: &venues,
            order: &order,
            prerequisites: &prerequisites,
            weights: &weights,
        };
        let bounds = suffix_bounds(&space);
        let outcome = branch_and_bound(&space, vec![false; events.len()], 0, max_nodes, 0);
        (outcome, bounds)
    }

    #[test]
    fn test_venue_optimum_is_weighted_interval_scheduling() {
        let events = vec![
            make_event(1, 0, 3, 5, "A"),
            make_event(2, 2, 5, 6, "A"),
            make_event(3, 4, 7, 5, "A"),
            make_event(4, 0, 9, 3, "B"),
        ];
        let (_, bounds) = solve(&events, 1_000);
        // A: {1, 3} = 10 beats {2} = 6; B: 3
        assert_eq!(bounds[0], 13);
        assert_eq!(bounds[events.len()], 0);
    }

    #[test]
    fn test_finds_optimum_across_venues() {
        let events = vec![
            make_event(1, 0, 3, 5, "A"),
            make_event(2, 2, 5, 6, "A"),
            make_event(3, 4, 7, 5, "A"),
            make_event(4, 0, 9, 3, "B"),
        ];
        let (outcome, _) = solve(&events, 1_000);
        assert!(outcome.complete);
        assert_eq!(outcome.score, 13);
        assert_eq!(outcome.chosen, vec![true, false, true, true]);
    }

    #[test]
    fn test_prerequisites_enforced() {
        // 3 is worth a lot but needs 2, which blocks the 1 + 4 pair
        let events = vec![
            make_event(1, 0, 2, 10, "A"),
            make_event(2, 1, 3, 1, "A"),
            make_event(4, 2, 4, 10, "A"),
            Event::new(3, 5, 6, 30, 0, "B").with_prerequisites([2]),
        ];
        let (outcome, _) = solve(&events, 1_000);
        assert_eq!(outcome.score, 31);
        assert_eq!(outcome.chosen, vec![false, true, false, true]);
    }

    #[test]
    fn test_node_limit_reports_incomplete() {
        let events: Vec<Event> = (0..10)
            .map(|i| make_event(i, i, i + 2, 1 + i as u64 % 3, "A"))
            .collect();
        let (outcome, _) = solve(&events, 3);
        assert!(!outcome.complete);
        assert_eq!(outcome.nodes, 3);
    }

    #[test]
    fn test_incumbent_at_bound_skips_search() {
        let events = vec![make_event(1, 0, 1, 4, "A")];
        let catalog = EventCatalog::new(&events).unwrap();
        let graph = validate(&catalog).unwrap();
        let venues = VenueIndex::build(&catalog);
        let weights = vec![4];
        let space = SearchSpace {
            catalog: &catalog,
            venues: &venues,
            order: &graph.order,
            prerequisites: &graph.prerequisites,
            weights: &weights,
        };
        let outcome = branch_and_bound(&space, vec![true], 4, 1_000, 0);
        assert!(outcome.complete);
        assert_eq!(outcome.nodes, 0);
        assert_eq!(outcome.chosen, vec![true]);
    }
}
