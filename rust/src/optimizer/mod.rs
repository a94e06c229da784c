//! Joint optimizer for venue conflicts and prerequisite chains.
//!
//! Runs in three phases:
//! 1. DP pass in topological order, producing per-event anchored schedules
//! 2. Greedy merge of anchored schedules into a global incumbent
//! 3. Branch and bound from that incumbent, within a node budget

mod dp;
mod ledger;
mod search;

pub use dp::{fill_table, DpTable};
pub use ledger::{is_feasible, VenueLedger};
pub use search::{branch_and_bound, suffix_bounds, venue_optima, SearchOutcome, SearchSpace};

use std::cmp::Reverse;

use crate::catalog::{EventCatalog, EventIdx};
use crate::log_changes;
use crate::models::Score;
use crate::reconstruct::ScheduleWalker;
use crate::validation::ValidatedGraph;
use crate::venue_index::VenueIndex;

/// Final state of one optimization.
#[derive(Debug, Clone)]
pub struct Optimization {
    /// Chosen events, in topological order.
    pub chosen: Vec<EventIdx>,
    pub score: Score,
    pub dp: DpTable,
    /// Score of the merged DP incumbent before search.
    pub incumbent_score: Score,
    pub search_nodes: u64,
    pub proven_optimal: bool,
}

/// Optimizer over one validated catalog.
pub struct JointOptimizer<'s, 'a> {
    catalog: &'s EventCatalog<'a>,
    graph: &'s ValidatedGraph,
    venues: VenueIndex,
    weights: Vec<Score>,
    verbosity: u8,
}

impl<'s, 'a> JointOptimizer<'s, 'a> {
    /// `weights` must be indexed like the catalog and sum without overflow.
    pub fn new(
        catalog: &'s EventCatalog<'a>,
        graph: &'s ValidatedGraph,
        weights: Vec<Score>,
        verbosity: u8,
    ) -> Self {
        Self {
            catalog,
            graph,
            venues: VenueIndex::build(catalog),
            weights,
            verbosity,
        }
    }

    pub fn venue_count(&self) -> usize {
        self.venues.venue_count()
    }

    /// Run all phases. `max_search_nodes == 0` skips the search.
    pub fn optimize(mut self, max_search_nodes: u64) -> Optimization {
        let dp = fill_table(
            self.catalog,
            &self.graph.order,
            &self.graph.prerequisites,
            &self.weights,
            &mut self.venues,
            self.verbosity,
        );

        let (incumbent, incumbent_score) = self.merge_anchored(&dp);
        log_changes!(self.verbosity, "merged incumbent score {}", incumbent_score);

        let space = SearchSpace {
            catalog: self.catalog,
            venues: &self.venues,
            order: &self.graph.order,
            prerequisites: &self.graph.prerequisites,
            weights: &self.weights,
        };

        let outcome = if max_search_nodes == 0 {
            let bounds = suffix_bounds(&space);
            SearchOutcome {
                complete: incumbent_score >= bounds[0],
                chosen: incumbent,
                score: incumbent_score,
                nodes: 0,
            }
        } else {
            branch_and_bound(
                &space,
                incumbent,
                incumbent_score,
                max_search_nodes,
                self.verbosity,
            )
        };

        log_changes!(
            self.verbosity,
            "search: score {} after {} nodes (complete: {})",
            outcome.score,
            outcome.nodes,
            outcome.complete
        );

        let chosen = self
            .graph
            .order
            .iter()
            .copied()
            .filter(|&idx| outcome.chosen[idx])
            .collect();

        Optimization {
            chosen,
            score: outcome.score,
            dp,
            incumbent_score,
            search_nodes: outcome.nodes,
            proven_optimal: outcome.complete,
        }
    }

    /// Union anchored schedules, best first, while the union stays feasible.
    ///
    /// Each anchored schedule is closed under parent and prerequisite links,
    /// so every union is too and walks can stop at chosen events.
    fn merge_anchored(&self, dp: &DpTable) -> (Vec<bool>, Score) {
        let n = self.catalog.len();
        let mut rank = vec![0; n];
        for (pos, &idx) in self.graph.order.iter().enumerate() {
            rank[idx] = pos;
        }

        let mut ranked: Vec<(EventIdx, Score)> = dp
            .scores
            .iter()
            .enumerate()
            .filter_map(|(idx, score)| score.filter(|&s| s > 0).map(|s| (idx, s)))
            .collect();
        ranked.sort_by_key(|&(idx, score)| (Reverse(score), rank[idx]));

        let mut chosen = vec![false; n];
        let mut ledger = VenueLedger::new(self.venues.venue_count());
        let mut walker = ScheduleWalker::new(n);
        let mut total: Score = 0;

        for (idx, _) in ranked {
            if chosen[idx] {
                continue;
            }
            let fresh =
                walker.walk_fresh(idx, &dp.parents, &self.graph.prerequisites, &chosen);
            let gain: Score = fresh.iter().map(|&m| self.weights[m]).sum();
            if gain == 0
                || !fresh
                    .iter()
                    .all(|&m| ledger.fits(self.catalog, &self.venues, m))
            {
                continue;
            }
            for m in fresh {
                chosen[m] = true;
                ledger.push(&self.venues, m);
            }
            total += gain;
        }

        (chosen, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Event, EventId};
    use crate::validation::validate;

    fn scenario() -> Vec<Event> {
        vec![
            Event::new(1, 1, 3, 100, 50, "A"),
            Event::new(2, 2, 4, 120, 60, "A"),
            Event::new(3, 5, 7, 150, 80, "B"),
            Event::new(4, 8, 9, 200, 100, "B").with_prerequisites([3]),
            Event::new(5, 6, 8, 180, 90, "A").with_prerequisites([1]),
            Event::new(6, 9, 11, 220, 110, "C").with_prerequisites([4]),
        ]
    }

    fn optimize(events: &[Event], max_nodes: u64) -> (Optimization, Vec<EventId>) {
        let catalog = EventCatalog::new(events).unwrap();
        let graph = validate(&catalog).unwrap();
        let weights = events.iter().map(|e| e.attendance).collect();
        let result = JointOptimizer::new(&catalog, &graph, weights, 0).optimize(max_nodes);
        let mut ids: Vec<EventId> = result.chosen.iter().map(|&i| events[i].id).collect();
        ids.sort_unstable();
        (result, ids)
    }

    #[test]
    fn test_dp_terminal_is_longest_chain() {
        let (result, _) = optimize(&scenario(), 0);
        // 6 anchors {3, 4, 6}
        assert_eq!(result.dp.best_terminal, Some(5));
        assert_eq!(result.dp.best_score, 570);
    }

    #[test]
    fn test_merge_combines_independent_chains() {
        let (result, ids) = optimize(&scenario(), 0);
        assert_eq!(result.incumbent_score, 850);
        assert_eq!(ids, vec![1, 3, 4, 5, 6]);
        // Relaxation bound is 870 (venue A alone allows 2 + 5), so nothing is proven yet
        assert!(!result.proven_optimal);
    }

    #[test]
    fn test_search_proves_merged_incumbent() {
        let (result, ids) = optimize(&scenario(), 10_000);
        assert_eq!(result.score, 850);
        assert_eq!(ids, vec![1, 3, 4, 5, 6]);
        assert!(result.proven_optimal);
        assert!(result.search_nodes > 0);
    }

    #[test]
    fn test_search_improves_on_greedy_merge() {
        // Greedy takes the 9-point chain 1 -> 2 and blocks 3 and 4 (6 + 6)
        let events = vec![
            Event::new(1, 0, 2, 4, 0, "A"),
            Event::new(2, 2, 4, 5, 0, "B").with_prerequisites([1]),
            Event::new(3, 1, 3, 6, 0, "A"),
            Event::new(4, 3, 5, 6, 0, "B"),
        ];
        let (greedy, _) = optimize(&events, 0);
        assert_eq!(greedy.incumbent_score, 9);

        let (result, ids) = optimize(&events, 10_000);
        assert_eq!(result.score, 12);
        assert_eq!(ids, vec![3, 4]);
        assert!(result.proven_optimal);
    }
}
