//! Venue-conflict index.
//!
//! Groups events by venue, sorted by finish time, so the optimizer can find
//! the best already-scored event that ends before a given start in
//! O(log M) for M events in the venue.

use rustc_hash::FxHashMap;

use crate::catalog::{EventCatalog, EventIdx};
use crate::models::{Score, Timestamp};

/// Dense venue identifier assigned in order of first appearance.
pub type VenueIdx = usize;

/// Events sharing one venue label.
#[derive(Debug, Clone)]
pub struct VenueGroup {
    pub label: String,
    /// Members sorted by (end, start, id).
    pub members: Vec<EventIdx>,
    /// End times of `members`, same order, for binary search.
    ends: Vec<Timestamp>,
    /// Prefix maximum over recorded scores, keyed by member position.
    best: PrefixMax,
}

impl VenueGroup {
    /// Number of members whose end time is `<= start`.
    ///
    /// Upper-bound style search: members `[0, cut)` are the ones that finish
    /// no later than `start`.
    pub fn compatible_prefix(&self, start: Timestamp) -> usize {
        self.ends.partition_point(|&end| end <= start)
    }
}

/// Venue groups plus per-event lookups.
#[derive(Debug, Clone)]
pub struct VenueIndex {
    groups: Vec<VenueGroup>,
    venue_of: Vec<VenueIdx>,
    position_of: Vec<usize>,
}

impl VenueIndex {
    /// Partition the catalog by venue and sort each partition.
    pub fn build(catalog: &EventCatalog<'_>) -> Self {
        let n = catalog.len();
        let mut by_label: FxHashMap<&str, VenueIdx> = FxHashMap::default();
        let mut members: Vec<Vec<EventIdx>> = Vec::new();
        let mut labels: Vec<String> = Vec::new();
        let mut venue_of = vec![0; n];

        for (idx, event) in catalog.events().iter().enumerate() {
            let venue = *by_label.entry(event.venue.as_str()).or_insert_with(|| {
                members.push(Vec::new());
                labels.push(event.venue.clone());
                members.len() - 1
            });
            members[venue].push(idx);
            venue_of[idx] = venue;
        }

        let mut position_of = vec![0; n];
        let groups = members
            .into_iter()
            .zip(labels)
            .map(|(mut group, label)| {
                group.sort_by_key(|&idx| {
                    let e = catalog.event(idx);
                    (e.end, e.start, e.id)
                });
                for (pos, &idx) in group.iter().enumerate() {
                    position_of[idx] = pos;
                }
                let ends = group.iter().map(|&idx| catalog.event(idx).end).collect();
                let best = PrefixMax::new(group.len());
                VenueGroup {
                    label,
                    members: group,
                    ends,
                    best,
                }
            })
            .collect();

        Self {
            groups,
            venue_of,
            position_of,
        }
    }

    pub fn groups(&self) -> &[VenueGroup] {
        &self.groups
    }

    #[inline]
    pub fn venue_of(&self, idx: EventIdx) -> VenueIdx {
        self.venue_of[idx]
    }

    pub fn venue_count(&self) -> usize {
        self.groups.len()
    }

    /// Make an event's score visible to later predecessor queries.
    ///
    /// Each event is recorded at most once per run.
    pub fn record(&mut self, idx: EventIdx, score: Score) {
        let pos = self.position_of[idx];
        self.groups[self.venue_of[idx]].best.update(pos, score);
    }

    /// Highest-scoring recorded event in `idx`'s venue that ends at or
    /// before `start`.
    ///
    /// Ties on score go to the later-finishing event. Events that were never
    /// recorded are invisible.
    pub fn best_compatible(&self, idx: EventIdx, start: Timestamp) -> Option<(EventIdx, Score)> {
        let group = &self.groups[self.venue_of[idx]];
        let cut = group.compatible_prefix(start);
        group
            .best
            .query(cut)
            .map(|(score, pos)| (group.members[pos], score))
    }
}

/// Fenwick tree answering "max over positions `[0, k)`" with point updates
/// that only ever raise a slot.
#[derive(Debug, Clone)]
struct PrefixMax {
    tree: Vec<Option<(Score, usize)>>,
}

impl PrefixMax {
    fn new(len: usize) -> Self {
        Self {
            tree: vec![None; len + 1],
        }
    }

    fn update(&mut self, pos: usize, score: Score) {
        let entry = Some((score, pos));
        let mut i = pos + 1;
        while i < self.tree.len() {
            if entry > self.tree[i] {
                self.tree[i] = entry;
            }
            i += i & i.wrapping_neg();
        }
    }

    fn query(&self, len: usize) -> Option<(Score, usize)> {
        let mut best = None;
        let mut i = len.min(self.tree.len() - 1);
        while i > 0 {
            best = best.max(self.tree[i]);
            i -= i & i.wrapping_neg();
        }
        best
    }
}
