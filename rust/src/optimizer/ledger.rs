//! Venue occupancy tracking for chosen events.

use crate::catalog::{EventCatalog, EventIdx};
use crate::models::Timestamp;
use crate::venue_index::{VenueIdx, VenueIndex};

/// Events currently chosen, bucketed by venue.
///
/// Insertions and removals must be LIFO per venue, which is exactly how the
/// search trail undoes decisions.
#[derive(Debug, Clone)]
pub struct VenueLedger {
    chosen: Vec<Vec<EventIdx>>,
}

impl VenueLedger {
    pub fn new(venue_count: usize) -> Self {
        Self {
            chosen: vec![Vec::new(); venue_count],
        }
    }

    /// True if `idx` overlaps no chosen event in its venue.
    pub fn fits(&self, catalog: &EventCatalog<'_>, venues: &VenueIndex, idx: EventIdx) -> bool {
        let event = catalog.event(idx);
        self.chosen[venues.venue_of(idx)]
            .iter()
            .all(|&other| !event.conflicts_with(catalog.event(other)))
    }

    pub fn push(&mut self, venues: &VenueIndex, idx: EventIdx) {
        self.chosen[venues.venue_of(idx)].push(idx);
    }

    pub fn pop(&mut self, venues: &VenueIndex, idx: EventIdx) {
        let popped = self.chosen[venues.venue_of(idx)].pop();
        debug_assert_eq!(popped, Some(idx));
    }
}

/// True if no two members overlap in the same venue.
///
/// Sweeps each venue's intervals in (start, end) order; an interval that
/// starts before the running maximum end overlaps an earlier one.
pub fn is_feasible(catalog: &EventCatalog<'_>, venues: &VenueIndex, members: &[EventIdx]) -> bool {
    let mut spans: Vec<(VenueIdx, Timestamp, Timestamp)> = members
        .iter()
        .map(|&idx| {
            let e = catalog.event(idx);
            (venues.venue_of(idx), e.start, e.end)
        })
        .collect();
    spans.sort_unstable();

    let mut current: Option<(VenueIdx, Timestamp)> = None;
    for (venue, start, end) in spans {
        match current {
            Some((v, max_end)) if v == venue => {
                if start < max_end {
                    return false;
                }
                current = Some((venue, max_end.max(end)));
            }
            _ => current = Some((venue, end)),
        }
    }
    true
}
