//! Event catalog with dense indexing.
//!
//! Maps event IDs to positions in the borrowed event slice so the rest of the
//! engine can work with `usize` indices and plain vectors.

use rustc_hash::FxHashMap;

use crate::models::{Event, EventId};
use crate::validation::ValidationError;

/// Dense index of an event inside its catalog.
pub type EventIdx = usize;

/// Immutable view over one run's events.
#[derive(Debug, Clone)]
pub struct EventCatalog<'a> {
    events: &'a [Event],
    by_id: FxHashMap<EventId, EventIdx>,
}

impl<'a> EventCatalog<'a> {
    /// Index the events, rejecting the first repeated ID.
    pub fn new(events: &'a [Event]) -> Result<Self, ValidationError> {
        let mut by_id = FxHashMap::with_capacity_and_hasher(events.len(), Default::default());
        for (idx, event) in events.iter().enumerate() {
            if by_id.insert(event.id, idx).is_some() {
                return Err(ValidationError::DuplicateEventId(event.id));
            }
        }
        Ok(Self { events, by_id })
    }

    /// Position of an event ID, if it exists.
    #[inline]
    pub fn position(&self, id: EventId) -> Option<EventIdx> {
        self.by_id.get(&id).copied()
    }

    #[inline]
    pub fn event(&self, idx: EventIdx) -> &'a Event {
        &self.events[idx]
    }

    pub fn events(&self) -> &'a [Event] {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
