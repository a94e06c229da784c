//! Schedule reconstruction from venue-parent and prerequisite links.
//!
//! The walk is iterative over an explicit worklist so deep prerequisite chains
//! never grow the call stack.
//!
//! The DP pass and the incumbent merge use the walker to build candidate
//! schedules. `reconstruct` recovers the best DP terminal's own schedule,
//! which the engine reports as metadata; the returned schedule is the one the
//! search settles on.

use crate::catalog::{EventCatalog, EventIdx};
use crate::models::Event;

/// Reusable worklist and visited set sized to one catalog.
#[derive(Debug, Clone)]
pub struct ScheduleWalker {
    visited: Vec<bool>,
    stack: Vec<EventIdx>,
}

impl ScheduleWalker {
    pub fn new(len: usize) -> Self {
        Self {
            visited: vec![false; len],
            stack: Vec::new(),
        }
    }

    /// Collect `root` and everything reachable through venue parents and
    /// prerequisites, each event once.
    ///
    /// `root_parent` overrides the root's own entry in `parents`, which lets
    /// the optimizer try a candidate parent before committing it.
    pub fn walk(
        &mut self,
        root: EventIdx,
        root_parent: Option<EventIdx>,
        parents: &[Option<EventIdx>],
        prerequisites: &[Vec<EventIdx>],
    ) -> Vec<EventIdx> {
        self.collect(root, root_parent, parents, prerequisites, |_| false)
    }

    /// Like [`walk`](Self::walk), but never enters events marked in `taken`.
    ///
    /// `taken` must be closed under parent and prerequisite links, so nothing
    /// behind a taken event is fresh.
    pub fn walk_fresh(
        &mut self,
        root: EventIdx,
        parents: &[Option<EventIdx>],
        prerequisites: &[Vec<EventIdx>],
        taken: &[bool],
    ) -> Vec<EventIdx> {
        self.collect(root, parents[root], parents, prerequisites, |idx| taken[idx])
    }

    fn collect(
        &mut self,
        root: EventIdx,
        root_parent: Option<EventIdx>,
        parents: &[Option<EventIdx>],
        prerequisites: &[Vec<EventIdx>],
        skip: impl Fn(EventIdx) -> bool,
    ) -> Vec<EventIdx> {
        let mut members = Vec::new();
        self.visited[root] = true;
        members.push(root);
        self.push_links(root, root_parent, prerequisites);

        while let Some(idx) = self.stack.pop() {
            if self.visited[idx] || skip(idx) {
                continue;
            }
            self.visited[idx] = true;
            members.push(idx);
            self.push_links(idx, parents[idx], prerequisites);
        }

        for &idx in &members {
            self.visited[idx] = false;
        }
        members
    }

    fn push_links(
        &mut self,
        idx: EventIdx,
        parent: Option<EventIdx>,
        prerequisites: &[Vec<EventIdx>],
    ) {
        if let Some(parent) = parent {
            if !self.visited[parent] {
                self.stack.push(parent);
            }
        }
        for &dep in &prerequisites[idx] {
            if !self.visited[dep] {
                self.stack.push(dep);
            }
        }
    }
}

/// Recover the schedule ending at `terminal`.
///
/// `None` yields an empty schedule.
pub fn reconstruct(
    terminal: Option<EventIdx>,
    parents: &[Option<EventIdx>],
    prerequisites: &[Vec<EventIdx>],
) -> Vec<EventIdx> {
    match terminal {
        Some(root) => ScheduleWalker::new(parents.len()).walk(
            root,
            parents[root],
            parents,
            prerequisites,
        ),
        None => Vec::new(),
    }
}

/// Sort chosen events for presentation: by end, then start, then id.
pub fn order_by_finish(catalog: &EventCatalog<'_>, members: &[EventIdx]) -> Vec<Event> {
    let mut events: Vec<Event> = members.iter().map(|&idx| catalog.event(idx).clone()).collect();
    events.sort_by_key(|e| (e.end, e.start, e.id));
    events
}
