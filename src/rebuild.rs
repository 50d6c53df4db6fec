//! Pending road rebuilds.
//!
//! Edits mark roads dirty from wherever they happen; the host drains the set
//! once per frame and rebuilds each road exactly once.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::model::RoadId;

/// Thread-safe set of roads awaiting a rebuild. Clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct RebuildQueue {
    dirty: Arc<Mutex<HashSet<RoadId>>>,
}

impl RebuildQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a road dirty. Marking an already dirty road has no effect.
    pub fn mark_dirty(&self, road: RoadId) {
        if self.dirty.lock().insert(road) {
            trace!(%road, "road marked dirty");
        }
    }

    pub fn mark_all<I: IntoIterator<Item = RoadId>>(&self, roads: I) {
        let mut dirty = self.dirty.lock();
        for road in roads {
            dirty.insert(road);
        }
    }

    /// Drops a road from the pending set, e.g. after it was removed.
    pub fn forget(&self, road: RoadId) {
        self.dirty.lock().remove(&road);
    }

    pub fn is_dirty(&self, road: RoadId) -> bool {
        self.dirty.lock().contains(&road)
    }

    pub fn len(&self) -> usize {
        self.dirty.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirty.lock().is_empty()
    }

    /// Returns every dirty road (sorted by id) and clears the set atomically.
    pub fn get_and_clear(&self) -> Vec<RoadId> {
        let drained = std::mem::take(&mut *self.dirty.lock());
        let mut roads: Vec<RoadId> = drained.into_iter().collect();
        roads.sort_unstable();
        roads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn marking_is_idempotent() {
        let queue = RebuildQueue::new();
        queue.mark_dirty(RoadId(3));
        queue.mark_dirty(RoadId(3));
        queue.mark_dirty(RoadId(1));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.get_and_clear(), vec![RoadId(1), RoadId(3)]);
    }

    #[test]
    fn second_drain_is_empty() {
        let queue = RebuildQueue::new();
        queue.mark_dirty(RoadId(5));
        assert_eq!(queue.get_and_clear(), vec![RoadId(5)]);
        assert!(queue.get_and_clear().is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn clones_share_state() {
        let queue = RebuildQueue::new();
        let handle = queue.clone();
        handle.mark_dirty(RoadId(2));
        assert!(queue.is_dirty(RoadId(2)));
        queue.forget(RoadId(2));
        assert!(!handle.is_dirty(RoadId(2)));
    }

    #[test]
    fn concurrent_marks_are_drained_once() {
        const THREADS: u32 = 8;
        const ROADS: u32 = 64;

        let queue = RebuildQueue::new();
        std::thread::scope(|scope| {
            for _ in 0..THREADS {
                let queue = queue.clone();
                scope.spawn(move || {
                    for road in 0..ROADS {
                        queue.mark_dirty(RoadId(road));
                    }
                });
            }
        });

        let drained = queue.get_and_clear();
        assert_eq!(drained.len(), ROADS as usize);
        assert_eq!(drained, (0..ROADS).map(RoadId).collect::<Vec<_>>());
        assert!(queue.get_and_clear().is_empty());
    }

    #[test]
    fn drain_races_with_marking_without_loss() {
        let queue = RebuildQueue::new();
        let mut seen = HashSet::new();
        std::thread::scope(|scope| {
            let writer = queue.clone();
            let handle = scope.spawn(move || {
                for road in 0..500 {
                    writer.mark_dirty(RoadId(road));
                }
            });
            while !handle.is_finished() {
                seen.extend(queue.get_and_clear());
            }
        });
        seen.extend(queue.get_and_clear());
        assert_eq!(seen.len(), 500);
    }

    proptest! {
        #[test]
        fn concurrent_marks_drain_as_one_set(
            batches in proptest::collection::vec(
                proptest::collection::vec(0u32..40, 0..30),
                1..6,
            ),
        ) {
            let queue = RebuildQueue::new();
            std::thread::scope(|scope| {
                for batch in &batches {
                    let queue = queue.clone();
                    scope.spawn(move || {
                        for &road in batch {
                            queue.mark_dirty(RoadId(road));
                        }
                    });
                }
            });

            let mut expected: Vec<RoadId> = batches.iter().flatten().map(|&r| RoadId(r)).collect();
            expected.sort_unstable();
            expected.dedup();
            prop_assert_eq!(queue.get_and_clear(), expected);
            prop_assert!(queue.get_and_clear().is_empty());
        }
    }
}
