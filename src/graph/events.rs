//! Change notifications raised by an edit session.
//!
//! Events are delivered two ways: synchronously to registered handlers, and
//! into a bounded queue the host polls. Neither path triggers a rebuild.

use std::collections::VecDeque;
use std::fmt;

use crate::model::{CurveId, RoadId};
use crate::track::MeshBuffer;

use super::handles::PointRef;

#[derive(Debug, Clone, PartialEq)]
pub enum EditEvent {
    /// Anchor, handles or up vector of a point changed.
    PointChanged(PointRef),
    /// Points were added or removed, or the curve was opened or closed.
    CurveChanged(CurveId),
    /// The cross-section owned by a point changed.
    CrossSectionChanged(PointRef),
    /// Range, bridge or railing descriptors of a road changed.
    RoadChanged(RoadId),
    RoadBuilt { road: RoadId, mesh: MeshBuffer },
    BridgeBuilt { road: RoadId, mesh: MeshBuffer },
    RailingBuilt {
        road: RoadId,
        index: usize,
        mesh: MeshBuffer,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Point,
    Curve,
    CrossSection,
    Road,
    Build,
}

impl EditEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PointChanged(_) => EventKind::Point,
            Self::CurveChanged(_) => EventKind::Curve,
            Self::CrossSectionChanged(_) => EventKind::CrossSection,
            Self::RoadChanged(_) => EventKind::Road,
            Self::RoadBuilt { .. } | Self::BridgeBuilt { .. } | Self::RailingBuilt { .. } => {
                EventKind::Build
            }
        }
    }
}

/// Which events a handler receives.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EventFilter {
    #[default]
    All,
    Kinds(Vec<EventKind>),
}

impl EventFilter {
    pub fn matches(&self, event: &EditEvent) -> bool {
        match self {
            Self::All => true,
            Self::Kinds(kinds) => kinds.contains(&event.kind()),
        }
    }
}

/// Handle returned by [`Notifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

type EventHandler = Box<dyn FnMut(&EditEvent)>;

/// Queue capacity used by [`Notifier::default`].
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

pub struct Notifier {
    queue: VecDeque<EditEvent>,
    capacity: usize,
    handlers: Vec<(SubscriptionId, EventFilter, EventHandler)>,
    next_id: u64,
}

impl Notifier {
    /// Notifier whose poll queue keeps at most `capacity` events, dropping
    /// the oldest. A capacity of zero disables queueing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity,
            handlers: Vec::new(),
            next_id: 1,
        }
    }

    pub fn subscribe<F>(&mut self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: FnMut(&EditEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, filter, Box::new(handler)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub, _, _)| *sub != id);
        self.handlers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn emit(&mut self, event: EditEvent) {
        for (_, filter, handler) in &mut self.handlers {
            if filter.matches(&event) {
                handler(&event);
            }
        }
        if self.capacity == 0 {
            return;
        }
        if self.queue.len() == self.capacity {
            self.queue.pop_front();
        }
        self.queue.push_back(event);
    }

    /// Removes and returns every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<EditEvent> {
        self.queue.drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("queued", &self.queue.len())
            .field("capacity", &self.capacity)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
