//! Live edit graph.
//!
//! An [`EditSession`] wraps a [`CircuitData`](crate::model::CircuitData) with
//! derived per-point state and routes every edit through validation, change
//! notification and the rebuild queue.

mod events;
mod handles;
mod live;
mod session;

pub use events::{
    EditEvent, EventFilter, EventKind, Notifier, SubscriptionId, DEFAULT_QUEUE_CAPACITY,
};
pub use handles::{PointRef, SectionPointRef};
pub use live::{LiveCurve, LiveGraph, LivePoint, LiveSection};
pub use session::EditSession;
