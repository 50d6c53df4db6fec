//! Error types for structural edits.

use thiserror::Error;

use crate::model::{CurveId, RoadId};

/// Result type for edit-session operations.
pub type EditResult<T> = Result<T, EditError>;

/// Rejected edit. A failing operation never leaves partial changes behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// No curve with this id exists in the circuit.
    #[error("unknown curve {0}")]
    UnknownCurve(CurveId),

    /// No road with this id exists in the circuit.
    #[error("unknown road {0}")]
    UnknownRoad(RoadId),

    /// Point index is past the end of the curve.
    #[error("point {index} out of range on curve {curve} ({len} points)")]
    PointOutOfRange {
        curve: CurveId,
        index: usize,
        len: usize,
    },

    /// Cross-section point index is past the end of the profile.
    #[error("cross-section point {index} out of range ({len} points)")]
    SectionPointOutOfRange { index: usize, len: usize },

    /// Railing index is past the end of the road's railing list.
    #[error("railing {index} out of range on road {road} ({len} railings)")]
    RailingOutOfRange {
        road: RoadId,
        index: usize,
        len: usize,
    },

    /// Segment range does not fit the curve.
    #[error("segment range {start}..={end} invalid for curve with {segments} segments")]
    InvalidRange {
        start: usize,
        end: usize,
        segments: usize,
    },

    /// Segment range shares at least one segment with a sibling road.
    #[error("road {road} range overlaps road {other}")]
    RangeOverlap { road: RoadId, other: RoadId },

    /// Operation needs more points than were supplied.
    #[error("need at least {min} points, got {actual}")]
    TooFewPoints { min: usize, actual: usize },
}
