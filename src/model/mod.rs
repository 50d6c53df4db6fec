//! Persistent data model: plain serializable records owned by the host.
//!
//! Nothing here holds derived state; the live edit graph in [`crate::graph`]
//! wraps these records during an edit session.

mod circuit;
mod curve;
mod point;
mod road;
mod settings;

pub use circuit::{
    flat_cross_section, CircuitCurveData, CircuitData, CircuitPointData, CrossSectionData,
    CurveId, RoadId, FLAT_HALF_WIDTH,
};
pub use curve::{point_segment_distance_sq, segment_count, CurveData, CurvePoint};
pub use point::PointData;
pub use road::{
    range_segments, ranges_overlap, remap_range_after_insert, remap_range_after_remove,
    validate_range, BridgeData, BridgeProfile, BridgeTemplate, HostMeta, RailingData, RoadData,
    Sidedness, UvSettings,
};
pub use settings::{Settings, WaypointSettings};
