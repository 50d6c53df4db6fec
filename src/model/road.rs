use serde::{Deserialize, Serialize};

use crate::error::{EditError, EditResult};
use crate::geometry::Float2;

use super::circuit::{CurveId, RoadId};
use super::curve::segment_count;

/// Host-side metadata carried through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostMeta {
    pub material: String,
    pub physics_material: String,
    pub layer: i32,
    pub tag: String,
    pub generate_collider: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UvSettings {
    pub tiling: Float2,
    pub offset: Float2,
    /// Tile by accumulated world distance instead of a normalized 0..1 range.
    pub distance_based: bool,
}

impl Default for UvSettings {
    fn default() -> Self {
        Self {
            tiling: Float2::ONE,
            offset: Float2::ZERO,
            distance_based: false,
        }
    }
}

/// Which faces of a railing wall are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sidedness {
    #[default]
    Double,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RailingData {
    pub visible: bool,
    pub height: f32,
    /// Normalized start along the road, 0..1.
    pub min: f32,
    /// Normalized end along the road, 0..1.
    pub max: f32,
    /// Normalized position across the road's cross-section, 0..1.
    pub horizontal_position: f32,
    pub sidedness: Sidedness,
    pub uv: UvSettings,
    pub meta: HostMeta,
}

impl Default for RailingData {
    fn default() -> Self {
        Self {
            visible: true,
            height: 1.0,
            min: 0.0,
            max: 1.0,
            horizontal_position: 0.0,
            sidedness: Sidedness::Double,
            uv: UvSettings::default(),
            meta: HostMeta::default(),
        }
    }
}

/// Parametric bridge profile hung under the road.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeTemplate {
    pub edge_width: f32,
    pub bridge_height: f32,
    pub flange_width: f32,
    pub flange_height: f32,
    pub flange_depth: f32,
    pub curb_height: f32,
}

impl Default for BridgeTemplate {
    fn default() -> Self {
        Self {
            edge_width: 0.5,
            bridge_height: 1.5,
            flange_width: 0.75,
            flange_height: 0.3,
            flange_depth: 0.4,
            curb_height: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BridgeProfile {
    Template(BridgeTemplate),
    /// Right half of the profile (x >= 0 from the road centre line, y up
    /// from the road surface); mirrored to build the full outline.
    Custom { half_profile: Vec<Float2> },
}

impl Default for BridgeProfile {
    fn default() -> Self {
        Self::Template(BridgeTemplate::default())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeData {
    pub enabled: bool,
    pub profile: BridgeProfile,
    pub uv: UvSettings,
    pub meta: HostMeta,
}

/// A road is a slice of one parent curve: the inclusive segment range
/// `start_segment..=end_segment`. On a closed curve a range with
/// `end_segment < start_segment` wraps past the seam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadData {
    pub id: RoadId,
    pub curve: CurveId,
    pub start_segment: usize,
    pub end_segment: usize,
    /// Vertices across the road.
    #[serde(default = "default_width_vertices")]
    pub width_vertex_count: usize,
    /// Vertex rings per unit of road length.
    #[serde(default = "default_length_density")]
    pub length_density: f32,
    #[serde(default)]
    pub uv: UvSettings,
    #[serde(default)]
    pub railings: Vec<RailingData>,
    #[serde(default)]
    pub bridge: BridgeData,
    #[serde(default)]
    pub meta: HostMeta,
}

fn default_width_vertices() -> usize {
    8
}

fn default_length_density() -> f32 {
    1.0
}

impl RoadData {
    pub fn new(id: RoadId, curve: CurveId, start_segment: usize, end_segment: usize) -> Self {
        Self {
            id,
            curve,
            start_segment,
            end_segment,
            width_vertex_count: default_width_vertices(),
            length_density: default_length_density(),
            uv: UvSettings::default(),
            railings: Vec::new(),
            bridge: BridgeData::default(),
            meta: HostMeta::default(),
        }
    }

    /// Segment indices covered by this road, in travel order.
    pub fn segments(&self, point_count: usize, is_closed: bool) -> Vec<usize> {
        range_segments(self.start_segment, self.end_segment, point_count, is_closed)
    }

    /// Anchor indices covered by this road, in travel order. A road on a
    /// curve with no segments covers at most its start point.
    pub fn points(&self, point_count: usize, is_closed: bool) -> Vec<usize> {
        let segments = self.segments(point_count, is_closed);
        let Some(&first) = segments.first() else {
            return if point_count == 0 {
                Vec::new()
            } else {
                vec![self.start_segment.min(point_count - 1)]
            };
        };
        let mut points = Vec::with_capacity(segments.len() + 1);
        points.push(first);
        points.extend(segments.iter().map(|s| (s + 1) % point_count));
        points
    }
}

/// Checks that `start..=end` is a usable range on a curve.
pub fn validate_range(
    start: usize,
    end: usize,
    point_count: usize,
    is_closed: bool,
) -> EditResult<()> {
    let segments = segment_count(point_count, is_closed);
    let invalid = EditError::InvalidRange {
        start,
        end,
        segments,
    };
    if start >= segments || end >= segments {
        return Err(invalid);
    }
    if !is_closed && end < start {
        return Err(invalid);
    }
    Ok(())
}

/// Segments in `start..=end`, wrapping on closed curves. Out-of-range values
/// from stale data are clamped rather than rejected.
pub fn range_segments(start: usize, end: usize, point_count: usize, is_closed: bool) -> Vec<usize> {
    let segments = segment_count(point_count, is_closed);
    if segments == 0 {
        return Vec::new();
    }
    let start = start.min(segments - 1);
    let end = end.min(segments - 1);
    if is_closed {
        let count = (end + segments - start) % segments + 1;
        (0..count).map(|k| (start + k) % segments).collect()
    } else if end < start {
        Vec::new()
    } else {
        (start..=end).collect()
    }
}

/// Shifts a range after a point was inserted at `index` on its curve;
/// `point_count` is the count before insertion. The segment that was split
/// keeps both halves inside the range.
///
/// On a closed curve, inserting at 0 splits the wrap segment: its first half
/// becomes the new wrap segment and its second half the new segment 0.
pub fn remap_range_after_insert(
    start: usize,
    end: usize,
    index: usize,
    point_count: usize,
    is_closed: bool,
) -> (usize, usize) {
    if is_closed && index == 0 && point_count >= 2 {
        let wrap = point_count - 1;
        let new_start = if start == wrap { point_count } else { start + 1 };
        let new_end = if end == wrap { 0 } else { end + 1 };
        return (new_start, new_end);
    }
    let shift = |s: usize, bound: usize| if s >= bound { s + 1 } else { s };
    // Inserting at `index` splits segment `index - 1` (or prepends at 0).
    let split = index.saturating_sub(1);
    let new_end = if index == 0 { end + 1 } else { shift(end, split) };
    let new_start = shift(start, index);
    (new_start, new_end)
}

/// Shifts a range after the point at `index` was removed; `point_count` is
/// the count after removal. The two segments that met at the removed point
/// merge into one; on a closed curve removing point 0 merges into the new
/// wrap segment.
///
/// Removing an endpoint of an open curve deletes its end segment outright.
/// A road covering only that segment moves onto the neighbouring one, so
/// roads never end up with an empty range.
pub fn remap_range_after_remove(
    start: usize,
    end: usize,
    index: usize,
    point_count: usize,
    is_closed: bool,
) -> (usize, usize) {
    let segments = segment_count(point_count, is_closed);
    let max = segments.saturating_sub(1);
    let shift = |s: usize| {
        if is_closed && index == 0 && s == 0 {
            max
        } else if s >= index && s > 0 {
            s - 1
        } else {
            s
        }
    };
    (shift(start).min(max), shift(end).min(max))
}

/// Whether two ranges on the same curve share a segment.
pub fn ranges_overlap(
    a: (usize, usize),
    b: (usize, usize),
    point_count: usize,
    is_closed: bool,
) -> bool {
    let first = range_segments(a.0, a.1, point_count, is_closed);
    let second = range_segments(b.0, b.1, point_count, is_closed);
    first.iter().any(|s| second.contains(s))
}
