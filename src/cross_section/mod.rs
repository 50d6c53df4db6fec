//! Cross-section subsystem.
//!
//! A cross-section is a 2D profile curve (x across, y up, z = 0) expressed in
//! its parent circuit point's right/up frame. It is always open, its handles
//! are always automatic, and it carries an arc-length normalization used for
//! resampling and for sweeping road meshes.

mod presets;

pub use presets::CrossSectionPreset;

use tracing::debug;

use crate::geometry::{bezier, Float2, Float3, Frame, EPSILON};
use crate::model::{CrossSectionData, PointData};

/// Arc-length parameterization of a cross-section.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SectionArc {
    /// Normalized arc position of each point, 0 at the first and 1 at the last.
    pub normalized: Vec<f32>,
    /// Cumulative length at each point.
    pub cumulative: Vec<f32>,
    /// Per-segment arc-length lookup tables.
    pub tables: Vec<Vec<f32>>,
    pub length: f32,
}

impl SectionArc {
    pub fn compute(section: &CrossSectionData, subdivisions: usize) -> Self {
        let count = section.len();
        let mut cumulative = Vec::with_capacity(count);
        let mut tables = Vec::with_capacity(count.saturating_sub(1));
        let mut total = 0.0;
        if count > 0 {
            cumulative.push(0.0);
        }
        for segment in 0..count.saturating_sub(1) {
            let [p0, p1, p2, p3] = open_segment(section, segment);
            let table = bezier::arc_length_table(p0, p1, p2, p3, subdivisions);
            total += table.last().copied().unwrap_or(0.0);
            cumulative.push(total);
            tables.push(table);
        }

        let normalized = if total > EPSILON {
            cumulative.iter().map(|d| d / total).collect()
        } else {
            // Coincident points: spread evenly so sampling stays well defined.
            let last = count.saturating_sub(1).max(1) as f32;
            (0..count).map(|i| i as f32 / last).collect()
        };

        Self {
            normalized,
            cumulative,
            tables,
            length: total,
        }
    }

    /// Local position at normalized arc parameter `s` in [0, 1].
    pub fn sample(&self, section: &CrossSectionData, s: f32) -> Option<Float3> {
        let count = section.len();
        if count == 0 {
            return None;
        }
        if count == 1 {
            return Some(section.points[0].position);
        }
        let s = s.clamp(0.0, 1.0);

        if self.length <= EPSILON {
            let segment = ((s * (count - 1) as f32) as usize).min(count - 2);
            let local = s * (count - 1) as f32 - segment as f32;
            let [p0, p1, p2, p3] = open_segment(section, segment);
            return Some(bezier::cubic(p0, p1, p2, p3, local));
        }

        let target = s * self.length;
        let segment = self
            .cumulative
            .partition_point(|&d| d <= target)
            .saturating_sub(1)
            .min(count - 2);
        let local = target - self.cumulative[segment];
        let t = bezier::parameter_at_distance(&self.tables[segment], local);
        let [p0, p1, p2, p3] = open_segment(section, segment);
        Some(bezier::cubic(p0, p1, p2, p3, t))
    }

    /// `count` evenly spaced samples along the profile, as (across, up) pairs.
    pub fn profile(&self, section: &CrossSectionData, count: usize) -> Vec<Float2> {
        if count < 2 || section.len() < 2 {
            return Vec::new();
        }
        (0..count)
            .filter_map(|i| self.sample(section, i as f32 / (count - 1) as f32))
            .map(Float2::from)
            .collect()
    }
}

fn open_segment(section: &CrossSectionData, segment: usize) -> [Float3; 4] {
    let a = &section.points[segment];
    let b = &section.points[segment + 1];
    [a.position, a.forward_control, b.backward_control, b.position]
}

fn flatten(p: Float3) -> Float3 {
    Float3::new(p.x, p.y, 0.0)
}

/// Re-applies the cross-section invariants: open, planar and auto-tangent
/// handles for every point (interior points before endpoints).
pub fn refresh(section: &mut CrossSectionData, tangent_fraction: f32) {
    section.is_closed = false;
    for point in &mut section.points {
        point.position = flatten(point.position);
        point.sanitize();
    }
    section.apply_auto_tangents(tangent_fraction);
}

/// Replaces every point of the profile in one step.
pub fn set_points_from_local_positions(
    section: &mut CrossSectionData,
    positions: &[Float3],
    tangent_fraction: f32,
) {
    section.points = positions
        .iter()
        .map(|&p| PointData::new(flatten(p)))
        .collect();
    refresh(section, tangent_fraction);
}

/// Applies a preset shape. Fewer than two points falls back to the flat preset.
pub fn apply_preset(section: &mut CrossSectionData, points: &[Float3], tangent_fraction: f32) {
    if points.len() < 2 {
        debug!(count = points.len(), "cross-section preset too short, using flat preset");
        let flat = CrossSectionPreset::Flat.points();
        set_points_from_local_positions(section, &flat, tangent_fraction);
        return;
    }
    set_points_from_local_positions(section, points, tangent_fraction);
}

/// Resamples the profile to `count` points spread evenly by arc length.
///
/// Returns false (and leaves the profile alone) when `count < 2`. A profile
/// with fewer than two points is bootstrapped from the flat preset.
pub fn change_point_count(
    section: &mut CrossSectionData,
    count: usize,
    tangent_fraction: f32,
    subdivisions: usize,
) -> bool {
    if count < 2 {
        debug!(count, "ignoring cross-section point count below 2");
        return false;
    }
    if section.len() < 2 {
        apply_preset(section, &CrossSectionPreset::Flat.points(), tangent_fraction);
        return true;
    }

    let arc = SectionArc::compute(section, subdivisions);
    let positions: Vec<Float3> = (0..count)
        .filter_map(|i| arc.sample(section, i as f32 / (count - 1) as f32))
        .collect();
    set_points_from_local_positions(section, &positions, tangent_fraction);
    true
}

/// Moves one point and recomputes every handle of the profile.
pub fn move_point(
    section: &mut CrossSectionData,
    index: usize,
    local: Float3,
    tangent_fraction: f32,
) -> bool {
    let Some(point) = section.point_mut(index) else {
        return false;
    };
    point.position = flatten(local);
    refresh(section, tangent_fraction);
    true
}

/// Horizontal extent of the profile anchors (max x - min x).
pub fn width(section: &CrossSectionData) -> f32 {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for point in &section.points {
        min = min.min(point.position.x);
        max = max.max(point.position.x);
    }
    if min > max {
        0.0
    } else {
        max - min
    }
}

/// World position of a cross-section local coordinate.
///
/// Without a parent the local coordinate is returned unchanged.
pub fn to_world(parent: Option<(Float3, &Frame)>, local: Float3) -> Float3 {
    match parent {
        Some((origin, frame)) => frame.local_to_world(origin, Float3::new(local.x, local.y, 0.0)),
        None => local,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::flat_cross_section;
    use approx::assert_relative_eq;

    const FRACTION: f32 = 1.0 / 3.0;
    const SUBDIVISIONS: usize = 32;

    fn crowned() -> CrossSectionData {
        let mut section = CrossSectionData::default();
        apply_preset(&mut section, &CrossSectionPreset::Crowned.points(), FRACTION);
        section
    }

    #[test]
    fn flat_preset_yields_two_points() {
        let mut section = crowned();
        apply_preset(&mut section, &CrossSectionPreset::Flat.points(), FRACTION);
        assert_eq!(section.len(), 2);
        assert_eq!(section.points[0].position, Float3::new(-2.0, 0.0, 0.0));
        assert_eq!(section.points[1].position, Float3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn short_preset_falls_back_to_flat() {
        let mut section = crowned();
        apply_preset(&mut section, &[Float3::new(1.0, 1.0, 0.0)], FRACTION);
        assert_eq!(section.len(), 2);
        assert_eq!(section.points[1].position, Float3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn set_points_forces_open_and_planar() {
        let mut section = flat_cross_section();
        section.is_closed = true;
        set_points_from_local_positions(
            &mut section,
            &[Float3::new(-1.0, 0.0, 3.0), Float3::new(1.0, 0.0, -2.0)],
            FRACTION,
        );
        assert!(!section.is_closed);
        assert!(section.points.iter().all(|p| p.position.z == 0.0));
    }

    #[test]
    fn normalization_spans_zero_to_one() {
        let section = crowned();
        let arc = SectionArc::compute(&section, SUBDIVISIONS);
        assert_relative_eq!(arc.normalized[0], 0.0);
        assert_relative_eq!(arc.normalized[2], 1.0);
        assert_relative_eq!(arc.normalized[1], 0.5, epsilon = 1e-4);
        assert!(arc.length > 4.0);
    }

    #[test]
    fn sample_hits_endpoints() {
        let section = crowned();
        let arc = SectionArc::compute(&section, SUBDIVISIONS);
        let start = arc.sample(&section, 0.0).unwrap();
        let end = arc.sample(&section, 1.0).unwrap();
        assert_relative_eq!(start.x, -2.0, epsilon = 1e-5);
        assert_relative_eq!(end.x, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn change_point_count_below_two_is_noop() {
        let mut section = crowned();
        let before = section.clone();
        assert!(!change_point_count(&mut section, 1, FRACTION, SUBDIVISIONS));
        assert_eq!(section, before);
    }

    #[test]
    fn change_point_count_bootstraps_empty_profile() {
        let mut section = CrossSectionData::default();
        assert!(change_point_count(&mut section, 5, FRACTION, SUBDIVISIONS));
        assert_eq!(section.len(), 2);
    }

    #[test]
    fn resample_round_trip_keeps_shape() {
        let mut section = crowned();
        let original: Vec<Float3> = section.points.iter().map(|p| p.position).collect();

        assert!(change_point_count(&mut section, 7, FRACTION, SUBDIVISIONS));
        assert_eq!(section.len(), 7);
        assert!(change_point_count(&mut section, 4, FRACTION, SUBDIVISIONS));
        assert!(change_point_count(&mut section, 3, FRACTION, SUBDIVISIONS));
        assert_eq!(section.len(), 3);

        for (p, o) in section.points.iter().zip(&original) {
            assert!(p.position.distance(*o) < 0.1, "{:?} vs {:?}", p.position, o);
        }
    }

    #[test]
    fn move_point_recomputes_tangents() {
        let mut section = crowned();
        assert!(move_point(&mut section, 1, Float3::new(0.0, 1.0, 0.0), FRACTION));
        let first = &section.points[0];
        // First handle now aims up toward the raised centre.
        assert!(first.forward_control.y > 0.0);
        assert!(!move_point(&mut section, 9, Float3::ZERO, FRACTION));
    }

    #[test]
    fn width_measures_anchor_extent() {
        assert_relative_eq!(width(&crowned()), 4.0);
        assert_relative_eq!(width(&CrossSectionData::default()), 0.0);
    }

    #[test]
    fn to_world_without_parent_is_identity() {
        let local = Float3::new(1.5, 0.5, 0.0);
        assert_eq!(to_world(None, local), local);
        let frame = Frame::DEFAULT;
        let world = to_world(Some((Float3::new(0.0, 1.0, 0.0), &frame)), local);
        assert_relative_eq!(world.x, 1.5);
        assert_relative_eq!(world.y, 1.5);
    }

    #[test]
    fn profile_samples_evenly() {
        let section = flat_cross_section();
        let arc = SectionArc::compute(&section, SUBDIVISIONS);
        let profile = arc.profile(&section, 5);
        assert_eq!(profile.len(), 5);
        assert_relative_eq!(profile[2].x, 0.0, epsilon = 1e-3);
        assert_relative_eq!(profile[1].x, -1.0, epsilon = 1e-2);
    }
}
