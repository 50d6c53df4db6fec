use tracing::debug;

use crate::cross_section;
use crate::geometry::{bezier, Float3, Frame, Quaternion};
use crate::model::{CircuitPointData, CurveData, RoadData, WaypointSettings};

/// AI navigation marker along a road.
/// C-compatible layout for FFI.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Waypoint {
    pub position: Float3,
    pub rotation: Quaternion,
    pub scale: Float3,
}

impl Waypoint {
    pub const fn new(position: Float3, rotation: Quaternion, scale: Float3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub const DEFAULT: Self = Self::new(
        Float3::ZERO,
        Quaternion::IDENTITY,
        Float3::new(1.0, 1.0, 1.0),
    );
}

impl Default for Waypoint {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Curve sample used while refining waypoints.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WaypointSample {
    pub t: f32,
    pub position: Float3,
    pub frame: Frame,
    pub curvature: f32,
}

struct Segment {
    controls: [Float3; 4],
    up_start: Float3,
    up_end: Float3,
}

impl Segment {
    fn sample(&self, t: f32) -> WaypointSample {
        let [p0, p1, p2, p3] = self.controls;
        let tangent = bezier::cubic_tangent(p0, p1, p2, p3, t)
            .or_else(|| (p3 - p0).try_normalize())
            .unwrap_or(Float3::FORWARD);
        WaypointSample {
            t,
            position: bezier::cubic(p0, p1, p2, p3, t),
            frame: Frame::from_forward_up(tangent, self.up_start.lerp(self.up_end, t)),
            curvature: bezier::curvature(p0, p1, p2, p3, t),
        }
    }
}

fn lerp_sample(a: &WaypointSample, b: &WaypointSample, f: f32) -> WaypointSample {
    WaypointSample {
        t: a.t + (b.t - a.t) * f,
        position: a.position.lerp(b.position, f),
        frame: a.frame.lerp(b.frame, f),
        curvature: (a.curvature + b.curvature) * 0.5,
    }
}

/// Uniform samples with a single midpoint pass where curvature is high.
fn refine_curvature(
    segment: &Segment,
    uniform: Vec<WaypointSample>,
    threshold: f32,
) -> Vec<WaypointSample> {
    let mut refined = Vec::with_capacity(uniform.len() * 2);
    for (i, sample) in uniform.iter().enumerate() {
        refined.push(*sample);
        if let Some(next) = uniform.get(i + 1) {
            if sample.curvature.max(next.curvature) > threshold {
                refined.push(segment.sample((sample.t + next.t) * 0.5));
            }
        }
    }
    refined
}

/// Keeps the first and last sample and drops anything closer than
/// `min_spacing` to the last kept one.
fn filter_min_spacing(samples: &[WaypointSample], min_spacing: f32) -> Vec<WaypointSample> {
    let Some((last, rest)) = samples.split_last() else {
        return Vec::new();
    };
    let mut kept: Vec<WaypointSample> = Vec::with_capacity(samples.len());
    for sample in rest {
        let keep = kept
            .last()
            .map_or(true, |k| k.position.distance(sample.position) >= min_spacing);
        if keep {
            kept.push(*sample);
        }
    }
    kept.push(*last);
    kept
}

/// Fills gaps wider than `max_spacing` with evenly interpolated samples.
fn fill_max_spacing(samples: &[WaypointSample], max_spacing: f32) -> Vec<WaypointSample> {
    if max_spacing <= 0.0 {
        return samples.to_vec();
    }
    let mut filled = Vec::with_capacity(samples.len());
    for (i, sample) in samples.iter().enumerate() {
        filled.push(*sample);
        let Some(next) = samples.get(i + 1) else {
            continue;
        };
        let gap = sample.position.distance(next.position);
        if gap > max_spacing {
            let inserts = (gap / max_spacing).ceil() as usize - 1;
            for k in 1..=inserts {
                filled.push(lerp_sample(sample, next, k as f32 / (inserts + 1) as f32));
            }
        }
    }
    filled
}

/// Adaptive samples of one curve segment, before conversion to waypoints.
fn sample_segment(
    segment: &Segment,
    settings: &WaypointSettings,
    subdivisions: usize,
) -> Vec<WaypointSample> {
    let [p0, p1, p2, p3] = segment.controls;
    let length = bezier::estimate_arc_length(p0, p1, p2, p3, subdivisions);
    let count = ((length * settings.samples_per_unit()).ceil() as usize).max(2);

    let uniform: Vec<WaypointSample> = (0..count)
        .map(|i| segment.sample(i as f32 / (count - 1) as f32))
        .collect();
    let refined = refine_curvature(segment, uniform, settings.curvature_threshold);
    let spaced = filter_min_spacing(&refined, settings.min_spacing);
    fill_max_spacing(&spaced, settings.max_spacing)
}

/// Generates waypoints for every segment a road covers.
///
/// Each segment is sampled adaptively; the box scale is the average
/// cross-section width of the segment's two anchors plus the width buffer.
/// Segments after the first drop their first sample, which repeats the
/// previous segment's last one.
pub fn build_waypoints(
    curve: &CurveData<CircuitPointData>,
    road: &RoadData,
    settings: &WaypointSettings,
    subdivisions: usize,
) -> Vec<Waypoint> {
    let settings = settings.sanitized();
    let segments = road.segments(curve.len(), curve.is_closed);
    if segments.is_empty() {
        debug!(road = %road.id, "road has no segments, no waypoints");
        return Vec::new();
    }

    let mut waypoints = Vec::new();
    for (k, &index) in segments.iter().enumerate() {
        let (Some(controls), Some((a, b))) =
            (curve.segment_controls(index), curve.segment_points(index))
        else {
            continue;
        };
        let start = &curve.points[a];
        let end = &curve.points[b];
        let segment = Segment {
            controls,
            up_start: start.point.up,
            up_end: end.point.up,
        };
        let width = (cross_section::width(&start.cross_section)
            + cross_section::width(&end.cross_section))
            * 0.5;
        let scale = Float3::new(width + settings.width_buffer, settings.height, settings.depth);

        let samples = sample_segment(&segment, &settings, subdivisions);
        let skip = usize::from(k > 0);
        waypoints.extend(
            samples
                .iter()
                .skip(skip)
                .map(|s| Waypoint::new(s.position, s.frame.rotation(), scale)),
        );
    }
    waypoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CurveId, RoadId};
    use crate::track::fixtures::{closed_square, single_point_curve, straight_curve};
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    const TOLERANCE: f32 = 1e-4;

    fn spacings(waypoints: &[Waypoint]) -> Vec<f32> {
        waypoints
            .windows(2)
            .map(|w| w[0].position.distance(w[1].position))
            .collect()
    }

    #[test]
    fn straight_line_respects_spacing_bounds() {
        let curve = straight_curve(30.0);
        let road = RoadData::new(RoadId(1), CurveId(1), 0, 0);
        let settings = WaypointSettings::default();
        let waypoints = build_waypoints(&curve, &road, &settings, 16);

        assert!(waypoints.len() > 2);
        let gaps = spacings(&waypoints);
        let (last, rest) = gaps.split_last().unwrap();
        for gap in rest {
            assert!(*gap >= settings.min_spacing - TOLERANCE, "gap {gap}");
            assert!(*gap <= settings.max_spacing + TOLERANCE, "gap {gap}");
        }
        assert!(*last <= settings.max_spacing + TOLERANCE);
    }

    #[test]
    fn low_quality_fills_large_gaps() {
        let curve = straight_curve(25.0);
        let road = RoadData::new(RoadId(1), CurveId(1), 0, 0);
        let settings = WaypointSettings {
            quality: 0.0,
            ..WaypointSettings::default()
        };
        let waypoints = build_waypoints(&curve, &road, &settings, 16);
        // Three uniform samples 12.5 apart, each gap split once.
        assert_eq!(waypoints.len(), 5);
        for gap in spacings(&waypoints) {
            assert_relative_eq!(gap, 6.25, epsilon = 1e-3);
        }
    }

    #[test]
    fn waypoints_carry_frame_and_scale() {
        let curve = straight_curve(30.0);
        let road = RoadData::new(RoadId(1), CurveId(1), 0, 0);
        let settings = WaypointSettings::default();
        let waypoints = build_waypoints(&curve, &road, &settings, 16);

        let first = waypoints[0];
        // Travelling along +Z with world up needs no rotation.
        assert_relative_eq!(first.rotation.w.abs(), 1.0, epsilon = TOLERANCE);
        assert_relative_eq!(first.scale.x, 4.0 + settings.width_buffer, epsilon = TOLERANCE);
        assert_relative_eq!(first.scale.y, settings.height, epsilon = TOLERANCE);
        assert_relative_eq!(first.scale.z, settings.depth, epsilon = TOLERANCE);
    }

    #[test]
    fn segments_are_deduplicated() {
        let curve = closed_square(20.0);
        let road = RoadData::new(RoadId(1), CurveId(1), 0, 3);
        let waypoints = build_waypoints(&curve, &road, &WaypointSettings::default(), 16);
        for gap in spacings(&waypoints) {
            assert!(gap > TOLERANCE);
        }
    }

    #[test]
    fn curvature_refinement_adds_midpoints() {
        let segment = Segment {
            controls: [
                Float3::ZERO,
                Float3::new(0.0, 0.0, 5.0),
                Float3::new(5.0, 0.0, 10.0),
                Float3::new(10.0, 0.0, 10.0),
            ],
            up_start: Float3::UP,
            up_end: Float3::UP,
        };
        let uniform: Vec<WaypointSample> = (0..4).map(|i| segment.sample(i as f32 / 3.0)).collect();
        let refined = refine_curvature(&segment, uniform.clone(), 0.0);
        assert_eq!(refined.len(), uniform.len() * 2 - 1);
        let untouched = refine_curvature(&segment, uniform.clone(), 1e6);
        assert_eq!(untouched.len(), uniform.len());
    }

    #[test]
    fn sample_frames_are_orthonormal() {
        // Curved and banked segment; the coarse spacing forces interpolated fills.
        let segment = Segment {
            controls: [
                Float3::ZERO,
                Float3::new(0.0, 2.0, 8.0),
                Float3::new(12.0, -1.0, 14.0),
                Float3::new(20.0, 0.0, 20.0),
            ],
            up_start: Float3::UP,
            up_end: Float3::new(0.6, 0.8, 0.0),
        };
        let settings = WaypointSettings {
            quality: 5.0,
            min_spacing: 0.5,
            max_spacing: 1.5,
            curvature_threshold: 0.01,
            ..WaypointSettings::default()
        };
        let samples = sample_segment(&segment, &settings, 16);
        assert!(samples.len() > 4);
        for sample in &samples {
            assert!(sample.frame.is_orthonormal(1e-5), "t = {}", sample.t);
        }
    }

    #[test]
    fn degenerate_road_has_no_waypoints() {
        let curve = single_point_curve();
        let road = RoadData::new(RoadId(1), CurveId(1), 0, 0);
        assert!(build_waypoints(&curve, &road, &WaypointSettings::default(), 16).is_empty());
    }

    proptest! {
        #[test]
        fn straight_spacing_holds_for_any_settings(
            length in 5.0f32..80.0,
            quality in 0.0f32..100.0,
            min_spacing in 0.5f32..3.0,
            extra in 0.0f32..10.0,
        ) {
            let curve = straight_curve(length);
            let road = RoadData::new(RoadId(1), CurveId(1), 0, 0);
            let settings = WaypointSettings {
                quality,
                min_spacing,
                // Split gaps stay above half the maximum.
                max_spacing: min_spacing * 2.0 + extra,
                ..WaypointSettings::default()
            };
            let waypoints = build_waypoints(&curve, &road, &settings, 16);
            let gaps = spacings(&waypoints);
            if let Some((_, rest)) = gaps.split_last() {
                for gap in rest {
                    prop_assert!(*gap >= settings.min_spacing - 1e-3);
                    prop_assert!(*gap <= settings.max_spacing + 1e-3);
                }
            }
        }
    }
}
