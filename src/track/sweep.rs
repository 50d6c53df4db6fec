use tracing::debug;

use crate::cross_section::SectionArc;
use crate::geometry::{bezier, Float2, Float3, Frame};
use crate::model::{CircuitPointData, CurveData, RoadData};

/// A ring of the road sweep: a point on the main curve, its frame and the
/// interpolated cross-section profile at that point.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSample {
    /// Accumulated distance from the start of the road.
    pub distance: f32,
    pub position: Float3,
    pub frame: Frame,
    /// Local (across, up) profile, `width_vertex_count` entries.
    pub profile: Vec<Float2>,
}

impl SweepSample {
    /// World position of a local profile coordinate.
    pub fn to_world(&self, local: Float2) -> Float3 {
        self.frame.local_to_world(self.position, local.extend())
    }

    /// Profile point at normalized position `f` across the road.
    pub fn profile_at(&self, f: f32) -> Float2 {
        let Some(last) = self.profile.len().checked_sub(1) else {
            return Float2::ZERO;
        };
        let x = f.clamp(0.0, 1.0) * last as f32;
        let i = (x as usize).min(last.saturating_sub(1));
        let j = (i + 1).min(last);
        self.profile[i].lerp(self.profile[j], x - i as f32)
    }

    /// Left and right edges of the profile (min x, max x).
    pub fn extents(&self) -> (f32, f32) {
        self.profile
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.x), hi.max(p.x))
            })
    }
}

/// Road sweep sampled along its segment range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sweep {
    pub samples: Vec<SweepSample>,
}

impl Sweep {
    pub fn is_empty(&self) -> bool {
        self.samples.len() < 2
    }

    pub fn length(&self) -> f32 {
        self.samples.last().map_or(0.0, |s| s.distance)
    }

    /// Sample interpolated at a distance along the road. Uses binary search
    /// to find the bracketing pair, then lerps position, frame and profile.
    /// Distances outside the road clamp to its ends.
    pub fn interpolate_at_distance(&self, distance: f32) -> Option<SweepSample> {
        let first = self.samples.first()?;
        if distance <= first.distance {
            return Some(first.clone());
        }
        let last = self.samples.len() - 1;
        if distance >= self.samples[last].distance {
            return Some(self.samples[last].clone());
        }

        let mut lo = 0usize;
        let mut hi = last;
        while lo < hi - 1 {
            let mid = (lo + hi) / 2;
            if self.samples[mid].distance <= distance {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let a = &self.samples[lo];
        let b = &self.samples[lo + 1];
        let span = b.distance - a.distance;
        let t = if span > 0.0 {
            (distance - a.distance) / span
        } else {
            0.0
        };
        Some(SweepSample {
            distance,
            position: a.position.lerp(b.position, t),
            frame: a.frame.lerp(b.frame, t),
            profile: lerp_profile(&a.profile, &b.profile, t),
        })
    }
}

fn lerp_profile(a: &[Float2], b: &[Float2], t: f32) -> Vec<Float2> {
    a.iter().zip(b).map(|(p, q)| p.lerp(*q, t)).collect()
}

/// Sweeps a road's cross-sections along its slice of the main curve.
///
/// Each segment gets `ceil(length * length_density)` rings (at least one);
/// profiles are resampled to `width_vertex_count` points by arc length and
/// blended between the segment's two anchors. Returns an empty sweep when
/// the road covers fewer than two points, a cross-section has fewer than
/// two points, or the width resolution is below two.
pub fn sweep_road(
    curve: &CurveData<CircuitPointData>,
    road: &RoadData,
    subdivisions: usize,
) -> Sweep {
    let point_count = curve.len();
    let points = road.points(point_count, curve.is_closed);
    if points.len() < 2 {
        debug!(road = %road.id, points = points.len(), "road covers fewer than 2 points");
        return Sweep::default();
    }
    let width = road.width_vertex_count;
    if width < 2 {
        debug!(road = %road.id, width, "road width resolution below 2");
        return Sweep::default();
    }

    let mut profiles = Vec::with_capacity(points.len());
    for &index in &points {
        let section = &curve.points[index].cross_section;
        let profile = SectionArc::compute(section, subdivisions).profile(section, width);
        if profile.len() < 2 {
            debug!(road = %road.id, point = index, "cross-section has fewer than 2 points");
            return Sweep::default();
        }
        profiles.push(profile);
    }

    let segments = road.segments(point_count, curve.is_closed);
    let mut samples: Vec<SweepSample> = Vec::new();
    let mut distance = 0.0;
    for (k, &segment) in segments.iter().enumerate() {
        let Some([p0, p1, p2, p3]) = curve.segment_controls(segment) else {
            continue;
        };
        let (a, b) = (points[k], points[k + 1]);
        let up_a = curve.points[a].point.up;
        let up_b = curve.points[b].point.up;
        let chord = (p3 - p0).try_normalize();

        let length = bezier::estimate_arc_length(p0, p1, p2, p3, subdivisions);
        let rings = ((length * road.length_density.max(0.0)).ceil() as usize).max(1);
        let last_segment = k + 1 == segments.len();
        let steps = if last_segment { rings + 1 } else { rings };

        for step in 0..steps {
            let t = step as f32 / rings as f32;
            let position = bezier::cubic(p0, p1, p2, p3, t);
            let tangent = bezier::cubic_tangent(p0, p1, p2, p3, t)
                .or(chord)
                .or_else(|| samples.last().map(|s| s.frame.forward))
                .unwrap_or(Float3::FORWARD);
            let frame = Frame::from_forward_up(tangent, up_a.lerp(up_b, t));
            if let Some(prev) = samples.last() {
                distance += prev.position.distance(position);
            }
            samples.push(SweepSample {
                distance,
                position,
                frame,
                profile: lerp_profile(&profiles[k], &profiles[k + 1], t),
            });
        }
    }

    if samples.len() < 2 {
        return Sweep::default();
    }
    Sweep { samples }
}
