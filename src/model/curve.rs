use serde::{Deserialize, Serialize};

use crate::geometry::{auto_tangent, bezier, Float3};

use super::point::PointData;

/// Point types that can live in a [`CurveData`].
pub trait CurvePoint: Clone {
    fn point(&self) -> &PointData;
    fn point_mut(&mut self) -> &mut PointData;
    fn from_point(point: PointData) -> Self;
}

impl CurvePoint for PointData {
    fn point(&self) -> &PointData {
        self
    }

    fn point_mut(&mut self) -> &mut PointData {
        self
    }

    fn from_point(point: PointData) -> Self {
        point
    }
}

/// Ordered list of Bézier anchors. A closed curve has an extra segment
/// joining its last point back to its first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "P: Serialize", deserialize = "P: Deserialize<'de>"))]
pub struct CurveData<P> {
    pub points: Vec<P>,
    #[serde(default)]
    pub is_closed: bool,
}

impl<P> Default for CurveData<P> {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            is_closed: false,
        }
    }
}

impl<P: CurvePoint> CurveData<P> {
    pub fn new(points: Vec<P>, is_closed: bool) -> Self {
        Self { points, is_closed }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Option<&PointData> {
        self.points.get(index).map(CurvePoint::point)
    }

    pub fn point_mut(&mut self, index: usize) -> Option<&mut PointData> {
        self.points.get_mut(index).map(CurvePoint::point_mut)
    }

    pub fn segment_count(&self) -> usize {
        segment_count(self.points.len(), self.is_closed)
    }

    /// Anchor indices joined by segment `segment`.
    pub fn segment_points(&self, segment: usize) -> Option<(usize, usize)> {
        if segment >= self.segment_count() {
            return None;
        }
        Some((segment, (segment + 1) % self.points.len()))
    }

    /// Bézier control polygon `[p0, p1, p2, p3]` of segment `segment`.
    pub fn segment_controls(&self, segment: usize) -> Option<[Float3; 4]> {
        let (a, b) = self.segment_points(segment)?;
        let start = self.points[a].point();
        let end = self.points[b].point();
        Some([
            start.position,
            start.forward_control,
            end.backward_control,
            end.position,
        ])
    }

    pub fn evaluate(&self, segment: usize, t: f32) -> Option<Float3> {
        let [p0, p1, p2, p3] = self.segment_controls(segment)?;
        Some(bezier::cubic(p0, p1, p2, p3, t))
    }

    /// Neighbouring anchor indices, wrapping on closed curves.
    pub fn neighbors(&self, index: usize) -> (Option<usize>, Option<usize>) {
        let len = self.points.len();
        if index >= len || len < 2 {
            return (None, None);
        }
        let prev = if index > 0 {
            Some(index - 1)
        } else if self.is_closed {
            Some(len - 1)
        } else {
            None
        };
        let next = if index + 1 < len {
            Some(index + 1)
        } else if self.is_closed {
            Some(0)
        } else {
            None
        };
        (prev, next)
    }

    /// Direction of the chord through the neighbouring anchors; used as the
    /// tangent of a point whose handles are both degenerate.
    pub fn chord_direction(&self, index: usize) -> Option<Float3> {
        let (prev, next) = self.neighbors(index);
        let here = self.point(index)?.position;
        let from = prev.and_then(|i| self.point(i)).map_or(here, |p| p.position);
        let to = next.and_then(|i| self.point(i)).map_or(here, |p| p.position);
        (to - from).try_normalize()
    }

    /// Recomputes the handles of one point from its neighbours' anchors.
    pub fn apply_auto_tangent(&mut self, index: usize, fraction: f32) {
        let (prev, next) = self.neighbors(index);
        let prev = prev.and_then(|i| self.point(i)).map(|p| p.position);
        let next = next.and_then(|i| self.point(i)).map(|p| p.position);
        let Some(point) = self.point_mut(index) else {
            return;
        };
        let (forward, backward) = auto_tangent(prev, point.position, next, fraction);
        point.forward_control = forward;
        point.backward_control = backward;
    }

    /// Recomputes every point's handles. Interior points go first and the
    /// open endpoints last.
    pub fn apply_auto_tangents(&mut self, fraction: f32) {
        let len = self.points.len();
        if len == 0 {
            return;
        }
        if self.is_closed || len < 3 {
            for i in 0..len {
                self.apply_auto_tangent(i, fraction);
            }
            return;
        }
        for i in 1..len - 1 {
            self.apply_auto_tangent(i, fraction);
        }
        self.apply_auto_tangent(0, fraction);
        self.apply_auto_tangent(len - 1, fraction);
    }

    /// Segment of the anchor polyline closest to `target`, with the squared
    /// distance to it. Closed curves include the wraparound segment.
    pub fn closest_segment(&self, target: Float3) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for segment in 0..self.segment_count() {
            let (a, b) = self.segment_points(segment)?;
            let start = self.points[a].point().position;
            let end = self.points[b].point().position;
            let distance = point_segment_distance_sq(target, start, end);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((segment, distance));
            }
        }
        best
    }

    /// Estimated arc length of each segment.
    pub fn segment_lengths(&self, subdivisions: usize) -> Vec<f32> {
        (0..self.segment_count())
            .filter_map(|s| self.segment_controls(s))
            .map(|[p0, p1, p2, p3]| bezier::estimate_arc_length(p0, p1, p2, p3, subdivisions))
            .collect()
    }
}

pub fn segment_count(point_count: usize, is_closed: bool) -> usize {
    match point_count {
        0 | 1 => 0,
        n if is_closed => n,
        n => n - 1,
    }
}

/// Squared distance from `p` to segment `a..b`, parameter clamped to `[0, 1]`.
pub fn point_segment_distance_sq(p: Float3, a: Float3, b: Float3) -> f32 {
    let ab = b - a;
    let len_sq = ab.sqr_magnitude();
    let t = if len_sq > 0.0 {
        ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p - (a + ab * t)).sqr_magnitude()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TOLERANCE: f32 = 1e-5;

    fn curve(positions: &[Float3], closed: bool) -> CurveData<PointData> {
        CurveData::new(positions.iter().copied().map(PointData::new).collect(), closed)
    }

    fn triangle() -> CurveData<PointData> {
        curve(
            &[
                Float3::new(0.0, 0.0, 0.0),
                Float3::new(10.0, 0.0, 0.0),
                Float3::new(5.0, 10.0, 0.0),
            ],
            true,
        )
    }

    #[test]
    fn segment_count_depends_on_closure() {
        assert_eq!(segment_count(0, true), 0);
        assert_eq!(segment_count(1, true), 0);
        assert_eq!(segment_count(3, false), 2);
        assert_eq!(segment_count(3, true), 3);
    }

    #[test]
    fn closed_curve_wraps_last_segment() {
        let c = triangle();
        assert_eq!(c.segment_points(2), Some((2, 0)));
        assert_eq!(c.segment_points(3), None);
        assert_eq!(c.neighbors(0), (Some(2), Some(1)));
    }

    #[test]
    fn open_curve_has_no_wrap_neighbors() {
        let mut c = triangle();
        c.is_closed = false;
        assert_eq!(c.neighbors(0), (None, Some(1)));
        assert_eq!(c.neighbors(2), (Some(1), None));
        assert_eq!(c.segment_points(2), None);
    }

    #[test]
    fn closest_segment_projects_onto_polyline() {
        let c = triangle();
        let (segment, dist) = c.closest_segment(Float3::new(5.0, 0.0, 0.0)).unwrap();
        assert_eq!(segment, 0);
        assert_relative_eq!(dist, 0.0, epsilon = TOLERANCE);

        let (segment, _) = c.closest_segment(Float3::new(1.0, 6.0, 0.0)).unwrap();
        assert_eq!(segment, 2);
    }

    #[test]
    fn point_segment_distance_clamps_parameter() {
        let d = point_segment_distance_sq(
            Float3::new(-3.0, 4.0, 0.0),
            Float3::ZERO,
            Float3::new(10.0, 0.0, 0.0),
        );
        assert_relative_eq!(d, 25.0, epsilon = TOLERANCE);
    }

    #[test]
    fn auto_tangents_follow_the_polyline() {
        let mut c = curve(
            &[
                Float3::new(0.0, 0.0, 0.0),
                Float3::new(0.0, 0.0, 3.0),
                Float3::new(0.0, 0.0, 9.0),
            ],
            false,
        );
        c.apply_auto_tangents(1.0 / 3.0);
        let mid = c.point(1).unwrap();
        assert_relative_eq!(mid.forward_control.z, 5.0, epsilon = TOLERANCE);
        assert_relative_eq!(mid.backward_control.z, 2.0, epsilon = TOLERANCE);
        let first = c.point(0).unwrap();
        assert_relative_eq!(first.forward_control.z, 1.0, epsilon = TOLERANCE);
    }

    #[test]
    fn straight_curve_length() {
        let mut c = curve(&[Float3::ZERO, Float3::new(0.0, 0.0, 12.0)], false);
        c.apply_auto_tangents(1.0 / 3.0);
        let lengths = c.segment_lengths(16);
        assert_eq!(lengths.len(), 1);
        assert_relative_eq!(lengths[0], 12.0, epsilon = 1e-3);
    }

    #[test]
    fn chord_direction_spans_neighbors() {
        let c = triangle();
        let dir = c.chord_direction(1).unwrap();
        let expected = (Float3::new(5.0, 10.0, 0.0) - Float3::ZERO).normalize();
        assert_relative_eq!(dir.dot(expected), 1.0, epsilon = TOLERANCE);
    }
}
