use tracing::debug;

use crate::model::{RailingData, Sidedness};

use super::mesh::{apply_uv, MeshBuffer};
use super::sweep::Sweep;

/// Builds a vertical railing wall along part of the road.
///
/// The wall runs from `min` to `max` (normalized road distance), stands at
/// `horizontal_position` across the profile and rises `height` along each
/// ring's up vector. Right-facing triangles face the road's right vector;
/// `Double` emits both faces with separate vertices.
pub fn build_railing_mesh(sweep: &Sweep, railing: &RailingData) -> MeshBuffer {
    if !railing.visible || sweep.is_empty() {
        return MeshBuffer::default();
    }
    let min = railing.min.clamp(0.0, 1.0);
    let max = railing.max.clamp(0.0, 1.0);
    if max <= min || railing.height <= 0.0 {
        debug!(min, max, height = railing.height, "degenerate railing range");
        return MeshBuffer::default();
    }

    let length = sweep.length();
    let start = min * length;
    let end = max * length;
    let mut distances = vec![start];
    distances.extend(
        sweep
            .samples
            .iter()
            .map(|s| s.distance)
            .filter(|&d| d > start && d < end),
    );
    distances.push(end);

    let mut rows = Vec::with_capacity(distances.len());
    for &distance in &distances {
        let Some(sample) = sweep.interpolate_at_distance(distance) else {
            continue;
        };
        let base = sample.to_world(sample.profile_at(railing.horizontal_position));
        let top = base + sample.frame.up * railing.height;
        let v = if railing.uv.distance_based {
            distance - start
        } else {
            (distance - start) / (end - start)
        };
        rows.push((base, top, v));
    }
    if rows.len() < 2 {
        return MeshBuffer::default();
    }

    // `true` marks the left-facing side.
    let faces: &[bool] = match railing.sidedness {
        Sidedness::Right => &[false],
        Sidedness::Left => &[true],
        Sidedness::Double => &[false, true],
    };

    let mut mesh = MeshBuffer::default();
    for &left in faces {
        let base_index = mesh.vertex_count() as u32;
        let top_u = if railing.uv.distance_based {
            railing.height
        } else {
            1.0
        };
        for &(base, top, v) in &rows {
            mesh.push_vertex(base, apply_uv(&railing.uv, 0.0, v));
            mesh.push_vertex(top, apply_uv(&railing.uv, top_u, v));
        }
        // Columns run bottom to top, so an unflipped grid faces
        // forward x up, which is the road's left. Right faces flip.
        mesh.push_grid(base_index, rows.len(), 2, !left);
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Float3;
    use crate::model::{CurveId, RoadData, RoadId};
    use crate::track::fixtures::straight_curve;
    use crate::track::sweep::sweep_road;
    use approx::assert_relative_eq;

    const TOLERANCE: f32 = 1e-4;

    fn sweep() -> Sweep {
        let curve = straight_curve(10.5);
        let road = RoadData::new(RoadId(1), CurveId(1), 0, 0);
        sweep_road(&curve, &road, 16)
    }

    fn normal(mesh: &MeshBuffer, t: usize) -> Float3 {
        let [a, b, c] = [0, 1, 2].map(|k| mesh.vertices[mesh.triangles[t * 3 + k] as usize]);
        (b - a).cross(c - a)
    }

    #[test]
    fn right_face_points_right() {
        let railing = RailingData {
            sidedness: Sidedness::Right,
            horizontal_position: 1.0,
            ..RailingData::default()
        };
        let mesh = build_railing_mesh(&sweep(), &railing);
        assert!(!mesh.is_empty());
        for t in 0..mesh.triangle_count() {
            assert!(normal(&mesh, t).x > 0.0);
        }
        assert!(mesh.vertices.iter().all(|v| (v.x - 2.0).abs() < TOLERANCE));
    }

    #[test]
    fn left_face_points_left() {
        let railing = RailingData {
            sidedness: Sidedness::Left,
            ..RailingData::default()
        };
        let mesh = build_railing_mesh(&sweep(), &railing);
        for t in 0..mesh.triangle_count() {
            assert!(normal(&mesh, t).x < 0.0);
        }
    }

    #[test]
    fn double_sided_emits_both_faces() {
        let single = build_railing_mesh(
            &sweep(),
            &RailingData {
                sidedness: Sidedness::Right,
                ..RailingData::default()
            },
        );
        let double = build_railing_mesh(&sweep(), &RailingData::default());
        assert_eq!(double.vertex_count(), single.vertex_count() * 2);
        assert_eq!(double.triangle_count(), single.triangle_count() * 2);
    }

    #[test]
    fn range_limits_wall_extent() {
        let railing = RailingData {
            min: 0.25,
            max: 0.5,
            height: 1.2,
            sidedness: Sidedness::Right,
            ..RailingData::default()
        };
        let mesh = build_railing_mesh(&sweep(), &railing);
        let (lo, hi) = mesh
            .vertices
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(v.z), hi.max(v.z)));
        assert_relative_eq!(lo, 10.5 * 0.25, epsilon = TOLERANCE);
        assert_relative_eq!(hi, 10.5 * 0.5, epsilon = TOLERANCE);
        let top = mesh.vertices.iter().map(|v| v.y).fold(f32::NEG_INFINITY, f32::max);
        assert_relative_eq!(top, 1.2, epsilon = TOLERANCE);
    }

    #[test]
    fn hidden_or_inverted_railing_is_empty() {
        let hidden = RailingData {
            visible: false,
            ..RailingData::default()
        };
        assert!(build_railing_mesh(&sweep(), &hidden).is_empty());
        let inverted = RailingData {
            min: 0.8,
            max: 0.2,
            ..RailingData::default()
        };
        assert!(build_railing_mesh(&sweep(), &inverted).is_empty());
    }
}
