//! Pure Bézier evaluation, derivatives, curvature and arc length.
//!
//! Parameters are expected in `[0, 1]` and are not clamped.

use super::math::{Float3, EPSILON};

pub fn quadratic(a: Float3, b: Float3, c: Float3, t: f32) -> Float3 {
    let ab = a.lerp(b, t);
    let bc = b.lerp(c, t);
    ab.lerp(bc, t)
}

/// De Casteljau evaluation of a cubic segment.
pub fn cubic(p0: Float3, p1: Float3, p2: Float3, p3: Float3, t: f32) -> Float3 {
    let a = p0.lerp(p1, t);
    let b = p1.lerp(p2, t);
    let c = p2.lerp(p3, t);
    quadratic(a, b, c, t)
}

pub fn cubic_derivative(p0: Float3, p1: Float3, p2: Float3, p3: Float3, t: f32) -> Float3 {
    let u = 1.0 - t;
    (p1 - p0) * (3.0 * u * u) + (p2 - p1) * (6.0 * u * t) + (p3 - p2) * (3.0 * t * t)
}

pub fn cubic_second_derivative(p0: Float3, p1: Float3, p2: Float3, p3: Float3, t: f32) -> Float3 {
    let u = 1.0 - t;
    (p2 - p1 * 2.0 + p0) * (6.0 * u) + (p3 - p2 * 2.0 + p1) * (6.0 * t)
}

/// Unit tangent at `t`, falling back to the chord direction when the
/// derivative vanishes (coincident control points). Returns `None` only when
/// the whole segment collapses to a point.
pub fn cubic_tangent(p0: Float3, p1: Float3, p2: Float3, p3: Float3, t: f32) -> Option<Float3> {
    cubic_derivative(p0, p1, p2, p3, t)
        .try_normalize()
        .or_else(|| (p3 - p0).try_normalize())
}

/// Curvature (1 / radius) from first and second derivatives.
pub fn curvature(p0: Float3, p1: Float3, p2: Float3, p3: Float3, t: f32) -> f32 {
    let d1 = cubic_derivative(p0, p1, p2, p3, t);
    let speed = d1.magnitude();
    if speed < EPSILON {
        return 0.0;
    }
    let d2 = cubic_second_derivative(p0, p1, p2, p3, t);
    d1.cross(d2).magnitude() / (speed * speed * speed)
}

/// Polyline approximation of the segment length over `subdivisions` uniform steps.
pub fn estimate_arc_length(
    p0: Float3,
    p1: Float3,
    p2: Float3,
    p3: Float3,
    subdivisions: usize,
) -> f32 {
    let steps = subdivisions.max(1);
    let mut length = 0.0;
    let mut prev = p0;
    for i in 1..=steps {
        let t = i as f32 / steps as f32;
        let curr = cubic(p0, p1, p2, p3, t);
        length += prev.distance(curr);
        prev = curr;
    }
    length
}

/// Cumulative polyline lengths at `steps + 1` uniform parameters.
/// `table[i]` is the length from `t = 0` to `t = i / steps`.
pub fn arc_length_table(
    p0: Float3,
    p1: Float3,
    p2: Float3,
    p3: Float3,
    steps: usize,
) -> Vec<f32> {
    let steps = steps.max(1);
    let mut table = Vec::with_capacity(steps + 1);
    table.push(0.0);
    let mut prev = p0;
    let mut total = 0.0;
    for i in 1..=steps {
        let curr = cubic(p0, p1, p2, p3, i as f32 / steps as f32);
        total += prev.distance(curr);
        table.push(total);
        prev = curr;
    }
    table
}

/// Inverts an arc-length table: the parameter `t` at which `distance` is reached.
pub fn parameter_at_distance(table: &[f32], distance: f32) -> f32 {
    let Some(&total) = table.last() else {
        return 0.0;
    };
    let steps = table.len() - 1;
    if steps == 0 || total <= EPSILON || distance <= 0.0 {
        return 0.0;
    }
    if distance >= total {
        return 1.0;
    }

    let i = table.partition_point(|&d| d <= distance).saturating_sub(1).min(steps - 1);
    let span = table[i + 1] - table[i];
    let local = if span > EPSILON {
        (distance - table[i]) / span
    } else {
        0.0
    };
    (i as f32 + local) / steps as f32
}
