use super::math::Float3;

/// Automatic control handles for an anchor given its neighbouring anchors.
///
/// Interior points take the normalized average of the incoming and outgoing
/// chord directions; endpoints use their single neighbour. Each handle is
/// `fraction` of the distance to the neighbour on its side. Returns
/// `(forward_control, backward_control)`; with no usable neighbour both
/// handles collapse onto the anchor.
pub fn auto_tangent(
    prev: Option<Float3>,
    anchor: Float3,
    next: Option<Float3>,
    fraction: f32,
) -> (Float3, Float3) {
    let to_prev = prev.map(|p| anchor - p);
    let to_next = next.map(|n| n - anchor);
    let dir_in = to_prev.and_then(Float3::try_normalize);
    let dir_out = to_next.and_then(Float3::try_normalize);

    let direction = match (dir_in, dir_out) {
        (Some(a), Some(b)) => (a + b).try_normalize().unwrap_or(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return (anchor, anchor),
    };

    let len_prev = to_prev.map(Float3::magnitude).unwrap_or(0.0);
    let len_next = to_next.map(Float3::magnitude).unwrap_or(0.0);
    // An endpoint mirrors its single handle length onto the open side.
    let (len_prev, len_next) = match (dir_in.is_some(), dir_out.is_some()) {
        (false, true) => (len_next, len_next),
        (true, false) => (len_prev, len_prev),
        _ => (len_prev, len_next),
    };

    (
        anchor + direction * (len_next * fraction),
        anchor - direction * (len_prev * fraction),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TOLERANCE: f32 = 1e-5;

    #[test]
    fn interior_point_averages_directions() {
        let (fwd, back) = auto_tangent(
            Some(Float3::new(-3.0, 0.0, 0.0)),
            Float3::ZERO,
            Some(Float3::new(0.0, 0.0, 6.0)),
            1.0 / 3.0,
        );
        let dir = Float3::new(1.0, 0.0, 1.0).normalize();
        assert_relative_eq!(fwd.distance(dir * 2.0), 0.0, epsilon = TOLERANCE);
        assert_relative_eq!(back.distance(-dir), 0.0, epsilon = TOLERANCE);
    }

    #[test]
    fn first_point_points_at_next() {
        let (fwd, back) = auto_tangent(None, Float3::ZERO, Some(Float3::new(9.0, 0.0, 0.0)), 1.0 / 3.0);
        assert_relative_eq!(fwd.x, 3.0, epsilon = TOLERANCE);
        assert_relative_eq!(back.x, -3.0, epsilon = TOLERANCE);
    }

    #[test]
    fn last_point_continues_incoming_direction() {
        let (fwd, back) = auto_tangent(Some(Float3::new(-6.0, 0.0, 0.0)), Float3::ZERO, None, 0.5);
        assert_relative_eq!(fwd.x, 3.0, epsilon = TOLERANCE);
        assert_relative_eq!(back.x, -3.0, epsilon = TOLERANCE);
    }

    #[test]
    fn isolated_point_has_degenerate_handles() {
        let anchor = Float3::new(1.0, 2.0, 3.0);
        let (fwd, back) = auto_tangent(None, anchor, None, 0.3);
        assert_eq!(fwd, anchor);
        assert_eq!(back, anchor);
    }

    #[test]
    fn reversal_uses_outgoing_direction() {
        let (fwd, _) = auto_tangent(
            Some(Float3::new(-1.0, 0.0, 0.0)),
            Float3::ZERO,
            Some(Float3::new(-1.0, 0.0, 0.0)),
            1.0,
        );
        assert_relative_eq!(fwd.x, -1.0, epsilon = TOLERANCE);
    }
}
