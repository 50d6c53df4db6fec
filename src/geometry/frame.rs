use super::math::{Float3, Matrix3, Quaternion, EPSILON};

/// Orthonormal coordinate frame attached to a point on a curve.
///
/// Right-handed basis with `right = up x forward` and `up = forward x right`:
/// - `forward`: tangent direction along the curve
/// - `up`: banking/roll direction
/// - `right`: across the road, used as the cross-section x axis
///
/// C-compatible layout for FFI.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    pub forward: Float3,
    pub up: Float3,
    pub right: Float3,
}

impl Frame {
    pub const fn new(forward: Float3, up: Float3, right: Float3) -> Self {
        Self { forward, up, right }
    }

    pub const DEFAULT: Self = Self::new(Float3::FORWARD, Float3::UP, Float3::RIGHT);

    /// Builds an orthonormal frame from a tangent and an approximate up vector.
    ///
    /// The up hint is projected onto the plane perpendicular to the tangent,
    /// right is rebuilt as `up x forward` and up re-derived as
    /// `forward x right`. When the hint is parallel to the tangent a world
    /// axis that is not colinear with the tangent is used instead.
    pub fn from_forward_up(forward: Float3, up_hint: Float3) -> Self {
        let Some(forward) = forward.try_normalize() else {
            return Self::from_up(up_hint);
        };

        let projected = up_hint - forward * forward.dot(up_hint);
        let up = match projected.try_normalize() {
            Some(up) => up,
            None => {
                let axis = fallback_axis(forward);
                (axis - forward * forward.dot(axis)).normalize()
            }
        };

        let right = up.cross(forward).normalize();
        let up = forward.cross(right).normalize();
        Self::new(forward, up, right)
    }

    /// Frame for a point with no usable tangent: keeps the up vector and
    /// derives forward from a world axis perpendicular to it.
    pub fn from_up(up_hint: Float3) -> Self {
        let up = up_hint.try_normalize().unwrap_or(Float3::UP);
        let reference = fallback_axis(up);
        let forward = (reference - up * up.dot(reference)).normalize();
        let right = up.cross(forward).normalize();
        Self::new(forward, up, right)
    }

    /// Re-orthonormalizes the frame using the Gram-Schmidt process.
    ///
    /// Preserves forward exactly and keeps up as close to its current value as possible.
    pub fn reorthonormalize(self) -> Self {
        Self::from_forward_up(self.forward, self.up)
    }

    pub fn rotate(self, rotation: Quaternion) -> Self {
        Self::new(
            rotation.mul_vec(self.forward),
            rotation.mul_vec(self.up),
            rotation.mul_vec(self.right),
        )
        .reorthonormalize()
    }

    /// Rotation that maps the world basis (right, up, forward) onto this frame.
    pub fn rotation(&self) -> Quaternion {
        Matrix3::from_columns(self.right, self.up, self.forward).to_quaternion()
    }

    /// Projects a cross-section local coordinate (x across, y up) into world space.
    pub fn local_to_world(&self, origin: Float3, local: Float3) -> Float3 {
        origin + self.right * local.x + self.up * local.y + self.forward * local.z
    }

    pub fn is_orthonormal(&self, tolerance: f32) -> bool {
        (self.forward.magnitude() - 1.0).abs() <= tolerance
            && (self.up.magnitude() - 1.0).abs() <= tolerance
            && (self.right.magnitude() - 1.0).abs() <= tolerance
            && self.forward.dot(self.up).abs() <= tolerance
            && self.forward.dot(self.right).abs() <= tolerance
            && self.up.dot(self.right).abs() <= tolerance
    }

    /// Interpolates two frames and restores orthonormality.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let forward = self.forward.lerp(other.forward, t);
        let up = self.up.lerp(other.up, t);
        let forward = if forward.magnitude() < EPSILON {
            self.forward
        } else {
            forward
        };
        Self::from_forward_up(forward, up)
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// World axis guaranteed not to be colinear with `v`.
fn fallback_axis(v: Float3) -> Float3 {
    if v.y.abs() < 0.9 {
        Float3::UP
    } else {
        Float3::FORWARD
    }
}
