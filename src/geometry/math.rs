use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// Magnitude below which a vector is treated as degenerate.
pub const EPSILON: f32 = 1e-6;

/// 3D vector with f32 components.
/// C-compatible layout for FFI.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Float3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Float3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);
    pub const RIGHT: Self = Self::new(1.0, 0.0, 0.0);
    pub const FORWARD: Self = Self::new(0.0, 0.0, 1.0);

    pub fn magnitude(self) -> f32 {
        self.sqr_magnitude().sqrt()
    }

    pub fn sqr_magnitude(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn normalize(self) -> Self {
        let mag = self.magnitude();
        if mag < f32::EPSILON {
            return Self::ZERO;
        }
        self * (1.0 / mag)
    }

    /// Normalized copy, or `None` when the vector is too short to carry a direction.
    pub fn try_normalize(self) -> Option<Self> {
        let mag = self.magnitude();
        if mag < EPSILON {
            None
        } else {
            Some(self * (1.0 / mag))
        }
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn distance(self, other: Self) -> f32 {
        (self - other).magnitude()
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Float3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl AddAssign for Float3 {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Float3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f32> for Float3 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Div<f32> for Float3 {
    type Output = Self;
    fn div(self, scalar: f32) -> Self {
        Self::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl Neg for Float3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Default for Float3 {
    fn default() -> Self {
        Self::ZERO
    }
}

/// 2D vector, used for cross-section profiles (x = across, y = up) and UVs.
/// C-compatible layout for FFI.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Float2 {
    pub x: f32,
    pub y: f32,
}

impl Float2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const ZERO: Self = Self::new(0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0);

    pub fn distance(self, other: Self) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }

    /// Lifts into the local 3D cross-section frame (z = 0).
    pub fn extend(self) -> Float3 {
        Float3::new(self.x, self.y, 0.0)
    }
}

impl From<Float3> for Float2 {
    fn from(v: Float3) -> Self {
        Self::new(v.x, v.y)
    }
}

/// Unit quaternion for 3D rotations.
/// C-compatible layout for FFI.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub fn from_axis_angle(axis: Float3, angle: f32) -> Self {
        let half_angle = angle * 0.5;
        let s = half_angle.sin();
        let c = half_angle.cos();
        let normalized = axis.normalize();

        Self::new(normalized.x * s, normalized.y * s, normalized.z * s, c)
    }

    /// Yaw-pitch-roll rotation from Euler angles in degrees.
    ///
    /// `x` pitches about the right axis, `y` yaws about the up axis and `z`
    /// rolls about the forward axis. Roll is applied first, then pitch, then yaw.
    pub fn from_euler_degrees(euler: Float3) -> Self {
        let pitch = Self::from_axis_angle(Float3::RIGHT, euler.x.to_radians());
        let yaw = Self::from_axis_angle(Float3::UP, euler.y.to_radians());
        let roll = Self::from_axis_angle(Float3::FORWARD, euler.z.to_radians());
        yaw * pitch * roll
    }

    pub fn mul_vec(self, v: Float3) -> Float3 {
        let qv = Float3::new(self.x, self.y, self.z);
        let uv = qv.cross(v);
        let uuv = qv.cross(uv);
        v + (uv * (2.0 * self.w)) + (uuv * 2.0)
    }

    pub fn magnitude(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    pub fn normalize(self) -> Self {
        let mag = self.magnitude();
        if mag < f32::EPSILON {
            return Self::IDENTITY;
        }
        let inv = 1.0 / mag;
        Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
    }
}

impl Mul for Quaternion {
    type Output = Self;
    fn mul(self, other: Self) -> Self {
        Self::new(
            self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
            self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
        )
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// 3x3 matrix stored as three column vectors.
/// Used for rotation transformations.
#[derive(Debug, Clone, Copy)]
pub struct Matrix3 {
    pub c0: Float3,
    pub c1: Float3,
    pub c2: Float3,
}

impl Matrix3 {
    pub fn from_columns(c0: Float3, c1: Float3, c2: Float3) -> Self {
        Self { c0, c1, c2 }
    }

    /// Converts a rotation matrix to a unit quaternion.
    ///
    /// Picks one of four branches depending on which of the trace and the
    /// diagonal terms dominates, so the square root never sees a value near
    /// zero (rotations close to 180 degrees would otherwise lose precision).
    pub fn to_quaternion(&self) -> Quaternion {
        let (m00, m01, m02) = (self.c0.x, self.c1.x, self.c2.x);
        let (m10, m11, m12) = (self.c0.y, self.c1.y, self.c2.y);
        let (m20, m21, m22) = (self.c0.z, self.c1.z, self.c2.z);

        let trace = m00 + m11 + m22;
        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Quaternion::new((m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s, 0.25 * s)
        } else if m00 > m11 && m00 > m22 {
            let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
            Quaternion::new(0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
        } else if m11 > m22 {
            let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
            Quaternion::new((m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s)
        } else {
            let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
            Quaternion::new((m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s)
        };
        q.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_vec_eq(a: Float3, b: Float3) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-5);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-5);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-5);
    }

    #[test]
    fn test_float3_normalize() {
        let v = Float3::new(3.0, 4.0, 0.0);
        let normalized = v.normalize();
        assert_relative_eq!(normalized.x, 0.6, epsilon = 1e-6);
        assert_relative_eq!(normalized.y, 0.8, epsilon = 1e-6);
        assert_relative_eq!(normalized.magnitude(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_try_normalize_rejects_zero() {
        assert!(Float3::ZERO.try_normalize().is_none());
        assert!(Float3::new(0.0, 1e-9, 0.0).try_normalize().is_none());
        assert!(Float3::RIGHT.try_normalize().is_some());
    }

    #[test]
    fn test_float3_cross_basis() {
        // right = up x forward, up = forward x right
        assert_vec_eq(Float3::UP.cross(Float3::FORWARD), Float3::RIGHT);
        assert_vec_eq(Float3::FORWARD.cross(Float3::RIGHT), Float3::UP);
    }

    #[test]
    fn test_quaternion_axis_angle() {
        use std::f32::consts::PI;
        let q = Quaternion::from_axis_angle(Float3::UP, PI / 2.0);
        let rotated = q.mul_vec(Float3::RIGHT);
        assert_vec_eq(rotated, Float3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_euler_yaw_turns_forward_toward_right() {
        let q = Quaternion::from_euler_degrees(Float3::new(0.0, 90.0, 0.0));
        assert_vec_eq(q.mul_vec(Float3::FORWARD), Float3::RIGHT);
    }

    #[test]
    fn test_euler_roll_keeps_forward() {
        let q = Quaternion::from_euler_degrees(Float3::new(0.0, 0.0, 30.0));
        assert_vec_eq(q.mul_vec(Float3::FORWARD), Float3::FORWARD);
        assert_relative_eq!(q.mul_vec(Float3::UP).magnitude(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_matrix_to_quaternion_identity() {
        let m = Matrix3::from_columns(Float3::RIGHT, Float3::UP, Float3::FORWARD);
        let q = m.to_quaternion();
        assert_relative_eq!(q.w.abs(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_matrix_to_quaternion_all_branches() {
        // Each case exercises a different dominant diagonal term.
        let cases = [
            Float3::new(0.0, 30.0, 0.0),
            Float3::new(0.0, 180.0, 0.0),
            Float3::new(180.0, 0.0, 0.0),
            Float3::new(0.0, 0.0, 180.0),
            Float3::new(170.0, 20.0, 175.0),
        ];
        for euler in cases {
            let q = Quaternion::from_euler_degrees(euler);
            let m = Matrix3::from_columns(
                q.mul_vec(Float3::RIGHT),
                q.mul_vec(Float3::UP),
                q.mul_vec(Float3::FORWARD),
            );
            let back = m.to_quaternion();
            for v in [Float3::RIGHT, Float3::UP, Float3::FORWARD, Float3::new(1.0, 2.0, 3.0)] {
                assert_vec_eq(back.mul_vec(v), q.mul_vec(v));
            }
        }
    }
}
