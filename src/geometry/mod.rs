//! Geometry kernel: vector/quaternion primitives, orthonormal frames,
//! Bézier math and automatic tangents. Stateless.

pub mod bezier;
mod frame;
mod math;
mod tangent;

pub use frame::Frame;
pub use math::{Float2, Float3, Matrix3, Quaternion, EPSILON};
pub use tangent::auto_tangent;
