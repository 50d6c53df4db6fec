use serde::{Deserialize, Serialize};

use crate::geometry::{Float3, Frame};

/// Curve anchor with two Bézier control handles and a banking up vector.
///
/// Handles are stored as positions in the same space as the anchor (world
/// space for circuit points, local across/up space for cross-section points).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointData {
    pub position: Float3,
    pub forward_control: Float3,
    pub backward_control: Float3,
    #[serde(default = "default_up")]
    pub up: Float3,
    /// Per-point override of the global independent-control-points setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub independent_controls: Option<bool>,
}

fn default_up() -> Float3 {
    Float3::UP
}

impl PointData {
    /// Anchor with both handles collapsed onto it.
    pub const fn new(position: Float3) -> Self {
        Self {
            position,
            forward_control: position,
            backward_control: position,
            up: Float3::UP,
            independent_controls: None,
        }
    }

    pub fn with_controls(
        position: Float3,
        forward_control: Float3,
        backward_control: Float3,
        up: Float3,
    ) -> Self {
        let mut point = Self {
            position,
            forward_control,
            backward_control,
            up,
            independent_controls: None,
        };
        point.sanitize();
        point
    }

    pub fn forward_offset(&self) -> Float3 {
        self.forward_control - self.position
    }

    pub fn backward_offset(&self) -> Float3 {
        self.backward_control - self.position
    }

    /// Unit tangent implied by the handles: the forward handle direction, or
    /// the reverse of the backward handle when the forward one is degenerate.
    pub fn handle_tangent(&self) -> Option<Float3> {
        self.forward_offset()
            .try_normalize()
            .or_else(|| (-self.backward_offset()).try_normalize())
    }

    /// Orthonormal frame from the handles and stored up vector. `fallback`
    /// supplies the tangent when both handles are degenerate.
    pub fn frame(&self, fallback: Option<Float3>) -> Frame {
        match self.handle_tangent().or(fallback) {
            Some(tangent) => Frame::from_forward_up(tangent, self.up),
            None => Frame::from_up(self.up),
        }
    }

    /// Rigid translation of the anchor and both handles.
    pub fn translate(&mut self, delta: Float3) {
        self.position += delta;
        self.forward_control += delta;
        self.backward_control += delta;
    }

    /// Replaces a zero or non-finite up vector with world up.
    pub fn sanitize(&mut self) {
        if !self.up.is_finite() || self.up.try_normalize().is_none() {
            self.up = Float3::UP;
        }
    }

    pub fn independent(&self, global: bool) -> bool {
        self.independent_controls.unwrap_or(global)
    }
}

impl Default for PointData {
    fn default() -> Self {
        Self::new(Float3::ZERO)
    }
}
