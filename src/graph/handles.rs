use std::fmt;

use crate::model::CurveId;

/// A point on a circuit curve, by curve id and position in the curve.
///
/// Indices shift when points are inserted or removed before them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointRef {
    pub curve: CurveId,
    pub index: usize,
}

impl PointRef {
    pub const fn new(curve: CurveId, index: usize) -> Self {
        Self { curve, index }
    }

    /// Point `index` of this point's cross-section.
    pub const fn section_point(self, index: usize) -> SectionPointRef {
        SectionPointRef { point: self, index }
    }
}

impl fmt::Display for PointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.curve, self.index)
    }
}

/// A point of the cross-section owned by a circuit point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionPointRef {
    pub point: PointRef,
    pub index: usize,
}

impl fmt::Display for SectionPointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/section[{}]", self.point, self.index)
    }
}
