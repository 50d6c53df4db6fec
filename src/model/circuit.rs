use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::Float3;

use super::curve::{CurveData, CurvePoint};
use super::point::PointData;
use super::road::RoadData;

/// Half width of the default flat cross-section.
pub const FLAT_HALF_WIDTH: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurveId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoadId(pub u32);

impl fmt::Display for CurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "curve#{}", self.0)
    }
}

impl fmt::Display for RoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "road#{}", self.0)
    }
}

/// Cross-section profile: points in the parent's (across, up) plane, z = 0.
/// Always treated as open regardless of the stored flag.
pub type CrossSectionData = CurveData<PointData>;

/// Two-point flat profile at x = -2 and x = +2.
pub fn flat_cross_section() -> CrossSectionData {
    CurveData::new(
        vec![
            PointData::with_controls(
                Float3::new(-FLAT_HALF_WIDTH, 0.0, 0.0),
                Float3::new(-FLAT_HALF_WIDTH / 3.0, 0.0, 0.0),
                Float3::new(-FLAT_HALF_WIDTH * 5.0 / 3.0, 0.0, 0.0),
                Float3::UP,
            ),
            PointData::with_controls(
                Float3::new(FLAT_HALF_WIDTH, 0.0, 0.0),
                Float3::new(FLAT_HALF_WIDTH * 5.0 / 3.0, 0.0, 0.0),
                Float3::new(FLAT_HALF_WIDTH / 3.0, 0.0, 0.0),
                Float3::UP,
            ),
        ],
        false,
    )
}

/// Main-curve point that owns its cross-section profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitPointData {
    #[serde(flatten)]
    pub point: PointData,
    #[serde(default = "flat_cross_section")]
    pub cross_section: CrossSectionData,
}

impl CircuitPointData {
    pub fn new(point: PointData, cross_section: CrossSectionData) -> Self {
        Self {
            point,
            cross_section,
        }
    }
}

impl From<PointData> for CircuitPointData {
    fn from(point: PointData) -> Self {
        Self::new(point, flat_cross_section())
    }
}

impl CurvePoint for CircuitPointData {
    fn point(&self) -> &PointData {
        &self.point
    }

    fn point_mut(&mut self) -> &mut PointData {
        &mut self.point
    }

    fn from_point(point: PointData) -> Self {
        Self::from(point)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitCurveData {
    pub id: CurveId,
    #[serde(flatten)]
    pub curve: CurveData<CircuitPointData>,
}

/// Aggregate root: every curve and every road of a circuit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CircuitData {
    #[serde(default)]
    pub curves: Vec<CircuitCurveData>,
    #[serde(default)]
    pub roads: Vec<RoadData>,
    /// Next free id shared by curves and roads.
    #[serde(default = "first_id")]
    pub next_id: u32,
}

fn first_id() -> u32 {
    1
}

impl CircuitData {
    pub fn new() -> Self {
        Self {
            curves: Vec::new(),
            roads: Vec::new(),
            next_id: first_id(),
        }
    }

    /// The id [`allocate_id`](Self::allocate_id) would hand out next.
    pub fn peek_id(&self) -> u32 {
        let used = self
            .curves
            .iter()
            .map(|c| c.id.0)
            .chain(self.roads.iter().map(|r| r.id.0))
            .max()
            .map_or(0, |m| m + 1);
        self.next_id.max(used).max(first_id())
    }

    pub fn allocate_id(&mut self) -> u32 {
        let id = self.peek_id();
        self.next_id = id + 1;
        id
    }

    pub fn curve(&self, id: CurveId) -> Option<&CircuitCurveData> {
        self.curves.iter().find(|c| c.id == id)
    }

    pub fn curve_mut(&mut self, id: CurveId) -> Option<&mut CircuitCurveData> {
        self.curves.iter_mut().find(|c| c.id == id)
    }

    pub fn road(&self, id: RoadId) -> Option<&RoadData> {
        self.roads.iter().find(|r| r.id == id)
    }

    pub fn road_mut(&mut self, id: RoadId) -> Option<&mut RoadData> {
        self.roads.iter_mut().find(|r| r.id == id)
    }

    pub fn roads_on_curve(&self, curve: CurveId) -> impl Iterator<Item = &RoadData> {
        self.roads.iter().filter(move |r| r.curve == curve)
    }

    /// Restores invariants that loaded or hand-built data may violate:
    /// cross-sections are forced open and zero up vectors replaced.
    pub fn enforce_invariants(&mut self) {
        for curve in &mut self.curves {
            for point in &mut curve.curve.points {
                point.point.sanitize();
                point.cross_section.is_closed = false;
                for section_point in &mut point.cross_section.points {
                    section_point.sanitize();
                }
            }
        }
        self.next_id = self.next_id.max(first_id());
    }
}
