//! Derived state kept alongside the persistent records while editing.
//!
//! Mirrors are rebuilt top-down from data (curve, then its points, then each
//! point's cross-section) and refreshed after every mutation. They never own
//! persistent data; everything is addressed by id and index.

use std::collections::HashMap;

use crate::cross_section::SectionArc;
use crate::geometry::Frame;
use crate::model::{CircuitCurveData, CircuitData, CrossSectionData, CurveId, RoadId};

/// Derived state of a cross-section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveSection {
    pub arc: SectionArc,
}

impl LiveSection {
    pub fn build(section: &CrossSectionData, subdivisions: usize) -> Self {
        Self {
            arc: SectionArc::compute(section, subdivisions),
        }
    }

    /// Cross-sections never wrap, whatever the stored flag says.
    pub fn is_closed(&self) -> bool {
        false
    }
}

/// Derived state of a circuit point.
#[derive(Debug, Clone, PartialEq)]
pub struct LivePoint {
    pub frame: Frame,
    pub section: LiveSection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveCurve {
    pub id: CurveId,
    pub points: Vec<LivePoint>,
}

impl LiveCurve {
    pub fn build(data: &CircuitCurveData, subdivisions: usize) -> Self {
        let points = (0..data.curve.len())
            .map(|i| LivePoint {
                frame: point_frame(data, i),
                section: LiveSection::build(&data.curve.points[i].cross_section, subdivisions),
            })
            .collect();
        Self {
            id: data.id,
            points,
        }
    }

    pub fn refresh_frame(&mut self, data: &CircuitCurveData, index: usize) {
        if let Some(point) = self.points.get_mut(index) {
            point.frame = point_frame(data, index);
        }
    }

    /// Refreshes a point's frame and those of its neighbours, whose chord
    /// fallback depends on it.
    pub fn refresh_around(&mut self, data: &CircuitCurveData, index: usize) {
        let (prev, next) = data.curve.neighbors(index);
        self.refresh_frame(data, index);
        for i in prev.into_iter().chain(next) {
            self.refresh_frame(data, i);
        }
    }

    pub fn refresh_section(&mut self, data: &CircuitCurveData, index: usize, subdivisions: usize) {
        let record = data.curve.points.get(index);
        if let (Some(point), Some(record)) = (self.points.get_mut(index), record) {
            point.section = LiveSection::build(&record.cross_section, subdivisions);
        }
    }
}

fn point_frame(data: &CircuitCurveData, index: usize) -> Frame {
    let fallback = data.curve.chord_direction(index);
    data.curve
        .point(index)
        .map_or(Frame::DEFAULT, |p| p.frame(fallback))
}

/// Live mirror of a whole circuit plus id lookup tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveGraph {
    pub curves: Vec<LiveCurve>,
    curve_index: HashMap<CurveId, usize>,
    road_index: HashMap<RoadId, usize>,
}

impl LiveGraph {
    pub fn build(data: &CircuitData, subdivisions: usize) -> Self {
        let mut graph = Self {
            curves: data
                .curves
                .iter()
                .map(|c| LiveCurve::build(c, subdivisions))
                .collect(),
            ..Self::default()
        };
        graph.reindex(data);
        graph
    }

    /// Rebuilds the id lookup tables after curves or roads were added or
    /// removed.
    pub fn reindex(&mut self, data: &CircuitData) {
        self.curve_index.clear();
        for (i, curve) in data.curves.iter().enumerate() {
            self.curve_index.insert(curve.id, i);
        }
        self.road_index.clear();
        for (i, road) in data.roads.iter().enumerate() {
            self.road_index.insert(road.id, i);
        }
    }

    pub fn curve_index(&self, id: CurveId) -> Option<usize> {
        self.curve_index.get(&id).copied()
    }

    pub fn road_index(&self, id: RoadId) -> Option<usize> {
        self.road_index.get(&id).copied()
    }
}
