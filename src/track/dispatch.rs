use tracing::trace;

use crate::model::{CircuitPointData, CurveData, RoadData, RoadId, Settings};

use super::bridge::build_bridge_mesh;
use super::mesh::{build_road_mesh, MeshBuffer};
use super::railing::build_railing_mesh;
use super::sweep::sweep_road;

/// Every mesh generated for one road.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadBuild {
    pub road: RoadId,
    pub surface: MeshBuffer,
    /// Present only when the road's bridge is enabled.
    pub bridge: Option<MeshBuffer>,
    /// One mesh per railing descriptor, in descriptor order.
    pub railings: Vec<MeshBuffer>,
}

/// Sweeps the road once and builds its surface, bridge and railings.
pub fn build_road(
    curve: &CurveData<CircuitPointData>,
    road: &RoadData,
    settings: &Settings,
) -> RoadBuild {
    let sweep = sweep_road(curve, road, settings.arc_length_subdivisions);
    let surface = build_road_mesh(&sweep, &road.uv);
    let bridge = road
        .bridge
        .enabled
        .then(|| build_bridge_mesh(&sweep, &road.bridge));
    let railings = road
        .railings
        .iter()
        .map(|railing| build_railing_mesh(&sweep, railing))
        .collect();

    trace!(
        road = %road.id,
        rings = sweep.samples.len(),
        vertices = surface.vertex_count(),
        "road built"
    );
    RoadBuild {
        road: road.id,
        surface,
        bridge,
        railings,
    }
}
