//! Mesh and waypoint processors.
//!
//! Every processor is a pure function of persistent data: a road's slice of
//! its curve is swept once into rings (`sweep`), and the surface, bridge and
//! railing meshes are built from those rings. Waypoints sample the curve
//! segments directly. Insufficient input always yields empty output.

mod bridge;
mod dispatch;
mod mesh;
mod railing;
mod sweep;
mod waypoints;

pub use bridge::{build_bridge_mesh, mirror_half_profile, template_half_profile};
pub use dispatch::{build_road, RoadBuild};
pub use mesh::{build_road_mesh, MeshBuffer};
pub use railing::build_railing_mesh;
pub use sweep::{sweep_road, Sweep, SweepSample};
pub use waypoints::{build_waypoints, Waypoint, WaypointSample};
