//! KexRoad - procedural race-circuit geometry.
//!
//! # Architecture
//!
//! Layered modules with strict inward-only dependencies:
//!
//! - **geometry**: Vector/quaternion primitives, frames, Bézier math
//! - **model**: Persistent circuit data (points, curves, roads, settings)
//! - **cross_section**: Road profile editing and arc-length sampling
//! - **rebuild**: Thread-safe queue of roads awaiting a rebuild
//! - **track**: Road, bridge and railing meshes plus waypoints
//! - **graph**: Live edit session with events
//! - **persistence**: Versioned JSON envelope
//! - **ffi**: C FFI bindings
//!
//! # Usage
//!
//! ```ignore
//! use kexroad::{CircuitData, EditSession, RebuildQueue, Settings};
//!
//! let mut session = EditSession::begin(CircuitData::new(), Settings::default(), RebuildQueue::new());
//! let curve = session.add_curve(&positions, true);
//! let road = session.add_road(curve, 0, 3)?;
//! for build in session.rebuild_dirty() { /* upload meshes */ }
//! let data = session.end();
//! ```
//!
//! For C/C#/Unity, link the cdylib and use `kex_*` FFI functions.

pub mod cross_section;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod model;
pub mod persistence;
pub mod rebuild;
pub mod track;

#[cfg(feature = "ffi")]
pub mod ffi;

// Re-export commonly used types at crate root
pub use error::{EditError, EditResult};
pub use geometry::{Float2, Float3, Frame, Quaternion};
pub use graph::{EditEvent, EditSession, PointRef, SectionPointRef};
pub use model::{CircuitData, CurveId, RoadId, Settings};
pub use rebuild::RebuildQueue;
pub use track::{MeshBuffer, RoadBuild, Waypoint};
