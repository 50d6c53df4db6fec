//! C ABI for hosts driving an edit session.
//!
//! Functions:
//! - `kex_session_begin` / `kex_session_end` - open a session from saved JSON, free it
//! - `kex_session_save_size` / `kex_session_save` - serialize the session's circuit
//! - `kex_move_point` / `kex_move_cross_section_point` - point edits
//! - `kex_drain_dirty` - take the roads awaiting a rebuild
//! - `kex_build_mesh` - build a road, bridge or railing mesh into caller buffers
//! - `kex_build_waypoints` - build a road's waypoints into a caller buffer
//!
//! # Error Codes
//! - `0`: Success
//! - `-1`: Null pointer
//! - `-2`: Edit rejected (unknown id, index out of range)
//! - `-3`: Buffer overflow (resize and retry)
//! - `-5`: Invalid format

use tracing::warn;

use crate::error::EditError;
use crate::geometry::{Float2, Float3};
use crate::graph::{EditSession, PointRef};
use crate::model::{CurveId, RoadId};
use crate::persistence;
use crate::rebuild::RebuildQueue;
use crate::track::{MeshBuffer, Waypoint};

pub const KEX_OK: i32 = 0;
pub const KEX_NULL: i32 = -1;
pub const KEX_REJECTED: i32 = -2;
pub const KEX_OVERFLOW: i32 = -3;
pub const KEX_INVALID_FORMAT: i32 = -5;

/// Mesh selectors for [`kex_build_mesh`].
pub const KEX_MESH_ROAD: u32 = 0;
pub const KEX_MESH_BRIDGE: u32 = 1;
pub const KEX_MESH_RAILING: u32 = 2;

/// Opaque handle to an edit session.
pub type KexSessionHandle = *mut std::ffi::c_void;

/// Caller-owned buffers receiving one mesh.
///
/// `uvs` must hold as many entries as `vertices`. Counts are written even on
/// overflow so the caller can resize and retry.
#[repr(C)]
pub struct KexMeshOutput {
    pub vertices: *mut Float3,
    pub uvs: *mut Float2,
    pub vertices_capacity: usize,
    pub triangles: *mut u32,
    pub triangles_capacity: usize,

    pub vertex_count: *mut usize,
    pub triangle_index_count: *mut usize,
}

fn edit_code(result: Result<(), EditError>) -> i32 {
    match result {
        Ok(()) => KEX_OK,
        Err(err) => {
            warn!("ffi edit rejected: {err}");
            KEX_REJECTED
        }
    }
}

unsafe fn session_mut<'a>(handle: KexSessionHandle) -> Option<&'a mut EditSession> {
    (handle as *mut EditSession).as_mut()
}

unsafe fn session_ref<'a>(handle: KexSessionHandle) -> Option<&'a EditSession> {
    (handle as *const EditSession).as_ref()
}

// ============================================================================
// Session lifecycle
// ============================================================================

/// Open an edit session over a circuit saved by `kex_session_save`.
///
/// # Returns
/// - Session handle on success
/// - Null on error
///
/// # Safety
/// - `data` must point to a valid buffer of at least `data_len` bytes
#[no_mangle]
pub unsafe extern "C" fn kex_session_begin(data: *const u8, data_len: usize) -> KexSessionHandle {
    if data.is_null() || data_len == 0 {
        return std::ptr::null_mut();
    }

    let bytes = std::slice::from_raw_parts(data, data_len);
    match persistence::deserialize(bytes) {
        Ok((circuit, settings)) => {
            let session = EditSession::begin(circuit, settings, RebuildQueue::new());
            Box::into_raw(Box::new(session)) as KexSessionHandle
        }
        Err(err) => {
            warn!("ffi session begin failed: {err}");
            std::ptr::null_mut()
        }
    }
}

/// End a session and free its handle. Unsaved edits are discarded.
///
/// # Safety
/// - `handle` must be a valid handle returned by `kex_session_begin`, or null
#[no_mangle]
pub unsafe extern "C" fn kex_session_end(handle: KexSessionHandle) {
    if !handle.is_null() {
        let session = Box::from_raw(handle as *mut EditSession);
        drop(session.end());
    }
}

/// Get the buffer size required to save the session's circuit.
///
/// # Safety
/// - `handle` must be a valid handle from `kex_session_begin`
#[no_mangle]
pub unsafe extern "C" fn kex_session_save_size(handle: KexSessionHandle) -> i64 {
    let Some(session) = session_ref(handle) else {
        return KEX_NULL as i64;
    };
    match persistence::serialize(session.data(), session.settings()) {
        Ok(bytes) => bytes.len() as i64,
        Err(_) => KEX_INVALID_FORMAT as i64,
    }
}

/// Serialize the session's circuit and settings to JSON.
///
/// # Returns
/// - `0` on success
/// - `-1` on null pointer
/// - `-3` if buffer too small (bytes_written contains required size)
///
/// # Safety
/// - `handle` must be a valid handle from `kex_session_begin`
/// - `buffer` must point to a valid buffer of at least `buffer_capacity` bytes
/// - `bytes_written` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn kex_session_save(
    handle: KexSessionHandle,
    buffer: *mut u8,
    buffer_capacity: usize,
    bytes_written: *mut usize,
) -> i32 {
    if buffer.is_null() || bytes_written.is_null() {
        return KEX_NULL;
    }
    let Some(session) = session_ref(handle) else {
        return KEX_NULL;
    };

    let serialized = match persistence::serialize(session.data(), session.settings()) {
        Ok(bytes) => bytes,
        Err(_) => return KEX_INVALID_FORMAT,
    };

    *bytes_written = serialized.len();
    if serialized.len() > buffer_capacity {
        return KEX_OVERFLOW;
    }
    std::ptr::copy_nonoverlapping(serialized.as_ptr(), buffer, serialized.len());
    KEX_OK
}

// ============================================================================
// Edits
// ============================================================================

/// Move a curve point's anchor; its handles follow.
///
/// # Safety
/// - `handle` must be a valid handle from `kex_session_begin`
#[no_mangle]
pub unsafe extern "C" fn kex_move_point(
    handle: KexSessionHandle,
    curve: u32,
    index: usize,
    position: Float3,
) -> i32 {
    let Some(session) = session_mut(handle) else {
        return KEX_NULL;
    };
    edit_code(session.move_point(PointRef::new(CurveId(curve), index), position))
}

/// Move one cross-section point, in the owning point's local across/up space.
///
/// # Safety
/// - `handle` must be a valid handle from `kex_session_begin`
#[no_mangle]
pub unsafe extern "C" fn kex_move_cross_section_point(
    handle: KexSessionHandle,
    curve: u32,
    index: usize,
    section_index: usize,
    local: Float3,
) -> i32 {
    let Some(session) = session_mut(handle) else {
        return KEX_NULL;
    };
    let point = PointRef::new(CurveId(curve), index).section_point(section_index);
    edit_code(session.move_cross_section_point(point, local))
}

// ============================================================================
// Rebuild
// ============================================================================

/// Drain the roads awaiting a rebuild into `roads`.
///
/// On overflow nothing is drained and `count_written` holds the required
/// capacity.
///
/// # Safety
/// - `handle` must be a valid handle from `kex_session_begin`
/// - `roads` must point to a buffer of at least `capacity` entries
/// - `count_written` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn kex_drain_dirty(
    handle: KexSessionHandle,
    roads: *mut u32,
    capacity: usize,
    count_written: *mut usize,
) -> i32 {
    if count_written.is_null() {
        return KEX_NULL;
    }
    let Some(session) = session_ref(handle) else {
        return KEX_NULL;
    };

    let dirty = session.drain_dirty();
    *count_written = dirty.len();
    if dirty.len() > capacity {
        session.queue().mark_all(dirty);
        return KEX_OVERFLOW;
    }
    if roads.is_null() && !dirty.is_empty() {
        session.queue().mark_all(dirty);
        return KEX_NULL;
    }
    for (i, road) in dirty.iter().enumerate() {
        *roads.add(i) = road.0;
    }
    KEX_OK
}

unsafe fn write_mesh(mesh: &MeshBuffer, output: &KexMeshOutput) -> i32 {
    if output.vertex_count.is_null() || output.triangle_index_count.is_null() {
        return KEX_NULL;
    }
    *output.vertex_count = mesh.vertices.len();
    *output.triangle_index_count = mesh.triangles.len();

    if mesh.vertices.len() > output.vertices_capacity
        || mesh.triangles.len() > output.triangles_capacity
    {
        return KEX_OVERFLOW;
    }
    if mesh.vertices.is_empty() && mesh.triangles.is_empty() {
        return KEX_OK;
    }
    if output.vertices.is_null() || output.uvs.is_null() || output.triangles.is_null() {
        return KEX_NULL;
    }

    std::ptr::copy_nonoverlapping(mesh.vertices.as_ptr(), output.vertices, mesh.vertices.len());
    std::ptr::copy_nonoverlapping(mesh.uvs.as_ptr(), output.uvs, mesh.uvs.len());
    std::ptr::copy_nonoverlapping(
        mesh.triangles.as_ptr(),
        output.triangles,
        mesh.triangles.len(),
    );
    KEX_OK
}

/// Build one mesh of a road into caller buffers.
///
/// `kind` selects the road surface, the bridge or railing `railing_index`.
/// A road with insufficient geometry yields zero counts and success.
///
/// # Safety
/// - `handle` must be a valid handle from `kex_session_begin`
/// - `output` must be a valid pointer whose buffers hold their stated capacities
#[no_mangle]
pub unsafe extern "C" fn kex_build_mesh(
    handle: KexSessionHandle,
    road: u32,
    kind: u32,
    railing_index: usize,
    output: *mut KexMeshOutput,
) -> i32 {
    let Some(output) = output.as_ref() else {
        return KEX_NULL;
    };
    let Some(session) = session_ref(handle) else {
        return KEX_NULL;
    };

    let road = RoadId(road);
    let mesh = match kind {
        KEX_MESH_ROAD => session.build_road_mesh(road),
        KEX_MESH_BRIDGE => session.build_bridge_mesh(road),
        KEX_MESH_RAILING => session.build_railing_mesh(road, railing_index),
        _ => return KEX_INVALID_FORMAT,
    };
    match mesh {
        Ok(mesh) => write_mesh(&mesh, output),
        Err(err) => edit_code(Err(err)),
    }
}

/// Build a road's waypoints into `waypoints`.
///
/// # Returns
/// - `0` on success
/// - `-1` on null pointer
/// - `-2` if the road does not exist
/// - `-3` if buffer too small (count_written contains required size)
///
/// # Safety
/// - `handle` must be a valid handle from `kex_session_begin`
/// - `waypoints` must point to a buffer of at least `capacity` entries
/// - `count_written` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn kex_build_waypoints(
    handle: KexSessionHandle,
    road: u32,
    waypoints: *mut Waypoint,
    capacity: usize,
    count_written: *mut usize,
) -> i32 {
    if count_written.is_null() {
        return KEX_NULL;
    }
    let Some(session) = session_ref(handle) else {
        return KEX_NULL;
    };

    let built = match session.build_waypoints(RoadId(road)) {
        Ok(built) => built,
        Err(err) => return edit_code(Err(err)),
    };
    *count_written = built.len();
    if built.len() > capacity {
        return KEX_OVERFLOW;
    }
    if built.is_empty() {
        return KEX_OK;
    }
    if waypoints.is_null() {
        return KEX_NULL;
    }
    std::ptr::copy_nonoverlapping(built.as_ptr(), waypoints, built.len());
    KEX_OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CircuitData, Settings};

    fn saved_circuit() -> Vec<u8> {
        let mut session =
            EditSession::begin(CircuitData::new(), Settings::default(), RebuildQueue::new());
        let curve = session.add_curve(
            &[
                Float3::ZERO,
                Float3::new(0.0, 0.0, 10.0),
                Float3::new(0.0, 0.0, 20.0),
            ],
            false,
        );
        session.add_road(curve, 0, 1).unwrap();
        persistence::serialize(session.data(), session.settings()).unwrap()
    }

    fn begin() -> KexSessionHandle {
        let bytes = saved_circuit();
        let handle = unsafe { kex_session_begin(bytes.as_ptr(), bytes.len()) };
        assert!(!handle.is_null());
        handle
    }

    #[test]
    fn begin_rejects_garbage() {
        let bytes = b"not json";
        let handle = unsafe { kex_session_begin(bytes.as_ptr(), bytes.len()) };
        assert!(handle.is_null());
        assert!(unsafe { kex_session_begin(std::ptr::null(), 0) }.is_null());
    }

    #[test]
    fn move_then_drain_reports_road() {
        let handle = begin();
        unsafe {
            let code = kex_move_point(handle, 1, 1, Float3::new(1.0, 0.0, 10.0));
            assert_eq!(code, KEX_OK);
            assert_eq!(kex_move_point(handle, 1, 9, Float3::ZERO), KEX_REJECTED);

            let mut written = 0usize;
            let code = kex_drain_dirty(handle, std::ptr::null_mut(), 0, &mut written);
            assert_eq!(code, KEX_OVERFLOW);
            assert_eq!(written, 1);

            let mut roads = [0u32; 4];
            let code = kex_drain_dirty(handle, roads.as_mut_ptr(), roads.len(), &mut written);
            assert_eq!(code, KEX_OK);
            assert_eq!(written, 1);
            assert_eq!(roads[0], 2);
            kex_session_end(handle);
        }
    }

    #[test]
    fn mesh_overflow_reports_required_size() {
        let handle = begin();
        unsafe {
            let mut vertex_count = 0usize;
            let mut index_count = 0usize;
            let mut output = KexMeshOutput {
                vertices: std::ptr::null_mut(),
                uvs: std::ptr::null_mut(),
                vertices_capacity: 0,
                triangles: std::ptr::null_mut(),
                triangles_capacity: 0,
                vertex_count: &mut vertex_count,
                triangle_index_count: &mut index_count,
            };
            let code = kex_build_mesh(handle, 2, KEX_MESH_ROAD, 0, &mut output);
            assert_eq!(code, KEX_OVERFLOW);
            assert!(vertex_count > 0);
            assert_eq!(index_count % 3, 0);

            let mut vertices = vec![Float3::ZERO; vertex_count];
            let mut uvs = vec![Float2::default(); vertex_count];
            let mut triangles = vec![0u32; index_count];
            output.vertices = vertices.as_mut_ptr();
            output.uvs = uvs.as_mut_ptr();
            output.vertices_capacity = vertices.len();
            output.triangles = triangles.as_mut_ptr();
            output.triangles_capacity = triangles.len();
            assert_eq!(kex_build_mesh(handle, 2, KEX_MESH_ROAD, 0, &mut output), KEX_OK);
            assert!(triangles.iter().all(|&t| (t as usize) < vertex_count));

            assert_eq!(kex_build_mesh(handle, 2, 7, 0, &mut output), KEX_INVALID_FORMAT);
            let code = kex_build_mesh(handle, 2, KEX_MESH_RAILING, 0, &mut output);
            assert_eq!(code, KEX_REJECTED);
            kex_session_end(handle);
        }
    }

    #[test]
    fn waypoints_fill_caller_buffer() {
        let handle = begin();
        unsafe {
            let mut count = 0usize;
            let code = kex_build_waypoints(handle, 2, std::ptr::null_mut(), 0, &mut count);
            assert_eq!(code, KEX_OVERFLOW);
            assert!(count >= 2);

            let mut waypoints = vec![Waypoint::DEFAULT; count];
            let code = kex_build_waypoints(handle, 2, waypoints.as_mut_ptr(), count, &mut count);
            assert_eq!(code, KEX_OK);
            assert_eq!(waypoints[0].position, Float3::ZERO);
            let code = kex_build_waypoints(handle, 99, std::ptr::null_mut(), 0, &mut count);
            assert_eq!(code, KEX_REJECTED);
            kex_session_end(handle);
        }
    }

    #[test]
    fn save_round_trips_edits() {
        let handle = begin();
        unsafe {
            kex_move_point(handle, 1, 0, Float3::new(0.0, 3.0, 0.0));
            let size = kex_session_save_size(handle);
            assert!(size > 0);

            let mut written = 0usize;
            let mut small = [0u8; 4];
            let code = kex_session_save(handle, small.as_mut_ptr(), small.len(), &mut written);
            assert_eq!(code, KEX_OVERFLOW);
            assert_eq!(written as i64, size);

            let mut buffer = vec![0u8; written];
            let code = kex_session_save(handle, buffer.as_mut_ptr(), buffer.len(), &mut written);
            assert_eq!(code, KEX_OK);
            let (circuit, _) = persistence::deserialize(&buffer).unwrap();
            assert_eq!(circuit.curves[0].curve.points[0].point.position.y, 3.0);
            kex_session_end(handle);
        }
    }
}
