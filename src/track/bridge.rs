use tracing::debug;

use crate::geometry::{Float2, EPSILON};
use crate::model::{BridgeData, BridgeProfile, BridgeTemplate};

use super::mesh::{apply_uv, cumulative_lengths, MeshBuffer};
use super::sweep::Sweep;

/// Right half of the template outline for a road of half width
/// `half_width`, from the road edge at the surface down to the centre of
/// the underside. Coordinates are (across from the centre line, up from
/// the surface).
pub fn template_half_profile(template: &BridgeTemplate, half_width: f32) -> Vec<Float2> {
    let edge = half_width.max(0.0);
    let outer = edge + template.edge_width.max(0.0);
    let flange_bottom = -template.flange_height.max(0.0);
    let web = (outer - template.flange_width.max(0.0)).max(0.0);
    let keel = (web - template.flange_depth.max(0.0)).max(0.0);
    let bottom = flange_bottom.min(-template.bridge_height.max(0.0));

    vec![
        Float2::new(edge, 0.0),
        Float2::new(edge, template.curb_height.max(0.0)),
        Float2::new(outer, template.curb_height.max(0.0)),
        Float2::new(outer, flange_bottom),
        Float2::new(web, flange_bottom),
        Float2::new(keel, bottom),
        Float2::new(0.0, bottom),
    ]
}

/// Mirrors a right half-profile (top edge first) into the full outline,
/// running from the left surface edge around the underside to the right
/// surface edge. A shared point on the centre line is emitted once.
pub fn mirror_half_profile(half: &[Float2]) -> Vec<Float2> {
    let mut outline: Vec<Float2> = half.iter().map(|p| Float2::new(-p.x, p.y)).collect();
    let shared_centre = half.last().is_some_and(|p| p.x.abs() <= EPSILON);
    let right = half.iter().rev().skip(usize::from(shared_centre));
    outline.extend(right.copied());
    outline
}

/// Sweeps the bridge outline under the road.
///
/// The template follows each ring's road width and centre; a custom
/// half-profile is used as given, centred on the road's centre line.
/// Disabled bridges and empty sweeps give an empty mesh.
pub fn build_bridge_mesh(sweep: &Sweep, bridge: &BridgeData) -> MeshBuffer {
    if !bridge.enabled || sweep.is_empty() {
        return MeshBuffer::default();
    }
    if let BridgeProfile::Custom { half_profile } = &bridge.profile {
        if half_profile.len() < 2 {
            debug!(points = half_profile.len(), "custom bridge profile too short");
            return MeshBuffer::default();
        }
    }

    let length = sweep.length();
    let mut mesh = MeshBuffer::default();
    let mut cols = 0;
    for sample in &sweep.samples {
        let (left, right) = sample.extents();
        let centre = (left + right) * 0.5;
        let half = match &bridge.profile {
            BridgeProfile::Template(template) => {
                template_half_profile(template, (right - left) * 0.5)
            }
            BridgeProfile::Custom { half_profile } => half_profile.clone(),
        };
        let outline = mirror_half_profile(&half);
        cols = outline.len();

        let around = cumulative_lengths(&outline);
        let perimeter = around.last().copied().unwrap_or(0.0);
        let v = if bridge.uv.distance_based {
            sample.distance
        } else if length > 0.0 {
            sample.distance / length
        } else {
            0.0
        };
        for (j, p) in outline.iter().enumerate() {
            let u = if bridge.uv.distance_based {
                around[j]
            } else if perimeter > 0.0 {
                around[j] / perimeter
            } else {
                0.0
            };
            let local = Float2::new(p.x + centre, p.y);
            mesh.push_vertex(sample.to_world(local), apply_uv(&bridge.uv, u, v));
        }
    }
    // Outline columns run left to right along the underside, so the grid
    // is flipped to face outward.
    mesh.push_grid(0, sweep.samples.len(), cols, true);
    mesh
}
