use crate::geometry::{Float2, Float3};
use crate::model::UvSettings;

use super::sweep::Sweep;

/// Indexed triangle mesh handed to the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffer {
    pub vertices: Vec<Float3>,
    pub uvs: Vec<Float2>,
    /// Vertex indices, three per triangle.
    pub triangles: Vec<u32>,
}

impl MeshBuffer {
    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            uvs: Vec::with_capacity(vertices),
            triangles: Vec::with_capacity(triangles * 3),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    pub fn push_vertex(&mut self, position: Float3, uv: Float2) {
        self.vertices.push(position);
        self.uvs.push(uv);
    }

    /// Triangulates a `rows x cols` vertex grid starting at vertex `base`,
    /// two triangles per quad. With rows running forward and columns running
    /// right, unflipped triangles face `forward x right` (the road's up).
    pub fn push_grid(&mut self, base: u32, rows: usize, cols: usize, flip: bool) {
        if rows < 2 || cols < 2 {
            return;
        }
        let w = cols as u32;
        for r in 0..rows as u32 - 1 {
            for c in 0..w - 1 {
                let a = base + r * w + c;
                if flip {
                    self.triangles.extend_from_slice(&[a, a + 1, a + w]);
                    self.triangles.extend_from_slice(&[a + 1, a + w + 1, a + w]);
                } else {
                    self.triangles.extend_from_slice(&[a, a + w, a + 1]);
                    self.triangles.extend_from_slice(&[a + 1, a + w, a + w + 1]);
                }
            }
        }
    }

    /// Appends another mesh, offsetting its indices.
    pub fn append(&mut self, other: MeshBuffer) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.uvs.extend(other.uvs);
        self.triangles.extend(other.triangles.into_iter().map(|i| i + base));
    }
}

pub(crate) fn apply_uv(uv: &UvSettings, u: f32, v: f32) -> Float2 {
    Float2::new(u * uv.tiling.x + uv.offset.x, v * uv.tiling.y + uv.offset.y)
}

/// Running arc length along a polyline, starting at 0.
pub(crate) fn cumulative_lengths(points: &[Float2]) -> Vec<f32> {
    let mut total = 0.0;
    let mut lengths = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            total += points[i - 1].distance(*p);
        }
        lengths.push(total);
    }
    lengths
}

/// Builds the road surface by sweeping each ring's profile.
///
/// UVs run across the profile in `u` and along the road in `v`: either
/// normalized to 0..1 or, with `distance_based`, in world units (profile
/// arc length across, road distance along).
pub fn build_road_mesh(sweep: &Sweep, uv: &UvSettings) -> MeshBuffer {
    if sweep.is_empty() {
        return MeshBuffer::default();
    }
    let rows = sweep.samples.len();
    let cols = sweep.samples[0].profile.len();
    if cols < 2 {
        return MeshBuffer::default();
    }

    let length = sweep.length();
    let mut mesh = MeshBuffer::with_capacity(rows * cols, (rows - 1) * (cols - 1) * 2);
    for sample in &sweep.samples {
        let across = cumulative_lengths(&sample.profile);
        let width = across.last().copied().unwrap_or(0.0);
        let v = if uv.distance_based {
            sample.distance
        } else if length > 0.0 {
            sample.distance / length
        } else {
            0.0
        };
        for (j, &local) in sample.profile.iter().enumerate() {
            let u = if uv.distance_based {
                across[j]
            } else if width > 0.0 {
                across[j] / width
            } else {
                j as f32 / (cols - 1) as f32
            };
            mesh.push_vertex(sample.to_world(local), apply_uv(uv, u, v));
        }
    }
    mesh.push_grid(0, rows, cols, false);
    mesh
}
