//! Mesh modifiers for the avatar surface
//!
//! Modifiers operate on a repaired `Mesh` and run between repair and morph
//! synthesis.
//!
//! # Fluent API
//!
//! Use the `MeshApply` extension trait for method chaining:
//! ```no_run
//! use avatar_gen::{LaplacianSmooth, MeshApply, Subdivide};
//! # let mut mesh = avatar_gen::Mesh::default();
//! mesh.apply(LaplacianSmooth::default())
//!     .apply(Subdivide { iterations: 1 });
//! ```

use crate::mesh::Mesh;
use glam::Vec3;
use std::collections::HashMap;

/// Trait for mesh modifiers
pub trait MeshModifier {
    /// Apply this modifier to a mesh, modifying it in place
    fn apply(&self, mesh: &mut Mesh);
}

/// Extension trait for fluent modifier application
pub trait MeshApply {
    /// Apply a modifier and return `&mut Self` for chaining
    fn apply<M: MeshModifier>(&mut self, modifier: M) -> &mut Self;
}

impl MeshApply for Mesh {
    fn apply<M: MeshModifier>(&mut self, modifier: M) -> &mut Self {
        modifier.apply(self);
        self
    }
}

/// Laplacian smoothing over the vertex adjacency graph
///
/// Each iteration pulls every vertex toward the mean of its edge-connected
/// neighbors by `lambda`. Vertices with no neighbors are left untouched.
/// Normals are invalidated and must be recomputed afterwards.
pub struct LaplacianSmooth {
    /// Number of smoothing iterations
    pub iterations: u32,
    /// Pull strength toward the neighbor mean, in (0, 1]
    pub lambda: f32,
}

impl Default for LaplacianSmooth {
    fn default() -> Self {
        Self {
            iterations: 3,
            lambda: 0.5,
        }
    }
}

impl MeshModifier for LaplacianSmooth {
    fn apply(&self, mesh: &mut Mesh) {
        if self.iterations == 0 || self.lambda <= 0.0 {
            return;
        }

        // Undirected adjacency, deduplicated, built in face-scan order.
        let mut neighbors: Vec<Vec<u32>> = vec![Vec::new(); mesh.positions.len()];
        for face in mesh.indices.chunks(3) {
            for (a, b) in [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])] {
                if !neighbors[a as usize].contains(&b) {
                    neighbors[a as usize].push(b);
                }
                if !neighbors[b as usize].contains(&a) {
                    neighbors[b as usize].push(a);
                }
            }
        }

        let mut next = mesh.positions.clone();
        for _ in 0..self.iterations {
            for (i, adj) in neighbors.iter().enumerate() {
                if adj.is_empty() {
                    continue;
                }
                let mut mean = Vec3::ZERO;
                for &n in adj {
                    mean += Vec3::from(mesh.positions[n as usize]);
                }
                mean /= adj.len() as f32;

                let p = Vec3::from(mesh.positions[i]);
                let moved = p + self.lambda * (mean - p);
                next[i] = [moved.x, moved.y, moved.z];
            }
            mesh.positions.copy_from_slice(&next);
        }
        mesh.normals.clear();
    }
}

/// Subdivide mesh using midpoint subdivision
///
/// Each triangle is split into 4 smaller triangles by adding a vertex at
/// the midpoint of each edge. Midpoints are shared across the two faces of
/// an interior edge, so the result stays watertight.
pub struct Subdivide {
    /// Number of subdivision iterations (triangle count grows 4x each)
    pub iterations: u32,
}

impl Default for Subdivide {
    fn default() -> Self {
        Self { iterations: 1 }
    }
}

impl MeshModifier for Subdivide {
    fn apply(&self, mesh: &mut Mesh) {
        for _ in 0..self.iterations {
            subdivide_once(mesh);
        }
    }
}

/// Perform a single subdivision pass
fn subdivide_once(mesh: &mut Mesh) {
    // Edge key: sorted pair of vertex indices
    fn edge_key(a: u32, b: u32) -> (u32, u32) {
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }

    let has_normals = mesh.normals.len() == mesh.positions.len();
    let mut edge_midpoints: HashMap<(u32, u32), u32> = HashMap::new();
    let mut positions = mesh.positions.clone();
    let mut normals = mesh.normals.clone();
    let mut indices = Vec::with_capacity(mesh.indices.len() * 4);

    let mut midpoint = |a: u32, b: u32, positions: &mut Vec<[f32; 3]>, normals: &mut Vec<[f32; 3]>| {
        *edge_midpoints.entry(edge_key(a, b)).or_insert_with(|| {
            let p0 = Vec3::from(mesh.positions[a as usize]);
            let p1 = Vec3::from(mesh.positions[b as usize]);
            let mid = (p0 + p1) * 0.5;
            let idx = positions.len() as u32;
            positions.push([mid.x, mid.y, mid.z]);
            if has_normals {
                let n = (Vec3::from(mesh.normals[a as usize])
                    + Vec3::from(mesh.normals[b as usize]))
                .normalize_or_zero();
                normals.push([n.x, n.y, n.z]);
            }
            idx
        })
    };

    for face in mesh.indices.chunks(3) {
        let [i0, i1, i2] = [face[0], face[1], face[2]];
        let m01 = midpoint(i0, i1, &mut positions, &mut normals);
        let m12 = midpoint(i1, i2, &mut positions, &mut normals);
        let m20 = midpoint(i2, i0, &mut positions, &mut normals);

        indices.extend_from_slice(&[i0, m01, m20]);
        indices.extend_from_slice(&[m01, i1, m12]);
        indices.extend_from_slice(&[m20, m12, i2]);
        indices.extend_from_slice(&[m01, m12, m20]);
    }

    mesh.positions = positions;
    mesh.normals = normals;
    mesh.indices = indices;
}
