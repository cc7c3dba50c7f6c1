//! Mesh repair: welding, face pruning, orientation, normal recomputation
//!
//! Runs after part concatenation and before any smoothing. All passes scan
//! vertices and faces in storage order, so output ordering is deterministic
//! for a fixed input regardless of hash map internals.

use crate::error::BuildError;
use crate::mesh::Mesh;
use glam::Vec3;
use std::collections::{HashMap, HashSet};

/// Default weld tolerance in meters
pub const WELD_EPSILON: f32 = 1e-4;

/// Full repair pass: weld, prune, drop orphans, orient, recompute normals.
pub fn repair(mesh: &mut Mesh, epsilon: f32) -> Result<(), BuildError> {
    weld_vertices(mesh, epsilon);
    prune_faces(mesh);
    drop_orphan_vertices(mesh);
    if mesh.indices.is_empty() {
        return Err(BuildError::EmptyMesh);
    }
    orient_outward(mesh);
    recompute_normals(mesh)
}

/// Merge vertices that fall into the same epsilon-sized grid cell.
///
/// Surviving vertices keep their first-occurrence order; indices are
/// remapped in place.
pub fn weld_vertices(mesh: &mut Mesh, epsilon: f32) {
    let mut cell_to_new: HashMap<(i64, i64, i64), u32> = HashMap::new();
    let mut remap = Vec::with_capacity(mesh.positions.len());
    let mut kept = Vec::new();

    for p in &mesh.positions {
        let key = (
            (p[0] / epsilon).round() as i64,
            (p[1] / epsilon).round() as i64,
            (p[2] / epsilon).round() as i64,
        );
        let new_idx = *cell_to_new.entry(key).or_insert_with(|| {
            kept.push(*p);
            (kept.len() - 1) as u32
        });
        remap.push(new_idx);
    }

    mesh.positions = kept;
    mesh.normals.clear();
    for idx in &mut mesh.indices {
        *idx = remap[*idx as usize];
    }
}

/// Drop degenerate faces (repeated indices) and duplicate faces.
///
/// Duplicates are detected up to cyclic rotation, so `(a, b, c)` and
/// `(b, c, a)` count as the same face; opposite windings are kept.
pub fn prune_faces(mesh: &mut Mesh) {
    let mut seen: HashSet<[u32; 3]> = HashSet::new();
    let mut kept = Vec::with_capacity(mesh.indices.len());

    for face in mesh.indices.chunks(3) {
        let [a, b, c] = [face[0], face[1], face[2]];
        if a == b || b == c || a == c {
            continue;
        }
        if seen.insert(canonical_rotation(a, b, c)) {
            kept.extend_from_slice(&[a, b, c]);
        }
    }
    mesh.indices = kept;
}

/// Rotate a face so its smallest index comes first, preserving winding.
fn canonical_rotation(a: u32, b: u32, c: u32) -> [u32; 3] {
    if a <= b && a <= c {
        [a, b, c]
    } else if b <= a && b <= c {
        [b, c, a]
    } else {
        [c, a, b]
    }
}

/// Remove vertices referenced by no face and remap indices.
pub fn drop_orphan_vertices(mesh: &mut Mesh) {
    let mut used = vec![false; mesh.positions.len()];
    for &idx in &mesh.indices {
        used[idx as usize] = true;
    }

    let mut remap = vec![u32::MAX; mesh.positions.len()];
    let mut kept = Vec::new();
    for (i, p) in mesh.positions.iter().enumerate() {
        if used[i] {
            remap[i] = kept.len() as u32;
            kept.push(*p);
        }
    }

    mesh.positions = kept;
    for idx in &mut mesh.indices {
        *idx = remap[*idx as usize];
    }
}

/// Flip whole connected components whose aggregate orientation points
/// toward their own column axis.
///
/// Stitched parts arrive consistently wound, so orientation is a property
/// of the component, not of single faces. The reference direction for a
/// face is radial from the vertical axis through its component's vertex
/// centroid; for cap faces on that axis it degenerates to straight up or
/// down. Individual faces are never flipped: a per-face rule against a
/// global axis would turn the medial wall of an offset column (an arm,
/// a leg) inside out and break the winding invariant.
pub fn orient_outward(mesh: &mut Mesh) {
    let vertex_count = mesh.positions.len();
    if vertex_count == 0 || mesh.indices.is_empty() {
        return;
    }

    let mut parent: Vec<u32> = (0..vertex_count as u32).collect();
    for face in mesh.indices.chunks(3) {
        let a = find(&mut parent, face[0]);
        let b = find(&mut parent, face[1]);
        parent[b as usize] = a;
        let c = find(&mut parent, face[2]);
        parent[c as usize] = a;
    }

    // Per-component vertex statistics, indexed by component root.
    let mut sum_x = vec![0.0f32; vertex_count];
    let mut sum_z = vec![0.0f32; vertex_count];
    let mut min_y = vec![f32::INFINITY; vertex_count];
    let mut max_y = vec![f32::NEG_INFINITY; vertex_count];
    let mut count = vec![0u32; vertex_count];
    for i in 0..vertex_count {
        let root = find(&mut parent, i as u32) as usize;
        let p = mesh.positions[i];
        sum_x[root] += p[0];
        sum_z[root] += p[2];
        min_y[root] = min_y[root].min(p[1]);
        max_y[root] = max_y[root].max(p[1]);
        count[root] += 1;
    }

    let mut score = vec![0.0f32; vertex_count];
    for face in mesh.indices.chunks(3) {
        let root = find(&mut parent, face[0]) as usize;
        let p0 = Vec3::from(mesh.positions[face[0] as usize]);
        let p1 = Vec3::from(mesh.positions[face[1] as usize]);
        let p2 = Vec3::from(mesh.positions[face[2] as usize]);

        let normal = (p1 - p0).cross(p2 - p0);
        let centroid = (p0 + p1 + p2) / 3.0;
        let cx = sum_x[root] / count[root] as f32;
        let cz = sum_z[root] / count[root] as f32;
        let mut outward = Vec3::new(centroid.x - cx, 0.0, centroid.z - cz);
        if outward.length_squared() < 1e-8 {
            let mid_y = 0.5 * (min_y[root] + max_y[root]);
            outward = if centroid.y > mid_y { Vec3::Y } else { -Vec3::Y };
        }
        score[root] += normal.dot(outward);
    }

    for face in mesh.indices.chunks_mut(3) {
        let root = find(&mut parent, face[0]) as usize;
        if score[root] < 0.0 {
            face.swap(1, 2);
        }
    }
}

/// Union-find lookup with path halving
fn find(parent: &mut [u32], mut i: u32) -> u32 {
    while parent[i as usize] != i {
        parent[i as usize] = parent[parent[i as usize] as usize];
        i = parent[i as usize];
    }
    i
}

/// Recompute per-vertex normals as area-weighted averages of face normals.
///
/// Fails if any vertex accumulates a zero-length normal, which indicates
/// degenerate geometry the earlier passes should have removed.
pub fn recompute_normals(mesh: &mut Mesh) -> Result<(), BuildError> {
    let mut accum = vec![Vec3::ZERO; mesh.positions.len()];

    for face in mesh.indices.chunks(3) {
        let p0 = Vec3::from(mesh.positions[face[0] as usize]);
        let p1 = Vec3::from(mesh.positions[face[1] as usize]);
        let p2 = Vec3::from(mesh.positions[face[2] as usize]);

        // Cross product magnitude is twice the face area, giving the
        // area weighting for free.
        let weighted = (p1 - p0).cross(p2 - p0);
        for &i in face {
            accum[i as usize] += weighted;
        }
    }

    mesh.normals.clear();
    mesh.normals.reserve(accum.len());
    for (i, n) in accum.iter().enumerate() {
        let len = n.length();
        if len < 1e-12 {
            return Err(BuildError::DegenerateNormal(i));
        }
        let unit = *n / len;
        mesh.normals.push([unit.x, unit.y, unit.z]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{stitch_column, CapEnds};
    use crate::profile::{sample_ring, sample_ring_at, AnatomicalProfile, Asymmetry};

    fn stitched(point_counts: &[usize]) -> Mesh {
        let rings: Vec<_> = point_counts
            .iter()
            .enumerate()
            .map(|(i, &n)| {
                let h = i as f32 / (point_counts.len() - 1) as f32;
                let p = AnatomicalProfile::new(h, 0.1, 0.1, n, Asymmetry::NONE).unwrap();
                sample_ring(&p, 1.0)
            })
            .collect();
        stitch_column(&rings, CapEnds::BOTH).unwrap()
    }

    /// Count of faces per undirected edge
    fn edge_face_counts(mesh: &Mesh) -> HashMap<(u32, u32), usize> {
        let mut counts = HashMap::new();
        for face in mesh.indices.chunks(3) {
            for (a, b) in [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])] {
                let key = if a < b { (a, b) } else { (b, a) };
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Count of faces per directed edge
    fn directed_edge_counts(mesh: &Mesh) -> HashMap<(u32, u32), usize> {
        let mut counts = HashMap::new();
        for face in mesh.indices.chunks(3) {
            for (a, b) in [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])] {
                *counts.entry((a, b)).or_insert(0) += 1;
            }
        }
        counts
    }

    /// A limb-like tube centered away from the body midline, hand cap only.
    fn offset_column() -> Mesh {
        let rings: Vec<_> = [0.4f32, 0.5, 0.6, 0.7]
            .iter()
            .map(|&h| {
                let p = AnatomicalProfile::new(h, 0.03, 0.025, 12, Asymmetry::NONE).unwrap();
                sample_ring_at(&p, 1.0, 0.25)
            })
            .collect();
        let mut mesh = stitch_column(&rings, CapEnds::BOTTOM).unwrap();
        repair(&mut mesh, WELD_EPSILON).unwrap();
        mesh
    }

    #[test]
    fn test_weld_merges_coincident_vertices() {
        let mut mesh = Mesh {
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 0.000_01],
            ],
            normals: Vec::new(),
            indices: vec![0, 1, 2, 3, 1, 2],
        };
        weld_vertices(&mut mesh, WELD_EPSILON);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(&mesh.indices, &[0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_prune_drops_degenerates_and_duplicates() {
        let mut mesh = Mesh {
            positions: vec![[0.0; 3]; 4],
            normals: Vec::new(),
            // degenerate, real, cyclic duplicate of the real face, distinct
            indices: vec![0, 0, 1, 0, 1, 2, 1, 2, 0, 1, 2, 3],
        };
        prune_faces(&mut mesh);
        assert_eq!(&mesh.indices, &[0, 1, 2, 1, 2, 3]);
    }

    #[test]
    fn test_orphans_removed_and_remapped() {
        let mut mesh = Mesh {
            positions: vec![[0.0; 3], [1.0, 0.0, 0.0], [9.0; 3], [0.0, 1.0, 0.0]],
            normals: Vec::new(),
            indices: vec![0, 1, 3],
        };
        drop_orphan_vertices(&mut mesh);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(&mesh.indices, &[0, 1, 2]);
        assert_eq!(mesh.positions[2], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_repaired_column_is_edge_manifold() {
        let mut mesh = stitched(&[8, 12, 12, 8]);
        repair(&mut mesh, WELD_EPSILON).unwrap();

        for (&edge, &count) in edge_face_counts(&mesh).iter() {
            assert!(count <= 2, "edge {edge:?} touches {count} faces");
        }
        // Every vertex referenced, all indices in range.
        let mut used = vec![false; mesh.vertex_count()];
        for &idx in &mesh.indices {
            used[idx as usize] = true;
        }
        assert!(used.iter().all(|&u| u));
    }

    #[test]
    fn test_mismatched_ring_degenerates_are_pruned() {
        let mut mesh = stitched(&[8, 16, 8]);
        let before = mesh.triangle_count();
        repair(&mut mesh, WELD_EPSILON).unwrap();
        assert!(mesh.triangle_count() < before);
        for face in mesh.indices.chunks(3) {
            assert!(face[0] != face[1] && face[1] != face[2] && face[0] != face[2]);
        }
    }

    #[test]
    fn test_offset_column_stays_consistently_wound() {
        let mesh = offset_column();
        for (&(a, b), &count) in directed_edge_counts(&mesh).iter() {
            assert_eq!(count, 1, "directed edge {a}->{b} traversed {count} times");
        }
    }

    #[test]
    fn test_offset_column_medial_wall_points_inward() {
        let mesh = offset_column();

        // Vertices on the medial wall of the tube (toward the body midline)
        // must carry normals that point away from the tube's own axis at
        // x = 0.25, i.e. with a negative x component.
        let mut checked = 0;
        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            if p[0] < 0.25 - 0.015 {
                assert!(n[0] < 0.0, "medial vertex {p:?} has outward normal {n:?}");
                checked += 1;
            }
        }
        assert!(checked > 0);
    }

    #[test]
    fn test_normals_are_unit_and_outward() {
        let mut mesh = stitched(&[16, 16, 16]);
        repair(&mut mesh, WELD_EPSILON).unwrap();
        assert_eq!(mesh.normals.len(), mesh.vertex_count());

        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-4);

            // Side-wall vertices must point away from the vertical axis.
            let radial = Vec3::new(p[0], 0.0, p[2]);
            if radial.length() > 0.05 && p[1] > 0.01 && p[1] < 0.99 {
                assert!(Vec3::from(*n).dot(radial) > 0.0);
            }
        }
    }
}
