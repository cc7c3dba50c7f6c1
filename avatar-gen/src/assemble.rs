//! Ring stitching, extremity capping, and part concatenation

use crate::error::BuildError;
use crate::mesh::Mesh;
use crate::profile::Ring;
use glam::Vec3;

/// The sole-center cap vertex sits this far below the first ring plane
const SOLE_DROP: f32 = 0.005;

/// The apex cap vertex sits this far above the last ring plane
const APEX_RISE: f32 = 0.01;

/// Which ends of a ring column are closed with a cap fan
#[derive(Debug, Clone, Copy)]
pub struct CapEnds {
    /// Close the first (lowest) ring with a sole/hand-center fan
    pub bottom: bool,
    /// Close the last (highest) ring with an apex fan
    pub top: bool,
}

impl CapEnds {
    pub const BOTH: CapEnds = CapEnds {
        bottom: true,
        top: true,
    };
    pub const BOTTOM: CapEnds = CapEnds {
        bottom: true,
        top: false,
    };
}

/// Stitch a column of rings into a single open or capped surface.
///
/// Adjacent rings may have different point counts: each stitching step maps
/// into both rings by proportional down-sampling, so `max(Pa, Pb)` quads are
/// emitted per band. Repeated corners from the down-sampling produce
/// degenerate triangles here; `repair` prunes them. Rings must already be
/// ordered bottom to top.
///
/// The emitted surface is consistently wound: side bands face away from the
/// column and both cap fans match the band winding at their ring, so no
/// directed edge is ever traversed twice.
pub fn stitch_column(rings: &[Ring], caps: CapEnds) -> Result<Mesh, BuildError> {
    if rings.len() < 2 {
        return Err(BuildError::TooFewRings(rings.len()));
    }

    let mut mesh = Mesh::new();
    let mut ring_starts = Vec::with_capacity(rings.len());
    for ring in rings {
        ring_starts.push(mesh.positions.len() as u32);
        for p in ring {
            mesh.positions.push([p.x, p.y, p.z]);
        }
    }

    for (pair, window) in rings.windows(2).enumerate() {
        let (prev, curr) = (&window[0], &window[1]);
        let (pa, pb) = (prev.len() as u32, curr.len() as u32);
        let steps = pa.max(pb);
        let prev_start = ring_starts[pair];
        let curr_start = ring_starts[pair + 1];

        for j in 0..steps {
            let p = prev_start + (j * pa / steps) % pa;
            let c = curr_start + (j * pb / steps) % pb;
            let np = prev_start + ((j + 1) * pa / steps) % pa;
            let nc = curr_start + ((j + 1) * pb / steps) % pb;

            mesh.indices.extend_from_slice(&[p, c, nc]);
            mesh.indices.extend_from_slice(&[p, nc, np]);
        }
    }

    if caps.bottom {
        let ring = &rings[0];
        let center = ring_center(ring) - Vec3::Y * SOLE_DROP;
        let center_idx = mesh.positions.len() as u32;
        mesh.positions.push([center.x, center.y, center.z]);

        let start = ring_starts[0];
        let n = ring.len() as u32;
        for j in 0..n {
            // Wound so the fan faces downward, opposing the band above it.
            mesh.indices
                .extend_from_slice(&[start + j, start + (j + 1) % n, center_idx]);
        }
    }

    if caps.top {
        let ring = &rings[rings.len() - 1];
        let center = ring_center(ring) + Vec3::Y * APEX_RISE;
        let center_idx = mesh.positions.len() as u32;
        mesh.positions.push([center.x, center.y, center.z]);

        let start = ring_starts[rings.len() - 1];
        let n = ring.len() as u32;
        for j in 0..n {
            // Wound so the fan faces upward, opposing the band below it.
            mesh.indices
                .extend_from_slice(&[start + (j + 1) % n, start + j, center_idx]);
        }
    }

    if mesh.indices.is_empty() {
        return Err(BuildError::EmptyMesh);
    }
    Ok(mesh)
}

fn ring_center(ring: &Ring) -> Vec3 {
    ring.iter().copied().sum::<Vec3>() / ring.len() as f32
}

/// Concatenate body parts into one mesh by index offsetting.
///
/// Parts never share vertices across boundaries; the weld pass of `repair`
/// is what fuses coincident seams afterwards.
pub fn concatenate(parts: &[Mesh]) -> Mesh {
    let total_vertices: usize = parts.iter().map(|p| p.positions.len()).sum();
    let total_indices: usize = parts.iter().map(|p| p.indices.len()).sum();

    let mut result = Mesh::new();
    result.positions.reserve(total_vertices);
    result.normals.reserve(total_vertices);
    result.indices.reserve(total_indices);

    for part in parts {
        if part.positions.is_empty() {
            continue;
        }
        let offset = result.positions.len() as u32;
        result.positions.extend_from_slice(&part.positions);
        result.normals.extend_from_slice(&part.normals);
        for &idx in &part.indices {
            result.indices.push(offset + idx);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{sample_ring, AnatomicalProfile, Asymmetry};
    use std::collections::HashMap;

    fn column(point_counts: &[usize]) -> Vec<Ring> {
        point_counts
            .iter()
            .enumerate()
            .map(|(i, &n)| {
                let h = i as f32 / (point_counts.len() - 1) as f32;
                let p = AnatomicalProfile::new(h.min(1.0), 0.1, 0.1, n, Asymmetry::NONE).unwrap();
                sample_ring(&p, 1.0)
            })
            .collect()
    }

    #[test]
    fn test_minimal_torso_counts() {
        // 4 rings of 8 points: 3 bands x 8 steps x 2 triangles = 48 side
        // faces, plus 2 cap fans of 8 = 64 faces; 32 ring vertices plus
        // 2 cap centers = 34 vertices.
        let rings = column(&[8, 8, 8, 8]);
        let mesh = stitch_column(&rings, CapEnds::BOTH).unwrap();
        assert_eq!(mesh.vertex_count(), 34);
        assert_eq!(mesh.triangle_count(), 64);
    }

    #[test]
    fn test_indices_in_range() {
        let rings = column(&[8, 12, 16, 12]);
        let mesh = stitch_column(&rings, CapEnds::BOTH).unwrap();
        for &idx in &mesh.indices {
            assert!((idx as usize) < mesh.vertex_count());
        }
    }

    #[test]
    fn test_too_few_rings_is_an_error() {
        let rings = column(&[8, 8]);
        assert!(matches!(
            stitch_column(&rings[..1], CapEnds::BOTH),
            Err(BuildError::TooFewRings(1))
        ));
        assert!(matches!(
            stitch_column(&[], CapEnds::BOTH),
            Err(BuildError::TooFewRings(0))
        ));
    }

    #[test]
    fn test_open_column_has_no_cap_vertices() {
        let rings = column(&[8, 8, 8]);
        let open = stitch_column(
            &rings,
            CapEnds {
                bottom: false,
                top: false,
            },
        )
        .unwrap();
        assert_eq!(open.vertex_count(), 24);
        assert_eq!(open.triangle_count(), 32);
    }

    #[test]
    fn test_capped_column_is_consistently_wound() {
        let rings = column(&[8, 8, 8]);
        let mesh = stitch_column(&rings, CapEnds::BOTH).unwrap();

        // On a consistently wound closed surface every interior edge is
        // traversed once in each direction, so no directed edge repeats.
        let mut counts: HashMap<(u32, u32), usize> = HashMap::new();
        for face in mesh.indices.chunks(3) {
            for (a, b) in [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])] {
                *counts.entry((a, b)).or_insert(0) += 1;
            }
        }
        for (&(a, b), &count) in counts.iter() {
            assert_eq!(count, 1, "directed edge {a}->{b} traversed {count} times");
            assert_eq!(counts.get(&(b, a)), Some(&1));
        }
    }

    #[test]
    fn test_cap_centers_sit_outside_ring_planes() {
        let rings = column(&[8, 8]);
        let mesh = stitch_column(&rings, CapEnds::BOTH).unwrap();
        let sole = mesh.positions[16];
        let apex = mesh.positions[17];
        assert!(sole[1] < 0.0);
        assert!(apex[1] > 1.0);
    }

    #[test]
    fn test_concatenate_offsets_indices() {
        let rings = column(&[8, 8]);
        let part = stitch_column(&rings, CapEnds::BOTH).unwrap();
        let combined = concatenate(&[part.clone(), part.clone()]);

        assert_eq!(combined.vertex_count(), part.vertex_count() * 2);
        assert_eq!(combined.triangle_count(), part.triangle_count() * 2);
        for &idx in &combined.indices {
            assert!((idx as usize) < combined.vertex_count());
        }
        // The second copy references only second-copy vertices.
        let second = &combined.indices[part.indices.len()..];
        assert!(second.iter().all(|&i| i as usize >= part.vertex_count()));
    }
}
