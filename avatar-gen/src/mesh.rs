//! Indexed triangle mesh

/// An indexed triangle mesh in f32 format.
///
/// Coordinate convention: Y is vertical (0 = ground under the soles),
/// X is lateral, Z is anterior, origin on the body midline.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex unit normals (same length as positions once repaired)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (3 per face)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertical extent `(y_min, y_max)` of the mesh
    pub fn y_bounds(&self) -> (f32, f32) {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for p in &self.positions {
            min = min.min(p[1]);
            max = max.max(p[1]);
        }
        (min, max)
    }

    /// Recenter so the midline is at x = z = 0 and the soles rest on y = 0
    pub fn recenter(&mut self) {
        if self.positions.is_empty() {
            return;
        }
        let n = self.positions.len() as f32;
        let mean_x: f32 = self.positions.iter().map(|p| p[0]).sum::<f32>() / n;
        let mean_z: f32 = self.positions.iter().map(|p| p[2]).sum::<f32>() / n;
        let (min_y, _) = self.y_bounds();
        for p in &mut self.positions {
            p[0] -= mean_x;
            p[1] -= min_y;
            p[2] -= mean_z;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_y_bounds() {
        let mesh = Mesh {
            positions: vec![[0.0, -1.0, 0.0], [0.0, 2.5, 0.0], [1.0, 0.5, 0.0]],
            normals: Vec::new(),
            indices: Vec::new(),
        };
        assert_eq!(mesh.y_bounds(), (-1.0, 2.5));
    }

    #[test]
    fn test_recenter_grounds_soles() {
        let mut mesh = Mesh {
            positions: vec![[1.0, 0.2, 3.0], [3.0, 1.2, 5.0]],
            normals: Vec::new(),
            indices: Vec::new(),
        };
        mesh.recenter();
        assert_eq!(mesh.y_bounds().0, 0.0);
        let mean_x: f32 = mesh.positions.iter().map(|p| p[0]).sum();
        let mean_z: f32 = mesh.positions.iter().map(|p| p[2]).sum();
        assert!(mean_x.abs() < 1e-6);
        assert!(mean_z.abs() < 1e-6);
    }
}
