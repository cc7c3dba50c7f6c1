//! One-call container export for a morphable asset
//!
//! Sections land in the blob in a fixed order: positions, normals, indices,
//! then one displacement section per morph target in declared order. The
//! declared order also fixes the weight-array indexing and the
//! `targetNames` list, so the three never disagree.

use crate::buffer::BufferBuilder;
use crate::document::{GeometryAccessors, GltfBuilder};
use crate::error::ContainerError;
use crate::utils::assemble_glb;

/// Everything needed to write one container
pub struct MorphableAsset<'a> {
    /// Mesh and node name inside the document
    pub name: &'a str,
    /// Final vertex positions
    pub positions: &'a [[f32; 3]],
    /// Per-vertex unit normals, same length as positions
    pub normals: &'a [[f32; 3]],
    /// Triangle indices
    pub indices: &'a [u32],
    /// (name, displacement) pairs in declared order
    pub morph_targets: &'a [(&'a str, &'a [[f32; 3]])],
    /// Initial weight per morph target, same order
    pub weights: &'a [f32],
    /// Generator string recorded in the asset header
    pub generator: &'a str,
}

impl MorphableAsset<'_> {
    /// Validate consistency and encode the complete GLB byte stream.
    ///
    /// Nothing is written on error; a failed export leaves no partial
    /// container behind.
    pub fn encode_glb(&self) -> Result<Vec<u8>, ContainerError> {
        self.validate()?;

        let mut buffer = BufferBuilder::new();
        let geometry = GeometryAccessors {
            positions: buffer.pack_positions(self.positions),
            normals: buffer.pack_vec3(self.normals),
            indices: buffer.pack_indices_u32(self.indices),
        };
        let targets: Vec<_> = self
            .morph_targets
            .iter()
            .map(|&(name, displacement)| (name, buffer.pack_displacements(displacement)))
            .collect();
        buffer.validate()?;

        let gltf = GltfBuilder::new()
            .buffer_byte_length(buffer.data().len() as u64)
            .add_flat_material("AvatarSkin");
        let material = gltf.last_material_index();
        let gltf = gltf
            .add_morphable_mesh(self.name, &geometry, &targets, self.weights, material)?
            .add_node(self.name, gltf_json::Index::new(0))
            .add_scene("Scene", &[0]);

        let root = gltf.build(buffer.views(), buffer.accessors(), self.generator);
        assemble_glb(&root, buffer.data())
    }

    fn validate(&self) -> Result<(), ContainerError> {
        let vertex_count = self.positions.len();
        if vertex_count == 0 || self.indices.is_empty() {
            return Err(ContainerError::EmptyGeometry);
        }
        if self.normals.len() != vertex_count {
            return Err(ContainerError::AttributeLengthMismatch {
                attribute: "NORMAL",
                len: self.normals.len(),
                vertex_count,
            });
        }
        for &(name, displacement) in self.morph_targets {
            if displacement.len() != vertex_count {
                return Err(ContainerError::MorphLengthMismatch {
                    name: name.to_string(),
                    len: displacement.len(),
                    vertex_count,
                });
            }
        }
        if self.weights.len() != self.morph_targets.len() {
            return Err(ContainerError::WeightLengthMismatch {
                len: self.weights.len(),
                target_count: self.morph_targets.len(),
            });
        }
        for &index in self.indices {
            if index as usize >= vertex_count {
                return Err(ContainerError::IndexOutOfBounds {
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }
}
