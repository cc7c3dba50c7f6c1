//! glTF document construction

use crate::buffer::AccessorIndex;
use crate::error::ContainerError;
use gltf_json as json;
use gltf_json::validation::Checked::Valid;
use std::collections::BTreeMap;

/// Base color of the single flat avatar material (skin-tone RGBA)
pub const FLAT_BASE_COLOR: [f32; 4] = [0.85, 0.82, 0.80, 1.0];
/// Metallic factor of the flat material
pub const FLAT_METALLIC: f32 = 0.0;
/// Roughness factor of the flat material
pub const FLAT_ROUGHNESS: f32 = 0.7;

/// Base geometry accessors of one renderable mesh
pub struct GeometryAccessors {
    pub positions: AccessorIndex,
    pub normals: AccessorIndex,
    pub indices: AccessorIndex,
}

/// Builder for complete glTF documents
pub struct GltfBuilder {
    nodes: Vec<json::Node>,
    meshes: Vec<json::Mesh>,
    materials: Vec<json::Material>,
    scenes: Vec<json::Scene>,
    buffer_byte_length: u64,
}

impl GltfBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            meshes: Vec::new(),
            materials: Vec::new(),
            scenes: Vec::new(),
            buffer_byte_length: 0,
        }
    }

    /// Set buffer byte length (required before building)
    pub fn buffer_byte_length(mut self, length: u64) -> Self {
        self.buffer_byte_length = length;
        self
    }

    /// Add the single flat double-sided PBR material
    pub fn add_flat_material(mut self, name: &str) -> Self {
        self.materials.push(json::Material {
            name: Some(name.to_string()),
            double_sided: true,
            pbr_metallic_roughness: json::material::PbrMetallicRoughness {
                base_color_factor: json::material::PbrBaseColorFactor(FLAT_BASE_COLOR),
                metallic_factor: json::material::StrengthFactor(FLAT_METALLIC),
                roughness_factor: json::material::StrengthFactor(FLAT_ROUGHNESS),
                ..Default::default()
            },
            ..Default::default()
        });
        self
    }

    /// Get the index of the last added material
    pub fn last_material_index(&self) -> Option<json::Index<json::Material>> {
        if self.materials.is_empty() {
            None
        } else {
            Some(json::Index::new(self.materials.len() as u32 - 1))
        }
    }

    /// Add a mesh whose primitive lists morph targets as alternate position
    /// streams.
    ///
    /// `targets` supplies (name, displacement accessor) pairs in final order;
    /// the names are carried in the mesh `extras` as `targetNames` so
    /// consumers can map weight indices back to clinical meaning. `weights`
    /// is the initial per-target weight vector, same order.
    pub fn add_morphable_mesh(
        mut self,
        name: &str,
        geometry: &GeometryAccessors,
        targets: &[(&str, AccessorIndex)],
        weights: &[f32],
        material: Option<json::Index<json::Material>>,
    ) -> Result<Self, ContainerError> {
        if weights.len() != targets.len() {
            return Err(ContainerError::WeightLengthMismatch {
                len: weights.len(),
                target_count: targets.len(),
            });
        }

        let mut attributes = BTreeMap::new();
        attributes.insert(
            Valid(json::mesh::Semantic::Positions),
            geometry.positions.as_json_index(),
        );
        attributes.insert(
            Valid(json::mesh::Semantic::Normals),
            geometry.normals.as_json_index(),
        );

        // A frozen (non-morphable) mesh has no targets at all; an empty
        // targets array is not valid glTF.
        let morph_targets = if targets.is_empty() {
            None
        } else {
            Some(
                targets
                    .iter()
                    .map(|(_, accessor)| json::mesh::MorphTarget {
                        positions: Some(accessor.as_json_index()),
                        normals: None,
                        tangents: None,
                    })
                    .collect(),
            )
        };

        let primitive = json::mesh::Primitive {
            attributes,
            extensions: Default::default(),
            extras: Default::default(),
            indices: Some(geometry.indices.as_json_index()),
            material,
            mode: Valid(json::mesh::Mode::Triangles),
            targets: morph_targets,
        };

        let extras = if targets.is_empty() {
            None
        } else {
            let target_names: Vec<&str> = targets.iter().map(|&(name, _)| name).collect();
            Some(serde_json::value::to_raw_value(&serde_json::json!({
                "targetNames": target_names,
            }))?)
        };

        self.meshes.push(json::Mesh {
            extensions: Default::default(),
            extras,
            name: Some(name.to_string()),
            primitives: vec![primitive],
            weights: if weights.is_empty() {
                None
            } else {
                Some(weights.to_vec())
            },
        });

        Ok(self)
    }

    /// Get the index of the last added mesh
    pub fn last_mesh_index(&self) -> Option<json::Index<json::Mesh>> {
        if self.meshes.is_empty() {
            None
        } else {
            Some(json::Index::new(self.meshes.len() as u32 - 1))
        }
    }

    /// Add a node referencing a mesh
    pub fn add_node(mut self, name: &str, mesh: json::Index<json::Mesh>) -> Self {
        self.nodes.push(json::Node {
            camera: None,
            children: None,
            extensions: Default::default(),
            extras: Default::default(),
            matrix: None,
            mesh: Some(mesh),
            name: Some(name.to_string()),
            rotation: None,
            scale: None,
            skin: None,
            translation: None,
            weights: None,
        });
        self
    }

    /// Add a scene
    pub fn add_scene(mut self, name: &str, root_nodes: &[u32]) -> Self {
        self.scenes.push(json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some(name.to_string()),
            nodes: root_nodes.iter().map(|n| json::Index::new(*n)).collect(),
        });
        self
    }

    /// Build the final glTF Root from the views and accessors the
    /// BufferBuilder recorded.
    pub fn build(
        self,
        buffer_views: &[json::buffer::View],
        accessors: &[json::Accessor],
        generator: &str,
    ) -> json::Root {
        let buffers = vec![json::Buffer {
            byte_length: self.buffer_byte_length.into(),
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            uri: None,
        }];

        json::Root {
            accessors: accessors.to_vec(),
            animations: Vec::new(),
            asset: json::Asset {
                copyright: None,
                extensions: Default::default(),
                extras: Default::default(),
                generator: Some(generator.to_string()),
                min_version: None,
                version: "2.0".to_string(),
            },
            buffers,
            buffer_views: buffer_views.to_vec(),
            cameras: Vec::new(),
            extensions: Default::default(),
            extensions_required: Vec::new(),
            extensions_used: Vec::new(),
            extras: Default::default(),
            images: Vec::new(),
            materials: self.materials,
            meshes: self.meshes,
            nodes: self.nodes,
            samplers: Vec::new(),
            scene: if self.scenes.is_empty() {
                None
            } else {
                Some(json::Index::new(0))
            },
            scenes: self.scenes,
            skins: Vec::new(),
            textures: Vec::new(),
        }
    }
}

impl Default for GltfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferBuilder;

    #[test]
    fn test_gltf_builder_morphable_mesh() {
        let mut buffer = BufferBuilder::new();
        let geometry = GeometryAccessors {
            positions: buffer.pack_positions(&[[0.0; 3], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]]),
            normals: buffer.pack_vec3(&[[0.0, 0.0, 1.0]; 3]),
            indices: buffer.pack_indices_u32(&[0, 1, 2]),
        };
        let weight = buffer.pack_displacements(&[[0.01, 0.0, 0.0]; 3]);

        let gltf = GltfBuilder::new()
            .buffer_byte_length(buffer.data().len() as u64)
            .add_flat_material("AvatarSkin");
        let material = gltf.last_material_index();
        let gltf = gltf
            .add_morphable_mesh("Avatar", &geometry, &[("Weight", weight)], &[0.0], material)
            .unwrap()
            .add_node("Avatar", json::Index::new(0))
            .add_scene("Scene", &[0]);

        let root = gltf.build(buffer.views(), buffer.accessors(), "test");

        assert_eq!(root.meshes.len(), 1);
        assert_eq!(root.materials.len(), 1);
        assert_eq!(root.scenes.len(), 1);
        assert_eq!(root.asset.version, "2.0");

        let mesh = &root.meshes[0];
        assert_eq!(mesh.weights, Some(vec![0.0]));
        let targets = mesh.primitives[0].targets.as_ref().unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].positions, Some(weight.as_json_index()));

        let extras: serde_json::Value =
            serde_json::from_str(mesh.extras.as_ref().unwrap().get()).unwrap();
        assert_eq!(extras["targetNames"][0], "Weight");
    }

    #[test]
    fn test_weight_count_must_match_targets() {
        let mut buffer = BufferBuilder::new();
        let geometry = GeometryAccessors {
            positions: buffer.pack_positions(&[[0.0; 3]; 3]),
            normals: buffer.pack_vec3(&[[0.0, 0.0, 1.0]; 3]),
            indices: buffer.pack_indices_u32(&[0, 1, 2]),
        };
        let target = buffer.pack_displacements(&[[0.0; 3]; 3]);

        let result = GltfBuilder::new().add_morphable_mesh(
            "Avatar",
            &geometry,
            &[("Weight", target)],
            &[0.0, 1.0],
            None,
        );
        assert!(matches!(
            result,
            Err(ContainerError::WeightLengthMismatch { len: 2, target_count: 1 })
        ));
    }
}
