//! Low-level buffer packing with automatic alignment and accessor creation
//!
//! Every pack call appends one contiguous section to the blob, records a
//! buffer view whose offset is the exact cumulative length of all prior
//! sections, and records one accessor over that view. Call order therefore
//! fixes the section order in the file.

use crate::error::ContainerError;
use crate::utils::{align_buffer, compute_bounds};
use gltf_json as json;
use gltf_json::validation::Checked::Valid;

/// Accessor index returned by buffer operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorIndex(pub u32);

impl AccessorIndex {
    pub fn as_json_index(&self) -> json::Index<json::Accessor> {
        json::Index::new(self.0)
    }
}

/// Builder for the single binary buffer of a container
pub struct BufferBuilder {
    buffer: Vec<u8>,
    views: Vec<json::buffer::View>,
    accessors: Vec<json::Accessor>,
}

impl BufferBuilder {
    /// Create a new empty buffer builder
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            views: Vec::new(),
            accessors: Vec::new(),
        }
    }

    /// Get the current accessor count
    pub fn accessor_count(&self) -> u32 {
        self.accessors.len() as u32
    }

    /// Get the binary buffer data
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer views
    pub fn views(&self) -> &[json::buffer::View] {
        &self.views
    }

    /// Get the accessors
    pub fn accessors(&self) -> &[json::Accessor] {
        &self.accessors
    }

    /// Pack Vec3 positions with per-axis min/max bounds
    pub fn pack_positions(&mut self, positions: &[[f32; 3]]) -> AccessorIndex {
        self.pack_vec3_section(positions, true)
    }

    /// Pack a morph target displacement section.
    ///
    /// Position displacements carry true per-axis bounds like base
    /// positions do; loaders reject POSITION targets without them.
    pub fn pack_displacements(&mut self, displacements: &[[f32; 3]]) -> AccessorIndex {
        self.pack_vec3_section(displacements, true)
    }

    /// Pack Vec3 data without bounds (normals)
    pub fn pack_vec3(&mut self, data: &[[f32; 3]]) -> AccessorIndex {
        self.pack_vec3_section(data, false)
    }

    fn pack_vec3_section(&mut self, data: &[[f32; 3]], with_bounds: bool) -> AccessorIndex {
        let offset = self.buffer.len();
        for item in data {
            self.buffer.extend_from_slice(bytemuck::cast_slice(item));
        }

        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: (data.len() * 12).into(),
            byte_offset: Some((offset as u64).into()),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: Some(Valid(json::buffer::Target::ArrayBuffer)),
        });

        let (min, max) = if with_bounds {
            let (min, max) = compute_bounds(data);
            (
                Some(json::Value::Array(
                    min.into_iter().map(json::Value::from).collect(),
                )),
                Some(json::Value::Array(
                    max.into_iter().map(json::Value::from).collect(),
                )),
            )
        } else {
            (None, None)
        };

        let accessor_idx = self.accessors.len() as u32;
        self.accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(self.views.len() as u32 - 1)),
            byte_offset: Some(0u64.into()),
            count: data.len().into(),
            component_type: Valid(json::accessor::GenericComponentType(
                json::accessor::ComponentType::F32,
            )),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(json::accessor::Type::Vec3),
            min,
            max,
            name: None,
            normalized: false,
            sparse: None,
        });

        align_buffer(&mut self.buffer);
        AccessorIndex(accessor_idx)
    }

    /// Pack u32 triangle indices
    pub fn pack_indices_u32(&mut self, indices: &[u32]) -> AccessorIndex {
        let offset = self.buffer.len();
        for idx in indices {
            self.buffer.extend_from_slice(&idx.to_le_bytes());
        }

        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: (indices.len() * 4).into(),
            byte_offset: Some((offset as u64).into()),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: Some(Valid(json::buffer::Target::ElementArrayBuffer)),
        });

        let accessor_idx = self.accessors.len() as u32;
        self.accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(self.views.len() as u32 - 1)),
            byte_offset: Some(0u64.into()),
            count: indices.len().into(),
            component_type: Valid(json::accessor::GenericComponentType(
                json::accessor::ComponentType::U32,
            )),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(json::accessor::Type::Scalar),
            min: None,
            max: None,
            name: None,
            normalized: false,
            sparse: None,
        });

        align_buffer(&mut self.buffer);
        AccessorIndex(accessor_idx)
    }

    /// Check that every accessor's element count exactly covers its view.
    ///
    /// The builder constructs both sides itself, so a mismatch means a bug,
    /// but the check runs before every serialization so a corrupt container
    /// can never be written.
    pub fn validate(&self) -> Result<(), ContainerError> {
        for (i, accessor) in self.accessors.iter().enumerate() {
            let Some(view_index) = accessor.buffer_view else {
                continue;
            };
            let view = &self.views[view_index.value()];

            let component_size = match accessor.component_type {
                Valid(json::accessor::GenericComponentType(c)) => c.size() as u64,
                _ => continue,
            };
            let element_size = match accessor.type_ {
                Valid(t) => t.multiplicity() as u64 * component_size,
                _ => continue,
            };
            let expected = accessor.count.0 * element_size;
            let actual = view.byte_length.0;
            if expected != actual {
                return Err(ContainerError::AccessorSizeMismatch {
                    accessor: i,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}

impl Default for BufferBuilder {
    fn default() -> Self {
        Self::new()
    }
}
