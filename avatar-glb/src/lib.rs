//! GLB container writing for morphable avatar assets
//!
//! This library packs an avatar mesh plus its named morph targets into a
//! single glTF-binary file:
//! - BufferBuilder: pack binary sections with automatic alignment
//! - GltfBuilder: document construction (mesh, material, node, scene)
//! - MorphableAsset: one-call export of geometry + morph targets
//!
//! # Example
//!
//! ```no_run
//! use avatar_glb::MorphableAsset;
//!
//! let asset = MorphableAsset {
//!     name: "Avatar",
//!     positions: &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]],
//!     normals: &[[0.0, 0.0, 1.0]; 3],
//!     indices: &[0, 1, 2],
//!     morph_targets: &[("Weight", &[[0.01, 0.0, 0.0]; 3])],
//!     weights: &[0.0],
//!     generator: "avatar-glb",
//! };
//! let glb_bytes = asset.encode_glb()?;
//! # Ok::<(), avatar_glb::ContainerError>(())
//! ```

pub mod buffer;
pub mod document;
pub mod export;
pub mod utils;

mod error;

pub use buffer::{AccessorIndex, BufferBuilder};
pub use document::{GeometryAccessors, GltfBuilder, FLAT_BASE_COLOR, FLAT_METALLIC, FLAT_ROUGHNESS};
pub use error::ContainerError;
pub use export::MorphableAsset;
pub use utils::{align_buffer, assemble_glb, compute_bounds};

// Re-export commonly used gltf-json types
pub use gltf_json as json;
pub use gltf_json::validation::Checked::Valid;
