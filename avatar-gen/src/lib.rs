//! Parametric human body mesh generation with clinical morph targets
//!
//! This library builds a watertight body surface from stacked anatomical
//! cross-section profiles and synthesizes per-vertex displacement fields
//! ("morph targets") keyed to clinical semantics:
//! - profile: cross-section definitions and ring sampling
//! - assemble: ring stitching, extremity caps, part concatenation
//! - repair: vertex welding, face pruning, normal recomputation
//! - modifiers: Laplacian smoothing and midpoint subdivision
//! - morph: primary and composite displacement field synthesis
//! - body: built-in anatomical tables and the pipeline entry point
//!
//! # Example
//!
//! ```no_run
//! use avatar_gen::{build_avatar, BodyType, PipelineConfig};
//!
//! let avatar = build_avatar(&PipelineConfig {
//!     height: 1.75,
//!     body: BodyType::Male,
//!     ..Default::default()
//! })?;
//!
//! println!("{} vertices, {} morph targets",
//!     avatar.mesh.vertex_count(), avatar.morphs.len());
//! # Ok::<(), avatar_gen::BuildError>(())
//! ```

pub mod assemble;
pub mod body;
pub mod mesh;
pub mod modifiers;
pub mod morph;
pub mod profile;
pub mod repair;

mod error;

pub use assemble::{concatenate, stitch_column, CapEnds};
pub use body::{build_avatar, Avatar, BodyType, PipelineConfig};
pub use error::BuildError;
pub use mesh::Mesh;
pub use modifiers::{LaplacianSmooth, MeshApply, MeshModifier, Subdivide};
pub use morph::{MorphSet, MorphTarget};
pub use profile::{sample_ring, sample_ring_at, AnatomicalProfile, Asymmetry, ProfileColumn, Ring};
