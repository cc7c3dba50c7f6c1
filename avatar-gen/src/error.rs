//! Construction and consistency errors

use thiserror::Error;

/// Errors raised while building the avatar mesh or its morph targets.
///
/// All variants are fatal for the current build; nothing is partially
/// emitted on failure.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A profile parameter failed validation at construction time.
    #[error("profile {field} must be {constraint}, got {value}")]
    InvalidProfile {
        field: &'static str,
        constraint: &'static str,
        value: f32,
    },

    /// A profile declared fewer than 3 ring points.
    #[error("profile point count must be at least 3, got {0}")]
    TooFewPoints(usize),

    /// Profile heights in a column must be strictly increasing.
    #[error("profile heights must be strictly increasing, got {prev} then {next}")]
    NonIncreasingHeight { prev: f32, next: f32 },

    /// A ring column cannot be stitched from fewer than 2 rings.
    #[error("ring column needs at least 2 rings, got {0}")]
    TooFewRings(usize),

    /// Stitching produced no faces.
    #[error("stitching produced an empty mesh")]
    EmptyMesh,

    /// A vertex accumulated a zero-length normal after repair.
    #[error("vertex {0} has a zero-length normal after repair")]
    DegenerateNormal(usize),

    /// A morph target's displacement count disagrees with the mesh.
    #[error("morph target '{name}' has {len} displacements for {vertex_count} vertices")]
    MorphLengthMismatch {
        name: String,
        len: usize,
        vertex_count: usize,
    },

    /// A weight vector referenced a morph target that does not exist.
    #[error("unknown morph target '{0}'")]
    UnknownMorphTarget(String),
}
