//! Consistency errors detected before serialization

use thiserror::Error;

/// Errors raised while assembling or validating a container.
///
/// All variants are fatal; no partial container is produced.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The asset has no vertices or no faces.
    #[error("container needs non-empty geometry")]
    EmptyGeometry,

    /// An attribute array disagrees with the vertex count.
    #[error("attribute '{attribute}' has {len} entries for {vertex_count} vertices")]
    AttributeLengthMismatch {
        attribute: &'static str,
        len: usize,
        vertex_count: usize,
    },

    /// A morph target's displacement count disagrees with the vertex count.
    #[error("morph target '{name}' has {len} displacements for {vertex_count} vertices")]
    MorphLengthMismatch {
        name: String,
        len: usize,
        vertex_count: usize,
    },

    /// The weights array does not cover every morph target.
    #[error("weight array has {len} entries for {target_count} morph targets")]
    WeightLengthMismatch { len: usize, target_count: usize },

    /// A triangle index references a vertex that does not exist.
    #[error("index {index} out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds { index: u32, vertex_count: usize },

    /// An accessor's element count disagrees with its view's byte length.
    #[error("accessor {accessor} covers {expected} bytes but its view holds {actual}")]
    AccessorSizeMismatch {
        accessor: usize,
        expected: u64,
        actual: u64,
    },

    /// JSON serialization failed.
    #[error("container JSON serialization failed")]
    Json(#[from] serde_json::Error),
}
