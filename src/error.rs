//! Error types for mesh construction and terrain import.
//!
//! Simulation passes never fail; they clamp instead. The only caller-visible
//! failures are bad geometry when building a mesh and malformed saved state.

use thiserror::Error;

/// Geometry problems detected before a graph is built.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("triangulation needs at least 3 points, got {count}")]
    TooFewPoints { count: usize },

    #[error("all points are collinear; no triangles can be formed")]
    Collinear,

    #[error("node {node} lists neighbor {neighbor} but the mesh only has {count} nodes")]
    NeighborOutOfRange {
        node: usize,
        neighbor: usize,
        count: usize,
    },

    #[error("adjacency is not symmetric: {a} lists {b} but {b} does not list {a}")]
    AsymmetricAdjacency { a: usize, b: usize },

    #[error("node {node} lists itself as a neighbor")]
    SelfLoop { node: usize },

    #[error("graph has {graph} nodes but {points} points were supplied")]
    NodeCountMismatch { graph: usize, points: usize },

    #[error("mesh has {nodes} nodes but the field set holds {fields}")]
    FieldCountMismatch { nodes: usize, fields: usize },
}

/// Failures while restoring a saved terrain.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("failed to read terrain file: {0}")]
    Io(#[from] std::io::Error),

    #[error("terrain file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unrecognized format tag {0:?}")]
    UnknownFormat(String),

    #[error("terrain version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("required field `{0}` is missing")]
    MissingField(&'static str),

    #[error("field `{field}` has {found} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("stored mesh is invalid: {0}")]
    Mesh(#[from] MeshError),
}
