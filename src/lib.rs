//! Terrain erosion library
//!
//! Samples a blue-noise point mesh, triangulates it, and erodes per-node
//! terrain fields with water, slope, climate and wind passes.
//!
//! Re-exports modules for use by binaries and tools.

pub mod error;
pub mod erosion;
pub mod export;
pub mod fields;
pub mod geometry;
pub mod graph;
pub mod heightmap;
pub mod mesh;
pub mod render;
pub mod sampler;
pub mod spatial;

pub use error::{ImportError, MeshError};
pub use erosion::{Eroder, ErosionParams, ErosionPreset, ErosionStats};
pub use export::TerrainRecord;
pub use fields::FieldSet;
pub use geometry::Vec2;
pub use graph::Graph;
pub use mesh::Mesh;
pub use sampler::{BlueNoiseSampler, SamplerState};
pub use spatial::SpatialIndex;
