//! Erosion simulation over a node mesh
//!
//! The `Eroder` advances a `FieldSet` through independent passes:
//! - **Water**: sea level, tides, rain, groundwater and surface flow (`water`)
//! - **Slopes**: landslides, weathering and river incision (`slope`)
//! - **Ambient**: vegetation, snow, river decay and wind scour (`climate`)
//! - **Wind**: upwind occlusion and flow-direction helpers (`wind`)
//!
//! The caller owns the mesh and the fields and decides which passes run in
//! which order; nothing is scheduled implicitly. Every pass is a sequential
//! scan over nodes, so a node may see neighbor values already updated in the
//! same pass. Transfers are clamped so no field goes negative and water never
//! climbs; none of the passes can fail.

pub mod climate;
pub mod params;
pub mod slope;
pub mod water;
pub mod wind;

pub use params::{ErosionParams, ErosionPreset};

use crate::error::MeshError;
use crate::fields::FieldSet;
use crate::geometry::Vec2;
use crate::mesh::Mesh;

/// Running totals across all passes
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ErosionStats {
    /// Rock converted from hard to soft (weathering, rivers, turbulence, wind)
    pub total_eroded: f64,
    /// Sediment carried by flowing water
    pub total_transported: f64,
    /// Material moved by landslides (soft and hard)
    pub total_landslid: f64,
    /// Rock scraped off by sliding snow
    pub total_scraped: f64,
    /// Sinks that received rain
    pub rain_events: u64,
    /// Number of pass invocations
    pub passes: u64,
    /// Largest single weathering step
    pub max_erosion: f32,
}

/// Simulation state that persists between passes but is not a per-node field.
#[derive(Clone, Debug)]
pub struct Eroder {
    node_count: usize,
    /// Smoothed wind direction (unit vector)
    wind: Vec2,
    /// Sea level set by the last tidal `fix_water`; `None` means untidal
    tide_sea_level: Option<f32>,
    tide_phase: f32,
    occlusion_cursor: usize,
    river_cursor: usize,
    uphills: Vec<Option<usize>>,
    stats: ErosionStats,
}

impl Eroder {
    /// Create an eroder for `mesh`. The field set must have one entry per
    /// node; all passes must be called with this same mesh and field set.
    pub fn new(mesh: &Mesh, fields: &FieldSet) -> Result<Self, MeshError> {
        if mesh.len() != fields.len() || !fields.is_consistent() {
            return Err(MeshError::FieldCountMismatch {
                nodes: mesh.len(),
                fields: fields.len(),
            });
        }

        Ok(Self {
            node_count: mesh.len(),
            wind: Vec2::new(1.0, 0.0),
            tide_sea_level: None,
            tide_phase: 0.0,
            occlusion_cursor: 0,
            river_cursor: 0,
            uphills: vec![None; mesh.len()],
            stats: ErosionStats::default(),
        })
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn stats(&self) -> &ErosionStats {
        &self.stats
    }

    /// Current smoothed wind direction.
    pub fn wind(&self) -> Vec2 {
        self.wind
    }

    /// Sea level in effect: the tidal level if `fix_water` ran last,
    /// otherwise the configured one.
    pub fn sea_level(&self, params: &ErosionParams) -> f32 {
        self.tide_sea_level.unwrap_or(params.sea_level)
    }

    /// Neighbor with the highest total elevation per node, as of the last
    /// `derive_uphills`.
    pub fn uphills(&self) -> &[Option<usize>] {
        &self.uphills
    }

    /// Weather up to `amount` of hard rock into sediment at one node.
    /// Returns how much was converted (never more than the rock present).
    pub fn simple_erode(&mut self, fields: &mut FieldSet, node: usize, amount: f32) -> f32 {
        let converted = if amount.is_finite() { amount.clamp(0.0, fields.hard[node].max(0.0)) } else { 0.0 };
        if converted > 0.0 {
            fields.hard[node] -= converted;
            fields.soft[node] += converted;
            self.stats.total_eroded += converted as f64;
            self.stats.max_erosion = self.stats.max_erosion.max(converted);
        }
        converted
    }

    fn begin_pass(&mut self) {
        self.stats.passes += 1;
    }

    /// Next `batch` node ids from a rotating cursor.
    fn take_batch(cursor: &mut usize, batch: usize, count: usize) -> Vec<usize> {
        if count == 0 {
            return Vec::new();
        }
        let batch = batch.clamp(1, count);
        let start = *cursor % count;
        *cursor = (start + batch) % count;
        (0..batch).map(|k| (start + k) % count).collect()
    }
}
