//! Terrain save and load.
//!
//! A terrain is stored as a single JSON document: a format tag and version,
//! the flattened node positions, and one array per field. Adjacency is
//! normally recomputed from the positions on load; it is only stored when
//! asked for, which skips triangulation on import.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ImportError;
use crate::fields::FieldSet;
use crate::geometry::Vec2;
use crate::mesh::Mesh;

/// Tag written to every terrain file.
pub const FORMAT_TAG: &str = "landform-terrain";

/// Newest layout this build reads and the one it writes.
pub const TERRAIN_VERSION: u32 = 1;

/// Serialized form of a mesh and its fields.
///
/// Required arrays are `Option` so a missing one is reported by name
/// instead of as a generic parse failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainRecord {
    pub format: String,
    pub version: u32,
    /// `[x0, y0, x1, y1, ...]`
    pub points: Vec<f32>,
    #[serde(default)]
    pub hard: Option<Vec<f32>>,
    #[serde(default)]
    pub soft: Option<Vec<f32>>,
    #[serde(default)]
    pub water: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aquifer: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vegetation: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snow: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub river: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silt: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjacency: Option<Vec<Vec<usize>>>,
}

impl TerrainRecord {
    /// Snapshot a terrain. Occlusion is not stored; it is rebuilt by
    /// `derive_occlusion` after loading.
    pub fn from_terrain(mesh: &Mesh, fields: &FieldSet, include_adjacency: bool) -> Self {
        Self {
            format: FORMAT_TAG.to_string(),
            version: TERRAIN_VERSION,
            points: mesh.flat_coords(),
            hard: Some(fields.hard.clone()),
            soft: Some(fields.soft.clone()),
            water: Some(fields.water.clone()),
            aquifer: Some(fields.aquifer.clone()),
            vegetation: Some(fields.vegetation.clone()),
            snow: Some(fields.snow.clone()),
            river: Some(fields.river.clone()),
            silt: Some(fields.silt.clone()),
            adjacency: include_adjacency.then(|| mesh.graph().adjacency().to_vec()),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, ImportError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Write the record as JSON to `path`.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let file = fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self).map_err(|e| {
            io::Error::new(io::ErrorKind::Other, format!("Serialization failed: {}", e))
        })?;
        writer.flush()?;

        info!(path = %path.display(), nodes = self.points.len() / 2, "saved terrain");
        Ok(())
    }

    /// Read a record from `path` without validating its contents.
    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Validate the record and rebuild the mesh and fields from it.
    ///
    /// Nothing is returned unless every check passes, so a failed import
    /// leaves whatever terrain the caller already holds untouched.
    pub fn into_terrain(self) -> Result<(Mesh, FieldSet), ImportError> {
        if self.format != FORMAT_TAG {
            return Err(ImportError::UnknownFormat(self.format));
        }
        if self.version > TERRAIN_VERSION {
            return Err(ImportError::UnsupportedVersion {
                found: self.version,
                supported: TERRAIN_VERSION,
            });
        }
        if self.points.len() % 2 != 0 {
            return Err(ImportError::LengthMismatch {
                field: "points",
                expected: self.points.len() - 1,
                found: self.points.len(),
            });
        }

        let count = self.points.len() / 2;
        let points: Vec<Vec2> = self
            .points
            .chunks_exact(2)
            .map(|xy| Vec2::new(xy[0], xy[1]))
            .collect();

        let mut fields = FieldSet::new(count);
        fields.hard = required(self.hard, "hard", count)?;
        fields.soft = required(self.soft, "soft", count)?;
        fields.water = required(self.water, "water", count)?;
        fields.aquifer = optional(self.aquifer, "aquifer", count)?;
        fields.vegetation = optional(self.vegetation, "vegetation", count)?;
        fields.snow = optional(self.snow, "snow", count)?;
        fields.river = optional(self.river, "river", count)?;
        fields.silt = optional(self.silt, "silt", count)?;
        let repaired = sanitize(&mut fields);
        if repaired > 0 {
            warn!(repaired, "clamped out-of-range field values on import");
        }
        for i in 0..count {
            fields.settle_aquifer(i);
        }

        let mesh = match self.adjacency {
            Some(adjacency) => Mesh::from_adjacency(points, adjacency)?,
            None => Mesh::from_points(points)?,
        };

        info!(nodes = mesh.len(), version = self.version, "imported terrain");
        Ok((mesh, fields))
    }
}

/// Save a terrain to `path`.
pub fn save_terrain(path: &Path, mesh: &Mesh, fields: &FieldSet, include_adjacency: bool) -> io::Result<()> {
    TerrainRecord::from_terrain(mesh, fields, include_adjacency).save(path)
}

/// Load and validate a terrain from `path`.
pub fn load_terrain(path: &Path) -> Result<(Mesh, FieldSet), ImportError> {
    TerrainRecord::load(path)?.into_terrain()
}

/// Force stored values back into their valid ranges: every field finite and
/// non-negative, vegetation at most 1. Returns how many values changed.
fn sanitize(fields: &mut FieldSet) -> usize {
    let mut repaired = 0;
    let mut clamp = |values: &mut Vec<f32>, max: f32| {
        for v in values.iter_mut() {
            let fixed = if v.is_finite() { v.clamp(0.0, max) } else { 0.0 };
            if fixed != *v {
                *v = fixed;
                repaired += 1;
            }
        }
    };
    clamp(&mut fields.hard, f32::MAX);
    clamp(&mut fields.soft, f32::MAX);
    clamp(&mut fields.water, f32::MAX);
    clamp(&mut fields.aquifer, f32::MAX);
    clamp(&mut fields.vegetation, 1.0);
    clamp(&mut fields.snow, f32::MAX);
    clamp(&mut fields.river, f32::MAX);
    clamp(&mut fields.silt, f32::MAX);
    repaired
}

fn required(values: Option<Vec<f32>>, field: &'static str, count: usize) -> Result<Vec<f32>, ImportError> {
    let values = values.ok_or(ImportError::MissingField(field))?;
    check_len(values, field, count)
}

fn optional(values: Option<Vec<f32>>, field: &'static str, count: usize) -> Result<Vec<f32>, ImportError> {
    match values {
        Some(values) => check_len(values, field, count),
        None => Ok(vec![0.0; count]),
    }
}

fn check_len(values: Vec<f32>, field: &'static str, count: usize) -> Result<Vec<f32>, ImportError> {
    if values.len() != count {
        return Err(ImportError::LengthMismatch {
            field,
            expected: count,
            found: values.len(),
        });
    }
    Ok(values)
}
