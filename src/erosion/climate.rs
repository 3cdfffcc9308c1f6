//! Ambient per-node evolution that does not depend on water flow:
//! vegetation, snow, wind scour, and decay of transient flow markers.

use super::{Eroder, ErosionParams};
use crate::fields::FieldSet;
use crate::mesh::Mesh;

/// Below this much sediment, rock counts as exposed to sliding snow.
const BARE_ROCK: f32 = 1e-3;

impl Eroder {
    /// One tick of ambient change at every node.
    pub fn pass_time(&mut self, mesh: &Mesh, fields: &mut FieldSet, params: &ErosionParams) {
        self.begin_pass();

        for i in 0..fields.len() {
            fields.river[i] *= params.river_decay.clamp(0.0, 1.0);
            fields.silt[i] *= params.silt_decay.clamp(0.0, 1.0);

            grow_vegetation(mesh, fields, params, i);

            let exposure = fields.exposure(i, params.occlusion_sensitivity);

            // Sheltered slopes above the snow line collect the most snow.
            if fields.rock_elevation(i) > params.snow_line {
                let fall = params.snowfall * params.rainfall * (0.25 + 0.75 * (1.0 - exposure));
                fields.snow[i] += fall.max(0.0);
            }

            // Wind scours exposed, unvegetated rock.
            let scour = params.wind_erosion * params.wind * exposure * (1.0 - fields.vegetation[i]);
            self.simple_erode(fields, i, scour);

            self.slide_snow(mesh, fields, params, i);

            if fields.rock_elevation(i) < params.snow_melt_elevation {
                let melt = fields.snow[i].min(params.snow_melt_rate.max(0.0));
                fields.snow[i] -= melt;
                fields.water[i] += melt;
            }
        }
    }

    /// Move snow toward the neighbor with the lowest snow surface. Snow
    /// sliding off bare rock onto lower rock scrapes some of it along.
    fn slide_snow(&mut self, mesh: &Mesh, fields: &mut FieldSet, params: &ErosionParams, i: usize) {
        if !(fields.snow[i] > 0.0) {
            return;
        }
        let surface = |f: &FieldSet, n: usize| f.total_elevation(n) + f.snow[n];
        let Some(j) = mesh
            .neighbors(i)
            .iter()
            .copied()
            .min_by(|&a, &b| {
                surface(fields, a)
                    .partial_cmp(&surface(fields, b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        else {
            return;
        };

        let drop = surface(fields, i) - surface(fields, j);
        if !(drop > 0.0) {
            return;
        }
        let slide = fields.snow[i].min(drop * 0.5) * params.snow_slide_rate.clamp(0.0, 1.0);
        if !(slide > 0.0) {
            return;
        }
        fields.snow[i] -= slide;
        fields.snow[j] += slide;

        let rock_drop = fields.rock_elevation(i) - fields.rock_elevation(j);
        if rock_drop > 0.0 && fields.soft[i] <= BARE_ROCK {
            let scraped = (slide * params.snow_scrape * rock_drop)
                .max(0.0)
                .min(fields.hard[i])
                .min(rock_drop * 0.5);
            fields.hard[i] -= scraped;
            fields.soft[j] += scraped;
            self.stats.total_scraped += scraped as f64;
        }
    }
}

fn grow_vegetation(mesh: &Mesh, fields: &mut FieldSet, params: &ErosionParams, i: usize) {
    let neighbors = mesh.neighbors(i);
    let v = fields.vegetation[i];
    let mean = if neighbors.is_empty() {
        v
    } else {
        neighbors.iter().map(|&n| fields.vegetation[n]).sum::<f32>() / neighbors.len() as f32
    };

    let moisture = fields.saturation(i);
    let mut next = v + params.vegetation_growth * moisture * (1.0 - v) - params.vegetation_decay * v
        + params.vegetation_spread * (mean - v);
    if fields.water[i] > params.vegetation_drown_depth {
        next *= 1.0 - params.vegetation_drown_rate.clamp(0.0, 1.0);
    }
    fields.vegetation[i] = if next.is_finite() { next.clamp(0.0, 1.0) } else { 0.0 };
}
