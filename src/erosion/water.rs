//! Sea level, rain and water movement.
//!
//! `spread_water` runs three sub-passes in order:
//! 1. Surface water soaks into sediment, and groundwater that no longer fits
//!    in the sediment resurfaces.
//! 2. Groundwater moves toward the neighbor with the lowest water table,
//!    dragging a little sediment with it.
//! 3. Surface water moves toward the lowest neighbor, building up `river`
//!    flow and carrying sediment downstream.
//!
//! Every transfer is limited by what the source holds and by half the height
//! difference, so the two nodes can at most level out.

use tracing::debug;

use super::{Eroder, ErosionParams};
use crate::fields::FieldSet;
use crate::mesh::Mesh;

impl Eroder {
    /// Flood every node below the configured sea level up to it and drain
    /// every node above it. Submerged sediment becomes saturated.
    pub fn reset_water(&mut self, fields: &mut FieldSet, params: &ErosionParams) {
        self.begin_pass();
        self.tide_sea_level = None;
        fill_to_sea(fields, params.sea_level, true);
    }

    /// Advance the tide and refill nodes lying below the moving sea level.
    /// Land above the sea keeps its water. Returns the new sea level.
    pub fn fix_water(&mut self, fields: &mut FieldSet, params: &ErosionParams) -> f32 {
        self.begin_pass();
        self.tide_phase = (self.tide_phase + params.tide_speed) % std::f32::consts::TAU;
        let sea = params.sea_level + params.tide_amplitude * self.tide_phase.sin();
        self.tide_sea_level = Some(sea);
        fill_to_sea(fields, sea, false);
        sea
    }

    /// Every land node sends rain down its steepest path to a local sink and
    /// wets the sink, unless the sink is already wet or is open sea.
    pub fn rain(&mut self, mesh: &Mesh, fields: &mut FieldSet, params: &ErosionParams) {
        self.begin_pass();
        let sea = self.sea_level(params);
        let graph = mesh.graph();
        let mut events = 0u64;

        for source in 0..fields.len() {
            if fields.rock_elevation(source) <= sea {
                continue;
            }

            let mut sink = source;
            for _ in 0..params.rain_max_hops {
                match fields.downhill(graph, sink) {
                    Some(next) if fields.total_elevation(next) < fields.total_elevation(sink) => {
                        sink = next;
                    }
                    _ => break,
                }
            }

            if fields.water[sink] >= params.rain_saturation || fields.rock_elevation(sink) <= sea {
                continue;
            }

            let exposure = fields.exposure(source, params.occlusion_sensitivity);
            let shadow = 1.0 - params.rain_shadow.clamp(0.0, 1.0) * (1.0 - exposure);
            let amount = (params.rain_amount * params.rainfall * shadow).max(0.0);
            if amount > 0.0 {
                fields.water[sink] += amount;
                events += 1;
            }
        }

        self.stats.rain_events += events;
        debug!(events, sea, "rain pass");
    }

    /// Groundwater exchange, then groundwater flow, then surface flow.
    pub fn spread_water(&mut self, mesh: &Mesh, fields: &mut FieldSet, params: &ErosionParams) {
        self.begin_pass();
        exchange_groundwater(fields, params);
        let carried = self.flow_groundwater(mesh, fields, params) + self.flow_surface(mesh, fields, params);
        debug!(carried, "spread water pass");
    }

    fn flow_groundwater(&mut self, mesh: &Mesh, fields: &mut FieldSet, params: &ErosionParams) -> f64 {
        let graph = mesh.graph();
        let mut carried = 0.0f64;

        for i in 0..fields.len() {
            if fields.aquifer[i] <= 0.0 {
                continue;
            }
            let Some(j) = fields.water_table_downhill(graph, i) else {
                continue;
            };
            let head = fields.water_table(i) - fields.water_table(j);
            if !(head > 0.0) {
                continue;
            }

            let friction = 1.0
                + params.sediment_friction.max(0.0) * fields.soft[i]
                + params.water_friction.max(0.0) * fields.water[i];
            let amount = (params.aquifer_flow_rate * head / friction)
                .min(fields.aquifer[i])
                .min(head * 0.5);
            if !(amount > 0.0) {
                continue;
            }

            fields.aquifer[i] -= amount;
            let room = (fields.soft[j] - fields.aquifer[j]).max(0.0);
            let absorbed = amount.min(room);
            fields.aquifer[j] += absorbed;
            fields.water[j] += amount - absorbed;

            let rock_drop = fields.rock_elevation(i) - fields.rock_elevation(j);
            if rock_drop > 0.0 {
                let moved = (amount * params.aquifer_sediment_rate * rock_drop)
                    .max(0.0)
                    .min(fields.soft[i])
                    .min(rock_drop * 0.5);
                carried += move_sediment(fields, i, j, moved) as f64;
            }
        }

        self.stats.total_transported += carried;
        carried
    }

    fn flow_surface(&mut self, mesh: &Mesh, fields: &mut FieldSet, params: &ErosionParams) -> f64 {
        let graph = mesh.graph();
        let mut carried = 0.0f64;

        for i in 0..fields.len() {
            let depth = fields.water[i];
            if depth <= 0.0 {
                continue;
            }
            let Some(j) = fields.downhill(graph, i) else {
                continue;
            };
            let drop = fields.total_elevation(i) - fields.total_elevation(j);
            if !(drop > 0.0) {
                continue;
            }

            let amount = (depth.min(drop * 0.5) * params.surface_flow_rate.clamp(0.0, 1.0)).max(0.0);
            if amount <= 0.0 {
                continue;
            }
            fields.water[i] -= amount;
            fields.water[j] += amount;
            fields.river[i] += amount;

            // Sediment may not lift the target above the source.
            let rock_drop = fields.rock_elevation(i) - fields.rock_elevation(j);
            let headroom = (drop - 2.0 * amount).max(0.0);
            if rock_drop > 0.0 {
                let limit = rock_drop.min(headroom) * 0.5;
                let demand = (amount * params.sediment_erosion * rock_drop).max(0.0);
                let from_soft = demand.min(fields.soft[i]).min(limit);
                carried += move_sediment(fields, i, j, from_soft) as f64;

                let unmet = (demand - from_soft).min(limit - from_soft);
                if unmet > 0.0 && fields.soft[i] <= f32::EPSILON {
                    self.simple_erode(fields, i, unmet * params.flow_hard_erosion);
                }
            }

            if depth < params.turbulence_depth {
                self.simple_erode(fields, i, amount * params.turbulence_erosion);
            }
        }

        self.stats.total_transported += carried;
        carried
    }
}

fn fill_to_sea(fields: &mut FieldSet, sea: f32, drain_land: bool) {
    for i in 0..fields.len() {
        let rock = fields.rock_elevation(i);
        if rock < sea {
            fields.water[i] = sea - rock;
            fields.aquifer[i] = fields.soft[i];
        } else if drain_land {
            fields.water[i] = 0.0;
        }
    }
}

fn exchange_groundwater(fields: &mut FieldSet, params: &ErosionParams) {
    for i in 0..fields.len() {
        fields.settle_aquifer(i);
        let room = (fields.soft[i] - fields.aquifer[i]).max(0.0);
        let soak = fields.water[i].min(room).min(params.infiltration_rate).max(0.0);
        fields.water[i] -= soak;
        fields.aquifer[i] += soak;
    }
}

/// Move sediment from `from` to `to`, keeping groundwater inside what
/// sediment remains at the source.
fn move_sediment(fields: &mut FieldSet, from: usize, to: usize, amount: f32) -> f32 {
    if !(amount > 0.0) {
        return 0.0;
    }
    let amount = amount.min(fields.soft[from]);
    fields.soft[from] -= amount;
    fields.soft[to] += amount;
    fields.silt[to] += amount;
    fields.settle_aquifer(from);
    amount
}
