//! Gravity-driven mass movement and river incision.

use tracing::debug;

use super::{Eroder, ErosionParams};
use crate::fields::FieldSet;
use crate::mesh::Mesh;

impl Eroder {
    /// Enforce the angle of repose toward each node's downhill neighbor.
    ///
    /// Sediment uses `silt_angle`, lowered by how saturated it is; rock uses
    /// `rock_angle`. Only the slope in excess of the stable one is moved, a
    /// fraction `landslide_rate` at a time, and sediment only moves if the
    /// node has some.
    pub fn landslide(&mut self, mesh: &Mesh, fields: &mut FieldSet, params: &ErosionParams) {
        self.begin_pass();
        let graph = mesh.graph();
        let rate = params.landslide_rate.clamp(0.0, 1.0);
        let mut moved_total = 0.0f64;

        for i in 0..fields.len() {
            let Some(j) = fields.downhill(graph, i) else {
                continue;
            };
            let dist = mesh.edge_length(i, j);
            if !(dist > 0.0) {
                continue;
            }

            if fields.soft[i] > 0.0 {
                let sag = 1.0 - params.saturation_sag.clamp(0.0, 1.0) * fields.saturation(i);
                let stable = params.silt_angle.max(0.0) * sag * dist;
                let excess = fields.rock_elevation(i) - fields.rock_elevation(j) - stable;
                if excess > 0.0 {
                    let moved = (excess * rate).min(excess * 0.5).min(fields.soft[i]);
                    fields.soft[i] -= moved;
                    fields.soft[j] += moved;
                    fields.settle_aquifer(i);
                    moved_total += moved as f64;
                }
            }

            let stable = params.rock_angle.max(0.0) * dist;
            let excess = fields.hard[i] - fields.hard[j] - stable;
            if excess > 0.0 {
                let moved = (excess * rate).min(excess * 0.5).min(fields.hard[i]);
                fields.hard[i] -= moved;
                fields.hard[j] += moved;
                moved_total += moved as f64;
            }
        }

        self.stats.total_landslid += moved_total;
        debug!(moved = moved_total, "landslide pass");
    }

    /// River incision over every node.
    pub fn global_rivers(&mut self, mesh: &Mesh, fields: &mut FieldSet, params: &ErosionParams) {
        self.begin_pass();
        for i in 0..fields.len() {
            self.incise(mesh, fields, params, i);
        }
    }

    /// River incision over the next `river_batch` nodes, continuing where the
    /// previous call stopped.
    pub fn iterate_rivers(&mut self, mesh: &Mesh, fields: &mut FieldSet, params: &ErosionParams) {
        self.begin_pass();
        let batch = Self::take_batch(&mut self.river_cursor, params.river_batch, fields.len());
        for i in batch {
            self.incise(mesh, fields, params, i);
        }
    }

    /// Weather rock at the head of a falling downhill edge in proportion to
    /// the flow through it, damped by sediment cover.
    fn incise(&mut self, mesh: &Mesh, fields: &mut FieldSet, params: &ErosionParams, i: usize) {
        let flow = fields.river[i];
        if !(flow > 0.0) {
            return;
        }
        let Some(j) = fields.downhill(mesh.graph(), i) else {
            return;
        };
        let drop = fields.total_elevation(i) - fields.total_elevation(j);
        if !(drop > 0.0) {
            return;
        }
        let cover = 1.0 + params.sediment_cover.max(0.0) * fields.soft[i];
        let pressure = params.river_erosion * flow * drop / cover;
        self.simple_erode(fields, i, pressure);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_landslide_does_not_invent_sediment() {
        let mesh = pair_mesh();
        let mut fields = FieldSet::with_hard(vec![1.0, 0.0]);
        let mut eroder = Eroder::new(&mesh, &fields).expect("eroder");
        let params = ErosionParams {
            silt_angle: 0.5,
            rock_angle: 0.5,
            ..Default::default()
        };

        eroder.landslide(&mesh, &mut fields, &params);
        assert_eq!(fields.soft, vec![0.0, 0.0]);
        assert!((fields.hard[0] + fields.hard[1] - 1.0).abs() < 1e-6);
        assert!(fields.hard[0] >= fields.hard[1]);
        assert_non_negative(&fields);
    }

    #[test]
    fn test_landslide_moves_steep_sediment() {
        let mesh = pair_mesh();
        let mut fields = FieldSet::with_hard(vec![0.0, 0.0]);
        fields.soft = vec![2.0, 0.0];
        let mut eroder = Eroder::new(&mesh, &fields).expect("eroder");
        let params = ErosionParams {
            silt_angle: 0.5,
            landslide_rate: 0.1,
            ..Default::default()
        };

        eroder.landslide(&mesh, &mut fields, &params);
        // Excess is 2.0 - 0.5, a tenth of it moves.
        assert!((fields.soft[1] - 0.15).abs() < 1e-5, "soft {:?}", fields.soft);
        assert!((fields.soft[0] + fields.soft[1] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_wet_sediment_slides_more() {
        let mesh = pair_mesh();
        let params = ErosionParams {
            silt_angle: 0.5,
            saturation_sag: 0.5,
            ..Default::default()
        };

        let mut dry = FieldSet::with_hard(vec![0.0, 0.0]);
        dry.soft = vec![1.0, 0.0];
        let mut wet = dry.clone();
        wet.aquifer[0] = 1.0;

        let mut eroder = Eroder::new(&mesh, &dry).expect("eroder");
        eroder.landslide(&mesh, &mut dry, &params);
        eroder.landslide(&mesh, &mut wet, &params);
        assert!(wet.soft[1] > dry.soft[1]);
        assert_non_negative(&wet);
    }

    #[test]
    fn test_gentle_slope_is_stable() {
        let mesh = pair_mesh();
        let mut fields = FieldSet::with_hard(vec![0.3, 0.0]);
        fields.soft = vec![0.1, 0.0];
        let before = fields.clone();
        let mut eroder = Eroder::new(&mesh, &fields).expect("eroder");

        eroder.landslide(&mesh, &mut fields, &ErosionParams::default());
        assert_eq!(fields, before);
    }

    #[test]
    fn test_rivers_erode_only_with_flow() {
        let mesh = pair_mesh();
        let mut fields = FieldSet::with_hard(vec![1.0, 0.5]);
        let mut eroder = Eroder::new(&mesh, &fields).expect("eroder");
        let params = ErosionParams::default();

        eroder.global_rivers(&mesh, &mut fields, &params);
        assert_eq!(fields.hard, vec![1.0, 0.5]);

        fields.river[0] = 1.0;
        eroder.global_rivers(&mesh, &mut fields, &params);
        assert!(fields.hard[0] < 1.0);
        assert!((fields.rock_elevation(0) - 1.0).abs() < 1e-6);
        assert_eq!(fields.hard[1], 0.5);
    }

    #[test]
    fn test_sediment_cover_shields_rock() {
        let mesh = pair_mesh();
        let params = ErosionParams::default();

        let mut bare = FieldSet::with_hard(vec![1.0, 0.0]);
        bare.river[0] = 1.0;
        let mut covered = bare.clone();
        covered.hard[0] = 0.8;
        covered.soft[0] = 0.2;

        let mut eroder = Eroder::new(&mesh, &bare).expect("eroder");
        eroder.global_rivers(&mesh, &mut bare, &params);
        eroder.global_rivers(&mesh, &mut covered, &params);
        assert!(1.0 - bare.hard[0] > 0.8 - covered.hard[0]);
    }

    #[test]
    fn test_iterate_rivers_covers_all_nodes_in_turn() {
        let mesh = ring_mesh(6);
        let mut fields = FieldSet::with_hard(vec![1.0, 0.5, 1.0, 0.5, 1.0, 0.5]);
        fields.river = vec![1.0; 6];
        let mut eroder = Eroder::new(&mesh, &fields).expect("eroder");
        let params = ErosionParams {
            river_batch: 2,
            ..Default::default()
        };

        eroder.iterate_rivers(&mesh, &mut fields, &params);
        assert!(fields.hard[0] < 1.0);
        assert_eq!(fields.hard[2], 1.0);
        eroder.iterate_rivers(&mesh, &mut fields, &params);
        assert!(fields.hard[2] < 1.0);
        assert_eq!(fields.hard[4], 1.0);
        eroder.iterate_rivers(&mesh, &mut fields, &params);
        assert!(fields.hard[4] < 1.0);
    }

    #[test]
    fn test_isolated_node_does_not_slide() {
        let mesh = lonely_mesh();
        let mut fields = FieldSet::with_hard(vec![5.0]);
        fields.soft[0] = 3.0;
        fields.river[0] = 10.0;
        let before = fields.clone();
        let mut eroder = Eroder::new(&mesh, &fields).expect("eroder");
        let params = ErosionParams::default();

        eroder.landslide(&mesh, &mut fields, &params);
        eroder.global_rivers(&mesh, &mut fields, &params);
        assert_eq!(fields, before);
    }
}
