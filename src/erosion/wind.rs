//! Wind direction, upwind occlusion and flow-direction helpers.
//!
//! `occlusion[i]` approximates the horizon a sightline has to clear when
//! travelling against the wind to reach node `i`. Each visit takes the
//! highest of the node's own elevation, its previous horizon, and the
//! elevations and horizons of its upwind neighbors. Repeated visits let tall
//! ridges cast long shadows downwind. With `occlusion_decay` and
//! `occlusion_falloff` left at zero the horizon only ever rises; raising them
//! lets old shadows fade and long ones thin out with distance. Only a
//! rotating batch of nodes is refreshed per call.

use rayon::prelude::*;

use super::{Eroder, ErosionParams};
use crate::fields::FieldSet;
use crate::geometry::Vec2;
use crate::mesh::Mesh;

impl Eroder {
    /// Turn the wind toward `target` (a zero target leaves it unchanged) and
    /// refresh the occlusion horizon for the next `occlusion_batch` nodes.
    pub fn derive_occlusion(
        &mut self,
        mesh: &Mesh,
        fields: &mut FieldSet,
        params: &ErosionParams,
        target: Vec2,
    ) {
        self.begin_pass();
        self.steer_wind(target, params.wind_turn_rate);

        let upwind = -self.wind;
        let batch = Self::take_batch(&mut self.occlusion_cursor, params.occlusion_batch, fields.len());
        for i in batch {
            let own = fields.total_elevation(i);
            let mut horizon = (fields.occlusion[i] - params.occlusion_decay.max(0.0)).max(own);

            for n in mesh.by_direction(i, upwind, params.occlusion_fan) {
                let dist = mesh.edge_length(i, n);
                let seen = fields.occlusion[n].max(fields.total_elevation(n))
                    - params.occlusion_falloff.max(0.0) * dist;
                horizon = horizon.max(seen);
            }

            if horizon.is_finite() {
                fields.occlusion[i] = horizon;
            }
        }
    }

    /// Record, per node, the neighbor with the highest total elevation.
    pub fn derive_uphills(&mut self, mesh: &Mesh, fields: &FieldSet) {
        self.begin_pass();
        let graph = mesh.graph();
        self.uphills = (0..fields.len())
            .into_par_iter()
            .map(|i| fields.uphill(graph, i))
            .collect();
    }

    /// Ease the wind direction toward `target` without snapping.
    fn steer_wind(&mut self, target: Vec2, rate: f32) {
        let target = target.normalize();
        if target == Vec2::ZERO {
            return;
        }
        let turned = self.wind.lerp(&target, rate.clamp(0.0, 1.0)).normalize();
        // Exactly opposite directions cancel out; nudge sideways.
        self.wind = if turned == Vec2::ZERO {
            Vec2::new(-self.wind.y, self.wind.x)
        } else {
            turned
        };
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    /// Nodes on a west-east line, one unit apart.
    fn transect(hard: Vec<f32>) -> (Mesh, FieldSet) {
        let n = hard.len();
        let points = (0..n).map(|i| Vec2::new(i as f32, 0.0)).collect();
        let adjacency = (0..n)
            .map(|i| {
                let mut list = Vec::new();
                if i > 0 {
                    list.push(i - 1);
                }
                if i + 1 < n {
                    list.push(i + 1);
                }
                list
            })
            .collect();
        let mesh = Mesh::from_adjacency(points, adjacency).expect("transect");
        (mesh, FieldSet::with_hard(hard))
    }

    #[test]
    fn test_ridge_shadows_downwind_nodes() {
        let (mesh, mut fields) = transect(vec![0.5, 2.0, 0.5, 0.5, 0.5]);
        let mut eroder = Eroder::new(&mesh, &fields).expect("eroder");
        let params = ErosionParams {
            wind_turn_rate: 1.0,
            occlusion_falloff: 0.05,
            occlusion_decay: 0.01,
            ..Default::default()
        };
        let east = Vec2::new(1.0, 0.0);

        for _ in 0..5 {
            eroder.derive_occlusion(&mesh, &mut fields, &params, east);
        }

        let s = params.occlusion_sensitivity;
        assert!(fields.occlusion[2] > 1.5, "occlusion {:?}", fields.occlusion);
        assert!(fields.exposure(2, s) < fields.exposure(0, s));
        assert_eq!(fields.exposure(1, s), 1.0);
        assert!(fields.occlusion[3] < fields.occlusion[2]);
        for i in 0..fields.len() {
            assert!(fields.occlusion[i] >= fields.total_elevation(i));
        }
    }

    #[test]
    fn test_default_horizon_is_running_maximum() {
        let (mesh, mut fields) = transect(vec![0.5, 2.0, 0.5, 0.3]);
        fields.occlusion = vec![0.0, 0.0, 0.0, 5.0];
        let before = fields.occlusion.clone();
        let mut eroder = Eroder::new(&mesh, &fields).expect("eroder");
        let params = ErosionParams {
            wind_turn_rate: 1.0,
            ..Default::default()
        };

        eroder.derive_occlusion(&mesh, &mut fields, &params, Vec2::new(1.0, 0.0));
        assert_eq!(fields.occlusion, vec![0.5, 2.0, 2.0, 5.0]);

        let upwind = -eroder.wind();
        for i in 0..fields.len() {
            let mut floor = before[i].max(fields.total_elevation(i));
            for n in mesh.by_direction(i, upwind, params.occlusion_fan) {
                floor = floor.max(fields.total_elevation(n));
            }
            assert!(fields.occlusion[i] >= floor, "node {}: {} < {}", i, fields.occlusion[i], floor);
        }

        let mut flat = FieldSet::with_hard(vec![1.0; 3]);
        flat.occlusion = vec![5.0; 3];
        let (line, _) = transect(vec![1.0; 3]);
        let mut eroder = Eroder::new(&line, &flat).expect("eroder");
        eroder.derive_occlusion(&line, &mut flat, &params, Vec2::new(1.0, 0.0));
        assert_eq!(flat.occlusion, vec![5.0; 3]);
    }

    #[test]
    fn test_wind_turns_gradually() {
        let (mesh, mut fields) = transect(vec![1.0, 1.0, 1.0]);
        let mut eroder = Eroder::new(&mesh, &fields).expect("eroder");
        let params = ErosionParams {
            wind_turn_rate: 0.1,
            ..Default::default()
        };
        let north = Vec2::new(0.0, 1.0);

        eroder.derive_occlusion(&mesh, &mut fields, &params, north);
        let w = eroder.wind();
        assert!(w.y > 0.0 && w.x > w.y, "wind turned too far: {:?}", w);
        assert!((w.length() - 1.0).abs() < 1e-5);

        for _ in 0..200 {
            eroder.derive_occlusion(&mesh, &mut fields, &params, north);
        }
        assert!(eroder.wind().dot(&north) > 0.99);

        let before = eroder.wind();
        eroder.derive_occlusion(&mesh, &mut fields, &params, Vec2::ZERO);
        assert_eq!(eroder.wind(), before);
    }

    #[test]
    fn test_occlusion_batches_rotate() {
        let (mesh, mut fields) = transect(vec![1.0; 4]);
        let mut eroder = Eroder::new(&mesh, &fields).expect("eroder");
        let params = ErosionParams {
            occlusion_batch: 2,
            ..Default::default()
        };

        eroder.derive_occlusion(&mesh, &mut fields, &params, Vec2::new(1.0, 0.0));
        assert_eq!(fields.occlusion, vec![1.0, 1.0, 0.0, 0.0]);
        eroder.derive_occlusion(&mesh, &mut fields, &params, Vec2::new(1.0, 0.0));
        assert_eq!(fields.occlusion, vec![1.0; 4]);
    }

    #[test]
    fn test_derive_uphills() {
        let (mesh, fields) = transect(vec![0.1, 0.5, 0.3, 0.9]);
        let mut eroder = Eroder::new(&mesh, &fields).expect("eroder");

        eroder.derive_uphills(&mesh, &fields);
        assert_eq!(eroder.uphills(), &[Some(1), Some(2), Some(3), Some(2)]);

        let lonely = lonely_mesh();
        let single = FieldSet::with_hard(vec![1.0]);
        let mut eroder = Eroder::new(&lonely, &single).expect("eroder");
        eroder.derive_uphills(&lonely, &single);
        assert_eq!(eroder.uphills(), &[None]);
    }
}
