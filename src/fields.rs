//! Per-node scalar fields of the terrain and the quantities derived from them.
//!
//! Groundwater is tracked separately from surface water:
//! - total elevation = hard + soft + water
//! - rock elevation  = hard + soft
//! - water table     = hard + aquifer + water
//!
//! `aquifer` lives in the pore space of `soft` and never exceeds it.

use crate::graph::Graph;

/// All per-node arrays, each `len()` long and indexed by node id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldSet {
    /// Consolidated rock height.
    pub hard: Vec<f32>,
    /// Loose sediment above the rock.
    pub soft: Vec<f32>,
    /// Surface water column.
    pub water: Vec<f32>,
    /// Groundwater held inside `soft`.
    pub aquifer: Vec<f32>,
    /// Transient flow magnitude; decays every `pass_time`.
    pub river: Vec<f32>,
    /// Cover fraction in [0, 1].
    pub vegetation: Vec<f32>,
    pub snow: Vec<f32>,
    /// Highest elevation seen looking upwind.
    pub occlusion: Vec<f32>,
    /// Suspended-sediment marker left by surface flow.
    pub silt: Vec<f32>,
}

impl FieldSet {
    /// Zeroed fields for `count` nodes.
    pub fn new(count: usize) -> Self {
        Self {
            hard: vec![0.0; count],
            soft: vec![0.0; count],
            water: vec![0.0; count],
            aquifer: vec![0.0; count],
            river: vec![0.0; count],
            vegetation: vec![0.0; count],
            snow: vec![0.0; count],
            occlusion: vec![0.0; count],
            silt: vec![0.0; count],
        }
    }

    /// Zeroed fields with `hard` seeded from an initial heightmap.
    pub fn with_hard(hard: Vec<f32>) -> Self {
        let mut fields = Self::new(hard.len());
        fields.hard = hard.into_iter().map(|h| h.max(0.0)).collect();
        fields
    }

    pub fn len(&self) -> usize {
        self.hard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hard.is_empty()
    }

    pub fn total_elevation(&self, i: usize) -> f32 {
        self.hard[i] + self.soft[i] + self.water[i]
    }

    pub fn rock_elevation(&self, i: usize) -> f32 {
        self.hard[i] + self.soft[i]
    }

    pub fn surface_water(&self, i: usize) -> f32 {
        self.water[i]
    }

    pub fn water_table(&self, i: usize) -> f32 {
        self.hard[i] + self.aquifer[i] + self.water[i]
    }

    /// Fraction of the sediment's pore space that is filled, in [0, 1].
    pub fn saturation(&self, i: usize) -> f32 {
        if self.soft[i] > 0.0 {
            (self.aquifer[i] / self.soft[i]).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// How exposed a node is to wind, in [0, 1]: 1 when nothing upwind rises
    /// above it, falling toward 0 as the upwind horizon climbs.
    pub fn exposure(&self, i: usize, sensitivity: f32) -> f32 {
        let shelter = (self.occlusion[i] - self.total_elevation(i)).max(0.0);
        (1.0 - shelter * sensitivity).clamp(0.0, 1.0)
    }

    /// Neighbor with the lowest total elevation. `None` only for isolated
    /// nodes; the result may be higher than `i` itself when `i` is a sink.
    pub fn downhill(&self, graph: &Graph, i: usize) -> Option<usize> {
        lowest_by(graph.neighbors(i), |n| self.total_elevation(n))
    }

    /// Neighbor with the lowest water table.
    pub fn water_table_downhill(&self, graph: &Graph, i: usize) -> Option<usize> {
        lowest_by(graph.neighbors(i), |n| self.water_table(n))
    }

    /// Neighbor with the highest total elevation.
    pub fn uphill(&self, graph: &Graph, i: usize) -> Option<usize> {
        lowest_by(graph.neighbors(i), |n| -self.total_elevation(n))
    }

    /// Move excess groundwater back to the surface wherever sediment no
    /// longer has room for it.
    pub fn settle_aquifer(&mut self, i: usize) {
        let excess = self.aquifer[i] - self.soft[i].max(0.0);
        if excess > 0.0 {
            self.aquifer[i] -= excess;
            self.water[i] += excess;
        }
    }

    /// Sum of `hard + soft` over all nodes.
    pub fn total_rock(&self) -> f64 {
        self.hard
            .iter()
            .zip(&self.soft)
            .map(|(h, s)| (*h + *s) as f64)
            .sum()
    }

    /// Sum of water in all its forms (surface, ground, snow).
    pub fn total_water(&self) -> f64 {
        self.water
            .iter()
            .zip(&self.aquifer)
            .zip(&self.snow)
            .map(|((w, a), s)| (*w + *a + *s) as f64)
            .sum()
    }

    /// Every array has the same length.
    pub fn is_consistent(&self) -> bool {
        let n = self.len();
        [
            &self.soft,
            &self.water,
            &self.aquifer,
            &self.river,
            &self.vegetation,
            &self.snow,
            &self.occlusion,
            &self.silt,
        ]
        .iter()
        .all(|field| field.len() == n)
    }
}

/// First neighbor minimizing `key`; NaN keys never win.
fn lowest_by(neighbors: &[usize], key: impl Fn(usize) -> f32) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for &n in neighbors {
        let k = key(n);
        if k.is_nan() {
            continue;
        }
        match best {
            Some((_, bk)) if bk <= k => {}
            _ => best = Some((n, k)),
        }
    }
    best.map(|(n, _)| n).or_else(|| neighbors.first().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec2;

    fn line_graph(n: usize) -> Graph {
        let points: Vec<Vec2> = (0..n).map(|i| Vec2::new(i as f32, (i % 2) as f32 * 0.1)).collect();
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
        Graph::from_adjacency(&points, adjacency).expect("line graph")
    }

    #[test]
    fn test_derived_quantities() {
        let mut fields = FieldSet::new(1);
        fields.hard[0] = 2.0;
        fields.soft[0] = 1.0;
        fields.water[0] = 0.5;
        fields.aquifer[0] = 0.25;

        assert_eq!(fields.total_elevation(0), 3.5);
        assert_eq!(fields.rock_elevation(0), 3.0);
        assert_eq!(fields.surface_water(0), 0.5);
        assert_eq!(fields.water_table(0), 2.75);
        assert_eq!(fields.saturation(0), 0.25);
    }

    #[test]
    fn test_downhill_is_a_neighbor() {
        let graph = line_graph(5);
        let mut fields = FieldSet::with_hard(vec![3.0, 2.0, 5.0, 1.0, 4.0]);
        fields.water[1] = 0.5;

        assert_eq!(fields.downhill(&graph, 0), Some(1));
        assert_eq!(fields.downhill(&graph, 2), Some(3));
        assert_eq!(fields.uphill(&graph, 3), Some(2));
        for i in 0..graph.len() {
            let d = fields.downhill(&graph, i).expect("has neighbors");
            assert_ne!(d, i);
            assert!(graph.neighbors(i).contains(&d));
        }
    }

    #[test]
    fn test_water_table_downhill_uses_groundwater() {
        let graph = line_graph(3);
        let mut fields = FieldSet::with_hard(vec![1.0, 1.0, 1.0]);
        fields.soft = vec![2.0, 2.0, 2.0];
        fields.aquifer = vec![0.0, 1.5, 0.5];

        assert_eq!(fields.water_table_downhill(&graph, 1), Some(0));
    }

    #[test]
    fn test_isolated_node_has_no_downhill() {
        let points = vec![Vec2::new(0.0, 0.0)];
        let graph = Graph::from_adjacency(&points, vec![vec![]]).expect("single node");
        let fields = FieldSet::new(1);
        assert_eq!(fields.downhill(&graph, 0), None);
        assert_eq!(fields.water_table_downhill(&graph, 0), None);
    }

    #[test]
    fn test_settle_aquifer_resurfaces_excess() {
        let mut fields = FieldSet::new(1);
        fields.soft[0] = 0.3;
        fields.aquifer[0] = 0.5;
        fields.settle_aquifer(0);
        assert!((fields.aquifer[0] - 0.3).abs() < 1e-6);
        assert!((fields.water[0] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_exposure_clamped() {
        let mut fields = FieldSet::with_hard(vec![1.0]);
        fields.occlusion[0] = 0.5;
        assert_eq!(fields.exposure(0, 2.0), 1.0);
        fields.occlusion[0] = 10.0;
        assert_eq!(fields.exposure(0, 2.0), 0.0);
        fields.occlusion[0] = 1.25;
        assert!((fields.exposure(0, 2.0) - 0.5).abs() < 1e-6);
    }
}
