//! The finalized terrain mesh: node positions, adjacency and a point index.
//!
//! Node identity is the index into `points`; it never changes for the life
//! of a mesh. The mesh is read-only once built.

use rand::Rng;
use tracing::info;

use crate::error::MeshError;
use crate::geometry::Vec2;
use crate::graph::Graph;
use crate::sampler::BlueNoiseSampler;
use crate::spatial::SpatialIndex;

/// Points + adjacency + spatial index over the same node ids.
#[derive(Clone, Debug)]
pub struct Mesh {
    points: Vec<Vec2>,
    graph: Graph,
    index: SpatialIndex,
    spacing: f32,
}

impl Mesh {
    /// Blue-noise sample a `width` x `height` world with separation `radius`
    /// and triangulate it.
    pub fn generate<R: Rng + ?Sized>(
        width: f32,
        height: f32,
        radius: f32,
        rng: &mut R,
    ) -> Result<Self, MeshError> {
        Self::generate_with(width, height, radius, |_| radius, rng)
    }

    /// Like `generate`, with a position-dependent separation radius.
    /// `cell_size` of the sampler's index is `cell_radius`.
    pub fn generate_with<F, R>(
        width: f32,
        height: f32,
        cell_radius: f32,
        radius: F,
        rng: &mut R,
    ) -> Result<Self, MeshError>
    where
        F: Fn(Vec2) -> f32,
        R: Rng + ?Sized,
    {
        let max = Vec2::new(width, height);
        let inside = move |p: Vec2| p.x >= 0.0 && p.y >= 0.0 && p.x < width && p.y < height;
        let mut sampler = BlueNoiseSampler::new(Vec2::ZERO, max, cell_radius, radius, inside);
        sampler.seed(max * 0.5);
        let count = sampler.run(rng);
        info!(points = count, width, height, "sampled blue-noise points");

        Self::from_points(sampler.into_points())
    }

    /// Triangulate a finalized point list.
    pub fn from_points(points: Vec<Vec2>) -> Result<Self, MeshError> {
        let graph = Graph::triangulate(&points)?;
        Ok(Self::assemble(points, graph))
    }

    /// Use a known adjacency instead of triangulating.
    pub fn from_adjacency(points: Vec<Vec2>, adjacency: Vec<Vec<usize>>) -> Result<Self, MeshError> {
        let graph = Graph::from_adjacency(&points, adjacency)?;
        Ok(Self::assemble(points, graph))
    }

    fn assemble(points: Vec<Vec2>, graph: Graph) -> Self {
        let spacing = mean_edge_length(&points, &graph);
        let index = SpatialIndex::build(&points, spacing.max(1e-3));
        Self {
            points,
            graph,
            index,
            spacing,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn point(&self, node: usize) -> Vec2 {
        self.points[node]
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn neighbors(&self, node: usize) -> &[usize] {
        self.graph.neighbors(node)
    }

    /// Mean edge length; a stand-in for "one step" across the mesh.
    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn edge_length(&self, a: usize, b: usize) -> f32 {
        self.points[a].distance(&self.points[b])
    }

    /// Flattened `[x0, y0, x1, y1, ...]` coordinates.
    pub fn flat_coords(&self) -> Vec<f32> {
        self.points.iter().flat_map(|p| [p.x, p.y]).collect()
    }

    /// (min, max) corners of the point bounding box.
    pub fn bounds(&self) -> (Vec2, Vec2) {
        let mut min = Vec2::new(f32::MAX, f32::MAX);
        let mut max = Vec2::new(f32::MIN, f32::MIN);
        for p in &self.points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        (min, max)
    }

    /// Node closest to a world position, for picking.
    pub fn nearest_node(&self, pos: Vec2, max_radius: f32) -> Option<usize> {
        self.index.nearest(pos, max_radius)
    }

    /// Nodes whose position lies within `radius` of `pos`.
    pub fn nodes_within(&self, pos: Vec2, radius: f32) -> Vec<usize> {
        self.index.query_circle(pos, radius)
    }

    /// Neighbors of `node` whose direction from it has a dot product with the
    /// unit vector `dir` greater than `threshold`. Zero-length edges are
    /// skipped. Results keep the angular order.
    pub fn by_direction(&self, node: usize, dir: Vec2, threshold: f32) -> Vec<usize> {
        let origin = self.points[node];
        self.graph
            .neighbors(node)
            .iter()
            .copied()
            .filter(|&n| {
                let offset = self.points[n] - origin;
                let len = offset.length();
                len > 0.0 && offset.dot(&dir) / len > threshold
            })
            .collect()
    }
}

fn mean_edge_length(points: &[Vec2], graph: &Graph) -> f32 {
    let mut total = 0.0f64;
    let mut count = 0usize;
    for (a, list) in graph.adjacency().iter().enumerate() {
        for &b in list {
            if a < b {
                total += points[a].distance(&points[b]) as f64;
                count += 1;
            }
        }
    }
    if count == 0 {
        1.0
    } else {
        (total / count as f64) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_generate_produces_connected_symmetric_mesh() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let mesh = Mesh::generate(30.0, 20.0, 1.0, &mut rng).expect("mesh");
        assert!(mesh.len() > 200);
        assert!(mesh.graph().is_symmetric());
        assert!(mesh.spacing() >= 1.0 && mesh.spacing() < 2.5, "spacing {}", mesh.spacing());

        let (min, max) = mesh.bounds();
        assert!(min.x >= 0.0 && min.y >= 0.0 && max.x < 30.0 && max.y < 20.0);
    }

    #[test]
    fn test_nearest_node_picks_exact_point() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let mesh = Mesh::generate(20.0, 20.0, 1.0, &mut rng).expect("mesh");
        for node in [0, mesh.len() / 2, mesh.len() - 1] {
            let p = mesh.point(node);
            assert_eq!(mesh.nearest_node(p, 0.5), Some(node));
        }
        assert_eq!(mesh.nearest_node(Vec2::new(-50.0, -50.0), 1.0), None);
    }

    #[test]
    fn test_by_direction_filters_fan() {
        let points = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(0.0, -1.0),
        ];
        let adjacency = vec![vec![1, 2, 3, 4], vec![0], vec![0], vec![0], vec![0]];
        let mesh = Mesh::from_adjacency(points, adjacency).expect("mesh");

        assert_eq!(mesh.by_direction(0, Vec2::new(1.0, 0.0), 0.5), vec![1]);
        let wide = mesh.by_direction(0, Vec2::new(1.0, 1.0).normalize(), 0.1);
        assert_eq!(wide, vec![1, 2]);
        assert!(mesh.by_direction(0, Vec2::new(1.0, 0.0), 1.0).is_empty());
    }
}
