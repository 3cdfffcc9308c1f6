//! Node adjacency derived from a Delaunay triangulation.
//!
//! Each node keeps its neighbors sorted by increasing angle around it (ties
//! broken by index), which gives passes a consistent "walk around the node"
//! order. Adjacency is always symmetric.

use delaunator::{triangulate, Point, EMPTY};
use rayon::prelude::*;
use tracing::debug;

use crate::error::MeshError;
use crate::geometry::Vec2;

/// Symmetric, angularly ordered adjacency lists indexed by node id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    adjacency: Vec<Vec<usize>>,
}

impl Graph {
    /// Triangulate `points` and derive adjacency from the triangle edges.
    ///
    /// Fails on fewer than three points or a fully collinear set; the caller
    /// must not build fields or an eroder over such input.
    pub fn triangulate(points: &[Vec2]) -> Result<Self, MeshError> {
        check_triangulable(points)?;

        let coords: Vec<Point> = points
            .iter()
            .map(|p| Point { x: p.x as f64, y: p.y as f64 })
            .collect();
        let tri = triangulate(&coords);
        if tri.triangles.is_empty() {
            return Err(MeshError::Collinear);
        }

        let mut adjacency = vec![Vec::new(); points.len()];
        // Each undirected edge is visited once: from its lower half-edge id,
        // or from its only half-edge when it lies on the hull.
        for e in 0..tri.triangles.len() {
            let twin = tri.halfedges[e];
            if twin != EMPTY && twin < e {
                continue;
            }
            let a = tri.triangles[e];
            let b = tri.triangles[next_halfedge(e)];
            adjacency[a].push(b);
            adjacency[b].push(a);
        }

        let mut graph = Self { adjacency };
        graph.sort_around(points);
        debug!(
            nodes = points.len(),
            triangles = tri.triangles.len() / 3,
            edges = graph.edge_count(),
            "triangulated mesh"
        );
        Ok(graph)
    }

    /// Build from known adjacency, validating range, self-loops and symmetry.
    /// Duplicate entries are dropped and lists are re-sorted by angle.
    pub fn from_adjacency(points: &[Vec2], mut lists: Vec<Vec<usize>>) -> Result<Self, MeshError> {
        let count = points.len();
        if lists.len() != count {
            return Err(MeshError::NodeCountMismatch {
                graph: lists.len(),
                points: count,
            });
        }

        for (node, list) in lists.iter_mut().enumerate() {
            list.sort_unstable();
            list.dedup();
            for &neighbor in list.iter() {
                if neighbor >= count {
                    return Err(MeshError::NeighborOutOfRange { node, neighbor, count });
                }
                if neighbor == node {
                    return Err(MeshError::SelfLoop { node });
                }
            }
        }

        for (a, list) in lists.iter().enumerate() {
            for &b in list {
                if lists[b].binary_search(&a).is_err() {
                    return Err(MeshError::AsymmetricAdjacency { a, b });
                }
            }
        }

        let mut graph = Self { adjacency: lists };
        graph.sort_around(points);
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Neighbors of `node` in angular order.
    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.adjacency[node]
    }

    pub fn adjacency(&self) -> &[Vec<usize>] {
        &self.adjacency
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    pub fn is_symmetric(&self) -> bool {
        self.adjacency
            .iter()
            .enumerate()
            .all(|(a, list)| list.iter().all(|&b| self.adjacency[b].contains(&a)))
    }

    fn sort_around(&mut self, points: &[Vec2]) {
        self.adjacency
            .par_iter_mut()
            .enumerate()
            .for_each(|(node, list)| {
                let origin = points[node];
                list.sort_by(|&a, &b| {
                    let ta = (points[a] - origin).angle();
                    let tb = (points[b] - origin).angle();
                    ta.partial_cmp(&tb)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(a.cmp(&b))
                });
                list.dedup();
            });
    }
}

fn next_halfedge(e: usize) -> usize {
    if e % 3 == 2 { e - 2 } else { e + 1 }
}

/// Reject inputs with no possible triangle before handing them to the
/// triangulator.
fn check_triangulable(points: &[Vec2]) -> Result<(), MeshError> {
    if points.len() < 3 {
        return Err(MeshError::TooFewPoints { count: points.len() });
    }

    let a = points[0];
    let Some(b) = points.iter().copied().find(|p| p.distance_squared(&a) > 0.0) else {
        return Err(MeshError::Collinear);
    };
    let ab = b - a;
    let scale = ab.length();
    let has_turn = points
        .iter()
        .any(|&p| (ab.cross(&(p - a)) / scale).abs() > 1e-6 * scale.max(1.0));
    if has_turn {
        Ok(())
    } else {
        Err(MeshError::Collinear)
    }
}
