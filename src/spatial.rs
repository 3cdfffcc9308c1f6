//! Uniform bucket grid over 2D points.
//!
//! Points are stored row-major in cells of `cell_size` world units, like a
//! `Tilemap` whose tiles hold point ids. Supports incremental insertion (the
//! sampler grows it one point at a time) and a one-shot bulk build over a
//! finished point list.
//!
//! Rectangle queries return every point in the overlapped cells, so callers
//! that need an exact shape either filter themselves or use `query_circle`.

use crate::geometry::Vec2;

/// Static-or-growing point index supporting range and nearest queries.
#[derive(Clone, Debug)]
pub struct SpatialIndex {
    origin: Vec2,
    cell_size: f32,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<usize>>,
    points: Vec<Vec2>,
}

impl SpatialIndex {
    /// Empty index covering `[min, max]`. Points inserted outside the bounds
    /// are kept in the nearest edge cell, so queries stay complete.
    pub fn new(min: Vec2, max: Vec2, cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 { cell_size } else { 1.0 };
        let cols = (((max.x - min.x) / cell_size).ceil().max(1.0)) as usize;
        let rows = (((max.y - min.y) / cell_size).ceil().max(1.0)) as usize;

        Self {
            origin: min,
            cell_size,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
            points: Vec::new(),
        }
    }

    /// Bulk-build over a finalized point list; ids equal positions in `points`.
    pub fn build(points: &[Vec2], cell_size: f32) -> Self {
        let mut min = Vec2::new(f32::MAX, f32::MAX);
        let mut max = Vec2::new(f32::MIN, f32::MIN);
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        if points.is_empty() {
            min = Vec2::ZERO;
            max = Vec2::ZERO;
        }

        let mut index = Self::new(min, max, cell_size);
        index.points.reserve(points.len());
        for &p in points {
            index.insert(p);
        }
        index
    }

    /// Add a point and return its id.
    pub fn insert(&mut self, pos: Vec2) -> usize {
        let id = self.points.len();
        let (cx, cy) = self.clamped_cell(pos);
        let cell = cy * self.cols + cx;
        self.cells[cell].push(id);
        self.points.push(pos);
        id
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, id: usize) -> Vec2 {
        self.points[id]
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// All points in cells overlapping the rectangle. May include points just
    /// outside it; never misses one inside.
    pub fn query_rect(&self, min: Vec2, max: Vec2) -> Vec<usize> {
        let mut result = Vec::new();
        self.visit_rect(min, max, |id| result.push(id));
        result
    }

    /// Points within `radius` of `center` (exact distance test).
    pub fn query_circle(&self, center: Vec2, radius: f32) -> Vec<usize> {
        let r2 = radius * radius;
        let mut result = Vec::new();
        let extent = Vec2::new(radius, radius);
        self.visit_rect(center - extent, center + extent, |id| {
            if self.points[id].distance_squared(&center) < r2 {
                result.push(id);
            }
        });
        result
    }

    /// True if any point lies strictly closer than `radius` to `center`.
    pub fn any_within(&self, center: Vec2, radius: f32) -> bool {
        let r2 = radius * radius;
        let extent = Vec2::new(radius, radius);
        let (x0, y0) = self.clamped_cell(center - extent);
        let (x1, y1) = self.clamped_cell(center + extent);
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                for &id in &self.cells[cy * self.cols + cx] {
                    if self.points[id].distance_squared(&center) < r2 {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Closest point to `pos` no farther than `max_radius`. Ties go to the
    /// lower id.
    pub fn nearest(&self, pos: Vec2, max_radius: f32) -> Option<usize> {
        if self.points.is_empty() || !(max_radius >= 0.0) {
            return None;
        }

        let (cx, cy) = self.cell_coords(pos);
        let (last_x, last_y) = (self.cols as i64 - 1, self.rows as i64 - 1);
        // Rings closer than `first_ring` lie entirely outside the grid.
        let first_ring = (-cx).max(cx - last_x).max(-cy).max(cy - last_y).max(0);
        let far_ring = cx.max(last_x - cx).max(cy).max(last_y - cy).max(0);
        let max_ring = if max_radius.is_finite() {
            ((max_radius / self.cell_size).ceil() as i64).saturating_add(1).min(far_ring)
        } else {
            far_ring
        };
        let mut best: Option<(f32, usize)> = None;

        for ring in first_ring..=max_ring.max(first_ring) {
            for (x, y) in ring_cells(cx, cy, ring) {
                if x < 0 || y < 0 || x >= self.cols as i64 || y >= self.rows as i64 {
                    continue;
                }
                for &id in &self.cells[y as usize * self.cols + x as usize] {
                    let d2 = self.points[id].distance_squared(&pos);
                    let better = match best {
                        None => true,
                        Some((bd, bid)) => d2 < bd || (d2 == bd && id < bid),
                    };
                    if better {
                        best = Some((d2, id));
                    }
                }
            }

            // Anything in a farther ring is at least `ring * cell_size` away.
            let reach = ring as f32 * self.cell_size;
            if let Some((bd, _)) = best {
                if bd.sqrt() <= reach {
                    break;
                }
            }
            if reach > max_radius {
                break;
            }
        }

        best.filter(|(d2, _)| d2.sqrt() <= max_radius).map(|(_, id)| id)
    }

    fn visit_rect(&self, min: Vec2, max: Vec2, mut f: impl FnMut(usize)) {
        let (x0, y0) = self.clamped_cell(min);
        let (x1, y1) = self.clamped_cell(max);
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                for &id in &self.cells[cy * self.cols + cx] {
                    f(id);
                }
            }
        }
    }

    fn cell_coords(&self, pos: Vec2) -> (i64, i64) {
        let cx = ((pos.x - self.origin.x) / self.cell_size).floor();
        let cy = ((pos.y - self.origin.y) / self.cell_size).floor();
        (cx as i64, cy as i64)
    }

    fn clamped_cell(&self, pos: Vec2) -> (usize, usize) {
        let (cx, cy) = self.cell_coords(pos);
        (
            cx.clamp(0, self.cols as i64 - 1) as usize,
            cy.clamp(0, self.rows as i64 - 1) as usize,
        )
    }
}

/// Cells at Chebyshev distance `ring` from `(cx, cy)`.
fn ring_cells(cx: i64, cy: i64, ring: i64) -> Vec<(i64, i64)> {
    if ring == 0 {
        return vec![(cx, cy)];
    }
    let mut cells = Vec::with_capacity((ring * 8) as usize);
    for dx in -ring..=ring {
        cells.push((cx + dx, cy - ring));
        cells.push((cx + dx, cy + ring));
    }
    for dy in (-ring + 1)..ring {
        cells.push((cx - ring, cy + dy));
        cells.push((cx + ring, cy + dy));
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn random_points(n: usize, seed: u64) -> Vec<Vec2> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n)
            .map(|_| Vec2::new(rng.gen_range(0.0..50.0), rng.gen_range(0.0..30.0)))
            .collect()
    }

    #[test]
    fn test_query_rect_has_no_false_negatives() {
        let points = random_points(500, 1);
        let index = SpatialIndex::build(&points, 2.5);
        let min = Vec2::new(10.0, 5.0);
        let max = Vec2::new(22.0, 17.0);

        let found = index.query_rect(min, max);
        for (i, p) in points.iter().enumerate() {
            if p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y {
                assert!(found.contains(&i), "point {} inside rect was missed", i);
            }
        }
    }

    #[test]
    fn test_query_circle_is_exact() {
        let points = random_points(500, 2);
        let index = SpatialIndex::build(&points, 3.0);
        let center = Vec2::new(25.0, 15.0);

        let mut found = index.query_circle(center, 6.0);
        found.sort_unstable();
        let expected: Vec<usize> = (0..points.len())
            .filter(|&i| points[i].distance(&center) < 6.0)
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_nearest_matches_brute_force() {
        let points = random_points(300, 3);
        let index = SpatialIndex::build(&points, 2.0);
        let mut rng = ChaCha8Rng::seed_from_u64(99);

        for _ in 0..50 {
            let q = Vec2::new(rng.gen_range(-5.0..55.0), rng.gen_range(-5.0..35.0));
            let brute = (0..points.len())
                .min_by(|&a, &b| {
                    points[a]
                        .distance_squared(&q)
                        .partial_cmp(&points[b].distance_squared(&q))
                        .unwrap()
                        .then(a.cmp(&b))
                })
                .unwrap();
            assert_eq!(index.nearest(q, 100.0), Some(brute));
        }
    }

    #[test]
    fn test_nearest_respects_max_radius() {
        let index = SpatialIndex::build(&[Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)], 1.0);
        assert_eq!(index.nearest(Vec2::new(5.0, 5.0), 2.0), None);
        assert_eq!(index.nearest(Vec2::new(9.0, 0.5), 2.0), Some(1));
    }

    #[test]
    fn test_nearest_with_unbounded_radius() {
        let index = SpatialIndex::build(&[Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0)], 1.0);
        assert_eq!(index.nearest(Vec2::new(9.0, 9.0), f32::INFINITY), Some(1));
        assert_eq!(index.nearest(Vec2::new(9.0, 9.0), f32::MAX), Some(1));
        assert_eq!(index.nearest(Vec2::new(1.0, 2.0), f32::INFINITY), Some(0));
        assert_eq!(index.nearest(Vec2::new(20.0, 12.0), f32::INFINITY), Some(1));
        assert_eq!(index.nearest(Vec2::new(-40.0, 30.0), f32::INFINITY), Some(0));
        assert_eq!(index.nearest(Vec2::new(1.0, 1.0), f32::NAN), None);
    }

    #[test]
    fn test_incremental_insert_matches_build() {
        let points = random_points(100, 4);
        let mut grown = SpatialIndex::new(Vec2::ZERO, Vec2::new(50.0, 30.0), 2.0);
        for &p in &points {
            grown.insert(p);
        }
        assert_eq!(grown.len(), points.len());
        assert!(grown.any_within(points[7], 0.01));
        assert!(!grown.any_within(Vec2::new(-100.0, -100.0), 1.0));
    }
}
