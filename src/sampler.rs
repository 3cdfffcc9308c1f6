//! Poisson-disc (blue noise) point sampling by dart throwing.
//!
//! Points grow outward from one or more seeds. Each `step` picks an active
//! point, throws a fixed number of candidates into the annulus `[r, 2r)`
//! around it, and keeps every candidate that is admitted by the caller's
//! predicate and has no existing point closer than `r`. A point that yields
//! nothing is retired from the active set (it stays in the point list).
//!
//! `r` comes from a radius function so density can vary over the world.

use rand::Rng;

use crate::geometry::Vec2;
use crate::spatial::SpatialIndex;

/// Candidates thrown around an active point per step.
pub const CANDIDATE_ATTEMPTS: usize = 7;

/// Lifecycle of a sampler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplerState {
    /// No point admitted yet.
    Empty,
    /// At least one active point remains.
    Sampling,
    /// Active set exhausted; the point list is final.
    Done,
}

/// Blue-noise point generator.
///
/// `F` maps a position to its minimum separation radius, `A` decides whether a
/// position may hold a point at all (typically "inside the world").
pub struct BlueNoiseSampler<F, A>
where
    F: Fn(Vec2) -> f32,
    A: Fn(Vec2) -> bool,
{
    state: SamplerState,
    index: SpatialIndex,
    active: Vec<usize>,
    radius: F,
    admit: A,
}

impl<F, A> BlueNoiseSampler<F, A>
where
    F: Fn(Vec2) -> f32,
    A: Fn(Vec2) -> bool,
{
    /// Empty sampler over the rectangle `[min, max]`. `cell_size` should be
    /// close to the typical radius for fast neighbor checks.
    pub fn new(min: Vec2, max: Vec2, cell_size: f32, radius: F, admit: A) -> Self {
        Self {
            state: SamplerState::Empty,
            index: SpatialIndex::new(min, max, cell_size),
            active: Vec::new(),
            radius,
            admit,
        }
    }

    /// Convenience: create and place the given seed points.
    pub fn with_seeds(
        min: Vec2,
        max: Vec2,
        cell_size: f32,
        radius: F,
        admit: A,
        seeds: &[Vec2],
    ) -> Self {
        let mut sampler = Self::new(min, max, cell_size, radius, admit);
        for &seed in seeds {
            sampler.seed(seed);
        }
        sampler
    }

    /// Place a seed point. Returns false if it is not admitted or is too
    /// close to an existing point. Seeding a finished sampler is a no-op.
    pub fn seed(&mut self, pos: Vec2) -> bool {
        if self.state == SamplerState::Done {
            return false;
        }
        if !self.accepts(pos) {
            return false;
        }
        let id = self.index.insert(pos);
        self.active.push(id);
        self.state = SamplerState::Sampling;
        true
    }

    /// Advance by one active point. Returns false once sampling has finished.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.state != SamplerState::Sampling || self.active.is_empty() {
            self.state = SamplerState::Done;
            return false;
        }

        let slot = rng.gen_range(0..self.active.len());
        let center = self.index.point(self.active[slot]);
        let r = (self.radius)(center);

        let mut accepted = 0;
        if r.is_finite() && r > 0.0 {
            for _ in 0..CANDIDATE_ATTEMPTS {
                let angle = rng.gen_range(0.0..std::f32::consts::TAU);
                let dist = rng.gen_range(r..2.0 * r);
                let candidate = center + Vec2::from_angle(angle) * dist;

                if self.accepts(candidate) {
                    let id = self.index.insert(candidate);
                    self.active.push(id);
                    accepted += 1;
                }
            }
        }

        if accepted == 0 {
            self.active.swap_remove(slot);
        }

        if self.active.is_empty() {
            self.state = SamplerState::Done;
            return false;
        }
        true
    }

    /// Step until done; returns the number of points placed.
    pub fn run<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        while self.step(rng) {}
        self.index.len()
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn points(&self) -> &[Vec2] {
        self.index.points()
    }

    pub fn into_points(self) -> Vec<Vec2> {
        self.index.points().to_vec()
    }

    fn accepts(&self, pos: Vec2) -> bool {
        if !pos.x.is_finite() || !pos.y.is_finite() || !(self.admit)(pos) {
            return false;
        }
        let r = (self.radius)(pos);
        if !(r.is_finite() && r > 0.0) {
            return false;
        }
        !self.index.any_within(pos, r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn inside(width: f32, height: f32) -> impl Fn(Vec2) -> bool {
        move |p: Vec2| p.x >= 0.0 && p.y >= 0.0 && p.x < width && p.y < height
    }

    #[test]
    fn test_minimum_separation_holds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut sampler = BlueNoiseSampler::with_seeds(
            Vec2::ZERO,
            Vec2::new(40.0, 25.0),
            1.0,
            |_| 1.0,
            inside(40.0, 25.0),
            &[Vec2::new(20.0, 12.5)],
        );
        let count = sampler.run(&mut rng);
        assert_eq!(sampler.state(), SamplerState::Done);
        assert!(count > 300, "expected a dense fill, got {} points", count);

        let points = sampler.points();
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                let d = points[i].distance(&points[j]);
                assert!(d >= 1.0, "points {} and {} are only {} apart", i, j, d);
            }
        }
    }

    #[test]
    fn test_variable_radius_is_respected() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let radius = |p: Vec2| if p.x < 20.0 { 0.8 } else { 2.0 };
        let mut sampler = BlueNoiseSampler::with_seeds(
            Vec2::ZERO,
            Vec2::new(40.0, 20.0),
            0.8,
            radius,
            inside(40.0, 20.0),
            &[Vec2::new(10.0, 10.0)],
        );
        sampler.run(&mut rng);

        let points = sampler.points();
        let dense = points.iter().filter(|p| p.x < 20.0).count();
        let sparse = points.len() - dense;
        assert!(dense > sparse * 3, "dense half {} vs sparse half {}", dense, sparse);
    }

    #[test]
    fn test_unsatisfiable_admission_terminates_immediately() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut sampler = BlueNoiseSampler::with_seeds(
            Vec2::ZERO,
            Vec2::new(10.0, 10.0),
            1.0,
            |_| 1.0,
            |_| false,
            &[Vec2::new(5.0, 5.0)],
        );
        assert_eq!(sampler.state(), SamplerState::Empty);
        assert!(!sampler.step(&mut rng));
        assert_eq!(sampler.state(), SamplerState::Done);
        assert!(sampler.points().is_empty());
    }

    #[test]
    fn test_same_seed_same_points() {
        let make = || {
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            let mut sampler = BlueNoiseSampler::with_seeds(
                Vec2::ZERO,
                Vec2::new(15.0, 15.0),
                1.0,
                |_| 1.0,
                inside(15.0, 15.0),
                &[Vec2::new(7.5, 7.5)],
            );
            sampler.run(&mut rng);
            sampler.into_points()
        };
        assert_eq!(make(), make());
    }
}
