//! Initial rock heights for a fresh mesh: domain-warped fBm noise under an
//! island falloff, sampled at every node.

use noise::{NoiseFn, Perlin, Seedable};
use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;
use crate::mesh::Mesh;

// =============================================================================
// TERRAIN PARAMETERS
// =============================================================================

/// Parameters for the initial rock heightmap
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightmapParams {
    /// Base frequency in cycles per world unit (lower = larger features)
    pub base_frequency: f64,
    /// Number of noise octaves
    pub octaves: u32,
    /// Amplitude decay per octave (0.0-1.0)
    pub persistence: f64,
    /// Frequency multiplier per octave
    pub lacunarity: f64,
    /// Domain warping strength, in world units
    pub warp_strength: f64,
    /// Peak rock height
    pub amplitude: f32,
    /// Height added everywhere before the falloff
    pub base_height: f32,
    /// How strongly height drops toward the map edge (0 = no island mask)
    pub island_falloff: f32,
}

impl Default for HeightmapParams {
    fn default() -> Self {
        Self {
            base_frequency: 0.02,
            octaves: 6,
            persistence: 0.5,
            lacunarity: 2.0,
            warp_strength: 8.0,
            amplitude: 1.2,
            base_height: 0.15,
            island_falloff: 1.4,
        }
    }
}

// =============================================================================
// HEIGHTMAP GENERATION
// =============================================================================

/// Seed `hard` for every mesh node:
/// 1. Multi-octave fBm for base variation
/// 2. Domain warping for less grid-aligned features
/// 3. Radial falloff so the land is ringed by sea
///
/// Returned heights are non-negative.
pub fn generate_hard(mesh: &Mesh, params: &HeightmapParams, seed: u64) -> Vec<f32> {
    let terrain_noise = Perlin::new(1).set_seed(seed as u32);
    let warp_noise = Perlin::new(1).set_seed((seed as u32).wrapping_add(1111));

    let (min, max) = mesh.bounds();
    let center = (min + max) * 0.5;
    let half_extent = ((max - min) * 0.5).length().max(1e-3);

    mesh.points()
        .iter()
        .map(|&p| {
            let (wx, wy) = apply_domain_warp(
                p.x as f64 * params.base_frequency,
                p.y as f64 * params.base_frequency,
                &warp_noise,
                params.warp_strength * params.base_frequency,
            );
            let n = fbm(&terrain_noise, wx, wy, params.octaves, params.persistence, params.lacunarity);
            let n = (n * 0.5 + 0.5) as f32;

            let falloff = island_falloff(p, center, half_extent, params.island_falloff);
            (params.base_height + n * params.amplitude) * falloff
        })
        .map(|h: f32| if h.is_finite() { h.max(0.0) } else { 0.0 })
        .collect()
}

/// 1.0 at the center, easing toward 0.0 at the corners.
fn island_falloff(p: Vec2, center: Vec2, half_extent: f32, strength: f32) -> f32 {
    if strength <= 0.0 {
        return 1.0;
    }
    let d = (p.distance(&center) / half_extent).min(1.0);
    (1.0 - d.powf(2.0) * strength).clamp(0.0, 1.0)
}

// =============================================================================
// NOISE FUNCTIONS
// =============================================================================

/// Fractional Brownian Motion - multi-octave noise
fn fbm(
    noise: &Perlin,
    x: f64,
    y: f64,
    octaves: u32,
    persistence: f64,
    lacunarity: f64,
) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves.max(1) {
        total += amplitude * noise.get([x * frequency, y * frequency]);
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    total / max_value
}

/// Domain warping - distort coordinates for organic shapes
fn apply_domain_warp(x: f64, y: f64, noise: &Perlin, strength: f64) -> (f64, f64) {
    let warp_x = noise.get([x, y]);
    let warp_y = noise.get([x + 5.2, y + 1.3]);

    (x + warp_x * strength, y + warp_y * strength)
}
