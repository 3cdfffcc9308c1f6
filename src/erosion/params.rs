//! Erosion simulation parameters and configuration
//!
//! Heights are in the same units as the seed heightmap (roughly 0..1.5) and
//! distances in world units (roughly one mesh spacing per unit). Every rate
//! is per pass invocation.

use serde::{Deserialize, Serialize};

/// Erosion intensity preset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErosionPreset {
    /// Slow weathering, gentle slopes
    Calm,
    /// Balanced erosion
    #[default]
    Normal,
    /// Wet climate, deep valleys and canyons
    Dramatic,
}

impl ErosionPreset {
    pub fn all() -> &'static [Self] {
        &[Self::Calm, Self::Normal, Self::Dramatic]
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Calm => "Slow weathering, gentle slopes",
            Self::Normal => "Balanced erosion",
            Self::Dramatic => "Deep valleys and canyons",
        }
    }
}

impl std::fmt::Display for ErosionPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Calm => write!(f, "calm"),
            Self::Normal => write!(f, "normal"),
            Self::Dramatic => write!(f, "dramatic"),
        }
    }
}

impl std::str::FromStr for ErosionPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "calm" => Ok(Self::Calm),
            "normal" => Ok(Self::Normal),
            "dramatic" => Ok(Self::Dramatic),
            other => Err(format!("unknown erosion preset '{}'", other)),
        }
    }
}

/// Tunables read by every pass. The engine never stores or validates them
/// beyond the clamps inside each pass; refresh them between passes freely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErosionParams {
    // =========================================================================
    // Sea and rain
    // =========================================================================

    /// Still-water sea level
    pub sea_level: f32,

    /// Half the tidal range used by `fix_water`
    pub tide_amplitude: f32,

    /// Tide phase advance per `fix_water` call (radians)
    pub tide_speed: f32,

    /// Global rain multiplier (also scales snowfall)
    pub rainfall: f32,

    /// Water added to a sink per rain source node
    pub rain_amount: f32,

    /// Maximum downhill hops while searching for a sink
    pub rain_max_hops: usize,

    /// Sinks holding more surface water than this receive no rain
    pub rain_saturation: f32,

    /// How much a sheltered source loses to rain shadow (0 = none, 1 = all)
    pub rain_shadow: f32,

    // =========================================================================
    // Groundwater
    // =========================================================================

    /// Surface water soaking into sediment per pass
    pub infiltration_rate: f32,

    /// Lateral groundwater flow per unit of head difference
    pub aquifer_flow_rate: f32,

    /// Damping of groundwater flow by sediment depth
    pub sediment_friction: f32,

    /// Damping of groundwater flow by standing surface water
    pub water_friction: f32,

    /// Sediment carried per unit of groundwater moved per unit rock drop
    pub aquifer_sediment_rate: f32,

    // =========================================================================
    // Surface flow
    // =========================================================================

    /// Fraction of the justified surface transfer actually moved
    pub surface_flow_rate: f32,

    /// Sediment picked up per unit of surface water moved per unit rock drop
    pub sediment_erosion: f32,

    /// Fraction of unmet sediment demand taken from bare rock
    pub flow_hard_erosion: f32,

    /// Water shallower than this erodes rock through turbulence
    pub turbulence_depth: f32,

    /// Rock weathered per unit of shallow, moving water
    pub turbulence_erosion: f32,

    // =========================================================================
    // Slopes
    // =========================================================================

    /// Stable slope (rise over run) for dry sediment
    pub silt_angle: f32,

    /// Stable slope for hard rock
    pub rock_angle: f32,

    /// Fraction of `silt_angle` lost when sediment is fully saturated
    pub saturation_sag: f32,

    /// Fraction of the excess height moved per landslide
    pub landslide_rate: f32,

    // =========================================================================
    // Rivers
    // =========================================================================

    /// Rock weathered per unit of river flow per unit drop
    pub river_erosion: f32,

    /// How strongly sediment cover shields the rock from rivers
    pub sediment_cover: f32,

    /// Nodes visited per `iterate_rivers` call
    pub river_batch: usize,

    /// Multiplicative river decay per `pass_time`
    pub river_decay: f32,

    /// Multiplicative silt-marker decay per `pass_time`
    pub silt_decay: f32,

    // =========================================================================
    // Vegetation
    // =========================================================================

    pub vegetation_growth: f32,
    pub vegetation_decay: f32,
    /// Diffusion toward the neighbor mean
    pub vegetation_spread: f32,
    /// Standing water deeper than this drowns vegetation
    pub vegetation_drown_depth: f32,
    pub vegetation_drown_rate: f32,

    // =========================================================================
    // Snow
    // =========================================================================

    /// Rock elevation above which snow falls
    pub snow_line: f32,
    pub snowfall: f32,
    /// Snow melts below this rock elevation
    pub snow_melt_elevation: f32,
    pub snow_melt_rate: f32,
    /// Fraction of the justified snow slide moved per pass
    pub snow_slide_rate: f32,
    /// Rock scraped per unit of sliding snow per unit rock drop
    pub snow_scrape: f32,

    // =========================================================================
    // Wind
    // =========================================================================

    /// Global wind multiplier
    pub wind: f32,
    /// Rock weathered per pass on a fully exposed, bare node
    pub wind_erosion: f32,
    /// How fast the wind direction turns toward its target (0-1)
    pub wind_turn_rate: f32,
    /// Nodes visited per `derive_occlusion` call
    pub occlusion_batch: usize,
    /// Minimum cosine between an edge and the upwind direction
    pub occlusion_fan: f32,
    /// Horizon drop per unit distance along a sightline (0 keeps the
    /// strict running maximum)
    pub occlusion_falloff: f32,
    /// Horizon relaxation per visit, lets shadows move with the wind (0 never
    /// lowers a horizon)
    pub occlusion_decay: f32,
    /// Exposure lost per unit of horizon above the node
    pub occlusion_sensitivity: f32,
}

impl Default for ErosionParams {
    fn default() -> Self {
        Self {
            sea_level: 0.3,
            tide_amplitude: 0.02,
            tide_speed: 0.01,
            rainfall: 1.0,
            rain_amount: 0.002,
            rain_max_hops: 64,
            rain_saturation: 0.05,
            rain_shadow: 0.5,

            infiltration_rate: 0.01,
            aquifer_flow_rate: 0.25,
            sediment_friction: 2.0,
            water_friction: 1.0,
            aquifer_sediment_rate: 0.5,

            surface_flow_rate: 0.5,
            sediment_erosion: 40.8,
            flow_hard_erosion: 0.25,
            turbulence_depth: 0.02,
            turbulence_erosion: 0.05,

            silt_angle: 0.5,
            rock_angle: 1.2,
            saturation_sag: 0.5,
            landslide_rate: 0.1,

            river_erosion: 0.02,
            sediment_cover: 10.0,
            river_batch: 512,
            river_decay: 0.9,
            silt_decay: 0.95,

            vegetation_growth: 0.02,
            vegetation_decay: 0.005,
            vegetation_spread: 0.05,
            vegetation_drown_depth: 0.05,
            vegetation_drown_rate: 0.2,

            snow_line: 0.9,
            snowfall: 0.001,
            snow_melt_elevation: 0.7,
            snow_melt_rate: 0.002,
            snow_slide_rate: 0.2,
            snow_scrape: 0.05,

            wind: 1.0,
            wind_erosion: 0.0002,
            wind_turn_rate: 0.05,
            occlusion_batch: 1024,
            occlusion_fan: 0.5,
            occlusion_falloff: 0.0,
            occlusion_decay: 0.0,
            occlusion_sensitivity: 4.0,
        }
    }
}

impl ErosionParams {
    /// Create parameters from a preset
    pub fn from_preset(preset: ErosionPreset) -> Self {
        match preset {
            ErosionPreset::Calm => Self {
                rainfall: 0.5,
                sediment_erosion: 20.0,
                river_erosion: 0.01,
                landslide_rate: 0.05,
                wind: 0.5,
                ..Default::default()
            },
            ErosionPreset::Normal => Self::default(),
            ErosionPreset::Dramatic => Self {
                rainfall: 2.0,
                sediment_erosion: 60.0,
                river_erosion: 0.04,
                flow_hard_erosion: 0.5,
                silt_angle: 0.35,
                ..Default::default()
            },
        }
    }

    /// Load from JSON; fields not present keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Load from JSON on top of `self`; only the fields named in `text`
    /// change.
    pub fn overridden_by_json(&self, text: &str) -> Result<Self, serde_json::Error> {
        let mut merged = serde_json::to_value(self)?;
        let overrides: serde_json::Value = serde_json::from_str(text)?;
        match (merged.as_object_mut(), overrides) {
            (Some(base), serde_json::Value::Object(fields)) => base.extend(fields),
            (_, other) => return serde_json::from_value(other),
        }
        serde_json::from_value(merged)
    }
}
