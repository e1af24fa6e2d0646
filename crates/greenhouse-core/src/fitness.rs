//! Suitability scoring of ambient conditions against species preferences.

use crate::config::GrowthConfig;
use crate::types::{Environment, OptimalRange, SoilProfile, SpeciesInfo};
use serde::{Deserialize, Serialize};

/// Score in [0, 1] of how well `value` sits within `range`.
///
/// Inside the range scores 1. Outside, the score falls linearly with the
/// distance to the nearest edge, measured in range widths, and floors at 0.
pub fn fit_score(value: f64, range: OptimalRange) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    if range.contains(value) {
        return 1.0;
    }
    (1.0 - range.distance(value) / range.width()).clamp(0.0, 1.0)
}

/// Multiplicative derating for the number of occupied neighbor cells.
pub fn crowd_penalty(neighbors: usize) -> f64 {
    match neighbors {
        0 | 1 => 1.0,
        2 | 3 => 0.8,
        _ => 0.5,
    }
}

/// Soil contribution to a plant's condition, before weighting.
pub fn soil_bonus(soil: SoilProfile, config: &GrowthConfig) -> f64 {
    let props = soil.properties();
    props.nutrient_level * config.nutrient_weight + props.water_retention * config.retention_weight
}

/// Per-quantity fit of an environment to one species
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateFitness {
    pub temperature: f64,
    pub moisture: f64,
    pub light: f64,
}

impl ClimateFitness {
    pub fn score(env: &Environment, species: &SpeciesInfo) -> Self {
        Self {
            temperature: fit_score(env.temperature, species.optimal_temp),
            moisture: fit_score(env.moisture, species.optimal_moisture),
            light: fit_score(env.light, species.optimal_light),
        }
    }

    pub fn mean(&self) -> f64 {
        (self.temperature + self.moisture + self.light) / 3.0
    }
}
