//! Aggregate statistics over the plants in a grid.

use crate::grid::Grid;
use crate::plant::GrowthStage;
use greenhouse_core::{GrowthConfig, Species};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot summary of the greenhouse population
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GreenhouseStats {
    pub total_plants: usize,
    pub average_health: f64,
    pub average_growth: f64,
    /// Plants below the stress threshold
    pub stressed: usize,
    /// Plants at the mature growth stage
    pub mature: usize,
    pub by_species: BTreeMap<Species, usize>,
}

impl GreenhouseStats {
    pub fn collect(grid: &Grid, config: &GrowthConfig) -> Self {
        let mut stats = Self::default();
        let mut health_sum = 0.0;
        let mut growth_sum = 0.0;

        for (_, plant) in grid.plants() {
            stats.total_plants += 1;
            health_sum += plant.health;
            growth_sum += plant.growth;

            if plant.is_stressed(config) {
                stats.stressed += 1;
            }
            if plant.stage() == GrowthStage::Mature {
                stats.mature += 1;
            }
            *stats.by_species.entry(plant.species).or_insert(0) += 1;
        }

        if stats.total_plants > 0 {
            let n = stats.total_plants as f64;
            stats.average_health = health_sum / n;
            stats.average_growth = growth_sum / n;
        }

        stats
    }

    pub fn is_empty(&self) -> bool {
        self.total_plants == 0
    }
}
