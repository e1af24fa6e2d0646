//! Plant state and the per-tick growth model.

use greenhouse_core::{
    crowd_penalty, soil_bonus, ClimateFitness, Environment, GrowthConfig, SoilProfile, Species,
    SpeciesInfo,
};
use serde::{Deserialize, Serialize};

/// A plant growing in a cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantInstance {
    pub species: Species,
    /// 0 up to the species' max growth
    pub growth: f64,
    /// 0 to 100
    pub health: f64,
    /// Ticks lived
    pub age: u64,
    pub planted_at_tick: u64,
}

impl PlantInstance {
    pub fn new(species: Species, tick: u64, config: &GrowthConfig) -> Self {
        Self {
            species,
            growth: 0.0,
            health: config.initial_health.clamp(0.0, 100.0),
            age: 0,
            planted_at_tick: tick,
        }
    }

    pub fn info(&self) -> &'static SpeciesInfo {
        self.species.info()
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn is_stressed(&self, config: &GrowthConfig) -> bool {
        self.health < config.stress_threshold
    }

    pub fn stage(&self) -> GrowthStage {
        GrowthStage::from_growth(self.growth)
    }

    /// Display marker for the current growth stage.
    pub fn stage_marker(&self) -> &'static str {
        let stages = &self.info().stages;
        let fraction = self.growth / self.info().max_growth;
        let index = (fraction * stages.len() as f64).floor().max(0.0) as usize;
        stages[index.min(stages.len() - 1)]
    }

    pub fn health_band(&self) -> HealthBand {
        HealthBand::from_health(self.health)
    }

    /// Check the numeric fields are finite and within their bounds.
    pub fn is_valid(&self) -> bool {
        self.growth.is_finite()
            && self.health.is_finite()
            && (0.0..=self.info().max_growth).contains(&self.growth)
            && (0.0..=100.0).contains(&self.health)
    }

    /// Apply one tick at the given condition score.
    fn grow(&mut self, condition: f64, config: &GrowthConfig) {
        self.health = (self.health + health_delta(condition, config)).clamp(0.0, 100.0);

        if self.health > config.growth_health_floor {
            let info = self.info();
            let gained = info.growth_rate * condition * (self.health / 100.0);
            self.growth = (self.growth + gained).clamp(0.0, info.max_growth);
        }

        self.age += 1;
    }
}

/// Coarse maturity bucket derived from growth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrowthStage {
    Seedling,
    Young,
    Maturing,
    Mature,
}

impl GrowthStage {
    pub fn from_growth(growth: f64) -> Self {
        if growth < 25.0 {
            GrowthStage::Seedling
        } else if growth < 50.0 {
            GrowthStage::Young
        } else if growth < 75.0 {
            GrowthStage::Maturing
        } else {
            GrowthStage::Mature
        }
    }
}

/// Coarse health bucket for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthBand {
    Thriving,
    Fair,
    Poor,
}

impl HealthBand {
    pub fn from_health(health: f64) -> Self {
        if health > 70.0 {
            HealthBand::Thriving
        } else if health > 40.0 {
            HealthBand::Fair
        } else {
            HealthBand::Poor
        }
    }
}

/// Breakdown of how a plant's surroundings score for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub climate: ClimateFitness,
    pub soil_bonus: f64,
    pub crowd_penalty: f64,
    /// Overall score in [0, 1]
    pub condition: f64,
}

impl Assessment {
    pub fn evaluate(
        species: Species,
        soil: SoilProfile,
        env: &Environment,
        neighbors: usize,
        config: &GrowthConfig,
    ) -> Self {
        let climate = ClimateFitness::score(env, species.info());
        let soil_bonus = soil_bonus(soil, config);
        let crowd_penalty = crowd_penalty(neighbors);

        // Soil is added after crowding so good soil offsets a poor fit.
        let condition = (climate.mean() * crowd_penalty + soil_bonus * config.soil_bonus_weight)
            .clamp(0.0, 1.0);

        Self {
            climate,
            soil_bonus,
            crowd_penalty,
            condition,
        }
    }
}

/// Health change for a condition score. Decay outpaces recovery.
pub fn health_delta(condition: f64, config: &GrowthConfig) -> f64 {
    if condition > config.health_threshold {
        (condition - config.health_threshold) * config.recovery_rate
    } else {
        -(config.health_threshold - condition) * config.decay_rate
    }
}

/// Result of stepping one plant
#[derive(Debug, Clone, PartialEq)]
pub enum GrowthOutcome {
    Growing(PlantInstance),
    /// Health reached zero; the cell is cleared. Holds the final state.
    Withered(PlantInstance),
}

/// Advance a plant one tick in its surroundings.
pub fn step(
    plant: &PlantInstance,
    soil: SoilProfile,
    env: &Environment,
    neighbors: usize,
    config: &GrowthConfig,
) -> GrowthOutcome {
    let assessment = Assessment::evaluate(plant.species, soil, env, neighbors, config);
    advance(plant, assessment.condition, config)
}

/// Advance a plant one tick at an already computed condition score.
pub fn advance(plant: &PlantInstance, condition: f64, config: &GrowthConfig) -> GrowthOutcome {
    let mut next = plant.clone();
    next.grow(condition, config);

    if next.is_alive() {
        GrowthOutcome::Growing(next)
    } else {
        GrowthOutcome::Withered(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn seedling(species: Species) -> PlantInstance {
        PlantInstance::new(species, 0, &GrowthConfig::default())
    }

    #[test]
    fn test_new_plant() {
        let plant = PlantInstance::new(Species::Basil, 7, &GrowthConfig::default());
        assert_eq!(plant.growth, 0.0);
        assert_eq!(plant.health, 80.0);
        assert_eq!(plant.age, 0);
        assert_eq!(plant.planted_at_tick, 7);
        assert!(plant.is_alive());
    }

    #[test]
    fn test_tomato_in_ideal_conditions() {
        let config = GrowthConfig::default();
        let env = Environment::default();
        let assessment = Assessment::evaluate(Species::Tomato, SoilProfile::Loam, &env, 0, &config);

        assert_eq!(assessment.climate.mean(), 1.0);
        assert!((assessment.soil_bonus - 0.36).abs() < 1e-12);
        assert_eq!(assessment.crowd_penalty, 1.0);
        assert_eq!(assessment.condition, 1.0);

        let plant = seedling(Species::Tomato);
        match step(&plant, SoilProfile::Loam, &env, 0, &config) {
            GrowthOutcome::Growing(next) => {
                assert!((next.health - 82.0).abs() < 1e-9);
                assert!((next.growth - 0.656).abs() < 1e-9);
                assert_eq!(next.age, 1);
            }
            other => panic!("expected a growing plant, got {other:?}"),
        }
    }

    #[test]
    fn test_soil_offsets_crowding_after_penalty() {
        let config = GrowthConfig::default();
        let env = Environment::default();
        let assessment = Assessment::evaluate(Species::Tomato, SoilProfile::Loam, &env, 5, &config);

        // 1.0 * 0.5 + 0.36 * 0.2
        assert!((assessment.condition - 0.572).abs() < 1e-12);
    }

    #[test]
    fn test_zero_condition_withers_at_tick_17() {
        let config = GrowthConfig::default();
        let mut plant = seedling(Species::Carrot);

        for tick in 1..=16 {
            match advance(&plant, 0.0, &config) {
                GrowthOutcome::Growing(next) => {
                    assert!((plant.health - next.health - 4.8).abs() < 1e-9);
                    plant = next;
                }
                GrowthOutcome::Withered(_) => panic!("withered early at tick {tick}"),
            }
        }

        match advance(&plant, 0.0, &config) {
            GrowthOutcome::Withered(last) => {
                assert_eq!(last.health, 0.0);
                assert_eq!(last.age, 17);
            }
            other => panic!("expected withering at tick 17, got {other:?}"),
        }
    }

    #[test]
    fn test_growth_frozen_at_low_health() {
        let config = GrowthConfig::default();
        let mut plant = seedling(Species::Lettuce);
        plant.health = 20.5;
        plant.growth = 10.0;

        // 0.5 condition costs 0.8 health, landing at 19.7
        match advance(&plant, 0.5, &config) {
            GrowthOutcome::Growing(next) => {
                assert!(next.health <= 20.0);
                assert_eq!(next.growth, 10.0);
                assert_eq!(next.age, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_growth_capped_at_max() {
        let config = GrowthConfig::default();
        let mut plant = seedling(Species::Basil);
        plant.growth = 99.9;
        plant.health = 100.0;

        match advance(&plant, 1.0, &config) {
            GrowthOutcome::Growing(next) => {
                assert_eq!(next.growth, 100.0);
                assert_eq!(next.health, 100.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_stage_and_marker() {
        let mut plant = seedling(Species::Tomato);
        assert_eq!(plant.stage(), GrowthStage::Seedling);
        assert_eq!(plant.stage_marker(), "🌱");

        plant.growth = 60.0;
        assert_eq!(plant.stage(), GrowthStage::Maturing);
        assert_eq!(plant.stage_marker(), "🪴");

        plant.growth = 100.0;
        assert_eq!(plant.stage(), GrowthStage::Mature);
        assert_eq!(plant.stage_marker(), "🍅");
    }

    #[test]
    fn test_health_bands() {
        assert_eq!(HealthBand::from_health(80.0), HealthBand::Thriving);
        assert_eq!(HealthBand::from_health(70.0), HealthBand::Fair);
        assert_eq!(HealthBand::from_health(40.0), HealthBand::Poor);
    }

    proptest! {
        #[test]
        fn health_delta_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let config = GrowthConfig::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(health_delta(lo, &config) <= health_delta(hi, &config));
        }

        #[test]
        fn plant_stays_in_bounds(
            species_index in 0usize..8,
            start_health in 0.1f64..=100.0,
            conditions in proptest::collection::vec(0.0f64..=1.0, 1..200),
        ) {
            let config = GrowthConfig::default();
            let mut plant = seedling(Species::all()[species_index]);
            plant.health = start_health;

            for condition in conditions {
                let previous_growth = plant.growth;
                match advance(&plant, condition, &config) {
                    GrowthOutcome::Growing(next) => {
                        prop_assert!(next.is_valid());
                        prop_assert!(next.growth >= previous_growth);
                        plant = next;
                    }
                    GrowthOutcome::Withered(last) => {
                        prop_assert_eq!(last.health, 0.0);
                        break;
                    }
                }
            }
        }
    }
}
