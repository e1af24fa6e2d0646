//! Simulation state, mutation commands, and the full-grid tick.

use crate::environment;
use crate::grid::{Cell, Grid, Occupant};
use crate::plant::{self, GrowthOutcome, PlantInstance};
use crate::stats::GreenhouseStats;
use greenhouse_core::{
    CellPos, Environment, EnvironmentUpdate, Error, GridConfig, Result, SimSpeed,
    SimulationConfig, SoilProfile, Species,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Complete greenhouse state at one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub grid: Grid,
    pub environment: Environment,
    pub tick: u64,
    pub speed: SimSpeed,
}

impl SimulationState {
    /// Fresh state: empty grid of default soil, default environment, tick 0, 1x.
    pub fn new(config: &GridConfig) -> Self {
        Self {
            grid: Grid::from_config(config),
            environment: Environment::default(),
            tick: 0,
            speed: SimSpeed::Normal,
        }
    }

    /// Reject a state that could not have come from this configuration.
    pub fn validate(&self, config: &GridConfig) -> Result<()> {
        if self.grid.rows() != config.rows || self.grid.cols() != config.cols {
            return Err(Error::IncompatibleState(format!(
                "grid is {}x{}, expected {}x{}",
                self.grid.rows(),
                self.grid.cols(),
                config.rows,
                config.cols
            )));
        }
        if !self.grid.is_consistent() {
            return Err(Error::IncompatibleState(
                "grid cells do not match its dimensions or hold invalid plants".to_string(),
            ));
        }
        if !self.environment.is_valid() {
            return Err(Error::IncompatibleState(
                "environment field out of range".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cell(&self, pos: CellPos) -> Option<&Cell> {
        self.grid.get(pos)
    }

    pub fn stats(&self, config: &SimulationConfig) -> GreenhouseStats {
        GreenhouseStats::collect(&self.grid, &config.growth)
    }

    /// Plant a seedling in an empty, in-bounds cell.
    pub fn place_plant(
        &mut self,
        pos: CellPos,
        species: Species,
        config: &SimulationConfig,
    ) -> Result<()> {
        let tick = self.tick;
        let cell = self.grid.get_mut(pos)?;
        if cell.occupant.is_occupied() {
            return Err(Error::CellOccupied {
                row: pos.row,
                col: pos.col,
            });
        }
        cell.occupant = Occupant::Occupied(PlantInstance::new(species, tick, &config.growth));
        Ok(())
    }

    /// Clear a cell, returning the plant it held if any.
    pub fn remove_plant(&mut self, pos: CellPos) -> Result<Option<PlantInstance>> {
        let cell = self.grid.get_mut(pos)?;
        Ok(match std::mem::take(&mut cell.occupant) {
            Occupant::Occupied(plant) => Some(plant),
            Occupant::Empty => None,
        })
    }

    pub fn set_soil(&mut self, pos: CellPos, soil: SoilProfile) -> Result<()> {
        self.grid.get_mut(pos)?.soil = soil;
        Ok(())
    }

    pub fn set_all_soil(&mut self, soil: SoilProfile) {
        self.grid.set_all_soil(soil);
    }

    pub fn update_environment(&mut self, update: &EnvironmentUpdate) {
        self.environment.apply(update);
    }

    pub fn set_speed(&mut self, speed: SimSpeed) {
        self.speed = speed;
    }
}

/// A plant removed during a tick because its health reached zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WitheredPlant {
    pub pos: CellPos,
    pub species: Species,
    pub age: u64,
    pub growth: f64,
}

/// Outcome of one full-grid tick
#[derive(Debug, Clone)]
pub struct TickReport {
    pub state: SimulationState,
    pub withered: Vec<WitheredPlant>,
}

/// Runs ticks over snapshots using a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    config: SimulationConfig,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// A fresh default state for this configuration.
    pub fn initial_state(&self) -> SimulationState {
        SimulationState::new(&self.config.grid)
    }

    /// Compute the next snapshot from `state`.
    ///
    /// The environment is stepped once and shared by every cell. Neighbor
    /// counts are read from the pre-tick grid, so the result does not depend
    /// on cell visiting order.
    pub fn tick(&self, state: &SimulationState) -> TickReport {
        let environment = environment::step(&state.environment, &self.config.climate);
        let mut withered = Vec::new();

        let grid = state.grid.map_cells(|pos, cell| {
            let Some(plant) = cell.plant() else {
                return cell.clone();
            };

            let neighbors = state.grid.neighbor_count(pos);
            match plant::step(plant, cell.soil, &environment, neighbors, &self.config.growth) {
                GrowthOutcome::Growing(next) => {
                    trace!(
                        tick = state.tick + 1,
                        row = pos.row,
                        col = pos.col,
                        health = next.health,
                        growth = next.growth,
                        "Plant stepped"
                    );
                    Cell {
                        soil: cell.soil,
                        occupant: Occupant::Occupied(next),
                    }
                }
                GrowthOutcome::Withered(last) => {
                    debug!(
                        tick = state.tick + 1,
                        row = pos.row,
                        col = pos.col,
                        species = %last.species,
                        age = last.age,
                        "Plant withered"
                    );
                    withered.push(WitheredPlant {
                        pos,
                        species: last.species,
                        age: last.age,
                        growth: last.growth,
                    });
                    Cell::empty(cell.soil)
                }
            }
        });

        TickReport {
            state: SimulationState {
                grid,
                environment,
                tick: state.tick + 1,
                speed: state.speed,
            },
            withered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenhouse_core::GrowthConfig;

    fn sim() -> Simulation {
        Simulation::new(SimulationConfig::default())
    }

    #[test]
    fn test_default_state() {
        let state = sim().initial_state();
        assert_eq!(state.tick, 0);
        assert_eq!(state.speed, SimSpeed::Normal);
        assert_eq!(state.environment, Environment::default());
        assert_eq!(state.grid.rows(), 6);
        assert_eq!(state.grid.cols(), 8);
        assert_eq!(state.grid.plant_count(), 0);
        assert!(state.validate(&GridConfig::default()).is_ok());
    }

    #[test]
    fn test_place_plant() {
        let sim = sim();
        let mut state = sim.initial_state();
        state.tick = 12;

        state
            .place_plant(CellPos::new(1, 2), Species::Pepper, sim.config())
            .unwrap();
        let plant = state.cell(CellPos::new(1, 2)).unwrap().plant().unwrap();
        assert_eq!(plant.species, Species::Pepper);
        assert_eq!(plant.health, 80.0);
        assert_eq!(plant.planted_at_tick, 12);
    }

    #[test]
    fn test_place_plant_rejections_leave_state_untouched() {
        let sim = sim();
        let mut state = sim.initial_state();
        state
            .place_plant(CellPos::new(0, 0), Species::Tomato, sim.config())
            .unwrap();
        let before = state.clone();

        let occupied = state.place_plant(CellPos::new(0, 0), Species::Basil, sim.config());
        assert!(matches!(occupied, Err(Error::CellOccupied { row: 0, col: 0 })));

        let outside = state.place_plant(CellPos::new(6, 0), Species::Basil, sim.config());
        assert!(matches!(outside, Err(Error::OutOfBounds { .. })));

        assert_eq!(state, before);
    }

    #[test]
    fn test_remove_plant() {
        let sim = sim();
        let mut state = sim.initial_state();
        state
            .place_plant(CellPos::new(2, 2), Species::Carrot, sim.config())
            .unwrap();

        let removed = state.remove_plant(CellPos::new(2, 2)).unwrap();
        assert_eq!(removed.map(|p| p.species), Some(Species::Carrot));
        assert_eq!(state.remove_plant(CellPos::new(2, 2)).unwrap(), None);
        assert!(state.remove_plant(CellPos::new(0, 9)).is_err());
    }

    #[test]
    fn test_set_soil_is_idempotent() {
        let mut once = sim().initial_state();
        once.set_soil(CellPos::new(3, 3), SoilProfile::Chalky).unwrap();

        let mut twice = once.clone();
        twice.set_soil(CellPos::new(3, 3), SoilProfile::Chalky).unwrap();

        assert_eq!(once, twice);
        assert_eq!(once.cell(CellPos::new(3, 3)).unwrap().soil, SoilProfile::Chalky);
    }

    #[test]
    fn test_tick_grows_tomato() {
        let sim = sim();
        let mut state = sim.initial_state();
        state
            .place_plant(CellPos::new(0, 0), Species::Tomato, sim.config())
            .unwrap();

        let report = sim.tick(&state);
        assert_eq!(report.state.tick, 1);
        assert!(report.withered.is_empty());
        assert_eq!(report.state.environment.moisture, 59.5);

        // The tick reads the stepped environment: moisture 59.5 is still in range.
        let plant = report.state.cell(CellPos::new(0, 0)).unwrap().plant().unwrap();
        assert!((plant.health - 82.0).abs() < 1e-9);
        assert!((plant.growth - 0.656).abs() < 1e-9);
        assert_eq!(plant.age, 1);
    }

    #[test]
    fn test_tick_uses_pre_tick_neighbors() {
        let sim = sim();
        let mut state = sim.initial_state();
        state.environment.moisture = 90.0;
        state.environment.light = 30.0;

        // The sunflower at (0, 0) withers this tick. The lettuce at (1, 1)
        // must still be scored with both sunflowers as neighbors.
        state
            .place_plant(CellPos::new(0, 0), Species::Sunflower, sim.config())
            .unwrap();
        state
            .place_plant(CellPos::new(0, 2), Species::Sunflower, sim.config())
            .unwrap();
        state
            .place_plant(CellPos::new(1, 1), Species::Lettuce, sim.config())
            .unwrap();
        state.grid.get_mut(CellPos::new(0, 0)).unwrap().occupant =
            Occupant::Occupied(PlantInstance {
                health: 0.5,
                ..PlantInstance::new(Species::Sunflower, 0, &GrowthConfig::default())
            });

        let report = sim.tick(&state);
        assert_eq!(report.withered.len(), 1);
        assert_eq!(report.withered[0].pos, CellPos::new(0, 0));
        assert_eq!(report.withered[0].species, Species::Sunflower);
        assert!(report.state.cell(CellPos::new(0, 0)).unwrap().plant().is_none());

        let lettuce = state.cell(CellPos::new(1, 1)).unwrap().plant().unwrap();
        let expected = plant::step(
            lettuce,
            SoilProfile::Loam,
            &report.state.environment,
            2,
            &sim.config().growth,
        );
        let actual = report.state.cell(CellPos::new(1, 1)).unwrap().plant().unwrap();
        assert_eq!(expected, GrowthOutcome::Growing(actual.clone()));
        assert!(actual.health < 80.0);

        // Original snapshot untouched.
        assert_eq!(state.grid.plant_count(), 3);
        assert_eq!(state.tick, 0);
    }

    #[test]
    fn test_hostile_conditions_remove_plant_at_tick_17() {
        let config = SimulationConfig {
            growth: GrowthConfig {
                soil_bonus_weight: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let sim = Simulation::new(config);
        let mut state = sim.initial_state();
        state.environment.temperature = 45.0;
        state.environment.moisture = 0.0;
        state.environment.light = 0.0;
        state
            .place_plant(CellPos::new(3, 4), Species::Tomato, sim.config())
            .unwrap();

        for _ in 0..16 {
            let report = sim.tick(&state);
            assert!(report.withered.is_empty());
            state = report.state;
        }
        assert!(state.cell(CellPos::new(3, 4)).unwrap().plant().is_some());

        let report = sim.tick(&state);
        assert_eq!(report.state.tick, 17);
        assert_eq!(report.withered.len(), 1);
        assert_eq!(report.withered[0].age, 17);
        assert_eq!(report.state.grid.plant_count(), 0);
    }

    #[test]
    fn test_tick_preserves_speed_and_soil() {
        let sim = sim();
        let mut state = sim.initial_state();
        state.set_speed(SimSpeed::Fast);
        state.set_all_soil(SoilProfile::Silty);

        let next = sim.tick(&state).state;
        assert_eq!(next.speed, SimSpeed::Fast);
        assert!(next.grid.iter().all(|(_, c)| c.soil == SoilProfile::Silty));
    }

    #[test]
    fn test_validate_rejects_mismatched_grid() {
        let state = SimulationState::new(&GridConfig {
            rows: 4,
            cols: 4,
            ..Default::default()
        });
        assert!(matches!(
            state.validate(&GridConfig::default()),
            Err(Error::IncompatibleState(_))
        ));
    }

    #[test]
    fn test_state_json_shape() {
        let sim = sim();
        let mut state = sim.initial_state();
        state
            .place_plant(CellPos::new(0, 0), Species::Sunflower, sim.config())
            .unwrap();

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["speed"], 1);
        assert_eq!(json["grid"]["cells"][0]["occupant"]["occupied"]["species"], "sunflower");
        assert_eq!(json["grid"]["cells"][1]["occupant"], "empty");
        assert_eq!(json["grid"]["cells"][1]["soil"], "loam");
    }
}
