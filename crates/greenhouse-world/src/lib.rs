//! Greenhouse world simulation engine.
//!
//! This module implements the cell grid, the ambient environment model, the
//! per-plant growth model, and the full-grid tick that combines them.

pub mod environment;
pub mod grid;
pub mod plant;
pub mod simulation;
pub mod stats;

pub use grid::{Cell, Grid, Occupant};
pub use plant::{Assessment, GrowthOutcome, GrowthStage, HealthBand, PlantInstance};
pub use simulation::{Simulation, SimulationState, TickReport, WitheredPlant};
pub use stats::GreenhouseStats;
