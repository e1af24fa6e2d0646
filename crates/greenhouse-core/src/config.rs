//! Configuration types for the simulation.

use crate::error::Result;
use crate::types::SoilProfile;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Grid layout parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of rows in the greenhouse grid
    pub rows: usize,
    /// Number of columns in the greenhouse grid
    pub cols: usize,
    /// Soil laid down in every cell of a fresh grid
    pub default_soil: SoilProfile,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 6,
            cols: 8,
            default_soil: SoilProfile::Loam,
        }
    }
}

/// Plant growth and health constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Health of a freshly placed plant
    pub initial_health: f64,
    /// Weight of soil nutrient level in the soil bonus
    pub nutrient_weight: f64,
    /// Weight of soil water retention in the soil bonus
    pub retention_weight: f64,
    /// Share of the soil bonus added to the condition score
    pub soil_bonus_weight: f64,
    /// Condition above which health recovers, below which it decays
    pub health_threshold: f64,
    /// Health gained per unit of condition above the threshold
    pub recovery_rate: f64,
    /// Health lost per unit of condition below the threshold
    pub decay_rate: f64,
    /// Growth is frozen at or below this health
    pub growth_health_floor: f64,
    /// Plants below this health count as stressed
    pub stress_threshold: f64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            initial_health: 80.0,
            nutrient_weight: 0.3,
            retention_weight: 0.2,
            soil_bonus_weight: 0.2,
            health_threshold: 0.6,
            recovery_rate: 5.0,
            decay_rate: 8.0,
            growth_health_floor: 20.0,
            stress_threshold: 50.0,
        }
    }
}

/// Irrigation and ventilation constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateConfig {
    /// Moisture gained per tick per point of irrigation intensity
    pub irrigation_factor: f64,
    /// Moisture lost per tick with irrigation off
    pub drying_rate: f64,
    /// Temperature ventilation pulls toward, °C
    pub ventilation_setpoint: f64,
    /// Fraction of the deviation removed per tick per point of fan speed
    pub ventilation_factor: f64,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            irrigation_factor: 0.05,
            drying_rate: 0.5,
            ventilation_setpoint: 22.0,
            ventilation_factor: 0.003,
        }
    }
}

/// Everything the per-tick models need
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub grid: GridConfig,
    pub growth: GrowthConfig,
    pub climate: ClimateConfig,
}

/// Session host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Where the state record is kept
    pub state_path: PathBuf,
    /// Write the state record after every tick and command
    pub persist_state: bool,
    /// Tick interval at 1x speed (milliseconds)
    pub base_tick_interval_ms: u64,
    /// Emit statistics every this many ticks (0 disables)
    pub metrics_interval_ticks: u64,
    /// OpenTelemetry endpoint
    pub otel_endpoint: Option<String>,
    /// Simulation models
    pub simulation: SimulationConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("./data/greenhouse-state.json"),
            persist_state: true,
            base_tick_interval_ms: 1000,
            metrics_interval_ticks: 100,
            otel_endpoint: None,
            simulation: SimulationConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Read a JSON config file; missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Load from the file named by `GREENHOUSE_CONFIG`, or use defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os("GREENHOUSE_CONFIG") {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn base_tick_interval(&self) -> Duration {
        Duration::from_millis(self.base_tick_interval_ms)
    }
}
