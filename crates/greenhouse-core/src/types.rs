//! Core type definitions for the simulation.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Valid temperature span, in °C.
pub const TEMPERATURE_RANGE: (f64, f64) = (10.0, 45.0);

/// Valid span for every percentage field.
pub const PERCENT_RANGE: (f64, f64) = (0.0, 100.0);

/// Unique identifier for a simulation session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Row/column address of a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPos {
    pub row: usize,
    pub col: usize,
}

impl CellPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Offset by a signed delta, or `None` if either coordinate would go negative.
    pub fn offset(&self, dr: isize, dc: isize) -> Option<Self> {
        Some(Self {
            row: self.row.checked_add_signed(dr)?,
            col: self.col.checked_add_signed(dc)?,
        })
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Inclusive optimal span for one ambient quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimalRange {
    pub min: f64,
    pub max: f64,
}

impl OptimalRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Width used for normalizing distances; a zero-width range counts as 1.
    pub fn width(&self) -> f64 {
        let width = self.max - self.min;
        if width == 0.0 {
            1.0
        } else {
            width
        }
    }

    /// Distance from `value` to the nearest edge, zero inside the range.
    pub fn distance(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }
}

/// Fixed physical properties of a soil kind, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilProperties {
    pub name: &'static str,
    pub water_retention: f64,
    pub nutrient_level: f64,
    pub drainage: f64,
}

/// Soil kind of a cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoilProfile {
    Sandy,
    Clay,
    #[default]
    Loam,
    Peat,
    Chalky,
    Silty,
}

impl SoilProfile {
    pub fn all() -> [SoilProfile; 6] {
        [
            SoilProfile::Sandy,
            SoilProfile::Clay,
            SoilProfile::Loam,
            SoilProfile::Peat,
            SoilProfile::Chalky,
            SoilProfile::Silty,
        ]
    }

    pub fn properties(&self) -> SoilProperties {
        let (name, water_retention, nutrient_level, drainage) = match self {
            SoilProfile::Sandy => ("Sandy", 0.2, 0.3, 0.9),
            SoilProfile::Clay => ("Clay", 0.9, 0.7, 0.2),
            SoilProfile::Loam => ("Loam", 0.6, 0.8, 0.5),
            SoilProfile::Peat => ("Peat", 0.85, 0.5, 0.3),
            SoilProfile::Chalky => ("Chalky", 0.3, 0.4, 0.8),
            SoilProfile::Silty => ("Silty", 0.7, 0.65, 0.4),
        };
        SoilProperties {
            name,
            water_retention,
            nutrient_level,
            drainage,
        }
    }
}

impl fmt::Display for SoilProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.properties().name)
    }
}

/// Static growing profile of a species
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesInfo {
    pub name: &'static str,
    pub emoji: &'static str,
    /// Display markers per growth stage, seedling first. Visual only.
    pub stages: [&'static str; 4],
    pub optimal_temp: OptimalRange,
    pub optimal_moisture: OptimalRange,
    pub optimal_light: OptimalRange,
    pub growth_rate: f64,
    pub max_growth: f64,
}

const TOMATO: SpeciesInfo = SpeciesInfo {
    name: "Tomato",
    emoji: "🍅",
    stages: ["🌱", "🌿", "🪴", "🍅"],
    optimal_temp: OptimalRange::new(20.0, 30.0),
    optimal_moisture: OptimalRange::new(50.0, 75.0),
    optimal_light: OptimalRange::new(60.0, 90.0),
    growth_rate: 0.8,
    max_growth: 100.0,
};

const LETTUCE: SpeciesInfo = SpeciesInfo {
    name: "Lettuce",
    emoji: "🥬",
    stages: ["🌱", "🌿", "🥬", "🥬"],
    optimal_temp: OptimalRange::new(15.0, 22.0),
    optimal_moisture: OptimalRange::new(60.0, 80.0),
    optimal_light: OptimalRange::new(40.0, 70.0),
    growth_rate: 1.2,
    max_growth: 100.0,
};

const CUCUMBER: SpeciesInfo = SpeciesInfo {
    name: "Cucumber",
    emoji: "🥒",
    stages: ["🌱", "🌿", "🪴", "🥒"],
    optimal_temp: OptimalRange::new(22.0, 32.0),
    optimal_moisture: OptimalRange::new(55.0, 80.0),
    optimal_light: OptimalRange::new(55.0, 85.0),
    growth_rate: 0.9,
    max_growth: 100.0,
};

const PEPPER: SpeciesInfo = SpeciesInfo {
    name: "Pepper",
    emoji: "🌶️",
    stages: ["🌱", "🌿", "🪴", "🌶️"],
    optimal_temp: OptimalRange::new(20.0, 35.0),
    optimal_moisture: OptimalRange::new(40.0, 70.0),
    optimal_light: OptimalRange::new(60.0, 95.0),
    growth_rate: 0.7,
    max_growth: 100.0,
};

const BASIL: SpeciesInfo = SpeciesInfo {
    name: "Basil",
    emoji: "🌿",
    stages: ["🌱", "🌿", "🌿", "🌿"],
    optimal_temp: OptimalRange::new(20.0, 30.0),
    optimal_moisture: OptimalRange::new(40.0, 65.0),
    optimal_light: OptimalRange::new(50.0, 80.0),
    growth_rate: 1.5,
    max_growth: 100.0,
};

const SUNFLOWER: SpeciesInfo = SpeciesInfo {
    name: "Sunflower",
    emoji: "🌻",
    stages: ["🌱", "🌿", "🌾", "🌻"],
    optimal_temp: OptimalRange::new(18.0, 30.0),
    optimal_moisture: OptimalRange::new(35.0, 60.0),
    optimal_light: OptimalRange::new(70.0, 100.0),
    growth_rate: 0.6,
    max_growth: 100.0,
};

const STRAWBERRY: SpeciesInfo = SpeciesInfo {
    name: "Strawberry",
    emoji: "🍓",
    stages: ["🌱", "🌿", "🌸", "🍓"],
    optimal_temp: OptimalRange::new(15.0, 26.0),
    optimal_moisture: OptimalRange::new(55.0, 75.0),
    optimal_light: OptimalRange::new(50.0, 80.0),
    growth_rate: 1.0,
    max_growth: 100.0,
};

const CARROT: SpeciesInfo = SpeciesInfo {
    name: "Carrot",
    emoji: "🥕",
    stages: ["🌱", "🌿", "🌿", "🥕"],
    optimal_temp: OptimalRange::new(15.0, 24.0),
    optimal_moisture: OptimalRange::new(50.0, 70.0),
    optimal_light: OptimalRange::new(45.0, 75.0),
    growth_rate: 0.85,
    max_growth: 100.0,
};

/// Plant kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Tomato,
    Lettuce,
    Cucumber,
    Pepper,
    Basil,
    Sunflower,
    Strawberry,
    Carrot,
}

impl Species {
    pub fn all() -> [Species; 8] {
        [
            Species::Tomato,
            Species::Lettuce,
            Species::Cucumber,
            Species::Pepper,
            Species::Basil,
            Species::Sunflower,
            Species::Strawberry,
            Species::Carrot,
        ]
    }

    pub fn info(&self) -> &'static SpeciesInfo {
        match self {
            Species::Tomato => &TOMATO,
            Species::Lettuce => &LETTUCE,
            Species::Cucumber => &CUCUMBER,
            Species::Pepper => &PEPPER,
            Species::Basil => &BASIL,
            Species::Sunflower => &SUNFLOWER,
            Species::Strawberry => &STRAWBERRY,
            Species::Carrot => &CARROT,
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name)
    }
}

/// Shared ambient conditions and actuator settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// °C, within [`TEMPERATURE_RANGE`]
    pub temperature: f64,
    /// Soil/air moisture, %
    pub moisture: f64,
    /// Light level, %
    pub light: f64,
    pub irrigation_on: bool,
    pub irrigation_intensity: f64,
    pub ventilation_on: bool,
    pub ventilation_speed: f64,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            temperature: 24.0,
            moisture: 60.0,
            light: 70.0,
            irrigation_on: false,
            irrigation_intensity: 50.0,
            ventilation_on: false,
            ventilation_speed: 50.0,
        }
    }
}

impl Environment {
    /// Merge the fields present in `update`, clamping each to its valid span.
    /// Non-finite values are ignored.
    pub fn apply(&mut self, update: &EnvironmentUpdate) {
        fn merge(target: &mut f64, value: Option<f64>, (lo, hi): (f64, f64)) {
            if let Some(v) = value.filter(|v| v.is_finite()) {
                *target = v.clamp(lo, hi);
            }
        }

        merge(&mut self.temperature, update.temperature, TEMPERATURE_RANGE);
        merge(&mut self.moisture, update.moisture, PERCENT_RANGE);
        merge(&mut self.light, update.light, PERCENT_RANGE);
        merge(&mut self.irrigation_intensity, update.irrigation_intensity, PERCENT_RANGE);
        merge(&mut self.ventilation_speed, update.ventilation_speed, PERCENT_RANGE);

        if let Some(on) = update.irrigation_on {
            self.irrigation_on = on;
        }
        if let Some(on) = update.ventilation_on {
            self.ventilation_on = on;
        }
    }

    /// Check every numeric field is finite and within its span.
    pub fn is_valid(&self) -> bool {
        let within = |v: f64, (lo, hi): (f64, f64)| v.is_finite() && v >= lo && v <= hi;
        within(self.temperature, TEMPERATURE_RANGE)
            && within(self.moisture, PERCENT_RANGE)
            && within(self.light, PERCENT_RANGE)
            && within(self.irrigation_intensity, PERCENT_RANGE)
            && within(self.ventilation_speed, PERCENT_RANGE)
    }
}

/// Partial environment change; absent fields are left as they are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentUpdate {
    pub temperature: Option<f64>,
    pub moisture: Option<f64>,
    pub light: Option<f64>,
    pub irrigation_on: Option<bool>,
    pub irrigation_intensity: Option<f64>,
    pub ventilation_on: Option<bool>,
    pub ventilation_speed: Option<f64>,
}

/// Ticks-per-second multiplier. `Paused` suspends ticking entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SimSpeed {
    Paused,
    #[default]
    Normal,
    Double,
    Fast,
    Fastest,
}

impl SimSpeed {
    pub fn multiplier(&self) -> u8 {
        match self {
            SimSpeed::Paused => 0,
            SimSpeed::Normal => 1,
            SimSpeed::Double => 2,
            SimSpeed::Fast => 5,
            SimSpeed::Fastest => 10,
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, SimSpeed::Paused)
    }

    /// Real-time gap between ticks, or `None` while paused.
    pub fn tick_interval(&self, base: Duration) -> Option<Duration> {
        match self.multiplier() {
            0 => None,
            m => Some(base / u32::from(m)),
        }
    }
}

impl TryFrom<u8> for SimSpeed {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SimSpeed::Paused),
            1 => Ok(SimSpeed::Normal),
            2 => Ok(SimSpeed::Double),
            5 => Ok(SimSpeed::Fast),
            10 => Ok(SimSpeed::Fastest),
            other => Err(Error::InvalidSpeed(other)),
        }
    }
}

impl From<SimSpeed> for u8 {
    fn from(speed: SimSpeed) -> Self {
        speed.multiplier()
    }
}

impl fmt::Display for SimSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.multiplier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_offset() {
        let pos = CellPos::new(0, 3);
        assert_eq!(pos.offset(1, -1), Some(CellPos::new(1, 2)));
        assert_eq!(pos.offset(-1, 0), None);
    }

    #[test]
    fn test_optimal_range_width() {
        assert_eq!(OptimalRange::new(20.0, 30.0).width(), 10.0);
        assert_eq!(OptimalRange::new(5.0, 5.0).width(), 1.0);
    }

    #[test]
    fn test_optimal_range_distance() {
        let range = OptimalRange::new(20.0, 30.0);
        assert_eq!(range.distance(25.0), 0.0);
        assert_eq!(range.distance(15.0), 5.0);
        assert_eq!(range.distance(33.0), 3.0);
    }

    #[test]
    fn test_soil_properties() {
        let loam = SoilProfile::Loam.properties();
        assert_eq!(loam.nutrient_level, 0.8);
        assert_eq!(loam.water_retention, 0.6);

        for soil in SoilProfile::all() {
            let props = soil.properties();
            for v in [props.water_retention, props.nutrient_level, props.drainage] {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_species_catalog() {
        let tomato = Species::Tomato.info();
        assert_eq!(tomato.optimal_temp, OptimalRange::new(20.0, 30.0));
        assert_eq!(tomato.growth_rate, 0.8);

        for species in Species::all() {
            let info = species.info();
            assert_eq!(info.max_growth, 100.0);
            assert!(info.optimal_temp.min <= info.optimal_temp.max);
        }
    }

    #[test]
    fn test_environment_update_merges_and_clamps() {
        let mut env = Environment::default();
        env.apply(&EnvironmentUpdate {
            temperature: Some(80.0),
            moisture: Some(-5.0),
            irrigation_on: Some(true),
            light: Some(f64::NAN),
            ..Default::default()
        });

        assert_eq!(env.temperature, 45.0);
        assert_eq!(env.moisture, 0.0);
        assert_eq!(env.light, 70.0);
        assert!(env.irrigation_on);
        assert!(!env.ventilation_on);
        assert!(env.is_valid());
    }

    #[test]
    fn test_environment_update_from_partial_json() {
        let update: EnvironmentUpdate =
            serde_json::from_str(r#"{"ventilation_on": true, "ventilation_speed": 80}"#).unwrap();
        assert_eq!(update.ventilation_on, Some(true));
        assert_eq!(update.ventilation_speed, Some(80.0));
        assert_eq!(update.temperature, None);
    }

    #[test]
    fn test_speed_conversion() {
        assert_eq!(SimSpeed::try_from(5).unwrap(), SimSpeed::Fast);
        assert!(matches!(SimSpeed::try_from(3), Err(Error::InvalidSpeed(3))));
        assert_eq!(u8::from(SimSpeed::Fastest), 10);
    }

    #[test]
    fn test_speed_interval() {
        let base = Duration::from_millis(1000);
        assert_eq!(SimSpeed::Paused.tick_interval(base), None);
        assert_eq!(SimSpeed::Normal.tick_interval(base), Some(Duration::from_millis(1000)));
        assert_eq!(SimSpeed::Fast.tick_interval(base), Some(Duration::from_millis(200)));
        assert_eq!(SimSpeed::Fastest.tick_interval(base), Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_speed_serializes_as_number() {
        assert_eq!(serde_json::to_string(&SimSpeed::Double).unwrap(), "2");
        let speed: SimSpeed = serde_json::from_str("10").unwrap();
        assert_eq!(speed, SimSpeed::Fastest);
        assert!(serde_json::from_str::<SimSpeed>("7").is_err());
    }
}
