//! Serialized form of session commands, one JSON object per command.

use greenhouse_core::{EnvironmentUpdate, SimSpeed, SoilProfile, Species};
use serde::{Deserialize, Serialize};

/// A mutation request against a [`Session`](crate::Session).
///
/// ```json
/// {"command": "place_plant", "row": 2, "col": 3, "species": "basil"}
/// {"command": "update_environment", "light": 85.0}
/// {"command": "set_speed", "speed": 0}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    PlacePlant { row: usize, col: usize, species: Species },
    RemovePlant { row: usize, col: usize },
    SetSoil { row: usize, col: usize, soil: SoilProfile },
    SetAllSoil { soil: SoilProfile },
    UpdateEnvironment(EnvironmentUpdate),
    SetSpeed { speed: SimSpeed },
    Reset,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::PlacePlant { .. } => "place_plant",
            Command::RemovePlant { .. } => "remove_plant",
            Command::SetSoil { .. } => "set_soil",
            Command::SetAllSoil { .. } => "set_all_soil",
            Command::UpdateEnvironment(_) => "update_environment",
            Command::SetSpeed { .. } => "set_speed",
            Command::Reset => "reset",
        }
    }
}
