//! Error types for the simulation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Cell ({row}, {col}) is already occupied")]
    CellOccupied { row: usize, col: usize },

    #[error("Invalid speed multiplier: {0} (expected 0, 1, 2, 5 or 10)")]
    InvalidSpeed(u8),

    #[error("Incompatible state: {0}")]
    IncompatibleState(String),

    #[error("Session is shut down")]
    Shutdown,
}

impl Error {
    /// True for rejections of a mutation command that left the state untouched.
    pub fn is_rejected_target(&self) -> bool {
        matches!(self, Error::OutOfBounds { .. } | Error::CellOccupied { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
