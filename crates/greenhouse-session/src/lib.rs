//! Live greenhouse session: a timer-driven simulation with mutation
//! commands, snapshot publication and a persisted state record.

pub mod command;
pub mod persistence;
mod scheduler;
pub mod session;
pub mod telemetry;

pub use command::Command;
pub use persistence::{PersistenceHandle, StateStore, STATE_VERSION};
pub use session::Session;
