//! Durable state record and the background writer that keeps it current.

use greenhouse_core::{Error, GridConfig, Result};
use greenhouse_world::SimulationState;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Version of the persisted record layout
pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct PersistedStateRef<'a> {
    version: u32,
    saved_at: i64,
    state: &'a SimulationState,
}

#[derive(Debug, Deserialize)]
struct PersistedState {
    version: u32,
    saved_at: i64,
    state: SimulationState,
}

/// JSON file holding the latest simulation snapshot
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `state`, replacing any previous record.
    pub async fn save(&self, state: &SimulationState) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }

        let record = PersistedStateRef {
            version: STATE_VERSION,
            saved_at: chrono::Utc::now().timestamp_millis(),
            state,
        };
        let bytes = serde_json::to_vec(&record)?;

        // Rename over the old record so a torn write never replaces it.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &self.path).await?;

        debug!(tick = state.tick, path = ?self.path, "State saved");
        Ok(())
    }

    /// Read and validate the stored record.
    pub async fn try_load(&self, config: &GridConfig) -> Result<SimulationState> {
        let bytes = fs::read(&self.path).await?;
        let record: PersistedState = serde_json::from_slice(&bytes)?;

        if record.version != STATE_VERSION {
            return Err(Error::IncompatibleState(format!(
                "record version {} (expected {})",
                record.version, STATE_VERSION
            )));
        }
        record.state.validate(config)?;

        info!(
            tick = record.state.tick,
            saved_at = record.saved_at,
            plants = record.state.grid.plant_count(),
            "Restored persisted state"
        );
        Ok(record.state)
    }

    /// Stored state if present and usable. Anything else is logged and dropped.
    pub async fn load(&self, config: &GridConfig) -> Option<SimulationState> {
        match self.try_load(config).await {
            Ok(state) => Some(state),
            Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!(path = ?self.path, "No persisted state");
                None
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Discarding unusable persisted state");
                None
            }
        }
    }

    /// Stored state, or a fresh default one.
    pub async fn load_or_default(&self, config: &GridConfig) -> SimulationState {
        match self.load(config).await {
            Some(state) => state,
            None => SimulationState::new(config),
        }
    }

    /// Delete the stored record. A missing record is not an error.
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = ?self.path, "Persisted state cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

enum PersistRequest {
    Save(Arc<SimulationState>),
    Clear,
    Flush(oneshot::Sender<()>),
}

/// Non-blocking front end of the writer task
#[derive(Debug, Clone)]
pub struct PersistenceHandle {
    tx: mpsc::UnboundedSender<PersistRequest>,
}

impl std::fmt::Debug for PersistRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistRequest::Save(state) => write!(f, "Save(tick {})", state.tick),
            PersistRequest::Clear => f.write_str("Clear"),
            PersistRequest::Flush(_) => f.write_str("Flush"),
        }
    }
}

impl PersistenceHandle {
    /// Spawn the writer task for `store`. Must be called inside a tokio runtime.
    pub fn spawn(store: StateStore) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(store, rx));
        Self { tx }
    }

    pub fn save(&self, state: Arc<SimulationState>) {
        self.send(PersistRequest::Save(state));
    }

    pub fn clear(&self) {
        self.send(PersistRequest::Clear);
    }

    /// Wait until every request queued before this call has been handled.
    pub async fn flush(&self) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(PersistRequest::Flush(done_tx));
        done_rx.await.map_err(|_| Error::Shutdown)
    }

    fn send(&self, request: PersistRequest) {
        if let Err(e) = self.tx.send(request) {
            warn!(request = ?e.0, "State writer has stopped; request dropped");
        }
    }
}

async fn run_writer(store: StateStore, mut rx: mpsc::UnboundedReceiver<PersistRequest>) {
    while let Some(first) = rx.recv().await {
        let mut next = Some(first);

        while let Some(request) = next.take() {
            match request {
                PersistRequest::Save(mut latest) => {
                    // Only the newest of a run of queued saves needs writing.
                    loop {
                        match rx.try_recv() {
                            Ok(PersistRequest::Save(newer)) => latest = newer,
                            Ok(other) => {
                                next = Some(other);
                                break;
                            }
                            Err(_) => break,
                        }
                    }
                    if let Err(e) = store.save(&latest).await {
                        warn!(tick = latest.tick, error = %e, "Failed to persist state");
                    }
                }
                PersistRequest::Clear => {
                    if let Err(e) = store.clear().await {
                        warn!(error = %e, "Failed to clear persisted state");
                    }
                }
                PersistRequest::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
    }

    debug!("State writer stopped");
}
