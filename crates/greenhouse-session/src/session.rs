//! Owned simulation session: current state, mutation commands, tick timer.

use crate::command::Command;
use crate::persistence::{PersistenceHandle, StateStore};
use crate::scheduler::TickTimer;
use greenhouse_core::{
    CellPos, EnvironmentUpdate, Result, SessionConfig, SessionId, SimSpeed, SoilProfile, Species,
};
use greenhouse_world::{GreenhouseStats, Simulation, SimulationState, TickReport, WitheredPlant};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// State shared between the session handle and its timer task
pub(crate) struct SessionInner {
    id: SessionId,
    simulation: Simulation,
    state: RwLock<Arc<SimulationState>>,
    publisher: watch::Sender<Arc<SimulationState>>,
    persistence: Option<PersistenceHandle>,
    metrics_interval_ticks: u64,
}

impl SessionInner {
    pub(crate) fn id(&self) -> SessionId {
        self.id
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<SimulationState>> {
        self.publisher.subscribe()
    }

    fn snapshot(&self) -> Arc<SimulationState> {
        self.state.read().clone()
    }

    /// Hand a committed snapshot to subscribers and the writer. Called with
    /// the state lock held so publication order matches commit order.
    fn publish(&self, next: &Arc<SimulationState>) {
        self.publisher.send_replace(next.clone());
        if let Some(persistence) = &self.persistence {
            persistence.save(next.clone());
        }
    }

    /// Apply `f` to a copy of the current state and commit it, or leave the
    /// state untouched if `f` rejects the change.
    fn mutate(
        &self,
        f: impl FnOnce(&mut SimulationState) -> Result<()>,
    ) -> Result<Arc<SimulationState>> {
        let mut current = self.state.write();
        let mut next = SimulationState::clone(&current);

        if let Err(e) = f(&mut next) {
            debug!(session_id = %self.id, error = %e, "Command rejected");
            return Err(e);
        }

        let next = Arc::new(next);
        *current = next.clone();
        self.publish(&next);
        Ok(next)
    }

    /// Run one tick against the current snapshot and commit the result.
    pub(crate) fn tick(&self) -> Arc<SimulationState> {
        let (next, withered) = {
            let mut current = self.state.write();
            let TickReport { state, withered } = self.simulation.tick(&current);
            let next = Arc::new(state);
            *current = next.clone();
            self.publish(&next);
            (next, withered)
        };

        for plant in &withered {
            self.record_withered(next.tick, plant);
        }

        if self.metrics_interval_ticks > 0 && next.tick % self.metrics_interval_ticks == 0 {
            self.emit_metrics(&next);
        }

        next
    }

    fn record_withered(&self, tick: u64, plant: &WitheredPlant) {
        info!(
            event = "plant_withered",
            session_id = %self.id,
            tick = tick,
            row = plant.pos.row,
            col = plant.pos.col,
            species = %plant.species,
            age = plant.age,
            final_growth = plant.growth,
            "Plant withered and was removed"
        );
        crate::record_counter!(
            "plants_withered",
            1,
            species = tracing::field::display(plant.species)
        );
    }

    fn emit_metrics(&self, state: &SimulationState) {
        let stats = state.stats(self.simulation.config());

        info!(
            event = "greenhouse_metrics",
            session_id = %self.id,
            tick = state.tick,
            total_plants = stats.total_plants,
            average_health = stats.average_health,
            average_growth = stats.average_growth,
            stressed = stats.stressed,
            mature = stats.mature,
            temperature = state.environment.temperature,
            moisture = state.environment.moisture,
            "Greenhouse metrics snapshot"
        );

        crate::record_gauge!("plants_total", stats.total_plants, tick = state.tick);
        crate::record_gauge!("average_health", stats.average_health, tick = state.tick);
        crate::record_gauge!("moisture", state.environment.moisture, tick = state.tick);

        if stats.stressed > 0 {
            warn!(
                session_id = %self.id,
                tick = state.tick,
                stressed = stats.stressed,
                "Plants are stressed; conditions need adjusting"
            );
        }
    }
}

/// A running greenhouse simulation.
///
/// Every committed change produces a new immutable snapshot that is
/// published to subscribers and, when persistence is enabled, queued for
/// writing. Commands return the committed snapshot or the rejection.
pub struct Session {
    inner: Arc<SessionInner>,
    timer: Option<TickTimer>,
}

impl Session {
    /// Restore the persisted state (or start fresh) and start ticking.
    /// Must be called inside a tokio runtime.
    pub async fn open(config: SessionConfig) -> Self {
        let simulation = Simulation::new(config.simulation.clone());

        let (state, persistence) = if config.persist_state {
            let store = StateStore::new(&config.state_path);
            let state = store.load_or_default(&config.simulation.grid).await;
            (state, Some(PersistenceHandle::spawn(store)))
        } else {
            (simulation.initial_state(), None)
        };

        let id = SessionId::new();
        info!(
            session_id = %id,
            tick = state.tick,
            speed = %state.speed,
            plants = state.grid.plant_count(),
            persist = config.persist_state,
            "Opening greenhouse session"
        );

        let state = Arc::new(state);
        let (publisher, _) = watch::channel(state.clone());
        let inner = Arc::new(SessionInner {
            id,
            simulation,
            state: RwLock::new(state),
            publisher,
            persistence,
            metrics_interval_ticks: config.metrics_interval_ticks,
        });

        let timer = TickTimer::spawn(inner.clone(), config.base_tick_interval());

        Self {
            inner,
            timer: Some(timer),
        }
    }

    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    /// Latest committed snapshot
    pub fn state(&self) -> Arc<SimulationState> {
        self.inner.snapshot()
    }

    /// Receive every snapshot committed from now on
    pub fn subscribe(&self) -> watch::Receiver<Arc<SimulationState>> {
        self.inner.subscribe()
    }

    pub fn stats(&self) -> GreenhouseStats {
        self.state().stats(self.inner.simulation.config())
    }

    #[instrument(skip(self), fields(session_id = %self.id()))]
    pub fn place_plant(&self, row: usize, col: usize, species: Species) -> Result<Arc<SimulationState>> {
        let config = self.inner.simulation.config();
        self.inner
            .mutate(|state| state.place_plant(CellPos::new(row, col), species, config))
    }

    #[instrument(skip(self), fields(session_id = %self.id()))]
    pub fn remove_plant(&self, row: usize, col: usize) -> Result<Arc<SimulationState>> {
        self.inner
            .mutate(|state| state.remove_plant(CellPos::new(row, col)).map(|_| ()))
    }

    #[instrument(skip(self), fields(session_id = %self.id()))]
    pub fn set_soil(&self, row: usize, col: usize, soil: SoilProfile) -> Result<Arc<SimulationState>> {
        self.inner
            .mutate(|state| state.set_soil(CellPos::new(row, col), soil))
    }

    #[instrument(skip(self), fields(session_id = %self.id()))]
    pub fn set_all_soil(&self, soil: SoilProfile) -> Result<Arc<SimulationState>> {
        self.inner.mutate(|state| {
            state.set_all_soil(soil);
            Ok(())
        })
    }

    /// Merge ambient/actuator fields; they take effect from the next tick.
    #[instrument(skip(self), fields(session_id = %self.id()))]
    pub fn update_environment(&self, update: EnvironmentUpdate) -> Result<Arc<SimulationState>> {
        self.inner.mutate(|state| {
            state.update_environment(&update);
            Ok(())
        })
    }

    /// Change cadence. The timer drops any pending tick and reschedules.
    #[instrument(skip(self), fields(session_id = %self.id()))]
    pub fn set_speed(&self, speed: SimSpeed) -> Result<Arc<SimulationState>> {
        self.inner.mutate(|state| {
            state.set_speed(speed);
            Ok(())
        })
    }

    /// Discard the current state for a fresh default one and clear the
    /// persisted record.
    #[instrument(skip(self), fields(session_id = %self.id()))]
    pub fn reset(&self) -> Arc<SimulationState> {
        let fresh = Arc::new(self.inner.simulation.initial_state());
        {
            let mut current = self.inner.state.write();
            *current = fresh.clone();
            self.inner.publisher.send_replace(fresh.clone());
            if let Some(persistence) = &self.inner.persistence {
                persistence.clear();
            }
        }
        info!(session_id = %self.id(), "Greenhouse reset");
        fresh
    }

    /// Advance one tick immediately, whatever the speed.
    pub fn step(&self) -> Arc<SimulationState> {
        self.inner.tick()
    }

    /// Dispatch a serialized command.
    pub fn apply(&self, command: Command) -> Result<Arc<SimulationState>> {
        match command {
            Command::PlacePlant { row, col, species } => self.place_plant(row, col, species),
            Command::RemovePlant { row, col } => self.remove_plant(row, col),
            Command::SetSoil { row, col, soil } => self.set_soil(row, col, soil),
            Command::SetAllSoil { soil } => self.set_all_soil(soil),
            Command::UpdateEnvironment(update) => self.update_environment(update),
            Command::SetSpeed { speed } => self.set_speed(speed),
            Command::Reset => Ok(self.reset()),
        }
    }

    /// Wait for every queued persistence write to land.
    pub async fn flush(&self) {
        if let Some(persistence) = &self.inner.persistence {
            if let Err(e) = persistence.flush().await {
                warn!(session_id = %self.id(), error = %e, "Pending state writes were lost");
            }
        }
    }

    /// Stop ticking and flush pending writes. No state changes after this.
    pub async fn shutdown(mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop().await;
        }
        self.flush().await;

        let state = self.state();
        info!(
            session_id = %self.id(),
            tick = state.tick,
            plants = state.grid.plant_count(),
            "Session shut down"
        );
    }
}
