//! Real-time cadence for session ticks.
//!
//! One task owns the timer. It follows the speed of the published state:
//! paused sessions wait without a timer, and any speed change drops the
//! pending deadline and starts a fresh interval from the moment of change.

use crate::session::SessionInner;
use greenhouse_core::SimSpeed;
use greenhouse_world::SimulationState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Handle to the running tick timer
#[derive(Debug)]
pub(crate) struct TickTimer {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TickTimer {
    pub(crate) fn spawn(inner: Arc<SessionInner>, base_interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let updates = inner.subscribe();
        let handle = tokio::spawn(run_timer(inner, updates, base_interval, cancel.clone()));
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Stop the timer and wait for the task to exit. No tick runs after this returns.
    pub(crate) async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TickTimer {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

fn schedule(speed: SimSpeed, base: Duration) -> Option<Interval> {
    speed.tick_interval(base).map(|period| {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    })
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn run_timer(
    inner: Arc<SessionInner>,
    mut updates: watch::Receiver<Arc<SimulationState>>,
    base: Duration,
    cancel: CancellationToken,
) {
    let mut speed = updates.borrow_and_update().speed;
    let mut ticker = schedule(speed, base);
    info!(session_id = %inner.id(), %speed, "Tick timer started");

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = updates.borrow_and_update().speed;
                if latest != speed {
                    debug!(session_id = %inner.id(), from = %speed, to = %latest, "Rescheduling ticks");
                    speed = latest;
                    ticker = schedule(speed, base);
                }
            }

            _ = next_tick(&mut ticker) => {
                inner.tick();
            }
        }
    }

    info!(session_id = %inner.id(), "Tick timer stopped");
}
