//! Headless greenhouse runner.
//!
//! Reads one JSON command per line on stdin and writes every committed
//! snapshot as a JSON line on stdout. Logs go to stderr.

use anyhow::{Context, Result};
use greenhouse_core::SessionConfig;
use greenhouse_session::{telemetry, Command, Session};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = SessionConfig::from_env().context("failed to load configuration")?;

    telemetry::init_telemetry(config.otel_endpoint.as_deref())?;

    info!(
        state_path = ?config.state_path,
        persist = config.persist_state,
        rows = config.simulation.grid.rows,
        cols = config.simulation.grid.cols,
        "Starting greenhouse"
    );

    let session = Session::open(config).await;

    let mut updates = session.subscribe();
    let printer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while updates.changed().await.is_ok() {
            let encoded = serde_json::to_vec(&**updates.borrow_and_update());
            let line = match encoded {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Failed to encode snapshot");
                    continue;
                }
            };
            if stdout.write_all(&line).await.is_err() || stdout.write_all(b"\n").await.is_err() {
                break;
            }
            let _ = stdout.flush().await;
        }
    });

    tokio::select! {
        result = read_commands(&session) => result?,
        _ = shutdown_signal() => {}
    }

    let stats = session.stats();
    info!(
        tick = session.state().tick,
        total_plants = stats.total_plants,
        average_health = stats.average_health,
        mature = stats.mature,
        "Greenhouse stopping"
    );

    session.shutdown().await;
    printer.abort();

    telemetry::shutdown_telemetry();

    Ok(())
}

/// Apply commands from stdin until it closes, then keep the simulation
/// running until a shutdown signal arrives.
async fn read_commands(session: &Session) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command: Command = match serde_json::from_str(line) {
            Ok(command) => command,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed command");
                continue;
            }
        };

        let name = command.name();
        match session.apply(command) {
            Ok(state) => debug!(command = name, tick = state.tick, "Command applied"),
            Err(e) => warn!(command = name, error = %e, "Command rejected"),
        }
    }

    debug!("Command input closed");
    std::future::pending::<()>().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
