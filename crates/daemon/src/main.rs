// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! walrusd
//!
//! Background process that captures the source's replication stream into
//! the log store and serves the control socket.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};
use walrus_core::Config;
use walrus_daemon::lifecycle::{self, Paths};
use walrus_daemon::{ingest, server};

/// How long shutdown waits for in-flight work to drain
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let paths = Paths::for_config(&config);

    let _log_guard = setup_logging(&paths)?;
    info!(state_dir = %paths.state_dir.display(), "starting walrusd");

    let daemon = match lifecycle::startup(config).await {
        Ok(daemon) => daemon,
        Err(e) => {
            error!(error = %e, "failed to start walrusd");
            return Err(e.into());
        }
    };
    let state = Arc::clone(&daemon.state);

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    // The ingest pipeline and request handlers all drain through one tracker
    let tracker = TaskTracker::new();
    tracker.spawn(ingest::run(Arc::clone(&state)));

    info!(socket = %daemon.paths.socket_path.display(), "walrusd ready");
    // Startup handshake for whoever spawned us
    println!("READY");

    loop {
        tokio::select! {
            result = daemon.listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        let state = Arc::clone(&state);
                        tracker.spawn(async move {
                            if let Err(e) = server::handle_connection(state, stream).await {
                                error!(error = %e, "connection handler failed");
                            }
                        });
                    }
                    Err(e) => error!(error = %e, "accept failed"),
                }
            }

            _ = state.shutdown.cancelled() => {
                info!("shutdown requested over the control socket");
                break;
            }

            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }

            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
        }
    }

    // Cancel everything, then wait out the drain budget
    state.shutdown.cancel();
    tracker.close();
    if tokio::time::timeout(DRAIN_TIMEOUT, tracker.wait()).await.is_err() {
        warn!(
            budget_secs = DRAIN_TIMEOUT.as_secs(),
            "tasks did not drain in time; forcing shutdown"
        );
    }

    daemon.cleanup();
    info!("walrusd stopped");
    Ok(())
}

fn setup_logging(
    paths: &Paths,
) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    std::fs::create_dir_all(&paths.state_dir)?;

    let file_appender = tracing_appender::rolling::never(
        &paths.state_dir,
        paths
            .log_path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("walrusd.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
