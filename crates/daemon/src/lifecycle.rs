// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup, shared state, shutdown cleanup.

use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use walrus_core::Config;
use walrus_storage::{
    CheckpointRegistry, LogReader, LogWriter, Navigator, RegistryError, SessionRegistry, WalError,
};

/// Files the daemon owns inside the state directory
#[derive(Debug, Clone)]
pub struct Paths {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub pid_path: PathBuf,
    pub log_path: PathBuf,
}

impl Paths {
    pub fn for_config(config: &Config) -> Self {
        let state_dir = config.state_dir.clone();
        Self {
            socket_path: state_dir.join("walrusd.sock"),
            pid_path: state_dir.join("walrusd.pid"),
            log_path: state_dir.join("walrusd.log"),
            state_dir,
        }
    }
}

/// State shared between the ingest task and the request handlers
pub struct AppState {
    pub config: Config,
    pub log: Arc<LogWriter>,
    pub checkpoints: Arc<CheckpointRegistry>,
    pub sessions: Arc<SessionRegistry>,
    pub navigator: Navigator,
    pub entries_captured: Arc<AtomicU64>,
    pub ingest_connected: Arc<AtomicBool>,
    pub start_time: Instant,
    /// Root cancellation: set on shutdown, observed by every long-lived
    /// task
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Open the storage layer and assemble the shared state. Does not
    /// touch the socket or lock files.
    pub fn build(config: Config) -> Result<Arc<Self>, LifecycleError> {
        let log = Arc::new(LogWriter::open(&config.storage.wal_dir)?);
        let checkpoints = Arc::new(CheckpointRegistry::open(&config.storage.checkpoint_dir)?);
        let sessions = Arc::new(SessionRegistry::open(&config.storage.session_dir)?);
        let navigator = Navigator::new(
            LogReader::open(&config.storage.wal_dir),
            Arc::clone(&checkpoints),
        );

        info!(
            checkpoints = checkpoints.list(None).len(),
            sessions = sessions.list().len(),
            "loaded catalogs"
        );

        Ok(Arc::new(Self {
            config,
            log,
            checkpoints,
            sessions,
            navigator,
            entries_captured: Arc::new(AtomicU64::new(0)),
            ingest_connected: Arc::new(AtomicBool::new(false)),
            start_time: Instant::now(),
            shutdown: CancellationToken::new(),
        }))
    }

    /// A fresh reader over the log directory
    pub fn log_reader(&self) -> LogReader {
        LogReader::open(&self.config.storage.wal_dir)
    }
}

/// The running daemon: shared state plus the resources only `main` touches
pub struct DaemonState {
    pub state: Arc<AppState>,
    pub listener: UnixListener,
    pub paths: Paths,
    // Held for the exclusive daemon lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("another walrusd holds the lock at {path}")]
    AlreadyRunning { path: PathBuf },

    #[error("bind socket at {path}: {source}")]
    BindFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Wal(#[from] WalError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon: lock, open storage, bind the socket last
pub async fn startup(config: Config) -> Result<DaemonState, LifecycleError> {
    let paths = Paths::for_config(&config);
    std::fs::create_dir_all(&paths.state_dir)?;

    // Exclusive lock first; a second daemon on the same state dir refuses
    let lock_file = File::create(&paths.pid_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(|_| LifecycleError::AlreadyRunning {
            path: paths.pid_path.clone(),
        })?;
    {
        use std::io::Write;
        let mut lock_file = &lock_file;
        writeln!(lock_file, "{}", std::process::id())?;
    }

    let state = AppState::build(config)?;

    // Bind last, only after storage opened cleanly
    if paths.socket_path.exists() {
        std::fs::remove_file(&paths.socket_path)?;
    }
    let listener =
        UnixListener::bind(&paths.socket_path).map_err(|source| LifecycleError::BindFailed {
            path: paths.socket_path.clone(),
            source,
        })?;

    info!(socket = %paths.socket_path.display(), "walrusd started");

    Ok(DaemonState {
        state,
        listener,
        paths,
        lock_file,
    })
}

impl DaemonState {
    /// Remove the socket and pid files; the lock releases on drop
    pub fn cleanup(&self) {
        for path in [&self.paths.socket_path, &self.paths.pid_path] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    tracing::warn!(path = %path.display(), error = %e, "cleanup failed");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
