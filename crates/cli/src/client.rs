// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::net::UnixStream;
use walrus_daemon::protocol::{self, ProtocolError, Request, Response};

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for one request/response exchange
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("WALRUS_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for the daemon to come up
pub fn timeout_connect() -> Duration {
    parse_duration_ms("WALRUS_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

/// Polling interval for retries
pub fn poll_interval() -> Duration {
    parse_duration_ms("WALRUS_POLL_INTERVAL_MS").unwrap_or(Duration::from_millis(50))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("walrusd is not running (no socket at the state directory)")]
    DaemonNotRunning,

    #[error("failed to start walrusd: {0}")]
    DaemonStartFailed(String),

    #[error("timed out waiting for walrusd to start")]
    DaemonStartTimeout,

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{0}")]
    Rejected(String),

    #[error("unexpected response from walrusd")]
    UnexpectedResponse,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The daemon's state directory; must agree with the daemon's own
/// configuration
pub fn state_dir() -> PathBuf {
    let _ = dotenvy::dotenv();
    std::env::var("WALRUS_STATE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./walrus-state"))
}

pub fn socket_path() -> PathBuf {
    state_dir().join("walrusd.sock")
}

/// Client for the walrusd control socket
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connect to a running daemon (no auto-start)
    pub fn connect() -> Result<Self, ClientError> {
        Self::with_socket(socket_path())
    }

    /// Connect via an explicit socket path
    pub fn with_socket(socket_path: PathBuf) -> Result<Self, ClientError> {
        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }
        Ok(Self { socket_path })
    }

    /// Send one request and read its response
    pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(&request)?;
        tokio::time::timeout(timeout_ipc(), protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let frame = tokio::time::timeout(timeout_ipc(), protocol::read_message(&mut reader))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        Ok(protocol::decode(&frame)?)
    }

    /// Request a graceful shutdown
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(Request::Shutdown).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }
}

/// Spawn walrusd in the background and wait for its socket to appear
pub async fn daemon_start() -> Result<DaemonClient, ClientError> {
    if let Ok(client) = DaemonClient::connect() {
        return Ok(client);
    }

    let binary = find_daemon_binary();
    Command::new(&binary)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(format!("{}: {e}", binary.display())))?;

    let deadline = Instant::now() + timeout_connect();
    while Instant::now() < deadline {
        if let Ok(client) = DaemonClient::connect() {
            return Ok(client);
        }
        tokio::time::sleep(poll_interval()).await;
    }
    Err(ClientError::DaemonStartTimeout)
}

/// Stop the daemon if it is running. Returns whether one was stopped.
pub async fn daemon_stop() -> Result<bool, ClientError> {
    let client = match DaemonClient::connect() {
        Ok(client) => client,
        Err(ClientError::DaemonNotRunning) => return Ok(false),
        Err(e) => return Err(e),
    };

    client.shutdown().await?;

    // Wait for the socket to disappear
    let socket = socket_path();
    let deadline = Instant::now() + timeout_connect();
    while Instant::now() < deadline && socket.exists() {
        tokio::time::sleep(poll_interval()).await;
    }
    Ok(true)
}

/// Find the walrusd binary: explicit override, sibling of this
/// executable, then PATH
fn find_daemon_binary() -> PathBuf {
    if let Ok(path) = std::env::var("WALRUS_DAEMON_BINARY") {
        return PathBuf::from(path);
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("walrusd");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    PathBuf::from("walrusd")
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
