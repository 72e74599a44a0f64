// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol between the CLI and walrusd
//!
//! Length-prefixed JSON frames over the Unix socket: a big-endian u32
//! payload length, then the serialized request or response. One request,
//! one response per connection.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use walrus_core::{Entry, Lsn};
use walrus_storage::{Checkpoint, Session};

pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Per-direction timeout for one frame
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on a single frame; larger is a protocol error
pub const MAX_FRAME_BYTES: u32 = 64 * 1024 * 1024;

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("timeout")]
    Timeout,
    #[error("connection closed")]
    ConnectionClosed,
    #[error("frame too large: {0} bytes")]
    FrameTooLarge(u32),
    #[error("encoding: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Requests the daemon accepts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Ping,
    Hello {
        version: String,
    },
    Status,
    Shutdown,

    SessionCreate {
        name: String,
        description: String,
        database: String,
    },
    SessionList,
    SessionGet {
        id: String,
    },
    SessionDelete {
        id: String,
    },
    SessionSwitch {
        id: String,
    },

    /// Create a checkpoint. Position and entry index default to the
    /// daemon's own view of the log; the session defaults to the active
    /// one.
    CheckpointCreate {
        name: String,
        description: String,
        #[serde(default)]
        lsn: Option<Lsn>,
        #[serde(default)]
        entry_index: Option<usize>,
        #[serde(default)]
        session_id: Option<String>,
    },
    CheckpointList {
        #[serde(default)]
        session_id: Option<String>,
    },
    CheckpointGet {
        id: String,
    },
    CheckpointDelete {
        id: String,
    },

    NavigateUpTo {
        checkpoint_id: String,
    },
    NavigateBetween {
        start_id: String,
        end_id: String,
    },

    Replay {
        session_id: String,
        checkpoint_id: String,
    },

    /// Last `limit` entries of the log
    WalTail {
        limit: usize,
    },
}

/// Responses the daemon sends
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Pong,
    Hello {
        version: String,
    },
    Ok,
    ShuttingDown,
    Error {
        message: String,
    },
    Status {
        uptime_secs: u64,
        entries_captured: u64,
        ingest_connected: bool,
        active_session: Option<String>,
    },
    Session {
        session: Box<Session>,
    },
    Sessions {
        sessions: Vec<Session>,
    },
    Checkpoint {
        checkpoint: Box<Checkpoint>,
    },
    Checkpoints {
        checkpoints: Vec<Checkpoint>,
    },
    Entries {
        entries: Vec<Entry>,
        total: usize,
    },
    ReplayResult {
        applied: usize,
    },
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(data)?)
}

/// Write one length-prefixed frame
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    if data.len() > MAX_FRAME_BYTES as usize {
        return Err(ProtocolError::FrameTooLarge(data.len() as u32));
    }
    writer.write_u32(data.len() as u32).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let len = match reader.read_u32().await {
        Ok(len) => len,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed)
        }
        Err(e) => return Err(e.into()),
    };
    if len > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ProtocolError::ConnectionClosed
        } else {
            ProtocolError::Io(e)
        }
    })?;
    Ok(buf)
}

/// Read and decode a request within `timeout`
pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    match tokio::time::timeout(timeout, read_message(reader)).await {
        Err(_elapsed) => Err(ProtocolError::Timeout),
        Ok(frame) => decode(&frame?),
    }
}

/// Encode and write a response within `timeout`
pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let data = encode(response)?;
    match tokio::time::timeout(timeout, write_message(writer, &data)).await {
        Err(_elapsed) => Err(ProtocolError::Timeout),
        Ok(result) => result,
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
