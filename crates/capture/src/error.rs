// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the capture pipeline
//!
//! Everything here is fatal to the consumer's current source session: the
//! receive loop returns and the owner decides whether to reconnect.

use std::io;

use thiserror::Error;
use walrus_storage::WalError;

/// Errors from the replication consumer and its connection
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("connection closed by server")]
    ConnectionClosed,

    #[error("authentication failed: {0}")]
    Auth(String),

    /// An error response from the source; `code` is the SQLSTATE
    #[error("server error {code}: {message}")]
    Db { code: String, message: String },

    /// An unexpected or out-of-sequence message
    #[error("protocol: {0}")]
    Protocol(String),

    /// An inbound message that cannot be parsed
    #[error("decode: {0}")]
    Decode(String),

    /// The log store refused an append; fatal, tear down the connection
    #[error(transparent)]
    Storage(#[from] WalError),

    #[error("cancelled")]
    Cancelled,
}

impl CaptureError {
    /// Whether this is the benign cancellation outcome rather than a fault
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CaptureError::Cancelled)
    }
}
