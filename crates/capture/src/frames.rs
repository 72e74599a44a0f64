// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replication stream frames
//!
//! Inside the copy-both stream, every payload starts with a one-byte tag:
//! `w` wraps a chunk of WAL data, `k` is a primary keepalive, and `r` is
//! the standby status update the consumer sends back. Timestamps on the
//! wire are microseconds since the Postgres epoch (2000-01-01 UTC).

use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use walrus_core::Lsn;

use crate::error::CaptureError;

pub const XLOG_DATA_TAG: u8 = b'w';
pub const KEEPALIVE_TAG: u8 = b'k';
pub const STANDBY_STATUS_TAG: u8 = b'r';

/// A chunk of logical WAL data
#[derive(Debug, Clone)]
pub struct XLogData {
    /// Position this chunk starts at
    pub wal_start: Lsn,
    /// Server's current end-of-WAL position
    pub wal_end: Lsn,
    pub server_time_micros: i64,
    /// The wrapped pgoutput message
    pub data: Bytes,
}

/// Server keepalive; `reply_requested` asks for an immediate status update
#[derive(Debug, Clone, Copy)]
pub struct PrimaryKeepalive {
    pub wal_end: Lsn,
    pub server_time_micros: i64,
    pub reply_requested: bool,
}

/// One inbound frame from the replication stream
#[derive(Debug, Clone)]
pub enum ReplicationFrame {
    XLogData(XLogData),
    Keepalive(PrimaryKeepalive),
}

impl ReplicationFrame {
    /// Parse one copy-data payload. Unknown tags yield `None` and are
    /// ignored by the caller.
    pub fn parse(mut payload: Bytes) -> Result<Option<Self>, CaptureError> {
        if payload.is_empty() {
            return Err(CaptureError::Decode("empty replication frame".to_string()));
        }
        let tag = payload.get_u8();
        match tag {
            XLOG_DATA_TAG => {
                ensure(&payload, 24, "xlog data header")?;
                let wal_start = Lsn(payload.get_u64());
                let wal_end = Lsn(payload.get_u64());
                let server_time_micros = payload.get_i64();
                Ok(Some(ReplicationFrame::XLogData(XLogData {
                    wal_start,
                    wal_end,
                    server_time_micros,
                    data: payload,
                })))
            }
            KEEPALIVE_TAG => {
                ensure(&payload, 17, "keepalive")?;
                let wal_end = Lsn(payload.get_u64());
                let server_time_micros = payload.get_i64();
                let reply_requested = payload.get_u8() != 0;
                Ok(Some(ReplicationFrame::Keepalive(PrimaryKeepalive {
                    wal_end,
                    server_time_micros,
                    reply_requested,
                })))
            }
            _ => Ok(None),
        }
    }
}

/// The consumer-to-source progress report
#[derive(Debug, Clone, Copy)]
pub struct StandbyStatus {
    pub write: Lsn,
    pub flush: Lsn,
    pub apply: Lsn,
    pub reply_requested: bool,
}

impl StandbyStatus {
    /// Report a single position as written, flushed, and applied
    pub fn at(position: Lsn) -> Self {
        Self {
            write: position,
            flush: position,
            apply: position,
            reply_requested: false,
        }
    }

    pub fn encode(&self, now: DateTime<Utc>) -> Bytes {
        let mut buf = BytesMut::with_capacity(34);
        buf.put_u8(STANDBY_STATUS_TAG);
        buf.put_u64(self.write.0);
        buf.put_u64(self.flush.0);
        buf.put_u64(self.apply.0);
        buf.put_i64(pg_epoch_micros(now));
        buf.put_u8(self.reply_requested as u8);
        buf.freeze()
    }
}

/// Microseconds since the Postgres epoch (2000-01-01T00:00:00Z)
pub fn pg_epoch_micros(at: DateTime<Utc>) -> i64 {
    const PG_EPOCH_UNIX_MICROS: i64 = 946_684_800_000_000;
    at.timestamp_micros() - PG_EPOCH_UNIX_MICROS
}

pub(crate) fn ensure(buf: &Bytes, needed: usize, what: &str) -> Result<(), CaptureError> {
    if buf.remaining() < needed {
        return Err(CaptureError::Decode(format!(
            "truncated {what}: need {needed} bytes, have {}",
            buf.remaining()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "frames_tests.rs"]
mod tests;
