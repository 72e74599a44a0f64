// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replication consumer
//!
//! Drives the source-side protocol: ensures the slot exists, starts the
//! stream, decodes logical messages into entries, appends them to the log
//! store, and keeps the standby-status feedback loop alive. Every failure
//! is fatal to the current source session; reconnection policy belongs to
//! the owner, which must resume from the last captured position.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};
use walrus_core::{ColumnMap, DbConfig, Entry, Lsn, Operation, ReplicationConfig, Value};
use walrus_storage::{LogReader, LogWriter};

use crate::conn::PgConnection;
use crate::error::CaptureError;
use crate::frames::{ReplicationFrame, StandbyStatus, XLogData};
use crate::pgoutput::{LogicalMessage, Relation, RelationCache, TupleData, TupleValue};

/// Interval between standby status updates; also the receive timeout
pub const STANDBY_INTERVAL: Duration = Duration::from_secs(10);

/// SQLSTATE for "object already exists"
const DUPLICATE_OBJECT: &str = "42710";

/// Long-lived consumer of the source's logical replication stream
pub struct ReplicationConsumer {
    source: DbConfig,
    replication: ReplicationConfig,
    log: Arc<LogWriter>,
    reader: LogReader,
    conn: Option<PgConnection>,
    relations: RelationCache,
    entries_captured: Arc<AtomicU64>,
}

impl ReplicationConsumer {
    pub fn new(
        source: DbConfig,
        replication: ReplicationConfig,
        log: Arc<LogWriter>,
        reader: LogReader,
        entries_captured: Arc<AtomicU64>,
    ) -> Self {
        Self {
            source,
            replication,
            log,
            reader,
            conn: None,
            relations: RelationCache::default(),
            entries_captured,
        }
    }

    /// Establish the replication-mode connection
    pub async fn connect(&mut self) -> Result<(), CaptureError> {
        let conn = PgConnection::connect_replication(&self.source).await?;
        self.conn = Some(conn);
        Ok(())
    }

    /// Create the logical slot; an existing slot is logged and kept
    pub async fn ensure_slot(&mut self) -> Result<(), CaptureError> {
        let slot = self.replication.slot.clone();
        let command = format!("CREATE_REPLICATION_SLOT {slot} LOGICAL pgoutput");
        match self.connection()?.simple_query(&command).await {
            Ok(_) => {
                info!(slot = %slot, "created replication slot");
                Ok(())
            }
            Err(CaptureError::Db { ref code, .. }) if code == DUPLICATE_OBJECT => {
                info!(slot = %slot, "replication slot already exists");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Position to resume streaming from: the configured override, else the
    /// last captured entry, else zero for a first run
    pub fn resume_position(&self) -> Result<Lsn, CaptureError> {
        if let Some(start) = self.replication.start_lsn {
            return Ok(start);
        }
        Ok(self.reader.last_lsn()?.unwrap_or(Lsn::ZERO))
    }

    /// Start streaming and run the receive loop until cancellation or a
    /// fatal error
    pub async fn start(&mut self, cancel: &CancellationToken) -> Result<(), CaptureError> {
        let start = self.resume_position()?;
        let slot = self.replication.slot.clone();
        let publication = self.replication.publication.clone();
        self.connection()?
            .start_replication(&slot, start, &publication)
            .await?;
        info!(slot = %slot, publication = %publication, %start, "replication started");

        self.receive_loop(cancel, start).await
    }

    /// Close the source connection, if any
    pub async fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            conn.close().await;
        }
    }

    async fn receive_loop(
        &mut self,
        cancel: &CancellationToken,
        start: Lsn,
    ) -> Result<(), CaptureError> {
        let mut write_position = start;
        let mut standby_deadline = Instant::now() + STANDBY_INTERVAL;

        loop {
            if cancel.is_cancelled() {
                return Err(CaptureError::Cancelled);
            }

            if Instant::now() >= standby_deadline {
                self.send_standby_status(write_position).await?;
                standby_deadline = Instant::now() + STANDBY_INTERVAL;
            }

            let payload = {
                let conn = self.connection()?;
                match tokio::time::timeout(STANDBY_INTERVAL, conn.recv_copy_data()).await {
                    // A quiet stream is normal; go around for the
                    // cancellation and standby checks
                    Err(_elapsed) => continue,
                    Ok(Err(e)) => return Err(e),
                    Ok(Ok(payload)) => payload,
                }
            };

            match ReplicationFrame::parse(payload)? {
                Some(ReplicationFrame::Keepalive(keepalive)) => {
                    trace!(wal_end = %keepalive.wal_end, "keepalive");
                    if keepalive.reply_requested {
                        // Fire on the next iteration
                        standby_deadline = Instant::now();
                    }
                }
                Some(ReplicationFrame::XLogData(xlog)) => {
                    let advance = xlog.data.len() as u64;
                    let wal_start = xlog.wal_start;
                    self.handle_xlog_data(xlog)?;
                    write_position = wal_start.advance(advance);
                }
                None => {}
            }
        }
    }

    fn handle_xlog_data(&mut self, xlog: XLogData) -> Result<(), CaptureError> {
        let mut data = xlog.data;
        match LogicalMessage::parse(&mut data)? {
            LogicalMessage::Relation(relation) => {
                debug!(
                    relation = relation.id,
                    name = %format!("{}.{}", relation.namespace, relation.name),
                    columns = relation.columns.len(),
                    "learned relation schema"
                );
                self.relations.insert(relation);
            }
            LogicalMessage::Insert { relation_id, new } => {
                self.capture(relation_id, xlog.wal_start, Operation::Insert, Some(new), None)?;
            }
            LogicalMessage::Update {
                relation_id,
                old,
                new,
            } => {
                self.capture(relation_id, xlog.wal_start, Operation::Update, Some(new), old)?;
            }
            LogicalMessage::Delete { relation_id, old } => {
                self.capture(relation_id, xlog.wal_start, Operation::Delete, None, Some(old))?;
            }
            LogicalMessage::Begin { .. } | LogicalMessage::Commit { .. } => {}
            LogicalMessage::Other(kind) => {
                trace!(kind, "ignoring logical message");
            }
        }
        Ok(())
    }

    fn capture(
        &mut self,
        relation_id: u32,
        lsn: Lsn,
        operation: Operation,
        new: Option<TupleData>,
        old: Option<TupleData>,
    ) -> Result<(), CaptureError> {
        let relation = self.relations.get(relation_id);
        let entry = build_entry(operation, lsn, relation, new, old);
        self.log.append(&entry)?;
        self.entries_captured.fetch_add(1, Ordering::Relaxed);
        trace!(id = %entry.id, op = %entry.operation, %lsn, "captured entry");
        Ok(())
    }

    async fn send_standby_status(&mut self, position: Lsn) -> Result<(), CaptureError> {
        let payload = StandbyStatus::at(position).encode(Utc::now());
        self.connection()?.send_copy_data(&payload).await?;
        trace!(%position, "sent standby status");
        Ok(())
    }

    fn connection(&mut self) -> Result<&mut PgConnection, CaptureError> {
        self.conn
            .as_mut()
            .ok_or_else(|| CaptureError::Protocol("not connected".to_string()))
    }
}

/// Build an entry from a decoded change.
///
/// Column names come from the relation cache when the stream has described
/// the relation; otherwise keys are synthesized positionally as `col_i`.
pub fn build_entry(
    operation: Operation,
    lsn: Lsn,
    relation: Option<&Relation>,
    new: Option<TupleData>,
    old: Option<TupleData>,
) -> Entry {
    let mut entry = Entry::new(operation, lsn);
    if let Some(relation) = relation {
        entry.schema = relation.namespace.clone();
        entry.table = relation.name.clone();
    }
    entry.data = new.map(|tuple| columns_to_map(relation, &tuple));
    entry.old_data = old.map(|tuple| columns_to_map(relation, &tuple));
    entry
}

/// Convert a decoded tuple to a column map. Unchanged TOAST columns carry
/// no value and are omitted.
pub fn columns_to_map(relation: Option<&Relation>, tuple: &TupleData) -> ColumnMap {
    tuple
        .columns
        .iter()
        .enumerate()
        .filter_map(|(i, column)| {
            let key = relation
                .and_then(|r| r.columns.get(i))
                .map(|c| c.name.clone())
                .unwrap_or_else(|| format!("col_{i}"));
            let value = match column {
                TupleValue::Null => Value::Null,
                TupleValue::Unchanged => return None,
                TupleValue::Text(bytes) => {
                    Value::Text(String::from_utf8_lossy(bytes).into_owned())
                }
                TupleValue::Binary(bytes) => Value::Bytes(bytes.clone()),
            };
            Some((key, value))
        })
        .collect()
}

#[cfg(test)]
#[path = "consumer_tests.rs"]
mod tests;
