// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered application of entries
//!
//! Entries are applied one at a time, in slice order, against the session's
//! target. The first failure aborts the run with the offending entry's
//! identifier; whatever was already applied stays applied. The caller
//! decides whether to wrap the whole replay in a target-side transaction.

use std::collections::HashSet;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};
use walrus_core::Entry;
use walrus_storage::Session;

use crate::sql;
use crate::target::SqlTarget;
use crate::ReplayError;

/// Apply `entries` in order. Returns the number applied.
///
/// Cancellation aborts before the next entry. A schema change without
/// statement text has nothing to execute and counts as applied.
pub async fn replay<T: SqlTarget>(
    cancel: &CancellationToken,
    session: &Session,
    entries: &[Entry],
    target: &mut T,
) -> Result<usize, ReplayError> {
    info!(
        session = %session.id,
        database = %session.database,
        count = entries.len(),
        "replaying entries"
    );

    let mut applied = 0;
    for entry in entries {
        if cancel.is_cancelled() {
            return Err(ReplayError::Cancelled { applied });
        }

        let statement = sql::statement_for(entry).map_err(|e| ReplayError::Apply {
            entry_id: entry.id.clone(),
            reason: e.to_string(),
        })?;

        match statement {
            Some(statement) => {
                trace!(entry = %entry.id, %statement, "applying");
                target
                    .execute(&statement)
                    .await
                    .map_err(|e| ReplayError::Apply {
                        entry_id: entry.id.clone(),
                        reason: e.to_string(),
                    })?;
            }
            None => {
                debug!(entry = %entry.id, "schema change without statement text; nothing to execute");
            }
        }
        applied += 1;
    }

    info!(applied, "replay complete");
    Ok(applied)
}

/// Drop re-delivered duplicates, keeping first occurrences.
///
/// At-least-once capture can write the same change twice across a consumer
/// restart; such duplicates agree on position and content and differ only
/// in entry identity and capture time.
pub fn dedupe_by_content(entries: Vec<Entry>) -> Vec<Entry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| {
            let key = format!(
                "{}|{}|{}|{}|{}|{}",
                entry.lsn,
                entry.operation,
                entry.schema,
                entry.table,
                serde_json::to_string(&entry.data).unwrap_or_default(),
                serde_json::to_string(&entry.old_data).unwrap_or_default(),
            );
            seen.insert(key)
        })
        .collect()
}

#[cfg(test)]
#[path = "replayer_tests.rs"]
mod tests;
