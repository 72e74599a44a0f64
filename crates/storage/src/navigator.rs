// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Navigator
//!
//! Materializes log slices bounded by checkpoint identities. Holds no state
//! of its own; every call is a pure function of the current log contents
//! plus the checkpoint catalog. Orphan checkpoints (whose session has been
//! deleted) resolve normally and are simply session-less.

use std::sync::Arc;

use thiserror::Error;
use walrus_core::Entry;

use crate::checkpoint::CheckpointRegistry;
use crate::persist::RegistryError;
use crate::wal::{LogReader, WalError};

/// Errors from slice derivation
#[derive(Debug, Error)]
pub enum NavigateError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Wal(#[from] WalError),
}

/// Derives entry slices bounded by checkpoint identities
pub struct Navigator {
    reader: LogReader,
    checkpoints: Arc<CheckpointRegistry>,
}

impl Navigator {
    pub fn new(reader: LogReader, checkpoints: Arc<CheckpointRegistry>) -> Self {
        Self {
            reader,
            checkpoints,
        }
    }

    /// The log prefix up to and including the checkpoint's entry index,
    /// clamped to what the log currently holds
    pub fn entries_up_to(&self, checkpoint_id: &str) -> Result<Vec<Entry>, NavigateError> {
        let checkpoint = self.checkpoints.get(checkpoint_id)?;
        let mut entries = self.reader.read_all()?;
        let take = checkpoint.entry_index.saturating_add(1).min(entries.len());
        entries.truncate(take);
        Ok(entries)
    }

    /// The inclusive slice between two checkpoints, in either argument
    /// order, with the high end clamped to the last entry
    pub fn entries_between(
        &self,
        start_id: &str,
        end_id: &str,
    ) -> Result<Vec<Entry>, NavigateError> {
        let start = self.checkpoints.get(start_id)?;
        let end = self.checkpoints.get(end_id)?;

        let (mut low, mut high) = (start.entry_index, end.entry_index);
        if low > high {
            std::mem::swap(&mut low, &mut high);
        }

        let entries = self.reader.read_all()?;
        if entries.is_empty() || low >= entries.len() {
            return Ok(Vec::new());
        }
        let high = high.min(entries.len() - 1);
        Ok(entries[low..=high].to_vec())
    }
}

#[cfg(test)]
#[path = "navigator_tests.rs"]
mod tests;
