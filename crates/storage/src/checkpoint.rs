// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint registry
//!
//! A checkpoint pairs a source position with an entry index, under a human
//! name. The registry holds the authoritative in-memory catalog for the
//! process lifetime and persists the whole catalog atomically on every
//! mutation. Readers take the shared lock, writers the exclusive one.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use walrus_core::Lsn;

use crate::persist::{load_json, save_json_atomic, RegistryError};

/// Catalog file name inside the checkpoint directory
pub const CHECKPOINT_CATALOG: &str = "checkpoints.json";

/// A named position in the captured log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub name: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub lsn: Lsn,
    /// Zero-based index of the last entry covered by this checkpoint
    pub entry_index: usize,
    /// Owning session; empty when created outside a session or orphaned by
    /// session deletion
    #[serde(default)]
    pub session_id: String,
}

/// Persistent mapping of checkpoint identity → position
pub struct CheckpointRegistry {
    dir: PathBuf,
    checkpoints: RwLock<HashMap<String, Checkpoint>>,
}

impl CheckpointRegistry {
    /// Open the registry on `dir`, creating it if absent and loading the
    /// existing catalog when there is one
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let loaded = load_json(&dir.join(CHECKPOINT_CATALOG))?.unwrap_or_default();
        Ok(Self {
            dir,
            checkpoints: RwLock::new(loaded),
        })
    }

    /// Create a checkpoint, persisting the catalog before returning
    pub fn create(
        &self,
        name: &str,
        description: &str,
        lsn: Lsn,
        entry_index: usize,
        session_id: &str,
    ) -> Result<Checkpoint, RegistryError> {
        let checkpoint = Checkpoint {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            timestamp: Utc::now(),
            lsn,
            entry_index,
            session_id: session_id.to_string(),
        };

        let mut map = self.checkpoints.write().unwrap_or_else(|e| e.into_inner());
        map.insert(checkpoint.id.clone(), checkpoint.clone());
        if let Err(e) = save_json_atomic(&self.catalog_path(), &*map) {
            self.rollback(&mut map);
            return Err(e);
        }
        Ok(checkpoint)
    }

    pub fn get(&self, id: &str) -> Result<Checkpoint, RegistryError> {
        let map = self.checkpoints.read().unwrap_or_else(|e| e.into_inner());
        map.get(id).cloned().ok_or_else(|| RegistryError::NotFound {
            kind: "checkpoint",
            id: id.to_string(),
        })
    }

    /// All checkpoints, timestamp ascending, optionally filtered by owning
    /// session
    pub fn list(&self, session_id: Option<&str>) -> Vec<Checkpoint> {
        let map = self.checkpoints.read().unwrap_or_else(|e| e.into_inner());
        let mut checkpoints: Vec<Checkpoint> = map
            .values()
            .filter(|cp| session_id.is_none_or(|sid| cp.session_id == sid))
            .cloned()
            .collect();
        checkpoints.sort_by_key(|cp| cp.timestamp);
        checkpoints
    }

    pub fn delete(&self, id: &str) -> Result<(), RegistryError> {
        let mut map = self.checkpoints.write().unwrap_or_else(|e| e.into_inner());
        if map.remove(id).is_none() {
            return Err(RegistryError::NotFound {
                kind: "checkpoint",
                id: id.to_string(),
            });
        }
        if let Err(e) = save_json_atomic(&self.catalog_path(), &*map) {
            self.rollback(&mut map);
            return Err(e);
        }
        Ok(())
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.dir.join(CHECKPOINT_CATALOG)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// A failed persist rolls the in-memory catalog back to what is on disk
    fn rollback(&self, map: &mut HashMap<String, Checkpoint>) {
        match load_json(&self.catalog_path()) {
            Ok(loaded) => *map = loaded.unwrap_or_default(),
            Err(e) => warn!(error = %e, "checkpoint catalog rollback failed; keeping in-memory state"),
        }
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
