// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session registry
//!
//! A session groups checkpoints under a target database. At most one
//! session is active at any instant; the active pointer is an attribute of
//! the registry instance, persisted alongside the session map.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::persist::{load_json, save_json_atomic, RegistryError};

/// Catalog file name inside the session directory
pub const SESSION_CATALOG: &str = "sessions.json";

/// A named grouping of checkpoints with a replay target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Target database this session replays into
    pub database: String,
    /// Member checkpoints, in creation order
    pub checkpoints: Vec<String>,
    pub active: bool,
}

/// On-disk form of the whole catalog: the session map plus the active
/// pointer (empty string when none)
#[derive(Debug, Default, Serialize, Deserialize)]
struct Catalog {
    sessions: HashMap<String, Session>,
    active: String,
}

/// Persistent mapping of session identity → metadata and membership
pub struct SessionRegistry {
    dir: PathBuf,
    inner: RwLock<Catalog>,
}

impl SessionRegistry {
    /// Open the registry on `dir`, creating it if absent and loading the
    /// existing catalog when there is one
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let loaded = load_json(&dir.join(SESSION_CATALOG))?.unwrap_or_default();
        Ok(Self {
            dir,
            inner: RwLock::new(loaded),
        })
    }

    /// Create an inactive session, persisting before returning
    pub fn create(
        &self,
        name: &str,
        description: &str,
        database: &str,
    ) -> Result<Session, RegistryError> {
        let now = Utc::now();
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            created_at: now,
            updated_at: now,
            database: database.to_string(),
            checkpoints: Vec::new(),
            active: false,
        };

        let mut catalog = self.inner.write().unwrap_or_else(|e| e.into_inner());
        catalog.sessions.insert(session.id.clone(), session.clone());
        self.persist_or_rollback(&mut catalog)?;
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Result<Session, RegistryError> {
        let catalog = self.inner.read().unwrap_or_else(|e| e.into_inner());
        catalog
            .sessions
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// All sessions, newest first
    pub fn list(&self) -> Vec<Session> {
        let catalog = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut sessions: Vec<Session> = catalog.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sessions
    }

    /// Make `id` the single active session
    pub fn switch(&self, id: &str) -> Result<(), RegistryError> {
        let mut catalog = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if !catalog.sessions.contains_key(id) {
            return Err(not_found(id));
        }
        for session in catalog.sessions.values_mut() {
            session.active = false;
        }
        if let Some(session) = catalog.sessions.get_mut(id) {
            session.active = true;
        }
        catalog.active = id.to_string();
        self.persist_or_rollback(&mut catalog)
    }

    /// The single active session, or a not-found error when none is active
    pub fn get_active(&self) -> Result<Session, RegistryError> {
        let catalog = self.inner.read().unwrap_or_else(|e| e.into_inner());
        if catalog.active.is_empty() {
            return Err(RegistryError::NotFound {
                kind: "active session",
                id: String::new(),
            });
        }
        catalog
            .sessions
            .get(&catalog.active)
            .cloned()
            .ok_or_else(|| not_found(&catalog.active))
    }

    /// Append a checkpoint to a session's membership and bump its update
    /// time
    pub fn add_checkpoint(&self, session_id: &str, checkpoint_id: &str) -> Result<(), RegistryError> {
        let mut catalog = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let session = catalog
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| not_found(session_id))?;
        session.checkpoints.push(checkpoint_id.to_string());
        session.updated_at = Utc::now();
        self.persist_or_rollback(&mut catalog)
    }

    /// Remove a session; clears the active pointer if it held it
    pub fn delete(&self, id: &str) -> Result<(), RegistryError> {
        let mut catalog = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if catalog.sessions.remove(id).is_none() {
            return Err(not_found(id));
        }
        if catalog.active == id {
            catalog.active.clear();
        }
        self.persist_or_rollback(&mut catalog)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.dir.join(SESSION_CATALOG)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn persist_or_rollback(&self, catalog: &mut Catalog) -> Result<(), RegistryError> {
        if let Err(e) = save_json_atomic(&self.catalog_path(), &*catalog) {
            match load_json(&self.catalog_path()) {
                Ok(loaded) => *catalog = loaded.unwrap_or_default(),
                Err(reload) => {
                    warn!(error = %reload, "session catalog rollback failed; keeping in-memory state");
                }
            }
            return Err(e);
        }
        Ok(())
    }
}

fn not_found(id: &str) -> RegistryError {
    RegistryError::NotFound {
        kind: "session",
        id: id.to_string(),
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
