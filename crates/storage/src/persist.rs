// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic catalog persistence
//!
//! Both registries persist their whole catalog on every mutation: the bytes
//! go to a sibling temporary file which is renamed over the target, so a
//! crash mid-write never leaves a half-written catalog behind.

use std::fs;
use std::io;
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Errors from registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("catalog encoding: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write `data` as pretty JSON to `path` via temp file + rename
pub fn save_json_atomic<T: Serialize>(path: &Path, data: &T) -> Result<(), RegistryError> {
    let json = serde_json::to_vec_pretty(data)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Load JSON from `path`; `None` when the file does not exist yet
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, RegistryError> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
