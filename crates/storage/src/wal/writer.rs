// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log writer
//!
//! Appends entries to the current segment as single JSON lines. Every
//! operation is serialized by an internal mutex, so concurrent callers
//! observe a single total order. A writer opens exactly one segment for its
//! lifetime unless size-based rotation is configured.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use tracing::debug;
use walrus_core::Entry;

use super::segment::{next_segment_name, segment_name};
use super::WalError;

/// Durable, append-only writer over timestamp-named segments
pub struct LogWriter {
    inner: Mutex<Inner>,
}

struct Inner {
    dir: PathBuf,
    file: File,
    segment: String,
    segment_bytes: u64,
    max_segment_bytes: Option<u64>,
}

impl LogWriter {
    /// Open a writer on `dir`, creating the directory if absent and starting
    /// a fresh segment named from the current time
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, WalError> {
        Self::open_with_rotation(dir, None)
    }

    /// Open a writer that additionally rotates once the current segment
    /// exceeds `max_segment_bytes`
    pub fn open_with_rotation(
        dir: impl Into<PathBuf>,
        max_segment_bytes: Option<u64>,
    ) -> Result<Self, WalError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| WalError::Directory {
            path: dir.clone(),
            source,
        })?;

        let segment = segment_name(Utc::now());
        let file = open_segment(&dir, &segment)?;
        debug!(segment = %segment, "opened log segment");

        Ok(Self {
            inner: Mutex::new(Inner {
                dir,
                file,
                segment,
                segment_bytes: 0,
                max_segment_bytes,
            }),
        })
    }

    /// Append one entry as a JSON line, delivered to the operating system
    /// before returning.
    ///
    /// A failure here is fatal to the owning consumer; the entry may or may
    /// not be partially written, and readers tolerate the torn tail.
    pub fn append(&self, entry: &Entry) -> Result<(), WalError> {
        let line = entry.to_line().map_err(|source| WalError::Encode {
            id: entry.id.clone(),
            source,
        })?;

        let mut buf = line.into_bytes();
        buf.push(b'\n');

        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let path = inner.dir.join(&inner.segment);
        inner
            .file
            .write_all(&buf)
            .map_err(|source| WalError::Append { path, source })?;
        inner.segment_bytes += buf.len() as u64;

        if let Some(max) = inner.max_segment_bytes {
            if inner.segment_bytes >= max {
                inner.rotate()?;
            }
        }

        Ok(())
    }

    /// Name of the segment currently being written
    pub fn current_segment(&self) -> String {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.segment.clone()
    }

    /// Flush and close the current segment
    pub fn close(self) -> Result<(), WalError> {
        let inner = self
            .inner
            .into_inner()
            .unwrap_or_else(|e| e.into_inner());
        let path = inner.dir.join(&inner.segment);
        inner
            .file
            .sync_all()
            .map_err(|source| WalError::Append { path, source })
    }
}

impl Inner {
    fn rotate(&mut self) -> Result<(), WalError> {
        let next = next_segment_name(&self.segment, Utc::now());
        let file = open_segment(&self.dir, &next)?;
        debug!(from = %self.segment, to = %next, "rotated log segment");
        self.file = file;
        self.segment = next;
        self.segment_bytes = 0;
        Ok(())
    }
}

fn open_segment(dir: &Path, name: &str) -> Result<File, WalError> {
    let path = dir.join(name);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| WalError::Append { path, source })
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
