// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log reader
//!
//! Scans every segment in name order and returns the decoded entries.
//! Lines that fail to decode (a torn tail from a crashed writer, stray
//! garbage) are skipped so readers can always make forward progress; a
//! segment that cannot be read at all is an error naming that segment.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::debug;
use walrus_core::{Entry, Lsn};

use super::segment::is_segment_name;
use super::WalError;

/// Read-only view over a log directory. Holds no file handles between
/// calls; every read is a fresh, idempotent scan.
pub struct LogReader {
    dir: PathBuf,
}

impl LogReader {
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// All entries across all segments, in global order.
    ///
    /// A missing or empty directory yields an empty sequence, never an
    /// error.
    pub fn read_all(&self) -> Result<Vec<Entry>, WalError> {
        let mut entries = Vec::new();
        for path in self.segment_paths()? {
            read_segment(&path, &mut entries)?;
        }
        Ok(entries)
    }

    /// Number of decodable entries in the log
    pub fn count(&self) -> Result<usize, WalError> {
        Ok(self.read_all()?.len())
    }

    /// Position of the last captured entry, if any; the consumer resumes
    /// from here across restarts
    pub fn last_lsn(&self) -> Result<Option<Lsn>, WalError> {
        Ok(self.read_all()?.last().map(|entry| entry.lsn))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn segment_paths(&self) -> Result<Vec<PathBuf>, WalError> {
        let read_dir = match std::fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(WalError::Directory {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut names: Vec<String> = Vec::new();
        for dirent in read_dir {
            let dirent = dirent.map_err(|source| WalError::Directory {
                path: self.dir.clone(),
                source,
            })?;
            let name = dirent.file_name().to_string_lossy().to_string();
            if is_segment_name(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names.into_iter().map(|name| self.dir.join(name)).collect())
    }
}

fn read_segment(path: &Path, entries: &mut Vec<Entry>) -> Result<(), WalError> {
    let file = File::open(path).map_err(|source| WalError::Segment {
        path: path.to_path_buf(),
        source,
    })?;

    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| WalError::Segment {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        match Entry::from_line(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                // Torn tail or stray garbage; drop the line and keep going
                debug!(segment = %path.display(), error = %e, "skipping undecodable line");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;
