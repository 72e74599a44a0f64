// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only log of captured entries
//!
//! Entries are stored one JSON line at a time in timestamp-named segment
//! files. Segment names sort lexicographically in creation order, so the
//! global entry sequence is the concatenation of segments in name order.

mod reader;
mod segment;
mod writer;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use reader::LogReader;
pub use segment::{is_segment_name, segment_name, segment_timestamp};
pub use writer::LogWriter;

/// Errors from the log store
#[derive(Debug, Error)]
pub enum WalError {
    /// A write or flush to the current segment failed. Fatal to the owning
    /// consumer.
    #[error("append to {path} failed: {source}")]
    Append {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The log directory could not be created or listed
    #[error("log directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A whole segment could not be read
    #[error("segment {path} unreadable: {source}")]
    Segment {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// An entry could not be serialized for appending
    #[error("encode entry {id}: {source}")]
    Encode {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}
