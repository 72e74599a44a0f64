// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Captured change entries
//!
//! An entry is the immutable record of one logical change from the source
//! stream. Entries are serialized as single JSON lines in the log segments;
//! [`Entry::to_line`] and [`Entry::from_line`] define that encoding.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lsn::Lsn;
use crate::value::Value;

/// Column identity → value mapping for one row image
pub type ColumnMap = BTreeMap<String, Value>;

/// The kind of change an entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
    #[serde(rename = "DDL")]
    SchemaChange,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::SchemaChange => "DDL",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One captured change. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    /// Wall-clock capture time
    pub timestamp: DateTime<Utc>,
    /// Source position the change was received at
    pub lsn: Lsn,
    pub operation: Operation,
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub table: String,
    /// New row image; absent for deletes
    #[serde(default)]
    pub data: Option<ColumnMap>,
    /// Prior row image; present for deletes, and for updates when the
    /// source supplies one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_data: Option<ColumnMap>,
    /// Verbatim statement text, for schema changes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_id: Option<String>,
}

impl Entry {
    /// Create an entry with a fresh identifier and the current capture time
    pub fn new(operation: Operation, lsn: Lsn) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            lsn,
            operation,
            schema: String::new(),
            table: String::new(),
            data: None,
            old_data: None,
            sql: None,
            checkpoint_id: None,
        }
    }

    /// Serialize to a single JSON line (no trailing newline)
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from a single line of JSON
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
