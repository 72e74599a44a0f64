// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Segment naming
//!
//! Segments are named `wal_YYYYMMDD_HHMMSS.log`. The fixed-width,
//! zero-padded timestamp makes lexicographic order equal temporal order.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use regex::Regex;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^wal_\d{8}_\d{6}\.log$").unwrap_or_else(|_| unreachable!())
    })
}

/// Segment file name for a creation time
pub fn segment_name(at: DateTime<Utc>) -> String {
    format!("wal_{}.log", at.format(TIMESTAMP_FORMAT))
}

/// Whether a file name matches the segment pattern
pub fn is_segment_name(name: &str) -> bool {
    pattern().is_match(name)
}

/// Creation time encoded in a segment name, if it matches the pattern
pub fn segment_timestamp(name: &str) -> Option<DateTime<Utc>> {
    if !is_segment_name(name) {
        return None;
    }
    let stamp = &name["wal_".len()..name.len() - ".log".len()];
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Name for a rotated segment that sorts strictly after `previous`.
///
/// The name is taken from the current time; if the clock has not advanced
/// past the previous segment's second, the successor second is used instead.
pub fn next_segment_name(previous: &str, now: DateTime<Utc>) -> String {
    let candidate = segment_name(now);
    if candidate.as_str() > previous {
        return candidate;
    }
    let bumped = segment_timestamp(previous)
        .map(|ts| ts + TimeDelta::seconds(1))
        .unwrap_or(now);
    segment_name(bumped)
}

#[cfg(test)]
#[path = "segment_tests.rs"]
mod tests;
