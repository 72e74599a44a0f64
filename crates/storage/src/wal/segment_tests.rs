// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

#[test]
fn name_is_fixed_width() {
    assert_eq!(
        segment_name(at(2026, 3, 7, 9, 5, 1)),
        "wal_20260307_090501.log"
    );
}

#[test]
fn name_order_equals_time_order() {
    let earlier = segment_name(at(2026, 3, 7, 9, 59, 59));
    let later = segment_name(at(2026, 3, 7, 10, 0, 0));
    assert!(earlier < later);
}

#[test]
fn pattern_accepts_segment_names() {
    assert!(is_segment_name("wal_20260307_090501.log"));
}

#[test]
fn pattern_rejects_foreign_files() {
    assert!(!is_segment_name("checkpoints.json"));
    assert!(!is_segment_name("wal.log"));
    assert!(!is_segment_name("wal_2026_0307.log"));
    assert!(!is_segment_name("wal_20260307_090501.log.tmp"));
    assert!(!is_segment_name("xwal_20260307_090501.log"));
}

#[test]
fn timestamp_roundtrips_through_name() {
    let ts = at(2026, 12, 31, 23, 59, 59);
    assert_eq!(segment_timestamp(&segment_name(ts)), Some(ts));
    assert_eq!(segment_timestamp("garbage"), None);
}

#[test]
fn next_name_uses_clock_when_it_advanced() {
    let previous = segment_name(at(2026, 3, 7, 9, 0, 0));
    let name = next_segment_name(&previous, at(2026, 3, 7, 9, 0, 5));
    assert_eq!(name, "wal_20260307_090005.log");
    assert!(name > previous);
}

#[test]
fn next_name_bumps_within_same_second() {
    let now = at(2026, 3, 7, 9, 0, 0);
    let previous = segment_name(now);
    let name = next_segment_name(&previous, now);
    assert_eq!(name, "wal_20260307_090001.log");
    assert!(name > previous);
}

#[test]
fn next_name_never_sorts_before_previous() {
    // Clock stepped backwards across a rotation
    let previous = segment_name(at(2026, 3, 7, 9, 0, 30));
    let name = next_segment_name(&previous, at(2026, 3, 7, 9, 0, 10));
    assert!(name > previous);
}
