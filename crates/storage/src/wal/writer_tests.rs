// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::super::LogReader;
use super::*;
use std::sync::Arc;
use tempfile::TempDir;
use walrus_core::{Lsn, Operation};

fn entry(id: &str) -> Entry {
    let mut e = Entry::new(Operation::Insert, Lsn(100));
    e.id = id.to_string();
    e
}

#[test]
fn open_creates_directory_and_segment() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("wal");
    assert!(!dir.exists());

    let writer = LogWriter::open(&dir).unwrap();

    assert!(dir.exists());
    let segment = writer.current_segment();
    assert!(super::super::is_segment_name(&segment));
    assert!(dir.join(&segment).exists());
}

#[test]
fn append_writes_one_line_per_entry() {
    let tmp = TempDir::new().unwrap();
    let writer = LogWriter::open(tmp.path()).unwrap();

    writer.append(&entry("e1")).unwrap();
    writer.append(&entry("e2")).unwrap();
    let segment = writer.current_segment();
    writer.close().unwrap();

    let content = std::fs::read_to_string(tmp.path().join(segment)).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(content.ends_with('\n'));

    let first = Entry::from_line(lines[0]).unwrap();
    assert_eq!(first.id, "e1");
}

#[test]
fn appends_preserve_program_order() {
    let tmp = TempDir::new().unwrap();
    let writer = LogWriter::open(tmp.path()).unwrap();
    for id in ["e1", "e2", "e3"] {
        writer.append(&entry(id)).unwrap();
    }
    writer.close().unwrap();

    let entries = LogReader::open(tmp.path()).read_all().unwrap();
    let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["e1", "e2", "e3"]);
}

#[test]
fn single_segment_per_writer_by_default() {
    let tmp = TempDir::new().unwrap();
    let writer = LogWriter::open(tmp.path()).unwrap();
    for i in 0..50 {
        writer.append(&entry(&format!("e{i}"))).unwrap();
    }
    writer.close().unwrap();

    let segments = std::fs::read_dir(tmp.path()).unwrap().count();
    assert_eq!(segments, 1);
}

#[test]
fn concurrent_appends_all_land() {
    let tmp = TempDir::new().unwrap();
    let writer = Arc::new(LogWriter::open(tmp.path()).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let writer = Arc::clone(&writer);
            std::thread::spawn(move || {
                for j in 0..10 {
                    writer.append(&entry(&format!("t{i}-{j}"))).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let entries = LogReader::open(tmp.path()).read_all().unwrap();
    assert_eq!(entries.len(), 80);

    // Every line must be intact JSON; interleaved partial writes would fail
    let mut ids: Vec<_> = entries.iter().map(|e| e.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 80);
}

#[test]
fn rotation_produces_strictly_later_segments() {
    let tmp = TempDir::new().unwrap();
    // Tiny threshold: every append rotates
    let writer = LogWriter::open_with_rotation(tmp.path(), Some(1)).unwrap();
    for i in 0..4 {
        writer.append(&entry(&format!("e{i}"))).unwrap();
    }
    writer.close().unwrap();

    let mut names: Vec<String> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|d| d.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    assert!(names.len() >= 4, "expected rotated segments, got {names:?}");
    for pair in names.windows(2) {
        assert!(pair[0] < pair[1]);
    }

    // Order survives rotation
    let entries = LogReader::open(tmp.path()).read_all().unwrap();
    let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["e0", "e1", "e2", "e3"]);
}

#[test]
fn close_flushes_cleanly() {
    let tmp = TempDir::new().unwrap();
    let writer = LogWriter::open(tmp.path()).unwrap();
    writer.append(&entry("e1")).unwrap();
    writer.close().unwrap();
}
