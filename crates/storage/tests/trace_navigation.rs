// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end flows over the log store, registries, and navigator.

use std::io::Write as _;
use std::sync::Arc;

use tempfile::TempDir;
use walrus_core::{Entry, Lsn, Operation};
use walrus_storage::{CheckpointRegistry, LogReader, LogWriter, Navigator, SessionRegistry};

fn entry(id: &str, lsn: u64) -> Entry {
    let mut e = Entry::new(Operation::Insert, Lsn(lsn));
    e.id = id.to_string();
    e
}

#[test]
fn write_close_then_read_back_in_order() {
    let tmp = TempDir::new().unwrap();

    let writer = LogWriter::open(tmp.path()).unwrap();
    for (i, id) in ["e1", "e2", "e3"].iter().enumerate() {
        writer.append(&entry(id, i as u64)).unwrap();
    }
    writer.close().unwrap();

    let entries = LogReader::open(tmp.path()).read_all().unwrap();
    let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["e1", "e2", "e3"]);
}

#[test]
fn session_and_checkpoint_link_survives_reload() {
    let session_dir = TempDir::new().unwrap();
    let checkpoint_dir = TempDir::new().unwrap();

    let sessions = SessionRegistry::open(session_dir.path()).unwrap();
    let checkpoints = CheckpointRegistry::open(checkpoint_dir.path()).unwrap();

    let session = sessions.create("smoke", "", "replica_db").unwrap();
    let cp = checkpoints
        .create("first", "", Lsn(42), 1, &session.id)
        .unwrap();
    sessions.add_checkpoint(&session.id, &cp.id).unwrap();

    // Fresh registries over the same directories
    let sessions = SessionRegistry::open(session_dir.path()).unwrap();
    let checkpoints = CheckpointRegistry::open(checkpoint_dir.path()).unwrap();

    let session = sessions.get(&session.id).unwrap();
    assert!(session.checkpoints.contains(&cp.id));
    assert_eq!(checkpoints.get(&cp.id).unwrap().session_id, session.id);
}

#[test]
fn checkpoint_at_index_two_covers_three_of_five() {
    let wal_dir = TempDir::new().unwrap();
    let cp_dir = TempDir::new().unwrap();

    let writer = LogWriter::open(wal_dir.path()).unwrap();
    for i in 0..5 {
        writer.append(&entry(&format!("e{i}"), i)).unwrap();
    }
    writer.close().unwrap();

    let checkpoints = Arc::new(CheckpointRegistry::open(cp_dir.path()).unwrap());
    let cp = checkpoints.create("mid", "", Lsn(2), 2, "").unwrap();
    let navigator = Navigator::new(LogReader::open(wal_dir.path()), checkpoints);

    let slice = navigator.entries_up_to(&cp.id).unwrap();
    assert_eq!(slice.len(), 3);
    assert_eq!(slice.last().unwrap().id, "e2");
}

#[test]
fn range_between_checkpoints_is_inclusive_and_symmetric() {
    let wal_dir = TempDir::new().unwrap();
    let cp_dir = TempDir::new().unwrap();

    let writer = LogWriter::open(wal_dir.path()).unwrap();
    for i in 0..5 {
        writer.append(&entry(&format!("e{i}"), i)).unwrap();
    }
    writer.close().unwrap();

    let checkpoints = Arc::new(CheckpointRegistry::open(cp_dir.path()).unwrap());
    let a = checkpoints.create("a", "", Lsn(1), 1, "").unwrap();
    let b = checkpoints.create("b", "", Lsn(3), 3, "").unwrap();
    let navigator = Navigator::new(LogReader::open(wal_dir.path()), checkpoints);

    let forward = navigator.entries_between(&a.id, &b.id).unwrap();
    let ids: Vec<_> = forward.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["e1", "e2", "e3"]);

    let backward = navigator.entries_between(&b.id, &a.id).unwrap();
    assert_eq!(forward, backward);
}

#[test]
fn killed_writer_leaves_a_readable_log() {
    let tmp = TempDir::new().unwrap();

    let writer = LogWriter::open(tmp.path()).unwrap();
    writer.append(&entry("e1", 1)).unwrap();
    writer.append(&entry("e2", 2)).unwrap();
    let segment = tmp.path().join(writer.current_segment());
    drop(writer);

    // Mid-line crash: an entry with its separator chopped off
    let half = entry("e3", 3).to_line().unwrap();
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(&segment)
        .unwrap();
    write!(file, "{}", &half[..half.len() / 2]).unwrap();
    drop(file);

    let entries = LogReader::open(tmp.path()).read_all().unwrap();
    let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["e1", "e2"]);
}

#[test]
fn switching_sessions_updates_the_catalog_on_disk() {
    let tmp = TempDir::new().unwrap();
    let sessions = SessionRegistry::open(tmp.path()).unwrap();

    let s1 = sessions.create("one", "", "db").unwrap();
    let s2 = sessions.create("two", "", "db").unwrap();
    sessions.switch(&s1.id).unwrap();
    sessions.switch(&s2.id).unwrap();

    let raw = std::fs::read_to_string(tmp.path().join("sessions.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["sessions"][&s1.id]["active"], false);
    assert_eq!(json["sessions"][&s2.id]["active"], true);
    assert_eq!(json["active"], s2.id.as_str());
}
