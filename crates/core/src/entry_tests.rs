// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use proptest::prelude::*;
use yare::parameterized;

fn sample_entry() -> Entry {
    let mut data = ColumnMap::new();
    data.insert("id".to_string(), Value::from(1_i64));
    data.insert("name".to_string(), Value::from("widget"));

    let mut entry = Entry::new(Operation::Insert, "0/16B3748".parse().unwrap());
    entry.schema = "public".to_string();
    entry.table = "widgets".to_string();
    entry.data = Some(data);
    entry
}

#[parameterized(
    insert = { Operation::Insert, "INSERT" },
    update = { Operation::Update, "UPDATE" },
    delete = { Operation::Delete, "DELETE" },
    ddl = { Operation::SchemaChange, "DDL" },
)]
fn operation_tags(op: Operation, tag: &str) {
    assert_eq!(op.as_str(), tag);
    assert_eq!(serde_json::to_string(&op).unwrap(), format!("\"{tag}\""));
    let back: Operation = serde_json::from_str(&format!("\"{tag}\"")).unwrap();
    assert_eq!(back, op);
}

#[test]
fn new_stamps_unique_ids() {
    let a = Entry::new(Operation::Insert, Lsn::ZERO);
    let b = Entry::new(Operation::Insert, Lsn::ZERO);
    assert_ne!(a.id, b.id);
}

#[test]
fn line_roundtrip_preserves_all_fields() {
    let entry = sample_entry();
    let line = entry.to_line().unwrap();
    let back = Entry::from_line(&line).unwrap();
    assert_eq!(back, entry);
}

#[test]
fn line_carries_expected_keys() {
    let line = sample_entry().to_line().unwrap();
    let json: serde_json::Value = serde_json::from_str(&line).unwrap();
    for key in ["id", "timestamp", "lsn", "operation", "schema", "table", "data"] {
        assert!(json.get(key).is_some(), "missing key {key}");
    }
    // Optional fields are omitted when unset
    assert!(json.get("old_data").is_none());
    assert!(json.get("sql").is_none());
    assert!(json.get("checkpoint_id").is_none());
}

#[test]
fn delete_serializes_null_new_image() {
    let mut entry = Entry::new(Operation::Delete, Lsn::ZERO);
    entry.old_data = Some(ColumnMap::new());
    let json: serde_json::Value = serde_json::from_str(&entry.to_line().unwrap()).unwrap();
    assert!(json.get("data").unwrap().is_null());
    assert!(json.get("old_data").is_some());
}

#[test]
fn timestamp_is_iso8601_with_timezone() {
    let line = sample_entry().to_line().unwrap();
    let json: serde_json::Value = serde_json::from_str(&line).unwrap();
    let ts = json.get("timestamp").unwrap().as_str().unwrap();
    assert!(
        ts.ends_with('Z') || ts.contains('+'),
        "timestamp lacks timezone: {ts}"
    );
}

#[test]
fn from_line_rejects_garbage() {
    assert!(Entry::from_line("not json").is_err());
    assert!(Entry::from_line("{\"id\": 1}").is_err());
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 _-]{0,16}".prop_map(Value::Text),
        proptest::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
    ]
}

fn column_map_strategy() -> impl Strategy<Value = ColumnMap> {
    proptest::collection::btree_map("[a-z_][a-z0-9_]{0,8}", value_strategy(), 0..6)
}

fn entry_strategy() -> impl Strategy<Value = Entry> {
    (
        "[a-f0-9-]{8,36}",
        0i64..4_000_000_000,
        any::<u64>(),
        prop_oneof![
            Just(Operation::Insert),
            Just(Operation::Update),
            Just(Operation::Delete),
            Just(Operation::SchemaChange),
        ],
        "[a-z_]{0,8}",
        "[a-z_]{0,8}",
        proptest::option::of(column_map_strategy()),
        proptest::option::of(column_map_strategy()),
        proptest::option::of("[a-zA-Z0-9 ();']{0,24}"),
        proptest::option::of("[a-f0-9-]{8,36}"),
    )
        .prop_map(
            |(id, secs, raw_lsn, operation, schema, table, data, old_data, sql, checkpoint_id)| {
                Entry {
                    id,
                    timestamp: chrono::Utc.timestamp_opt(secs, 0).unwrap(),
                    lsn: Lsn(raw_lsn),
                    operation,
                    schema,
                    table,
                    data,
                    old_data,
                    sql,
                    checkpoint_id,
                }
            },
        )
}

proptest! {
    #[test]
    fn entry_json_roundtrip(entry in entry_strategy()) {
        let line = entry.to_line().unwrap();
        let back = Entry::from_line(&line).unwrap();
        prop_assert_eq!(back, entry);
    }
}
