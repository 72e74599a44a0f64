// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use walrus_core::Lsn;

fn map(pairs: &[(&str, Value)]) -> ColumnMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn entry(operation: Operation) -> Entry {
    let mut e = Entry::new(operation, Lsn(1));
    e.schema = "public".to_string();
    e.table = "widgets".to_string();
    e
}

#[test]
fn idents_are_quoted_and_doubled() {
    assert_eq!(quote_ident("name"), "\"name\"");
    assert_eq!(quote_ident("weird\"col"), "\"weird\"\"col\"");
    assert_eq!(quote_ident("MixedCase"), "\"MixedCase\"");
}

#[test]
fn literals_render_each_variant() {
    assert_eq!(quote_literal(&Value::Null), "NULL");
    assert_eq!(quote_literal(&Value::Bool(true)), "TRUE");
    assert_eq!(quote_literal(&Value::Bool(false)), "FALSE");
    assert_eq!(quote_literal(&Value::from(42_i64)), "42");
    assert_eq!(quote_literal(&Value::from("o'clock")), "'o''clock'");
    assert_eq!(
        quote_literal(&Value::Bytes(vec![0xDE, 0xAD])),
        "'\\xdead'"
    );
}

#[test]
fn table_ref_handles_missing_schema() {
    assert_eq!(table_ref("public", "t"), "\"public\".\"t\"");
    assert_eq!(table_ref("", "t"), "\"t\"");
}

#[test]
fn insert_statement_lists_new_image_columns() {
    let mut e = entry(Operation::Insert);
    e.data = Some(map(&[
        ("id", Value::from("1")),
        ("label", Value::from("anvil")),
    ]));

    let sql = statement_for(&e).unwrap().unwrap();
    assert_eq!(
        sql,
        "INSERT INTO \"public\".\"widgets\" (\"id\", \"label\") VALUES ('1', 'anvil')"
    );
}

#[test]
fn update_statement_sets_new_and_matches_old() {
    let mut e = entry(Operation::Update);
    e.data = Some(map(&[
        ("id", Value::from("1")),
        ("label", Value::from("renamed")),
    ]));
    e.old_data = Some(map(&[("id", Value::from("1"))]));

    let sql = statement_for(&e).unwrap().unwrap();
    assert_eq!(
        sql,
        "UPDATE \"public\".\"widgets\" SET \"id\" = '1', \"label\" = 'renamed' WHERE \"id\" = '1'"
    );
}

#[test]
fn delete_statement_matches_the_old_image() {
    let mut e = entry(Operation::Delete);
    e.old_data = Some(map(&[
        ("id", Value::from("7")),
        ("label", Value::from("gone")),
    ]));

    let sql = statement_for(&e).unwrap().unwrap();
    assert_eq!(
        sql,
        "DELETE FROM \"public\".\"widgets\" WHERE \"id\" = '7' AND \"label\" = 'gone'"
    );
}

#[test]
fn null_predicates_use_is_null() {
    let mut e = entry(Operation::Delete);
    e.old_data = Some(map(&[("label", Value::Null)]));

    let sql = statement_for(&e).unwrap().unwrap();
    assert_eq!(
        sql,
        "DELETE FROM \"public\".\"widgets\" WHERE \"label\" IS NULL"
    );
}

#[test]
fn schema_change_passes_the_statement_through() {
    let mut e = entry(Operation::SchemaChange);
    e.sql = Some("ALTER TABLE widgets ADD COLUMN price int".to_string());
    assert_eq!(
        statement_for(&e).unwrap().unwrap(),
        "ALTER TABLE widgets ADD COLUMN price int"
    );
}

#[test]
fn schema_change_without_text_is_a_no_op() {
    let e = entry(Operation::SchemaChange);
    assert!(statement_for(&e).unwrap().is_none());
}

#[test]
fn update_without_old_image_is_unreplayable() {
    let mut e = entry(Operation::Update);
    e.data = Some(map(&[("id", Value::from("1"))]));
    assert!(matches!(
        statement_for(&e),
        Err(SqlError::MissingOldImage)
    ));
}

#[test]
fn insert_without_new_image_is_unreplayable() {
    let e = entry(Operation::Insert);
    assert!(matches!(statement_for(&e), Err(SqlError::MissingNewImage)));
}

#[test]
fn missing_table_is_unreplayable() {
    let mut e = Entry::new(Operation::Insert, Lsn(1));
    e.data = Some(map(&[("col_0", Value::from("1"))]));
    assert!(matches!(statement_for(&e), Err(SqlError::MissingTable)));
}

#[test]
fn empty_images_are_unreplayable() {
    let mut e = entry(Operation::Insert);
    e.data = Some(ColumnMap::new());
    assert!(matches!(statement_for(&e), Err(SqlError::EmptyImage)));
}
