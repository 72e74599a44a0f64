// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQL rendering from captured entries
//!
//! Statements are rendered as self-contained text (identifiers quoted,
//! values as literals) so they can run over the simple-query protocol.
//! Updates set every new-image column and match rows on the whole old
//! image; re-asserting an unchanged key is harmless, and a key-changing
//! update still finds its row through the old key in the predicate.

use thiserror::Error;
use walrus_core::{ColumnMap, Entry, Operation, Value};

/// An entry that cannot be rendered into a statement
#[derive(Debug, Error)]
pub enum SqlError {
    #[error("no table name")]
    MissingTable,
    #[error("no new row image")]
    MissingNewImage,
    /// Updates and deletes need an old image for their predicate; capture
    /// it by setting REPLICA IDENTITY FULL on the source relation
    #[error("no old row image to match on")]
    MissingOldImage,
    #[error("row image has no columns")]
    EmptyImage,
}

/// Double-quote an identifier, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Render a captured value as a SQL literal
pub fn quote_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(n) => n.to_string(),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Bytes(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
            format!("'\\x{hex}'")
        }
    }
}

/// `schema.table` with both parts quoted; bare table when schema is empty
pub fn table_ref(schema: &str, table: &str) -> String {
    if schema.is_empty() {
        quote_ident(table)
    } else {
        format!("{}.{}", quote_ident(schema), quote_ident(table))
    }
}

/// Render the statement an entry replays as; `None` for a schema change
/// without statement text (nothing to do)
pub fn statement_for(entry: &Entry) -> Result<Option<String>, SqlError> {
    match entry.operation {
        Operation::Insert => insert_statement(entry).map(Some),
        Operation::Update => update_statement(entry).map(Some),
        Operation::Delete => delete_statement(entry).map(Some),
        Operation::SchemaChange => Ok(entry.sql.clone()),
    }
}

fn insert_statement(entry: &Entry) -> Result<String, SqlError> {
    let table = require_table(entry)?;
    let data = entry.data.as_ref().ok_or(SqlError::MissingNewImage)?;
    if data.is_empty() {
        return Err(SqlError::EmptyImage);
    }

    let columns: Vec<String> = data.keys().map(|k| quote_ident(k)).collect();
    let values: Vec<String> = data.values().map(quote_literal).collect();
    Ok(format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        values.join(", ")
    ))
}

fn update_statement(entry: &Entry) -> Result<String, SqlError> {
    let table = require_table(entry)?;
    let data = entry.data.as_ref().ok_or(SqlError::MissingNewImage)?;
    let old = entry.old_data.as_ref().ok_or(SqlError::MissingOldImage)?;
    if data.is_empty() || old.is_empty() {
        return Err(SqlError::EmptyImage);
    }

    let assignments: Vec<String> = data
        .iter()
        .map(|(column, value)| format!("{} = {}", quote_ident(column), quote_literal(value)))
        .collect();
    Ok(format!(
        "UPDATE {table} SET {} WHERE {}",
        assignments.join(", "),
        predicate(old)
    ))
}

fn delete_statement(entry: &Entry) -> Result<String, SqlError> {
    let table = require_table(entry)?;
    let old = entry.old_data.as_ref().ok_or(SqlError::MissingOldImage)?;
    if old.is_empty() {
        return Err(SqlError::EmptyImage);
    }

    Ok(format!("DELETE FROM {table} WHERE {}", predicate(old)))
}

fn predicate(image: &ColumnMap) -> String {
    image
        .iter()
        .map(|(column, value)| match value {
            Value::Null => format!("{} IS NULL", quote_ident(column)),
            other => format!("{} = {}", quote_ident(column), quote_literal(other)),
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn require_table(entry: &Entry) -> Result<String, SqlError> {
    if entry.table.is_empty() {
        return Err(SqlError::MissingTable);
    }
    Ok(table_ref(&entry.schema, &entry.table))
}

#[cfg(test)]
#[path = "sql_tests.rs"]
mod tests;
