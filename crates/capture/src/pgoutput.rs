// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pgoutput logical message decoding (protocol version 1)
//!
//! Only the message kinds the consumer acts on are modeled fully:
//! Relation (to learn column names) and Insert/Update/Delete (to build
//! entries). Transaction framing and the remaining kinds parse to
//! [`LogicalMessage::Other`] and are ignored upstream.

use std::collections::HashMap;

use bytes::{Buf, Bytes};
use walrus_core::Lsn;

use crate::error::CaptureError;
use crate::frames::ensure;

/// One column slot in a decoded tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TupleValue {
    /// SQL NULL marker
    Null,
    /// Unchanged TOAST datum; the value was not sent
    Unchanged,
    /// Text-format value
    Text(Vec<u8>),
    /// Binary-format value
    Binary(Vec<u8>),
}

/// A decoded row image
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TupleData {
    pub columns: Vec<TupleValue>,
}

/// One column of a relation, from a Relation message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationColumn {
    pub name: String,
    pub type_oid: u32,
    /// Part of the relation's replica identity key
    pub key: bool,
}

/// Schema of a streamed relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub id: u32,
    pub namespace: String,
    pub name: String,
    pub replica_identity: u8,
    pub columns: Vec<RelationColumn>,
}

/// A decoded pgoutput message
#[derive(Debug, Clone)]
pub enum LogicalMessage {
    Begin {
        final_lsn: Lsn,
        commit_time_micros: i64,
        xid: u32,
    },
    Commit {
        commit_lsn: Lsn,
        end_lsn: Lsn,
        commit_time_micros: i64,
    },
    Relation(Relation),
    Insert {
        relation_id: u32,
        new: TupleData,
    },
    Update {
        relation_id: u32,
        old: Option<TupleData>,
        new: TupleData,
    },
    Delete {
        relation_id: u32,
        old: TupleData,
    },
    /// A kind the consumer does not act on (Origin, Type, Truncate, ...)
    Other(u8),
}

impl LogicalMessage {
    pub fn parse(buf: &mut Bytes) -> Result<Self, CaptureError> {
        ensure(buf, 1, "pgoutput message")?;
        let kind = buf.get_u8();
        match kind {
            b'B' => {
                ensure(buf, 20, "begin")?;
                Ok(LogicalMessage::Begin {
                    final_lsn: Lsn(buf.get_u64()),
                    commit_time_micros: buf.get_i64(),
                    xid: buf.get_u32(),
                })
            }
            b'C' => {
                ensure(buf, 25, "commit")?;
                let _flags = buf.get_u8();
                Ok(LogicalMessage::Commit {
                    commit_lsn: Lsn(buf.get_u64()),
                    end_lsn: Lsn(buf.get_u64()),
                    commit_time_micros: buf.get_i64(),
                })
            }
            b'R' => Ok(LogicalMessage::Relation(parse_relation(buf)?)),
            b'I' => {
                ensure(buf, 5, "insert")?;
                let relation_id = buf.get_u32();
                let marker = buf.get_u8();
                if marker != b'N' {
                    return Err(CaptureError::Decode(format!(
                        "insert: expected new-tuple marker, got {marker:#x}"
                    )));
                }
                Ok(LogicalMessage::Insert {
                    relation_id,
                    new: parse_tuple(buf)?,
                })
            }
            b'U' => {
                ensure(buf, 5, "update")?;
                let relation_id = buf.get_u32();
                let mut old = None;
                let mut marker = buf.get_u8();
                if marker == b'K' || marker == b'O' {
                    old = Some(parse_tuple(buf)?);
                    ensure(buf, 1, "update new-tuple marker")?;
                    marker = buf.get_u8();
                }
                if marker != b'N' {
                    return Err(CaptureError::Decode(format!(
                        "update: expected new-tuple marker, got {marker:#x}"
                    )));
                }
                Ok(LogicalMessage::Update {
                    relation_id,
                    old,
                    new: parse_tuple(buf)?,
                })
            }
            b'D' => {
                ensure(buf, 5, "delete")?;
                let relation_id = buf.get_u32();
                let marker = buf.get_u8();
                if marker != b'K' && marker != b'O' {
                    return Err(CaptureError::Decode(format!(
                        "delete: expected old-tuple marker, got {marker:#x}"
                    )));
                }
                Ok(LogicalMessage::Delete {
                    relation_id,
                    old: parse_tuple(buf)?,
                })
            }
            other => Ok(LogicalMessage::Other(other)),
        }
    }
}

fn parse_relation(buf: &mut Bytes) -> Result<Relation, CaptureError> {
    ensure(buf, 4, "relation")?;
    let id = buf.get_u32();
    let namespace = read_cstr(buf)?;
    let name = read_cstr(buf)?;
    ensure(buf, 3, "relation header")?;
    let replica_identity = buf.get_u8();
    let column_count = buf.get_u16();

    let mut columns = Vec::with_capacity(column_count as usize);
    for _ in 0..column_count {
        ensure(buf, 1, "relation column flags")?;
        let flags = buf.get_u8();
        let name = read_cstr(buf)?;
        ensure(buf, 8, "relation column types")?;
        let type_oid = buf.get_u32();
        let _type_modifier = buf.get_i32();
        columns.push(RelationColumn {
            name,
            type_oid,
            key: flags & 1 != 0,
        });
    }

    Ok(Relation {
        id,
        namespace,
        name,
        replica_identity,
        columns,
    })
}

fn parse_tuple(buf: &mut Bytes) -> Result<TupleData, CaptureError> {
    ensure(buf, 2, "tuple column count")?;
    let column_count = buf.get_u16();

    let mut columns = Vec::with_capacity(column_count as usize);
    for _ in 0..column_count {
        ensure(buf, 1, "tuple column kind")?;
        match buf.get_u8() {
            b'n' => columns.push(TupleValue::Null),
            b'u' => columns.push(TupleValue::Unchanged),
            kind @ (b't' | b'b') => {
                ensure(buf, 4, "tuple column length")?;
                let len = buf.get_i32();
                if len < 0 || buf.remaining() < len as usize {
                    return Err(CaptureError::Decode(format!(
                        "tuple column length {len} exceeds message"
                    )));
                }
                let data = buf.split_to(len as usize).to_vec();
                columns.push(if kind == b't' {
                    TupleValue::Text(data)
                } else {
                    TupleValue::Binary(data)
                });
            }
            other => {
                return Err(CaptureError::Decode(format!(
                    "unknown tuple column kind {other:#x}"
                )))
            }
        }
    }

    Ok(TupleData { columns })
}

fn read_cstr(buf: &mut Bytes) -> Result<String, CaptureError> {
    let end = buf
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| CaptureError::Decode("unterminated string".to_string()))?;
    let raw = buf.split_to(end);
    buf.advance(1);
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

/// Relation-id → schema cache, populated from Relation messages.
///
/// Lets entries carry real schema, table, and column names; rows from a
/// relation the stream has not described yet fall back to positional
/// `col_i` keys.
#[derive(Debug, Default)]
pub struct RelationCache {
    relations: HashMap<u32, Relation>,
}

impl RelationCache {
    pub fn insert(&mut self, relation: Relation) {
        self.relations.insert(relation.id, relation);
    }

    pub fn get(&self, id: u32) -> Option<&Relation> {
        self.relations.get(&id)
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

#[cfg(test)]
#[path = "pgoutput_tests.rs"]
mod tests;
