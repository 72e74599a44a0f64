// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output rendering for CLI commands

use serde::Serialize;
use walrus_core::Entry;
use walrus_storage::{Checkpoint, Session};

/// How command output is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_session(session: &Session, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(session),
        OutputFormat::Text => {
            let marker = if session.active { " (active)" } else { "" };
            println!("{}  {}{}", session.id, session.name, marker);
            println!("  database:    {}", session.database);
            if !session.description.is_empty() {
                println!("  description: {}", session.description);
            }
            println!("  created:     {}", session.created_at.to_rfc3339());
            println!("  checkpoints: {}", session.checkpoints.len());
            Ok(())
        }
    }
}

pub fn print_sessions(sessions: &[Session], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&sessions),
        OutputFormat::Text => {
            if sessions.is_empty() {
                println!("no sessions");
                return Ok(());
            }
            for session in sessions {
                let marker = if session.active { "*" } else { " " };
                println!(
                    "{} {}  {}  {} checkpoint(s)",
                    marker,
                    session.id,
                    session.name,
                    session.checkpoints.len()
                );
            }
            Ok(())
        }
    }
}

pub fn print_checkpoint(checkpoint: &Checkpoint, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(checkpoint),
        OutputFormat::Text => {
            println!("{}  {}", checkpoint.id, checkpoint.name);
            println!("  lsn:         {}", checkpoint.lsn);
            println!("  entry index: {}", checkpoint.entry_index);
            if !checkpoint.session_id.is_empty() {
                println!("  session:     {}", checkpoint.session_id);
            }
            if !checkpoint.description.is_empty() {
                println!("  description: {}", checkpoint.description);
            }
            println!("  created:     {}", checkpoint.timestamp.to_rfc3339());
            Ok(())
        }
    }
}

pub fn print_checkpoints(checkpoints: &[Checkpoint], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&checkpoints),
        OutputFormat::Text => {
            if checkpoints.is_empty() {
                println!("no checkpoints");
                return Ok(());
            }
            for checkpoint in checkpoints {
                println!(
                    "{}  {}  lsn={}  index={}",
                    checkpoint.id, checkpoint.name, checkpoint.lsn, checkpoint.entry_index
                );
            }
            Ok(())
        }
    }
}

pub fn print_entries(entries: &[Entry], total: usize, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&entries),
        OutputFormat::Text => {
            for entry in entries {
                let table = if entry.table.is_empty() {
                    "?".to_string()
                } else if entry.schema.is_empty() {
                    entry.table.clone()
                } else {
                    format!("{}.{}", entry.schema, entry.table)
                };
                println!(
                    "{}  {}  {:6}  {}",
                    entry.lsn, entry.timestamp.to_rfc3339(), entry.operation, table
                );
            }
            println!("{} of {} entries", entries.len(), total);
            Ok(())
        }
    }
}

pub fn print_status(
    uptime_secs: u64,
    entries_captured: u64,
    ingest_connected: bool,
    active_session: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "uptime_secs": uptime_secs,
            "entries_captured": entries_captured,
            "ingest_connected": ingest_connected,
            "active_session": active_session,
        })),
        OutputFormat::Text => {
            println!("uptime:           {uptime_secs}s");
            println!("entries captured: {entries_captured}");
            println!(
                "ingest:           {}",
                if ingest_connected {
                    "connected"
                } else {
                    "disconnected"
                }
            );
            println!("active session:   {}", active_session.unwrap_or("none"));
            Ok(())
        }
    }
}
