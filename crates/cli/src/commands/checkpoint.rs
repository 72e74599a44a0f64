// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `walrus checkpoint` subcommands

use anyhow::bail;
use clap::Subcommand;
use walrus_core::Lsn;
use walrus_daemon::{Request, Response};

use crate::client::DaemonClient;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum CheckpointCommand {
    /// Create a checkpoint at the current log position
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Pin an explicit source position instead of the latest captured
        #[arg(long)]
        lsn: Option<Lsn>,
        /// Pin an explicit entry index instead of the current log length
        #[arg(long)]
        entry_index: Option<usize>,
        /// Owning session; defaults to the active session
        #[arg(long)]
        session: Option<String>,
    },
    /// List checkpoints, optionally for one session
    List {
        #[arg(long)]
        session: Option<String>,
    },
    /// Show one checkpoint
    Show { id: String },
    /// Delete a checkpoint
    Delete { id: String },
}

pub async fn handle(command: CheckpointCommand, format: OutputFormat) -> anyhow::Result<()> {
    let client = DaemonClient::connect()?;
    match command {
        CheckpointCommand::Create {
            name,
            description,
            lsn,
            entry_index,
            session,
        } => {
            match client
                .send(Request::CheckpointCreate {
                    name,
                    description,
                    lsn,
                    entry_index,
                    session_id: session,
                })
                .await?
            {
                Response::Checkpoint { checkpoint } => {
                    output::print_checkpoint(&checkpoint, format)
                }
                Response::Error { message } => bail!(message),
                _ => bail!("unexpected response from walrusd"),
            }
        }

        CheckpointCommand::List { session } => {
            match client
                .send(Request::CheckpointList {
                    session_id: session,
                })
                .await?
            {
                Response::Checkpoints { checkpoints } => {
                    output::print_checkpoints(&checkpoints, format)
                }
                Response::Error { message } => bail!(message),
                _ => bail!("unexpected response from walrusd"),
            }
        }

        CheckpointCommand::Show { id } => match client.send(Request::CheckpointGet { id }).await? {
            Response::Checkpoint { checkpoint } => output::print_checkpoint(&checkpoint, format),
            Response::Error { message } => bail!(message),
            _ => bail!("unexpected response from walrusd"),
        },

        CheckpointCommand::Delete { id } => {
            match client.send(Request::CheckpointDelete { id }).await? {
                Response::Ok => {
                    println!("deleted");
                    Ok(())
                }
                Response::Error { message } => bail!(message),
                _ => bail!("unexpected response from walrusd"),
            }
        }
    }
}
