// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `walrus navigate` subcommands

use anyhow::bail;
use clap::Subcommand;
use walrus_daemon::{Request, Response};

use crate::client::DaemonClient;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum NavigateCommand {
    /// Entries from the start of the log up to a checkpoint
    Upto { checkpoint_id: String },
    /// Entries between two checkpoints, in either order
    Between { start_id: String, end_id: String },
}

pub async fn handle(command: NavigateCommand, format: OutputFormat) -> anyhow::Result<()> {
    let client = DaemonClient::connect()?;
    let request = match command {
        NavigateCommand::Upto { checkpoint_id } => Request::NavigateUpTo { checkpoint_id },
        NavigateCommand::Between { start_id, end_id } => {
            Request::NavigateBetween { start_id, end_id }
        }
    };

    match client.send(request).await? {
        Response::Entries { entries, total } => output::print_entries(&entries, total, format),
        Response::Error { message } => bail!(message),
        _ => bail!("unexpected response from walrusd"),
    }
}
