// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `walrus wal` subcommands

use anyhow::bail;
use clap::Subcommand;
use walrus_daemon::{Request, Response};

use crate::client::DaemonClient;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum WalCommand {
    /// Show the last entries of the captured log
    Tail {
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
}

pub async fn handle(command: WalCommand, format: OutputFormat) -> anyhow::Result<()> {
    let client = DaemonClient::connect()?;
    match command {
        WalCommand::Tail { limit } => match client.send(Request::WalTail { limit }).await? {
            Response::Entries { entries, total } => output::print_entries(&entries, total, format),
            Response::Error { message } => bail!(message),
            _ => bail!("unexpected response from walrusd"),
        },
    }
}
