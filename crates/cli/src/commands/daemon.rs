// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `walrus daemon` subcommands

use anyhow::bail;
use clap::Subcommand;
use walrus_daemon::{Request, Response};

use crate::client::{self, DaemonClient};
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start walrusd in the background
    Start,
    /// Stop a running walrusd
    Stop,
    /// Show daemon status
    Status,
}

pub async fn handle(command: DaemonCommand, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        DaemonCommand::Start => {
            client::daemon_start().await?;
            println!("walrusd started");
            Ok(())
        }

        DaemonCommand::Stop => {
            if client::daemon_stop().await? {
                println!("walrusd stopped");
            } else {
                println!("walrusd is not running");
            }
            Ok(())
        }

        DaemonCommand::Status => {
            let client = DaemonClient::connect()?;
            match client.send(Request::Status).await? {
                Response::Status {
                    uptime_secs,
                    entries_captured,
                    ingest_connected,
                    active_session,
                } => output::print_status(
                    uptime_secs,
                    entries_captured,
                    ingest_connected,
                    active_session.as_deref(),
                    format,
                ),
                Response::Error { message } => bail!(message),
                _ => bail!("unexpected response from walrusd"),
            }
        }
    }
}
