// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `walrus session` subcommands

use anyhow::bail;
use clap::Subcommand;
use walrus_daemon::{Request, Response};

use crate::client::DaemonClient;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Create a session
    Create {
        name: String,
        /// Target database the session replays into
        #[arg(long)]
        database: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List sessions
    List,
    /// Show one session
    Show { id: String },
    /// Make a session the single active one
    Switch { id: String },
    /// Delete a session
    Delete { id: String },
}

pub async fn handle(command: SessionCommand, format: OutputFormat) -> anyhow::Result<()> {
    let client = DaemonClient::connect()?;
    match command {
        SessionCommand::Create {
            name,
            database,
            description,
        } => {
            match client
                .send(Request::SessionCreate {
                    name,
                    description,
                    database,
                })
                .await?
            {
                Response::Session { session } => output::print_session(&session, format),
                Response::Error { message } => bail!(message),
                _ => bail!("unexpected response from walrusd"),
            }
        }

        SessionCommand::List => match client.send(Request::SessionList).await? {
            Response::Sessions { sessions } => output::print_sessions(&sessions, format),
            Response::Error { message } => bail!(message),
            _ => bail!("unexpected response from walrusd"),
        },

        SessionCommand::Show { id } => match client.send(Request::SessionGet { id }).await? {
            Response::Session { session } => output::print_session(&session, format),
            Response::Error { message } => bail!(message),
            _ => bail!("unexpected response from walrusd"),
        },

        SessionCommand::Switch { id } => match client.send(Request::SessionSwitch { id }).await? {
            Response::Ok => {
                println!("switched");
                Ok(())
            }
            Response::Error { message } => bail!(message),
            _ => bail!("unexpected response from walrusd"),
        },

        SessionCommand::Delete { id } => match client.send(Request::SessionDelete { id }).await? {
            Response::Ok => {
                println!("deleted");
                Ok(())
            }
            Response::Error { message } => bail!(message),
            _ => bail!("unexpected response from walrusd"),
        },
    }
}
