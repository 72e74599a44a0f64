// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! walrus - capture and replay Postgres change traces

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use clap::{Parser, Subcommand};

mod client;
mod commands;
mod output;

#[derive(Parser)]
#[command(name = "walrus")]
#[command(about = "Capture and replay Postgres change traces")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: output::OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the walrusd daemon
    Daemon {
        #[command(subcommand)]
        command: commands::daemon::DaemonCommand,
    },
    /// Manage replay sessions
    Session {
        #[command(subcommand)]
        command: commands::session::SessionCommand,
    },
    /// Manage checkpoints
    Checkpoint {
        #[command(subcommand)]
        command: commands::checkpoint::CheckpointCommand,
    },
    /// Slice the captured log by checkpoints
    Navigate {
        #[command(subcommand)]
        command: commands::navigate::NavigateCommand,
    },
    /// Replay a log prefix into a session's target database
    Replay {
        /// Session to replay under
        session_id: String,
        /// Checkpoint bounding the replayed prefix
        checkpoint_id: String,
    },
    /// Inspect the captured log
    Wal {
        #[command(subcommand)]
        command: commands::wal::WalCommand,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon { command } => commands::daemon::handle(command, cli.format).await,
        Commands::Session { command } => commands::session::handle(command, cli.format).await,
        Commands::Checkpoint { command } => commands::checkpoint::handle(command, cli.format).await,
        Commands::Navigate { command } => commands::navigate::handle(command, cli.format).await,
        Commands::Replay {
            session_id,
            checkpoint_id,
        } => commands::replay::handle(&session_id, &checkpoint_id, cli.format).await,
        Commands::Wal { command } => commands::wal::handle(command, cli.format).await,
    }
}
