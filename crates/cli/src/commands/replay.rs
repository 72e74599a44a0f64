// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `walrus replay`

use anyhow::bail;
use walrus_daemon::{Request, Response};

use crate::client::DaemonClient;
use crate::output::OutputFormat;

pub async fn handle(
    session_id: &str,
    checkpoint_id: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let client = DaemonClient::connect()?;
    match client
        .send(Request::Replay {
            session_id: session_id.to_string(),
            checkpoint_id: checkpoint_id.to_string(),
        })
        .await?
    {
        Response::ReplayResult { applied } => {
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({ "applied": applied }))
                }
                OutputFormat::Text => println!("applied {applied} entries"),
            }
            Ok(())
        }
        Response::Error { message } => bail!(message),
        _ => bail!("unexpected response from walrusd"),
    }
}
