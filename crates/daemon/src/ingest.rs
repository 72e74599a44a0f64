// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ingest supervision
//!
//! The consumer itself never reconnects; this supervisor owns that policy.
//! Each failure tears the connection down, waits out a doubling backoff,
//! and starts a fresh consumer that resumes from the last captured
//! position.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use walrus_capture::{CaptureError, ReplicationConsumer};

use crate::lifecycle::AppState;

pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Run the ingest pipeline until shutdown
pub async fn run(state: Arc<AppState>) {
    let mut backoff = INITIAL_BACKOFF;

    loop {
        if state.shutdown.is_cancelled() {
            break;
        }

        let mut consumer = ReplicationConsumer::new(
            state.config.source.clone(),
            state.config.replication.clone(),
            Arc::clone(&state.log),
            state.log_reader(),
            Arc::clone(&state.entries_captured),
        );

        let result = run_once(&state, &mut consumer).await;
        let was_streaming = state.ingest_connected.swap(false, Ordering::Relaxed);
        consumer.close().await;

        match result {
            Err(CaptureError::Cancelled) => {
                info!("ingest cancelled");
                break;
            }
            Err(e) => {
                if was_streaming {
                    backoff = INITIAL_BACKOFF;
                }
                warn!(error = %e, backoff_secs = backoff.as_secs(), "ingest failed; will reconnect");
                tokio::select! {
                    _ = state.shutdown.cancelled() => break,
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
            Ok(()) => break,
        }
    }
}

async fn run_once(
    state: &AppState,
    consumer: &mut ReplicationConsumer,
) -> Result<(), CaptureError> {
    consumer.connect().await?;
    consumer.ensure_slot().await?;
    state.ingest_connected.store(true, Ordering::Relaxed);
    consumer.start(&state.shutdown).await
}
