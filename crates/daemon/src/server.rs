// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and request dispatch.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UnixStream;
use tracing::{debug, error};
use walrus_core::Lsn;
use walrus_replay::{dedupe_by_content, replay, PgTarget};
use walrus_storage::NavigateError;

use crate::lifecycle::AppState;
use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// Budget for one replay request
const REPLAY_TIMEOUT: Duration = Duration::from_secs(30);

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

/// Serve a single client connection: one request, one response
pub async fn handle_connection(state: Arc<AppState>, stream: UnixStream) -> Result<(), ServerError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
        Ok(request) => request,
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("client disconnected before sending a request");
            return Ok(());
        }
        Err(e) => {
            error!(error = %e, "failed to read request");
            return Err(e.into());
        }
    };

    debug!(?request, "received request");
    let response = handle_request(&state, request).await;

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;
    Ok(())
}

/// Dispatch one request over the registries, navigator, and replayer
pub async fn handle_request(state: &AppState, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },

        Request::Status => Response::Status {
            uptime_secs: state.start_time.elapsed().as_secs(),
            entries_captured: state.entries_captured.load(Ordering::Relaxed),
            ingest_connected: state.ingest_connected.load(Ordering::Relaxed),
            active_session: state.sessions.get_active().ok().map(|s| s.id),
        },

        Request::Shutdown => {
            state.shutdown.cancel();
            Response::ShuttingDown
        }

        Request::SessionCreate {
            name,
            description,
            database,
        } => match state.sessions.create(&name, &description, &database) {
            Ok(session) => Response::Session {
                session: Box::new(session),
            },
            Err(e) => error_response(e),
        },

        Request::SessionList => Response::Sessions {
            sessions: state.sessions.list(),
        },

        Request::SessionGet { id } => match state.sessions.get(&id) {
            Ok(session) => Response::Session {
                session: Box::new(session),
            },
            Err(e) => error_response(e),
        },

        Request::SessionDelete { id } => match state.sessions.delete(&id) {
            Ok(()) => Response::Ok,
            Err(e) => error_response(e),
        },

        Request::SessionSwitch { id } => match state.sessions.switch(&id) {
            Ok(()) => Response::Ok,
            Err(e) => error_response(e),
        },

        Request::CheckpointCreate {
            name,
            description,
            lsn,
            entry_index,
            session_id,
        } => create_checkpoint(state, name, description, lsn, entry_index, session_id),

        Request::CheckpointList { session_id } => Response::Checkpoints {
            checkpoints: state.checkpoints.list(session_id.as_deref()),
        },

        Request::CheckpointGet { id } => match state.checkpoints.get(&id) {
            Ok(checkpoint) => Response::Checkpoint {
                checkpoint: Box::new(checkpoint),
            },
            Err(e) => error_response(e),
        },

        Request::CheckpointDelete { id } => match state.checkpoints.delete(&id) {
            Ok(()) => Response::Ok,
            Err(e) => error_response(e),
        },

        Request::NavigateUpTo { checkpoint_id } => {
            entries_response(state.navigator.entries_up_to(&checkpoint_id))
        }

        Request::NavigateBetween { start_id, end_id } => {
            entries_response(state.navigator.entries_between(&start_id, &end_id))
        }

        Request::Replay {
            session_id,
            checkpoint_id,
        } => replay_request(state, &session_id, &checkpoint_id).await,

        Request::WalTail { limit } => match state.log_reader().read_all() {
            Ok(entries) => {
                let total = entries.len();
                let start = total.saturating_sub(limit);
                Response::Entries {
                    entries: entries[start..].to_vec(),
                    total,
                }
            }
            Err(e) => error_response(e),
        },
    }
}

fn create_checkpoint(
    state: &AppState,
    name: String,
    description: String,
    lsn: Option<Lsn>,
    entry_index: Option<usize>,
    session_id: Option<String>,
) -> Response {
    let reader = state.log_reader();

    // Defaults come from the daemon's own view of the log and sessions
    let entry_index = match entry_index {
        Some(index) => index,
        None => match reader.count() {
            Ok(count) => count.saturating_sub(1),
            Err(e) => return error_response(e),
        },
    };
    let lsn = match lsn {
        Some(lsn) => lsn,
        None => match reader.last_lsn() {
            Ok(last) => last.unwrap_or(Lsn::ZERO),
            Err(e) => return error_response(e),
        },
    };
    let session_id = session_id
        .or_else(|| state.sessions.get_active().ok().map(|s| s.id))
        .unwrap_or_default();

    let checkpoint = match state
        .checkpoints
        .create(&name, &description, lsn, entry_index, &session_id)
    {
        Ok(checkpoint) => checkpoint,
        Err(e) => return error_response(e),
    };

    // Two catalogs, two persists; a crash between them leaves an orphan
    // checkpoint, which navigation tolerates
    if !session_id.is_empty() {
        if let Err(e) = state.sessions.add_checkpoint(&session_id, &checkpoint.id) {
            return error_response(e);
        }
    }

    Response::Checkpoint {
        checkpoint: Box::new(checkpoint),
    }
}

async fn replay_request(state: &AppState, session_id: &str, checkpoint_id: &str) -> Response {
    let session = match state.sessions.get(session_id) {
        Ok(session) => session,
        Err(e) => return error_response(e),
    };

    let entries = match state.navigator.entries_up_to(checkpoint_id) {
        Ok(entries) => entries,
        Err(e) => return error_response(e),
    };
    // Capture is at-least-once; drop re-delivered duplicates before applying
    let entries = dedupe_by_content(entries);

    let mut target = match PgTarget::connect(&state.config.target, &session.database).await {
        Ok(target) => target,
        Err(e) => return error_response(e),
    };

    let outcome = tokio::time::timeout(
        REPLAY_TIMEOUT,
        replay(&state.shutdown, &session, &entries, &mut target),
    )
    .await;

    match outcome {
        Err(_elapsed) => Response::Error {
            message: format!("replay timed out after {}s", REPLAY_TIMEOUT.as_secs()),
        },
        Ok(Err(e)) => error_response(e),
        Ok(Ok(applied)) => Response::ReplayResult { applied },
    }
}

fn entries_response(result: Result<Vec<walrus_core::Entry>, NavigateError>) -> Response {
    match result {
        Ok(entries) => {
            let total = entries.len();
            Response::Entries { entries, total }
        }
        Err(e) => error_response(e),
    }
}

fn error_response(e: impl std::fmt::Display) -> Response {
    Response::Error {
        message: e.to_string(),
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
