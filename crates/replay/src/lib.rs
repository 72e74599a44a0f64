// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! walrus-replay: applies an ordered slice of captured entries to a target
//! database under a session context.
//!
//! The engine is written against the [`SqlTarget`] trait so it can be
//! exercised without a database; [`PgTarget`] is the production
//! implementation and [`FakeTarget`] the recording test double.

pub mod fake;
pub mod replayer;
pub mod sql;
pub mod target;

use thiserror::Error;

pub use fake::FakeTarget;
pub use replayer::{dedupe_by_content, replay};
pub use target::{PgTarget, SqlTarget, TargetError};

/// Errors from the replay engine
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("connect to target {host}:{port}/{database}: {source}")]
    Connect {
        host: String,
        port: u16,
        database: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// A single entry failed; replay stops here and partial application is
    /// visible on the target
    #[error("apply entry {entry_id}: {reason}")]
    Apply { entry_id: String, reason: String },

    #[error("replay cancelled after {applied} entries")]
    Cancelled { applied: usize },
}
