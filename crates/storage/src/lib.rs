// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! walrus-storage: the durable side of walrus.
//!
//! The log store persists captured entries as JSON lines in rotated
//! segments. The checkpoint and session registries hold the named-position
//! catalogs, and the navigator materializes log slices bounded by
//! checkpoint identities.

pub mod checkpoint;
pub mod navigator;
pub mod persist;
pub mod session;
pub mod wal;

pub use checkpoint::{Checkpoint, CheckpointRegistry};
pub use navigator::{NavigateError, Navigator};
pub use persist::RegistryError;
pub use session::{Session, SessionRegistry};
pub use wal::{LogReader, LogWriter, WalError};
