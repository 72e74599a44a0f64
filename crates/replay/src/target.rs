// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Target database abstraction
//!
//! The replayer only needs "run this statement"; everything else about the
//! target connection stays behind this trait so the engine can be tested
//! with a recording fake.

use async_trait::async_trait;
use thiserror::Error;
use tokio_postgres::NoTls;
use tracing::warn;
use walrus_core::DbConfig;

use crate::ReplayError;

/// A statement failed on the target
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TargetError(pub String);

/// Something that can execute SQL statements in order
#[async_trait]
pub trait SqlTarget: Send {
    async fn execute(&mut self, sql: &str) -> Result<(), TargetError>;
}

/// Production target: a tokio-postgres client on the replica
pub struct PgTarget {
    client: tokio_postgres::Client,
}

impl PgTarget {
    /// Connect to `database` on the configured target server. The session
    /// names the database; the rest of the parameters come from
    /// configuration.
    pub async fn connect(target: &DbConfig, database: &str) -> Result<Self, ReplayError> {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&target.host)
            .port(target.port)
            .user(&target.user)
            .password(&target.password)
            .dbname(database);

        let (client, connection) =
            config
                .connect(NoTls)
                .await
                .map_err(|source| ReplayError::Connect {
                    host: target.host.clone(),
                    port: target.port,
                    database: database.to_string(),
                    source,
                })?;

        // The connection task owns the socket; it ends when the client drops
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "target connection closed with error");
            }
        });

        Ok(Self { client })
    }
}

#[async_trait]
impl SqlTarget for PgTarget {
    async fn execute(&mut self, sql: &str) -> Result<(), TargetError> {
        self.client
            .batch_execute(sql)
            .await
            .map_err(|e| TargetError(e.to_string()))
    }
}
