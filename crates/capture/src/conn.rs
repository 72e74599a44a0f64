// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replication-mode Postgres connection
//!
//! A thin connection over the wire codec: startup with
//! `replication=database`, password authentication (cleartext, md5, or
//! SCRAM-SHA-256), simple queries for slot management, and the copy-both
//! stream that carries replication frames. TLS is not negotiated; a
//! non-`disable` sslmode is accepted but logged and ignored.

use bytes::{Bytes, BytesMut};
use fallible_iterator::FallibleIterator;
use postgres_protocol::authentication;
use postgres_protocol::authentication::sasl;
use postgres_protocol::message::backend::{
    AuthenticationSaslBody, DataRowBody, ErrorResponseBody, Message,
};
use postgres_protocol::message::frontend;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};
use walrus_core::{DbConfig, Lsn};

use crate::error::CaptureError;

/// A single connection to the source, owned exclusively by the consumer
pub struct PgConnection {
    stream: TcpStream,
    buf: BytesMut,
}

impl PgConnection {
    /// Connect and authenticate in replication mode
    pub async fn connect_replication(db: &DbConfig) -> Result<Self, CaptureError> {
        if db.ssl_mode != "disable" {
            warn!(ssl_mode = %db.ssl_mode, "TLS is not negotiated; connecting in plain TCP");
        }

        let stream = TcpStream::connect((db.host.as_str(), db.port))
            .await
            .map_err(|source| CaptureError::Connect {
                host: db.host.clone(),
                port: db.port,
                source,
            })?;
        stream.set_nodelay(true)?;

        let mut conn = Self {
            stream,
            buf: BytesMut::with_capacity(8 * 1024),
        };
        conn.startup(db).await?;
        debug!(host = %db.host, port = db.port, database = %db.database, "replication connection ready");
        Ok(conn)
    }

    async fn startup(&mut self, db: &DbConfig) -> Result<(), CaptureError> {
        let params = [
            ("user", db.user.as_str()),
            ("database", db.database.as_str()),
            ("replication", "database"),
            ("application_name", "walrusd"),
            ("client_encoding", "UTF8"),
        ];
        let mut out = BytesMut::new();
        frontend::startup_message(params, &mut out)?;
        self.stream.write_all(&out).await?;

        loop {
            match self.recv().await? {
                Message::AuthenticationOk => {}
                Message::AuthenticationCleartextPassword => {
                    let mut out = BytesMut::new();
                    frontend::password_message(db.password.as_bytes(), &mut out)?;
                    self.stream.write_all(&out).await?;
                }
                Message::AuthenticationMd5Password(body) => {
                    let hashed = authentication::md5_hash(
                        db.user.as_bytes(),
                        db.password.as_bytes(),
                        body.salt(),
                    );
                    let mut out = BytesMut::new();
                    frontend::password_message(hashed.as_bytes(), &mut out)?;
                    self.stream.write_all(&out).await?;
                }
                Message::AuthenticationSasl(body) => {
                    self.authenticate_scram(db, body).await?;
                }
                Message::BackendKeyData(_)
                | Message::ParameterStatus(_)
                | Message::NoticeResponse(_) => {}
                Message::ReadyForQuery(_) => return Ok(()),
                Message::ErrorResponse(body) => return Err(db_error(body)),
                _ => {
                    return Err(CaptureError::Protocol(
                        "unexpected message during startup".to_string(),
                    ))
                }
            }
        }
    }

    async fn authenticate_scram(
        &mut self,
        db: &DbConfig,
        body: AuthenticationSaslBody,
    ) -> Result<(), CaptureError> {
        let mut offered = false;
        let mut mechanisms = body.mechanisms();
        while let Some(mechanism) = mechanisms.next()? {
            if mechanism == sasl::SCRAM_SHA_256 {
                offered = true;
            }
        }
        if !offered {
            return Err(CaptureError::Auth(
                "server offered no supported SASL mechanism".to_string(),
            ));
        }

        let mut scram =
            sasl::ScramSha256::new(db.password.as_bytes(), sasl::ChannelBinding::unsupported());

        let mut out = BytesMut::new();
        frontend::sasl_initial_response(sasl::SCRAM_SHA_256, scram.message(), &mut out)?;
        self.stream.write_all(&out).await?;

        match self.recv().await? {
            Message::AuthenticationSaslContinue(body) => {
                scram
                    .update(body.data())
                    .map_err(|e| CaptureError::Auth(e.to_string()))?;
                let mut out = BytesMut::new();
                frontend::sasl_response(scram.message(), &mut out)?;
                self.stream.write_all(&out).await?;
            }
            Message::ErrorResponse(body) => return Err(db_error(body)),
            _ => {
                return Err(CaptureError::Auth(
                    "expected SASL continuation".to_string(),
                ))
            }
        }

        match self.recv().await? {
            Message::AuthenticationSaslFinal(body) => {
                scram
                    .finish(body.data())
                    .map_err(|e| CaptureError::Auth(e.to_string()))?;
                Ok(())
            }
            Message::ErrorResponse(body) => Err(db_error(body)),
            _ => Err(CaptureError::Auth("expected SASL final".to_string())),
        }
    }

    /// Run one simple-protocol statement and collect its text rows
    pub async fn simple_query(&mut self, sql: &str) -> Result<Vec<SimpleRow>, CaptureError> {
        let mut out = BytesMut::new();
        frontend::query(sql, &mut out)?;
        self.stream.write_all(&out).await?;

        let mut rows = Vec::new();
        let mut error = None;
        loop {
            match self.recv().await? {
                Message::DataRow(body) => rows.push(SimpleRow::parse(body)?),
                Message::RowDescription(_)
                | Message::CommandComplete(_)
                | Message::EmptyQueryResponse
                | Message::ParameterStatus(_)
                | Message::NoticeResponse(_) => {}
                Message::ErrorResponse(body) => error = Some(db_error(body)),
                Message::ReadyForQuery(_) => {
                    return match error {
                        Some(e) => Err(e),
                        None => Ok(rows),
                    }
                }
                _ => {
                    return Err(CaptureError::Protocol(
                        "unexpected message during simple query".to_string(),
                    ))
                }
            }
        }
    }

    /// Issue START_REPLICATION and wait for the stream to open
    pub async fn start_replication(
        &mut self,
        slot: &str,
        start: Lsn,
        publication: &str,
    ) -> Result<(), CaptureError> {
        let command = format!(
            "START_REPLICATION SLOT {slot} LOGICAL {start} \
             (proto_version '1', publication_names '{publication}')"
        );
        debug!(%command, "starting replication");

        let mut out = BytesMut::new();
        frontend::query(&command, &mut out)?;
        self.stream.write_all(&out).await?;

        loop {
            match self.recv().await? {
                Message::CopyBothResponse(_) => return Ok(()),
                Message::ParameterStatus(_) | Message::NoticeResponse(_) => {}
                Message::ErrorResponse(body) => return Err(db_error(body)),
                _ => {
                    return Err(CaptureError::Protocol(
                        "unexpected message while starting replication".to_string(),
                    ))
                }
            }
        }
    }

    /// Next copy-data payload from the open stream
    pub async fn recv_copy_data(&mut self) -> Result<Bytes, CaptureError> {
        loop {
            match self.recv().await? {
                Message::CopyData(body) => return Ok(body.into_bytes()),
                Message::ParameterStatus(_)
                | Message::NoticeResponse(_)
                | Message::NotificationResponse(_) => {}
                Message::ErrorResponse(body) => return Err(db_error(body)),
                Message::CopyDone | Message::CommandComplete(_) | Message::ReadyForQuery(_) => {
                    return Err(CaptureError::Protocol(
                        "replication stream ended by server".to_string(),
                    ))
                }
                _ => {
                    return Err(CaptureError::Protocol(
                        "unexpected message on replication stream".to_string(),
                    ))
                }
            }
        }
    }

    /// Send one copy-data payload (standby status updates)
    pub async fn send_copy_data(&mut self, payload: &[u8]) -> Result<(), CaptureError> {
        let mut out = BytesMut::new();
        frontend::CopyData::new(payload)?.write(&mut out);
        self.stream.write_all(&out).await?;
        Ok(())
    }

    /// Best-effort terminate; errors on the way out are discarded
    pub async fn close(mut self) {
        let mut out = BytesMut::new();
        frontend::terminate(&mut out);
        let _ = self.stream.write_all(&out).await;
        let _ = self.stream.shutdown().await;
    }

    async fn recv(&mut self) -> Result<Message, CaptureError> {
        loop {
            if let Some(message) = Message::parse(&mut self.buf)? {
                return Ok(message);
            }
            let read = self.stream.read_buf(&mut self.buf).await?;
            if read == 0 {
                return Err(CaptureError::ConnectionClosed);
            }
        }
    }
}

/// A row from a simple query, all columns in text form
#[derive(Debug, Clone)]
pub struct SimpleRow {
    values: Vec<Option<String>>,
}

impl SimpleRow {
    fn parse(body: DataRowBody) -> Result<Self, CaptureError> {
        let buffer = body.buffer();
        let mut values = Vec::new();
        let mut ranges = body.ranges();
        while let Some(range) = ranges.next()? {
            values.push(range.map(|r| String::from_utf8_lossy(&buffer[r]).into_owned()));
        }
        Ok(Self { values })
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn db_error(body: ErrorResponseBody) -> CaptureError {
    let mut code = String::new();
    let mut message = String::new();
    let mut fields = body.fields();
    while let Ok(Some(field)) = fields.next() {
        match field.type_() {
            b'C' => code = field.value().to_string(),
            b'M' => message = field.value().to_string(),
            _ => {}
        }
    }
    CaptureError::Db { code, message }
}
