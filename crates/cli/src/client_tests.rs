// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;
use tokio::net::UnixListener;

#[test]
fn missing_socket_is_daemon_not_running() {
    let tmp = TempDir::new().unwrap();
    let result = DaemonClient::with_socket(tmp.path().join("absent.sock"));
    assert!(matches!(result, Err(ClientError::DaemonNotRunning)));
}

#[tokio::test]
async fn send_roundtrips_against_a_fake_daemon() {
    let tmp = TempDir::new().unwrap();
    let socket = tmp.path().join("walrusd.sock");
    let listener = UnixListener::bind(&socket).unwrap();

    // One-shot fake daemon: answer any request with Pong
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (mut reader, mut writer) = stream.into_split();
        let frame = protocol::read_message(&mut reader).await.unwrap();
        let _request: Request = protocol::decode(&frame).unwrap();
        let data = protocol::encode(&Response::Pong).unwrap();
        protocol::write_message(&mut writer, &data).await.unwrap();
    });

    let client = DaemonClient::with_socket(socket).unwrap();
    let response = client.send(Request::Ping).await.unwrap();
    assert!(matches!(response, Response::Pong));

    server.await.unwrap();
}

#[tokio::test]
async fn shutdown_accepts_shutting_down() {
    let tmp = TempDir::new().unwrap();
    let socket = tmp.path().join("walrusd.sock");
    let listener = UnixListener::bind(&socket).unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (mut reader, mut writer) = stream.into_split();
        let _ = protocol::read_message(&mut reader).await.unwrap();
        let data = protocol::encode(&Response::ShuttingDown).unwrap();
        protocol::write_message(&mut writer, &data).await.unwrap();
    });

    let client = DaemonClient::with_socket(socket).unwrap();
    client.shutdown().await.unwrap();
    server.await.unwrap();
}

#[test]
fn timeouts_have_sane_defaults() {
    assert_eq!(timeout_ipc(), Duration::from_secs(5));
    assert_eq!(timeout_connect(), Duration::from_secs(5));
    assert_eq!(poll_interval(), Duration::from_millis(50));
}
