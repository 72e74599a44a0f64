// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Smoke tests for the walrus binary.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_the_command_groups() {
    Command::cargo_bin("walrus")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("session"))
        .stdout(predicate::str::contains("checkpoint"))
        .stdout(predicate::str::contains("navigate"))
        .stdout(predicate::str::contains("replay"))
        .stdout(predicate::str::contains("wal"));
}

#[test]
fn version_prints() {
    Command::cargo_bin("walrus")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("walrus"));
}

#[test]
fn session_help_shows_subcommands() {
    Command::cargo_bin("walrus")
        .unwrap()
        .args(["session", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("switch"));
}

#[test]
fn commands_fail_cleanly_without_a_daemon() {
    let tmp = tempfile::TempDir::new().unwrap();
    Command::cargo_bin("walrus")
        .unwrap()
        .env("WALRUS_STATE_DIR", tmp.path())
        .args(["daemon", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not running"));
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    Command::cargo_bin("walrus")
        .unwrap()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage").or(predicate::str::contains("usage")));
}
