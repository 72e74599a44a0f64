// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn renders_two_hex_words() {
    assert_eq!(Lsn::new(0, 0x16B_3748).to_string(), "0/16B3748");
    assert_eq!(Lsn::new(0x2A, 0xDEAD_BEEF).to_string(), "2A/DEADBEEF");
    assert_eq!(Lsn::ZERO.to_string(), "0/0");
}

#[test]
fn parses_what_it_renders() {
    for raw in [0u64, 1, 0x16B_3748, u32::MAX as u64, u64::MAX] {
        let lsn = Lsn(raw);
        let parsed: Lsn = lsn.to_string().parse().unwrap();
        assert_eq!(parsed, lsn);
    }
}

#[test]
fn parse_accepts_lowercase_hex() {
    let lsn: Lsn = "2a/deadbeef".parse().unwrap();
    assert_eq!(lsn, Lsn::new(0x2A, 0xDEAD_BEEF));
}

#[test]
fn parse_rejects_malformed_tokens() {
    assert!("".parse::<Lsn>().is_err());
    assert!("16B3748".parse::<Lsn>().is_err());
    assert!("0/xyz".parse::<Lsn>().is_err());
    assert!("0/1/2".parse::<Lsn>().is_err());
}

#[test]
fn ordering_follows_offset() {
    assert!(Lsn::ZERO < Lsn(1));
    assert!(Lsn::new(1, 0) > Lsn::new(0, u32::MAX));
}

#[test]
fn advance_adds_bytes() {
    assert_eq!(Lsn(100).advance(28), Lsn(128));
    assert_eq!(Lsn(u64::MAX).advance(1), Lsn(u64::MAX));
}

#[test]
fn serde_uses_string_form() {
    let lsn = Lsn::new(0, 0x16B_3748);
    let json = serde_json::to_string(&lsn).unwrap();
    assert_eq!(json, "\"0/16B3748\"");
    let back: Lsn = serde_json::from_str(&json).unwrap();
    assert_eq!(back, lsn);
}
