// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::format_elapsed;

#[test]
fn format_elapsed_seconds() {
    assert_eq!(format_elapsed(45_000), "45s");
}

#[test]
fn format_elapsed_minutes() {
    assert_eq!(format_elapsed(125_000), "2m");
}

#[test]
fn format_elapsed_clamps_negative() {
    assert_eq!(format_elapsed(-500), "0s");
}
