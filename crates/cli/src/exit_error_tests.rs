// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{typed, WithExitCode};
use substrate_storage::StoreError;

#[test]
fn core_not_found_maps_to_exit_code_2() {
    let err = substrate_core::Error::not_found("session", "abc");
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn core_adapter_unavailable_maps_to_exit_code_1() {
    let err = substrate_core::Error::AdapterUnavailable("codex".into());
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn store_not_found_maps_to_exit_code_2() {
    let err = StoreError::not_found("task", "t1");
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn store_decode_error_maps_to_exit_code_1() {
    let err = StoreError::Decode("bad column".into());
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn typed_preserves_message_and_code() {
    let err = typed(StoreError::not_found("session", "xyz"));
    let exit_err = err.downcast_ref::<super::ExitError>().unwrap();
    assert_eq!(exit_err.code, 2);
    assert!(exit_err.message.contains("xyz"));
}
