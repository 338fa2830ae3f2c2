// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter-local error taxonomy. The pool manager and CLI convert these into
//! `substrate_core::Error::{AdapterUnavailable, SubprocessFailure}` at their
//! boundary (spec §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("adapter not registered: {0}")]
    NotRegistered(String),

    #[error("health check failed for {adapter}: {reason}")]
    HealthCheckFailed { adapter: String, reason: String },

    #[error("failed to spawn {binary}: {source}")]
    SpawnFailed {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse output: {0}")]
    ParseFailure(String),
}
