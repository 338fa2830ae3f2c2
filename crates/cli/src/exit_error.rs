// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Carries an explicit process exit code through an `anyhow::Error` chain
//! (spec §6/§7: exit codes are fixed per command, not derived from whether
//! `main` merely succeeded or failed). Grounded on the teacher's
//! `crates/cli/src/exit_error.rs`.

use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

/// Wrap a typed core/engine error, preserving its `exit_code()` mapping.
pub trait WithExitCode {
    fn exit_code(&self) -> i32;
}

impl WithExitCode for substrate_core::Error {
    fn exit_code(&self) -> i32 {
        substrate_core::Error::exit_code(self)
    }
}

impl WithExitCode for substrate_engine::EngineError {
    fn exit_code(&self) -> i32 {
        substrate_engine::EngineError::exit_code(self)
    }
}

impl WithExitCode for substrate_storage::StoreError {
    fn exit_code(&self) -> i32 {
        match self {
            substrate_storage::StoreError::NotFound { .. } => 2,
            _ => 1,
        }
    }
}

/// Convert a typed error into an `anyhow::Error` that carries its exit code.
pub fn typed<E>(err: E) -> anyhow::Error
where
    E: WithExitCode + std::error::Error + Send + Sync + 'static,
{
    let code = err.exit_code();
    let message = err.to_string();
    anyhow::Error::new(ExitError::new(code, message))
}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
