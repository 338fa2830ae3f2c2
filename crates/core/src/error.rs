// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy (spec §7).
//!
//! Every variant here is a typed leaf, not a string to pattern-match on. The
//! CLI boundary is the only place that calls [`Error::exit_code`]; everywhere
//! else propagates `Result<_, Error>` with `?`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("state conflict: {0}")]
    StateConflict(String),

    #[error("budget exceeded: estimated cost would push session past its ${cap:.2} cap")]
    BudgetExceeded { cap: f64 },

    #[error("adapter unavailable: {0}")]
    AdapterUnavailable(String),

    #[error("subprocess failure: {0}")]
    SubprocessFailure(String),

    #[error("system error: {0}")]
    System(String),
}

impl Error {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Exit code this error maps to at the CLI boundary (spec §6/§7).
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_) | Error::StateConflict(_) | Error::NotFound { .. } => 2,
            Error::BudgetExceeded { .. } => 2,
            Error::AdapterUnavailable(_) | Error::SubprocessFailure(_) => 1,
            Error::System(_) => 1,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
