// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-level error type, composing `substrate_core::Error` with the
//! storage and adapter crates' own taxonomies (spec §7).

use substrate_core::Error as CoreError;
use substrate_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Exit code this error maps to at the CLI boundary (spec §6/§7).
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::Core(e) => e.exit_code(),
            EngineError::Store(StoreError::NotFound { .. }) => 2,
            EngineError::Store(_) => 1,
        }
    }
}
