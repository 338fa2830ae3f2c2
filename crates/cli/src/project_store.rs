// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared store-opening helper for every subcommand that talks to the
//! project's state store directly rather than through a [`Coordinator`]
//! (`status`, `pause`/`resume`/`cancel`/`retry`, `worktrees`).
//!
//! [`Coordinator`]: substrate_daemon::Coordinator

use std::path::Path;

use anyhow::Result;
use substrate_storage::Store;

use crate::exit_error;

pub fn open_store(project_root: &Path) -> Result<Store> {
    let db_path = project_root.join(".substrate").join("state.db");
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Store::open(&db_path).map_err(exit_error::typed)
}
