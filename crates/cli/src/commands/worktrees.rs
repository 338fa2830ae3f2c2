// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `worktrees [--include-orphaned]` / `worktrees prune` (spec §4.5, §6;
//! `prune` is an ambient addition — see SPEC_FULL.md).

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};
use substrate_engine::worktree::{WorktreeEntry, WorktreeManager};
use substrate_storage::Store;

use crate::exit_error;
use crate::output::{print_json, OutputFormat};
use crate::project_store::open_store;

#[derive(Args)]
pub struct WorktreesArgs {
    #[command(subcommand)]
    pub command: Option<WorktreesCommand>,

    /// List orphaned worktrees alongside active ones (default: active only).
    #[arg(long = "include-orphaned")]
    pub include_orphaned: bool,
}

#[derive(Subcommand)]
pub enum WorktreesCommand {
    /// Remove every orphaned worktree and its branch.
    Prune,
}

pub async fn handle(args: WorktreesArgs, project_root: &Path, format: OutputFormat) -> Result<i32> {
    let store = open_store(project_root)?;
    let manager = WorktreeManager::new(project_root.to_path_buf());

    match args.command {
        Some(WorktreesCommand::Prune) => prune(&manager, &store, format).await,
        None => list(&manager, &store, args.include_orphaned, format).await,
    }
}

async fn list(
    manager: &WorktreeManager,
    store: &Store,
    include_orphaned: bool,
    format: OutputFormat,
) -> Result<i32> {
    let entries = manager.list(store).await.map_err(exit_error::typed)?;
    let entries: Vec<&WorktreeEntry> = entries
        .iter()
        .filter(|e| include_orphaned || !e.orphaned)
        .collect();

    match format {
        OutputFormat::Json => {
            print_json(&serde_json::json!({
                "worktrees": entries.iter().map(|e| serde_json::json!({
                    "path": e.path.display().to_string(),
                    "branch": e.branch,
                    "created_at_ms": e.created_at_ms,
                    "orphaned": e.orphaned,
                })).collect::<Vec<_>>(),
            }));
        }
        OutputFormat::Human => {
            if entries.is_empty() {
                println!("no worktrees");
            }
            for entry in entries {
                let flag = if entry.orphaned { " (orphaned)" } else { "" };
                println!(
                    "{:<18} {}{}",
                    entry.branch.as_deref().unwrap_or("-"),
                    entry.path.display(),
                    flag
                );
            }
        }
    }

    Ok(0)
}

async fn prune(manager: &WorktreeManager, store: &Store, format: OutputFormat) -> Result<i32> {
    let orphaned = manager.orphaned(store).await.map_err(exit_error::typed)?;
    let mut removed = Vec::with_capacity(orphaned.len());
    let mut failed = Vec::new();

    for entry in &orphaned {
        match manager.remove(&entry.path, entry.branch.as_deref()).await {
            Ok(()) => removed.push(entry.path.display().to_string()),
            Err(e) => failed.push((entry.path.display().to_string(), e.to_string())),
        }
    }

    match format {
        OutputFormat::Json => {
            print_json(&serde_json::json!({
                "removed": removed,
                "failed": failed.iter().map(|(p, e)| serde_json::json!({"path": p, "error": e})).collect::<Vec<_>>(),
            }));
        }
        OutputFormat::Human => {
            if removed.is_empty() && failed.is_empty() {
                println!("no orphaned worktrees");
            }
            for path in &removed {
                println!("removed {path}");
            }
            for (path, err) in &failed {
                println!("failed to remove {path}: {err}");
            }
        }
    }

    Ok(if failed.is_empty() { 0 } else { 1 })
}
