// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `start <graph>` — create a session from a graph file and dispatch it
//! (spec §6). Runs the daemon's coordinator in-process for the lifetime of
//! this one CLI invocation (SPEC_FULL.md §6 "ambient CLI detail").

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use substrate_core::{
    clock::SystemClock,
    id::{IdGen, UuidIdGen},
    ids::SessionId,
};
use substrate_daemon::Coordinator;

use crate::exit_error;
use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct StartArgs {
    /// Path to a task graph YAML file.
    pub graph: PathBuf,

    /// Explicit session id; a UUID is generated if omitted.
    #[arg(long = "session")]
    pub session_id: Option<String>,

    /// Branch every task's worktree is created from.
    #[arg(long = "base-branch", default_value = "main")]
    pub base_branch: String,

    /// Upper bound on simultaneously running workers (spec §4.7).
    #[arg(long = "max-concurrent-tasks", default_value_t = 4)]
    pub max_concurrent_tasks: usize,

    /// Return immediately after dispatch instead of blocking until the
    /// session reaches a terminal status.
    #[arg(long)]
    pub no_wait: bool,

    /// Stop waiting (without cancelling the session) after this many
    /// seconds; omit to wait indefinitely.
    #[arg(long = "timeout-secs")]
    pub timeout_secs: Option<u64>,
}

pub async fn handle(args: StartArgs, project_root: &Path, format: OutputFormat) -> Result<()> {
    let coordinator = Coordinator::open(project_root, args.max_concurrent_tasks)
        .await
        .map_err(exit_error::typed)?;
    let recovery = coordinator.recover().map_err(exit_error::typed)?;
    if recovery.recovered.len() + recovery.failed.len() > 0 {
        tracing::info!(
            recovered = recovery.recovered.len(),
            failed = recovery.failed.len(),
            "crash recovery ran before dispatching new session"
        );
    }

    let session_id = SessionId::new(
        args.session_id
            .clone()
            .unwrap_or_else(|| UuidIdGen.next()),
    );
    let known_agents = coordinator.registry.ids();

    coordinator
        .engine
        .create_session(
            session_id.clone(),
            &args.graph,
            &args.base_branch,
            &known_agents,
            &SystemClock,
        )
        .map_err(exit_error::typed)?;

    let status = if args.no_wait {
        coordinator.store.get_session(&session_id).map_err(exit_error::typed)?.status
    } else {
        coordinator
            .wait_for_completion(
                &session_id,
                args.timeout_secs.map(std::time::Duration::from_secs),
            )
            .await
            .map_err(exit_error::typed)?
    };

    coordinator.shutdown().await.map_err(exit_error::typed)?;

    match format {
        OutputFormat::Json => {
            print_json(&serde_json::json!({
                "session_id": session_id.as_str(),
                "status": status.as_str(),
            }));
        }
        OutputFormat::Human => {
            println!("session {session_id} started, status: {status}");
        }
    }

    Ok(())
}
