// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git worktree manager (spec §4.5).
//!
//! Shells out to the system `git` binary. Creation uses
//! `git worktree add -b <branch> <path> <base>`; listing parses
//! `git worktree list --porcelain` and stats each entry for a creation time;
//! orphan detection diffs that listing against the store's `worktree_path`
//! column.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use substrate_core::{ids::TaskId, Event, EventBus};
use substrate_storage::Store;
use tokio::process::Command;

use crate::error::EngineError;

/// Timeout for `git worktree` subcommands, mirroring the teacher's
/// `crates/adapters/src/subprocess.rs::GIT_WORKTREE_TIMEOUT`.
pub const GIT_WORKTREE_TIMEOUT: Duration = Duration::from_secs(60);

/// Subdirectory (relative to the project root) worktrees are created under
/// (spec §6 worktree layout).
pub const WORKTREE_DIR: &str = ".substrate-worktrees";

/// One entry from `git worktree list --porcelain`, with a stat-based
/// creation time layered on top.
#[derive(Debug, Clone)]
pub struct WorktreeEntry {
    pub path: PathBuf,
    pub branch: Option<String>,
    pub created_at_ms: Option<i64>,
    /// `true` if the store has no task claiming this path (spec §4.5).
    pub orphaned: bool,
}

pub struct WorktreeManager {
    project_root: PathBuf,
}

impl WorktreeManager {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    fn worktree_path(&self, task_id: &TaskId) -> PathBuf {
        self.project_root
            .join(WORKTREE_DIR)
            .join(task_id.as_str())
    }

    /// Create a worktree for `task_id` off `base_branch`, on a newly created
    /// branch (spec §4.5, §6: `substrate/task-<task-id>`).
    pub async fn create(
        &self,
        task_id: &TaskId,
        branch_name: &str,
        base_branch: &str,
    ) -> Result<(PathBuf, String), EngineError> {
        let path = self.worktree_path(task_id);

        let mut cmd = Command::new("git");
        cmd.current_dir(&self.project_root)
            .arg("worktree")
            .arg("add")
            .arg("-b")
            .arg(branch_name)
            .arg(&path)
            .arg(base_branch);

        let output = run_with_timeout(cmd, GIT_WORKTREE_TIMEOUT, "git worktree add").await?;
        if !output.status.success() {
            return Err(EngineError::Core(substrate_core::Error::SubprocessFailure(
                format!(
                    "git worktree add failed for task {task_id}: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            )));
        }

        Ok((path, branch_name.to_string()))
    }

    /// Remove the worktree at `path`. `delete_branch` additionally deletes
    /// the branch once the worktree is gone.
    pub async fn remove(&self, path: &Path, branch: Option<&str>) -> Result<(), EngineError> {
        let mut remove_cmd = Command::new("git");
        remove_cmd
            .current_dir(&self.project_root)
            .arg("worktree")
            .arg("remove")
            .arg("--force")
            .arg(path);
        let output = run_with_timeout(remove_cmd, GIT_WORKTREE_TIMEOUT, "git worktree remove").await?;
        if !output.status.success() {
            return Err(EngineError::Core(substrate_core::Error::SubprocessFailure(
                format!(
                    "git worktree remove failed for {}: {}",
                    path.display(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            )));
        }

        if let Some(branch) = branch {
            let mut branch_cmd = Command::new("git");
            branch_cmd
                .current_dir(&self.project_root)
                .arg("branch")
                .arg("-D")
                .arg(branch);
            // Best-effort: a branch that was never merged back still gets
            // force-deleted; a branch that's already gone is not an error.
            let _ = run_with_timeout(branch_cmd, GIT_WORKTREE_TIMEOUT, "git branch -D").await;
        }

        Ok(())
    }

    /// Parse `git worktree list --porcelain` into entries, flagging which
    /// ones have no corresponding `tasks.worktree_path` row in `store`.
    pub async fn list(&self, store: &Store) -> Result<Vec<WorktreeEntry>, EngineError> {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.project_root)
            .arg("worktree")
            .arg("list")
            .arg("--porcelain");
        let output = run_with_timeout(cmd, GIT_WORKTREE_TIMEOUT, "git worktree list").await?;
        if !output.status.success() {
            return Err(EngineError::Core(substrate_core::Error::SubprocessFailure(
                format!(
                    "git worktree list failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let known_paths = known_worktree_paths(store)?;

        let mut entries = Vec::new();
        let mut current_path: Option<PathBuf> = None;
        let mut current_branch: Option<String> = None;
        for line in stdout.lines() {
            if let Some(path) = line.strip_prefix("worktree ") {
                if let Some(p) = current_path.take() {
                    entries.push(finalize_entry(p, current_branch.take(), &known_paths));
                }
                current_path = Some(PathBuf::from(path));
            } else if let Some(branch) = line.strip_prefix("branch ") {
                current_branch = Some(
                    branch
                        .trim_start_matches("refs/heads/")
                        .to_string(),
                );
            } else if line.is_empty() {
                if let Some(p) = current_path.take() {
                    entries.push(finalize_entry(p, current_branch.take(), &known_paths));
                }
            }
        }
        if let Some(p) = current_path.take() {
            entries.push(finalize_entry(p, current_branch.take(), &known_paths));
        }

        // The repository's primary worktree is always listed first by git
        // and is never one of ours; drop anything outside our directory.
        entries.retain(|e| e.path.starts_with(self.project_root.join(WORKTREE_DIR)));
        Ok(entries)
    }

    /// Worktrees with no corresponding active task (spec §4.5).
    pub async fn orphaned(&self, store: &Store) -> Result<Vec<WorktreeEntry>, EngineError> {
        Ok(self
            .list(store)
            .await?
            .into_iter()
            .filter(|e| e.orphaned)
            .collect())
    }
}

fn known_worktree_paths(store: &Store) -> Result<Vec<String>, EngineError> {
    let mut paths = Vec::new();
    for session in store.list_sessions()? {
        for task in store.list_tasks(&session.id, Default::default())? {
            if let Some(path) = task.worktree_path {
                paths.push(path);
            }
        }
    }
    Ok(paths)
}

fn finalize_entry(path: PathBuf, branch: Option<String>, known_paths: &[String]) -> WorktreeEntry {
    let created_at_ms = std::fs::metadata(&path)
        .ok()
        .and_then(|m| m.created().ok())
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64);
    let orphaned = !known_paths.iter().any(|p| Path::new(p) == path);
    WorktreeEntry {
        path,
        branch,
        created_at_ms,
        orphaned,
    }
}

async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<std::process::Output, EngineError> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(EngineError::Core(substrate_core::Error::SubprocessFailure(
            format!("{description} failed: {io_err}"),
        ))),
        Err(_elapsed) => Err(EngineError::Core(substrate_core::Error::SubprocessFailure(
            format!("{description} timed out after {}s", timeout.as_secs()),
        ))),
    }
}

/// Bridges `task:ready` to worktree creation (spec §4.5: "the worktree
/// manager never decides what runs, only where it runs"). Holds its own
/// `Arc`-wrapped `WorktreeManager` so its bus subscriber closure can clone
/// itself cheaply.
#[derive(Clone)]
pub struct WorktreeCoordinator {
    manager: Arc<WorktreeManager>,
    store: Arc<Store>,
    bus: EventBus,
}

impl WorktreeCoordinator {
    pub fn new(project_root: impl Into<PathBuf>, store: Arc<Store>, bus: EventBus) -> Self {
        Self {
            manager: Arc::new(WorktreeManager::new(project_root)),
            store,
            bus,
        }
    }

    /// The underlying manager, for callers (e.g. the `worktrees` CLI
    /// command) that need to list/remove worktrees outside the
    /// `task:ready`-triggered creation flow.
    pub fn manager(&self) -> &Arc<WorktreeManager> {
        &self.manager
    }

    /// Subscribe to `task:ready`. Call once per daemon/process lifetime.
    pub fn install(&self) {
        let coordinator = self.clone();
        self.bus.subscribe("task:ready", move |event| {
            if let Event::TaskReady {
                session_id,
                task_id,
            } = event
            {
                let coordinator = coordinator.clone();
                let session_id = session_id.clone();
                let task_id = task_id.clone();
                tokio::spawn(async move {
                    if let Err(e) = coordinator.create_for_task(&session_id, &task_id).await {
                        tracing::error!(%session_id, %task_id, error = %e, "worktree creation failed");
                    }
                });
            }
        });
    }

    async fn create_for_task(
        &self,
        session_id: &substrate_core::ids::SessionId,
        task_id: &TaskId,
    ) -> Result<(), EngineError> {
        let session = self.store.get_session(session_id)?;
        let task = self.store.get_task(session_id, task_id)?;
        let branch_name = task.default_branch_name();

        let (path, branch) = self
            .manager
            .create(task_id, &branch_name, &session.base_branch)
            .await?;

        self.store.set_task_worktree(
            session_id,
            task_id,
            &path.display().to_string(),
            &branch,
        )?;

        self.bus.emit(Event::WorktreeCreated {
            session_id: session_id.clone(),
            task_id: task_id.clone(),
            worktree_path: path.display().to_string(),
            branch_name: branch,
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "worktree_tests.rs"]
mod tests;
