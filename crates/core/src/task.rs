// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task: a single node in a session's task graph.

use crate::ids::{AdapterId, SessionId, TaskId, WorkerId};
use crate::status::TaskStatus;
use serde::{Deserialize, Serialize};

/// Default retry budget for a task that doesn't declare its own.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// A single node in a session's task graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub session_id: SessionId,
    pub name: String,
    pub prompt: String,
    pub status: TaskStatus,
    pub agent_id: Option<AdapterId>,
    pub worker_id: Option<WorkerId>,
    pub started_at_ms: Option<i64>,
    pub completed_at_ms: Option<i64>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
    pub retry_count: u32,
    pub max_retries: u32,
    pub worktree_path: Option<String>,
    pub branch_name: Option<String>,
    pub exit_code: Option<i32>,
    pub error: Option<String>,
    pub budget_exceeded: bool,
}

impl Task {
    pub fn new(
        id: TaskId,
        session_id: SessionId,
        name: impl Into<String>,
        prompt: impl Into<String>,
        agent_id: Option<AdapterId>,
        max_retries: u32,
    ) -> Self {
        Self {
            id,
            session_id,
            name: name.into(),
            prompt: prompt.into(),
            status: TaskStatus::Pending,
            agent_id,
            worker_id: None,
            started_at_ms: None,
            completed_at_ms: None,
            input_tokens: 0,
            output_tokens: 0,
            cost_usd: 0.0,
            retry_count: 0,
            max_retries,
            worktree_path: None,
            branch_name: None,
            exit_code: None,
            error: None,
            budget_exceeded: false,
        }
    }

    /// Invariant 1 (spec §8): a `running` task must have a worker id and a start time.
    pub fn running_invariant_holds(&self) -> bool {
        if self.status != TaskStatus::Running {
            return true;
        }
        self.worker_id.is_some() && self.started_at_ms.is_some()
    }

    pub fn can_retry(&self) -> bool {
        self.status == TaskStatus::Failed && self.retry_count < self.max_retries
    }

    /// Branch name the worktree manager creates for this task (spec §6 worktree layout).
    pub fn default_branch_name(&self) -> String {
        format!("substrate/task-{}", self.id.as_str())
    }
}

/// A (task_id, depends_on) edge within one session's graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDependency {
    pub session_id: SessionId,
    pub task_id: TaskId,
    pub depends_on: TaskId,
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
