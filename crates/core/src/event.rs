// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events carried on the in-process event bus (spec §4.2).
//!
//! Every event the orchestration core publishes is a variant here. Event
//! names used for bus registration (`Event::name()`) match the wire strings
//! spec.md §4.2 enumerates (`task:ready`, `worker:spawned`, ...).

use crate::cost::BillingMode;
use crate::ids::{AdapterId, SessionId, TaskId, WorkerId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Normalized token usage, regardless of which adapter produced it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensUsed {
    pub input: u64,
    pub output: u64,
}

impl TokensUsed {
    pub fn total(&self) -> u64 {
        self.input + self.output
    }
}

/// Outcome payload for a successfully completed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub output: String,
    pub exit_code: i32,
    #[serde(default)]
    pub tokens_used: Option<TokensUsed>,
}

/// Failure payload for a failed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub message: String,
    pub code: Option<i32>,
    /// Set when this failure is the budget gate rejecting the task before it
    /// ever ran, so the engine's `task:failed` handler records the same
    /// `budget_exceeded` flag a pool-side write would have (spec §4.6: the
    /// pool never writes task rows, it only emits events for the engine).
    #[serde(default)]
    pub budget_exceeded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    TaskReady {
        session_id: SessionId,
        task_id: TaskId,
    },
    TaskRouted {
        session_id: SessionId,
        task_id: TaskId,
        agent: AdapterId,
        provider: String,
        model: String,
        billing_mode: BillingMode,
    },
    TaskStarted {
        session_id: SessionId,
        task_id: TaskId,
        worker_id: WorkerId,
        agent: AdapterId,
    },
    WorkerSpawned {
        session_id: SessionId,
        task_id: TaskId,
        worker_id: WorkerId,
    },
    WorkerTerminated {
        worker_id: WorkerId,
        reason: String,
    },
    TaskComplete {
        session_id: SessionId,
        task_id: TaskId,
        result: TaskResult,
    },
    TaskFailed {
        session_id: SessionId,
        task_id: TaskId,
        error: TaskFailure,
    },
    WorktreeCreated {
        session_id: SessionId,
        task_id: TaskId,
        worktree_path: String,
        branch_name: String,
    },
    ConfigReloaded {
        max_concurrent_tasks: usize,
    },
    SessionPause {
        session_id: SessionId,
    },
    SessionResume {
        session_id: SessionId,
    },
    SessionCancel {
        session_id: SessionId,
    },
    MonitorMetricsRecorded {
        session_id: SessionId,
        #[serde(default)]
        fields: HashMap<String, f64>,
    },
}

impl Event {
    /// Wire name used for bus subscription and NDJSON event-stream rendering.
    pub fn name(&self) -> &'static str {
        match self {
            Event::TaskReady { .. } => "task:ready",
            Event::TaskRouted { .. } => "task:routed",
            Event::TaskStarted { .. } => "task:started",
            Event::WorkerSpawned { .. } => "worker:spawned",
            Event::WorkerTerminated { .. } => "worker:terminated",
            Event::TaskComplete { .. } => "task:complete",
            Event::TaskFailed { .. } => "task:failed",
            Event::WorktreeCreated { .. } => "worktree:created",
            Event::ConfigReloaded { .. } => "config:reloaded",
            Event::SessionPause { .. } => "session:pause",
            Event::SessionResume { .. } => "session:resume",
            Event::SessionCancel { .. } => "session:cancel",
            Event::MonitorMetricsRecorded { .. } => "monitor:metrics_recorded",
        }
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Event::TaskReady { session_id, .. }
            | Event::TaskRouted { session_id, .. }
            | Event::TaskStarted { session_id, .. }
            | Event::WorkerSpawned { session_id, .. }
            | Event::TaskComplete { session_id, .. }
            | Event::TaskFailed { session_id, .. }
            | Event::WorktreeCreated { session_id, .. }
            | Event::SessionPause { session_id }
            | Event::SessionResume { session_id }
            | Event::SessionCancel { session_id }
            | Event::MonitorMetricsRecorded { session_id, .. } => Some(session_id),
            Event::WorkerTerminated { .. } | Event::ConfigReloaded { .. } => None,
        }
    }

    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            Event::TaskReady { task_id, .. }
            | Event::TaskRouted { task_id, .. }
            | Event::TaskStarted { task_id, .. }
            | Event::WorkerSpawned { task_id, .. }
            | Event::TaskComplete { task_id, .. }
            | Event::TaskFailed { task_id, .. }
            | Event::WorktreeCreated { task_id, .. } => Some(task_id),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
