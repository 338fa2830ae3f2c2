// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup crash recovery (spec §4.9): before a daemon accepts any new
//! `start` request, every non-terminal session is swept for tasks left
//! `running` by a process that died mid-flight — there is no worker left
//! alive to finish them, so each one is either retried (still has retry
//! budget) or failed outright (`DEFAULT_MAX_RETRIES` exhausted), then the
//! ready set is recomputed so the orchestrator can pick up where it left
//! off.

use std::sync::Arc;

use substrate_core::{
    clock::Clock,
    ids::{SessionId, TaskId},
    status::TaskStatus,
};
use substrate_storage::{Store, TaskFilter};

use crate::error::EngineError;
use crate::scheduler::Engine;

/// What a single recovery pass did, for the daemon's startup log line.
#[derive(Debug, Clone, Default)]
pub struct RecoverySummary {
    /// Sessions inspected (every non-terminal session at the time of the call).
    pub sessions_scanned: usize,
    /// `running` tasks reset back to `pending`.
    pub recovered: Vec<TaskId>,
    /// `running` tasks that had exhausted their retry budget and were failed.
    pub failed: Vec<TaskId>,
    /// Tasks newly moved into `ready` as a consequence of the above.
    pub newly_ready: Vec<TaskId>,
}

/// Run one crash-recovery pass over every non-terminal session (spec §4.9).
/// Idempotent: a second call against an already-recovered store finds no
/// `running` tasks left and returns an empty summary.
pub fn recover(engine: &Engine, clock: &impl Clock) -> Result<RecoverySummary, EngineError> {
    let store: &Arc<Store> = engine.store();
    let sessions = store.list_non_terminal_sessions()?;
    let mut summary = RecoverySummary {
        sessions_scanned: sessions.len(),
        ..Default::default()
    };

    for session in &sessions {
        let running = store.list_tasks(
            &session.id,
            TaskFilter {
                status: Some(TaskStatus::Running),
            },
        )?;

        let mut session_had_crash_failure = false;
        for task in running {
            // `Task::can_retry` also requires `status == Failed`, which never
            // holds here (we just filtered on `Running`) — recovery judges
            // retry eligibility on the budget alone (spec §4.9).
            if task.retry_count < task.max_retries {
                store.reset_task_after_crash(&session.id, &task.id)?;
                summary.recovered.push(task.id);
            } else {
                store.mark_task_crash_failed(&session.id, &task.id)?;
                summary.failed.push(task.id);
                session_had_crash_failure = true;
            }
        }

        let newly_ready = engine.dispatch_ready(&session.id)?;
        summary.newly_ready.extend(newly_ready);

        // A session where a crashed task exhausted its retries, and nothing
        // else is left pending/ready to make progress on, can never advance
        // again — archive it rather than leave it stuck non-terminal forever.
        if session_had_crash_failure {
            let refreshed = store.get_session(&session.id)?;
            if !refreshed.status.is_terminal() {
                let outstanding = store.list_tasks(
                    &session.id,
                    TaskFilter {
                        status: Some(TaskStatus::Pending),
                    },
                )?;
                let ready = store.list_tasks(
                    &session.id,
                    TaskFilter {
                        status: Some(TaskStatus::Ready),
                    },
                )?;
                if outstanding.is_empty() && ready.is_empty() {
                    store.archive_session(&session.id, clock.now_ms())?;
                }
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
