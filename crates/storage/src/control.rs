// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic session-control transitions (spec §4.8): each of these bundles a
//! status change with its signal-queue entry (and, for cancel/retry, the
//! affected task rows) into a single `Store::transaction` so a crash between
//! the two writes can never happen.

use rusqlite::params;
use substrate_core::{
    ids::{SessionId, TaskId},
    signal::SignalKind,
};

use crate::error::StoreError;
use crate::store::Store;

impl Store {
    /// `active` -> `paused` plus a queued pause signal. No-op (zero rows
    /// touched) if the session isn't currently `active`; callers decide
    /// whether that no-op is an error (spec §4.8: pause is a usage error on
    /// a non-active session).
    pub fn pause_session(&self, id: &SessionId, now_ms: i64) -> Result<(), StoreError> {
        self.transaction(|tx| {
            tx.execute(
                "UPDATE sessions SET status = 'paused', updated_at_ms = ?1
                 WHERE id = ?2 AND status = 'active'",
                params![now_ms, id.as_str()],
            )?;
            tx.execute(
                "INSERT INTO session_signals (session_id, signal, created_at_ms) VALUES (?1,?2,?3)",
                params![id.as_str(), SignalKind::Pause.as_str(), now_ms],
            )?;
            Ok(())
        })
    }

    /// `paused` -> `active` plus a queued resume signal.
    pub fn resume_session(&self, id: &SessionId, now_ms: i64) -> Result<(), StoreError> {
        self.transaction(|tx| {
            tx.execute(
                "UPDATE sessions SET status = 'active', updated_at_ms = ?1
                 WHERE id = ?2 AND status = 'paused'",
                params![now_ms, id.as_str()],
            )?;
            tx.execute(
                "INSERT INTO session_signals (session_id, signal, created_at_ms) VALUES (?1,?2,?3)",
                params![id.as_str(), SignalKind::Resume.as_str(), now_ms],
            )?;
            Ok(())
        })
    }

    /// Any non-terminal status -> `cancelled`, every non-terminal task row
    /// in the session cancelled alongside it, plus a queued cancel signal.
    /// Returns the number of task rows cancelled.
    pub fn cancel_session(&self, id: &SessionId, now_ms: i64) -> Result<u64, StoreError> {
        self.transaction(|tx| {
            tx.execute(
                "UPDATE sessions SET status = 'cancelled', updated_at_ms = ?1
                 WHERE id = ?2 AND status NOT IN ('completed', 'cancelled', 'abandoned')",
                params![now_ms, id.as_str()],
            )?;
            let affected = tx.execute(
                "UPDATE tasks SET status = 'cancelled'
                 WHERE session_id = ?1 AND status IN ('pending', 'ready', 'running')",
                params![id.as_str()],
            )?;
            tx.execute(
                "INSERT INTO session_signals (session_id, signal, created_at_ms) VALUES (?1,?2,?3)",
                params![id.as_str(), SignalKind::Cancel.as_str(), now_ms],
            )?;
            Ok(affected as u64)
        })
    }

    /// Reset every task in `task_ids` from `failed` back to `pending`
    /// (incrementing `retry_count`, clearing `error`/`exit_code`/`worker_id`),
    /// plus one queued resume signal so a paused orchestrator wakes up to
    /// pick the retried tasks back into its ready-set computation. A no-op
    /// (no signal enqueued) when `task_ids` is empty, e.g. a dry run.
    pub fn retry_tasks(
        &self,
        session_id: &SessionId,
        task_ids: &[TaskId],
        now_ms: i64,
    ) -> Result<(), StoreError> {
        self.transaction(|tx| {
            for task_id in task_ids {
                tx.execute(
                    "UPDATE tasks SET status = 'pending', retry_count = retry_count + 1,
                         error = NULL, exit_code = NULL, worker_id = NULL
                     WHERE session_id = ?1 AND id = ?2 AND status = 'failed'",
                    params![session_id.as_str(), task_id.as_str()],
                )?;
            }
            if !task_ids.is_empty() {
                tx.execute(
                    "INSERT INTO session_signals (session_id, signal, created_at_ms) VALUES (?1,?2,?3)",
                    params![session_id.as_str(), SignalKind::Resume.as_str(), now_ms],
                )?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
