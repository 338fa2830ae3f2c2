// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session controller (spec §4.8): pause, resume, cancel, and retry. Every
//! operation here is a thin, validating wrapper around one of
//! `substrate_storage::Store`'s atomic control transitions, followed by the
//! matching bus event — the signal row the store writes is the durable
//! record; the bus event is the in-process wakeup for anything already
//! subscribed and running.

use std::sync::Arc;

use substrate_core::{
    clock::Clock,
    ids::{SessionId, TaskId},
    status::{SessionStatus, TaskStatus},
    Error as CoreError, Event, EventBus,
};
use substrate_storage::{Store, TaskFilter};

use crate::error::EngineError;

/// Outcome of a `retry` call, real or `--dry-run` (spec §4.8).
#[derive(Debug, Clone, Default)]
pub struct RetryReport {
    pub retried: Vec<TaskId>,
    /// Failed tasks already at `max_retries`; never retried.
    pub skipped_retry_limit: Vec<TaskId>,
    /// A `--task` target whose predecessors aren't all `completed`/`cancelled` yet.
    pub skipped_predecessors_incomplete: Vec<TaskId>,
    pub dry_run: bool,
}

#[derive(Clone)]
pub struct SessionController {
    store: Arc<Store>,
    bus: EventBus,
}

impl SessionController {
    pub fn new(store: Arc<Store>, bus: EventBus) -> Self {
        Self { store, bus }
    }

    /// `active` -> `paused`. Usage error if the session isn't active.
    pub fn pause(&self, session_id: &SessionId, clock: &impl Clock) -> Result<(), EngineError> {
        let session = self.store.get_session(session_id)?;
        if session.status != SessionStatus::Active {
            return Err(EngineError::Core(CoreError::StateConflict(format!(
                "session {session_id} is {} and cannot be paused", session.status
            ))));
        }
        self.store.pause_session(session_id, clock.now_ms())?;
        self.bus.emit(Event::SessionPause {
            session_id: session_id.clone(),
        });
        Ok(())
    }

    /// `paused` -> `active`. Usage error if the session isn't paused.
    pub fn resume(&self, session_id: &SessionId, clock: &impl Clock) -> Result<(), EngineError> {
        let session = self.store.get_session(session_id)?;
        if session.status != SessionStatus::Paused {
            return Err(EngineError::Core(CoreError::StateConflict(format!(
                "session {session_id} is {} and cannot be resumed", session.status
            ))));
        }
        self.store.resume_session(session_id, clock.now_ms())?;
        self.bus.emit(Event::SessionResume {
            session_id: session_id.clone(),
        });
        Ok(())
    }

    /// Any non-terminal status -> `cancelled`. Usage error if already terminal.
    pub fn cancel(&self, session_id: &SessionId, clock: &impl Clock) -> Result<(), EngineError> {
        let session = self.store.get_session(session_id)?;
        if session.status.is_terminal() {
            return Err(EngineError::Core(CoreError::StateConflict(format!(
                "session {session_id} is already {}", session.status
            ))));
        }
        self.store.cancel_session(session_id, clock.now_ms())?;
        self.bus.emit(Event::SessionCancel {
            session_id: session_id.clone(),
        });
        Ok(())
    }

    /// Reset retryable failed tasks back to `pending`.
    ///
    /// `task_id = None` retries every failed task under its retry budget.
    /// `task_id = Some(id)` retries just that task, but only once every
    /// declared predecessor has reached a dependency-satisfying status.
    /// `dry_run` computes the same report without writing anything.
    pub fn retry(
        &self,
        session_id: &SessionId,
        task_id: Option<&TaskId>,
        dry_run: bool,
        clock: &impl Clock,
    ) -> Result<RetryReport, EngineError> {
        let candidates = match task_id {
            Some(id) => vec![self.store.get_task(session_id, id)?],
            None => self.store.list_tasks(
                session_id,
                TaskFilter {
                    status: Some(TaskStatus::Failed),
                },
            )?,
        };

        let mut report = RetryReport {
            dry_run,
            ..Default::default()
        };

        for task in &candidates {
            if task.status != TaskStatus::Failed {
                continue;
            }
            if !task.can_retry() {
                report.skipped_retry_limit.push(task.id.clone());
                continue;
            }
            if task_id.is_some() {
                // The explicit `--task` form requires every predecessor to
                // have actually finished its work, not merely reached a
                // status that would unblock the ready-set rule — a
                // `cancelled` predecessor doesn't qualify here.
                let predecessors = self.store.predecessors_of(session_id, &task.id)?;
                let mut all_satisfied = true;
                for dep in &predecessors {
                    let dep_task = self.store.get_task(session_id, dep)?;
                    if dep_task.status != TaskStatus::Completed {
                        all_satisfied = false;
                        break;
                    }
                }
                if !all_satisfied {
                    report.skipped_predecessors_incomplete.push(task.id.clone());
                    continue;
                }
            }
            report.retried.push(task.id.clone());
        }

        if !dry_run && !report.retried.is_empty() {
            self.store
                .retry_tasks(session_id, &report.retried, clock.now_ms())?;
            self.bus.emit(Event::SessionResume {
                session_id: session_id.clone(),
            });
        }

        Ok(report)
    }
}

#[cfg(test)]
#[path = "session_control_tests.rs"]
mod tests;
