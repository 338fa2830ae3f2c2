// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task-graph engine (spec §4.6): owns task-row mutation, computes the
//! ready set, and is the only subscriber allowed to move a task out of
//! `running` (spec §5: "task-row mutations from worker completion are
//! performed only by the engine's handler for `task:complete`/`task:failed`").

use std::path::Path;
use std::sync::Arc;

use substrate_core::{
    clock::Clock,
    event::{Event, TaskFailure, TaskResult},
    ids::{AdapterId, SessionId, TaskId},
    signal::SignalKind,
    status::{SessionStatus, TaskStatus},
    task::TaskDependency,
    EventBus, Session, Task,
};
use substrate_storage::{Store, TaskFilter};

use crate::error::EngineError;
use crate::graph::{load_graph_file, validate};

/// Owns task and ready-set logic for every session. Cheaply clonable (an
/// `Arc<Store>` plus the already-`Clone` `EventBus`), so both the daemon's
/// coordinator and its worktree/pool subscribers can hold one.
#[derive(Clone)]
pub struct Engine {
    store: Arc<Store>,
    bus: EventBus,
}

impl Engine {
    pub fn new(store: Arc<Store>, bus: EventBus) -> Self {
        Self { store, bus }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Subscribe this engine's handlers to the events it owns (spec §4.6,
    /// §5). Call once per daemon/process lifetime.
    pub fn install(&self) {
        let complete_engine = self.clone();
        self.bus.subscribe("task:complete", move |event| {
            if let Event::TaskComplete {
                session_id,
                task_id,
                result,
            } = event
            {
                if let Err(e) = complete_engine.handle_task_complete(session_id, task_id, result) {
                    tracing::error!(%session_id, %task_id, error = %e, "failed to apply task:complete");
                }
            }
        });

        let failed_engine = self.clone();
        self.bus.subscribe("task:failed", move |event| {
            if let Event::TaskFailed {
                session_id,
                task_id,
                error,
            } = event
            {
                if let Err(e) = failed_engine.handle_task_failed(session_id, task_id, error) {
                    tracing::error!(%session_id, %task_id, error = %e, "failed to apply task:failed");
                }
            }
        });

        let resume_engine = self.clone();
        self.bus.subscribe("session:resume", move |event| {
            if let Event::SessionResume { session_id } = event {
                if let Err(e) = resume_engine.dispatch_ready(session_id) {
                    tracing::error!(%session_id, error = %e, "failed to dispatch ready set on resume");
                }
            }
        });
    }

    /// Load, validate, and atomically persist a graph file as a new session
    /// (spec §4.6). Returns the new session's ready set having already been
    /// computed and emitted (`task:ready` per newly-ready task), or the
    /// session transitioned straight to `completed` for an empty graph
    /// (spec §8 S1).
    pub fn create_session(
        &self,
        session_id: SessionId,
        graph_path: &Path,
        base_branch: &str,
        known_agents: &[AdapterId],
        clock: &impl Clock,
    ) -> Result<SessionId, EngineError> {
        if self.store.find_session(&session_id)?.is_some() {
            return Err(EngineError::Core(substrate_core::Error::StateConflict(
                format!("session {session_id} already exists"),
            )));
        }

        let file = load_graph_file(graph_path)?;
        let validated = validate(&file, known_agents)?;
        for warning in &validated.warnings {
            tracing::warn!(%session_id, warning, "graph validation warning");
        }

        let now_ms = clock.now_ms();
        let session = Session::new(
            session_id.clone(),
            graph_path.display().to_string(),
            base_branch,
            validated.budget_usd,
            now_ms,
        );

        let tasks: Vec<Task> = validated
            .tasks
            .iter()
            .map(|t| {
                Task::new(
                    t.id.clone(),
                    session_id.clone(),
                    t.name.clone(),
                    t.prompt.clone(),
                    t.agent_id.clone(),
                    t.max_retries,
                )
            })
            .collect();

        let dependencies: Vec<TaskDependency> = validated
            .tasks
            .iter()
            .flat_map(|t| {
                t.depends_on.iter().map(move |dep| TaskDependency {
                    session_id: session_id.clone(),
                    task_id: t.id.clone(),
                    depends_on: dep.clone(),
                })
            })
            .collect();

        self.store
            .create_session_with_graph(&session, &tasks, &dependencies)?;

        if tasks.is_empty() {
            self.store
                .update_session_status(&session_id, SessionStatus::Completed, now_ms)?;
        } else {
            self.dispatch_ready(&session_id)?;
        }

        Ok(session_id)
    }

    /// Every pending task whose predecessors are all `completed`/`cancelled`
    /// (spec §4.6 ready-set rule).
    pub fn ready_task_ids(&self, session_id: &SessionId) -> Result<Vec<TaskId>, EngineError> {
        let pending = self.store.list_tasks(
            session_id,
            TaskFilter {
                status: Some(TaskStatus::Pending),
            },
        )?;
        let mut ready = Vec::new();
        for task in pending {
            let predecessors = self.store.predecessors_of(session_id, &task.id)?;
            let mut all_satisfied = true;
            for dep in &predecessors {
                let dep_task = self.store.get_task(session_id, dep)?;
                if !dep_task.status.satisfies_dependency() {
                    all_satisfied = false;
                    break;
                }
            }
            if all_satisfied {
                ready.push(task.id);
            }
        }
        Ok(ready)
    }

    /// Transition every currently-ready pending task to `ready` and emit
    /// `task:ready` for each (spec §4.6). Safe to call repeatedly; only
    /// newly-eligible tasks are touched each time since already-`ready`
    /// tasks no longer match the `pending` filter.
    ///
    /// A no-op while the session is `paused`/`cancelled`/terminal: pause
    /// stops new work from entering the ready set without disturbing tasks
    /// already `running` (spec §4.8 — pause is cooperative, not preemptive).
    pub fn dispatch_ready(&self, session_id: &SessionId) -> Result<Vec<TaskId>, EngineError> {
        let session = self.store.get_session(session_id)?;
        if session.status != SessionStatus::Active {
            return Ok(Vec::new());
        }
        let ready_ids = self.ready_task_ids(session_id)?;
        for task_id in &ready_ids {
            self.store.mark_task_ready(session_id, task_id)?;
            self.bus.emit(Event::TaskReady {
                session_id: session_id.clone(),
                task_id: task_id.clone(),
            });
        }
        Ok(ready_ids)
    }

    /// Drain unprocessed signals for every non-terminal session (spec §9:
    /// "the signals table IS the IPC channel"; polling interval is an
    /// implementation choice).
    ///
    /// A same-process `pause`/`resume`/`cancel` already takes effect the
    /// instant [`SessionController`](crate::session_control::SessionController)
    /// writes the session row and fires its bus event — `dispatch_ready`
    /// re-reads session status on every call, and `resume`'s bus event wakes
    /// a dormant engine immediately. This sweep exists for the case the bus
    /// event can't reach: a *different* process wrote the signal (e.g. a
    /// separate `substrate pause`/`resume`/`retry` invocation against a
    /// `substrate start` blocked in another process). Without it, such a
    /// session's engine would only notice the status change next time
    /// something else happens to call `dispatch_ready`, which for a resume
    /// after a cross-process pause may be never.
    pub fn poll_signals(&self, clock: &impl Clock) -> Result<(), EngineError> {
        for session in self.store.list_non_terminal_sessions()? {
            while let Some(signal) = self.store.next_unprocessed_signal(&session.id)? {
                self.store
                    .mark_signal_processed(signal.id, clock.now_ms())?;
                if signal.signal == SignalKind::Resume {
                    self.dispatch_ready(&session.id)?;
                }
            }
        }
        Ok(())
    }

    fn handle_task_complete(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
        result: &TaskResult,
    ) -> Result<(), EngineError> {
        // A task cancelled while its worker was already in flight (spec
        // §4.8) must stay `cancelled`: the pool has no way to know the
        // cancel happened before its subprocess exited, so this handler is
        // the only place that can veto the stale completion.
        if self.store.get_task(session_id, task_id)?.status.is_terminal() {
            return Ok(());
        }

        let now_ms = substrate_core::clock::SystemClock.now_ms();
        let (input_tokens, output_tokens) = result
            .tokens_used
            .map(|t| (t.input, t.output))
            .unwrap_or_default();
        self.store.mark_task_completed(
            session_id,
            task_id,
            result.exit_code,
            input_tokens,
            output_tokens,
            0.0,
            now_ms,
        )?;
        self.dispatch_ready(session_id)?;
        self.maybe_complete_session(session_id, now_ms)?;
        Ok(())
    }

    fn handle_task_failed(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
        error: &TaskFailure,
    ) -> Result<(), EngineError> {
        // Same cancel-race guard as `handle_task_complete`: a task already
        // `cancelled` (or otherwise terminal) must not be flipped to
        // `failed` by a worker that was in flight when the cancel landed.
        if self.store.get_task(session_id, task_id)?.status.is_terminal() {
            return Ok(());
        }

        let now_ms = substrate_core::clock::SystemClock.now_ms();
        if error.budget_exceeded {
            self.store.mark_task_budget_exceeded(session_id, task_id, now_ms)?;
        } else {
            self.store
                .mark_task_failed(session_id, task_id, &error.message, error.code, now_ms)?;
        }
        // A failed predecessor never satisfies a dependent's ready-set rule,
        // so no downstream task becomes newly ready here; still check
        // whether the session as a whole is now done (every task terminal).
        self.maybe_complete_session(session_id, now_ms)?;
        Ok(())
    }

    /// Once every task in a session has reached a terminal status, the
    /// session itself transitions to `completed` (spec §8 S1, S2).
    fn maybe_complete_session(
        &self,
        session_id: &SessionId,
        now_ms: i64,
    ) -> Result<(), EngineError> {
        let session = self.store.get_session(session_id)?;
        if session.status.is_terminal() {
            return Ok(());
        }
        let tasks = self.store.list_tasks(session_id, TaskFilter::default())?;
        if tasks.iter().all(|t| t.status.is_terminal()) {
            self.store
                .update_session_status(session_id, SessionStatus::Completed, now_ms)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
