// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-pool manager (spec §4.7).
//!
//! The pool never writes a task row directly; it only emits `task:started`,
//! `worker:spawned`, `task:complete`/`task:failed`, and `worker:terminated`,
//! and reacts to `worktree:created`/`config:reloaded`. All task-row mutation
//! after a subprocess exits happens in [`crate::scheduler::Engine`]'s own
//! subscribers, mirroring the teacher's rule that only the executor commits
//! state transitions while adapters/the pool only describe and run work.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use substrate_adapters::AdapterRegistry;
use substrate_core::{
    clock::{Clock, SystemClock},
    event::{TaskFailure, TaskResult, TokensUsed},
    id::{IdGen, UuidIdGen},
    ids::{AdapterId, SessionId, TaskId, WorkerId},
    Event, EventBus,
};
use substrate_storage::Store;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};

use crate::cost::estimate_cost_usd;
use crate::error::EngineError;

/// Grace period between SIGTERM and SIGKILL during `terminate_all` (spec §4.7).
pub const TERMINATION_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Spawning,
    Running,
    Terminating,
}

/// Public-facing snapshot of a live worker (spec §4.7 worker-entry shape).
#[derive(Debug, Clone)]
pub struct WorkerEntry {
    pub worker_id: WorkerId,
    pub task_id: TaskId,
    pub session_id: SessionId,
    pub agent_id: AdapterId,
    pub status: WorkerStatus,
    pub started_at_ms: i64,
}

struct RunningWorker {
    entry: WorkerEntry,
    child: Child,
}

/// Owns the set of live subprocesses, bounded by `max_concurrent_tasks`
/// (spec §5 concurrency model).
#[derive(Clone)]
pub struct Pool {
    store: Arc<Store>,
    bus: EventBus,
    registry: Arc<AdapterRegistry>,
    max_concurrent: Arc<Mutex<usize>>,
    workers: Arc<Mutex<HashMap<WorkerId, RunningWorker>>>,
}

impl Pool {
    pub fn new(
        store: Arc<Store>,
        bus: EventBus,
        registry: Arc<AdapterRegistry>,
        max_concurrent_tasks: usize,
    ) -> Self {
        Self {
            store,
            bus,
            registry,
            max_concurrent: Arc::new(Mutex::new(max_concurrent_tasks)),
            workers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Subscribe this pool's handlers to the events it owns (spec §4.7).
    pub fn install(&self) {
        let spawn_pool = self.clone();
        self.bus.subscribe("worktree:created", move |event| {
            if let Event::WorktreeCreated {
                session_id,
                task_id,
                worktree_path,
                ..
            } = event
            {
                let pool = spawn_pool.clone();
                let session_id = session_id.clone();
                let task_id = task_id.clone();
                let worktree_path = worktree_path.clone();
                tokio::spawn(async move {
                    if let Err(e) = pool.spawn_worker(&session_id, &task_id, &worktree_path).await
                    {
                        tracing::error!(%session_id, %task_id, error = %e, "failed to spawn worker");
                    }
                });
            }
        });

        let config_pool = self.clone();
        self.bus.subscribe("config:reloaded", move |event| {
            if let Event::ConfigReloaded {
                max_concurrent_tasks,
            } = event
            {
                *config_pool.max_concurrent.lock() = *max_concurrent_tasks;
            }
        });
    }

    pub fn active_worker_count(&self) -> usize {
        self.workers.lock().len()
    }

    pub fn snapshot(&self) -> Vec<WorkerEntry> {
        self.workers.lock().values().map(|w| w.entry.clone()).collect()
    }

    /// Spawning sequence (spec §4.7):
    /// 1. look up the task row
    /// 2. resolve its adapter from the registry
    /// 3. budget-gate the estimated cost before committing to a spawn
    /// 4. emit `task:routed`
    /// 5. build the spawn descriptor and start the subprocess
    /// 6. mark the task `running` and emit `task:started`/`worker:spawned`
    /// 7. hand completion off to a detached waiter task
    async fn spawn_worker(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
        worktree_path: &str,
    ) -> Result<(), EngineError> {
        if self.active_worker_count() >= *self.max_concurrent.lock() {
            // The next `task:ready`/`worktree:created` cycle (or a future
            // poll-driven sweep) retries; nothing to clean up here since no
            // worktree-claiming side effect has happened yet.
            tracing::debug!(%session_id, %task_id, "pool at capacity, deferring spawn");
            return Ok(());
        }

        let task = self.store.get_task(session_id, task_id)?;
        let Some(agent_id) = task.agent_id.clone() else {
            self.fail_task(session_id, task_id, "task has no assigned agent", None)
                .await;
            return Ok(());
        };
        let Some(adapter) = self.registry.get(&agent_id) else {
            self.fail_task(
                session_id,
                task_id,
                &format!("agent {agent_id} is not registered"),
                None,
            )
            .await;
            return Ok(());
        };

        let (input_tokens, output_tokens) = adapter.estimate_tokens(&task.prompt);
        let estimated_cost = estimate_cost_usd(input_tokens, output_tokens);
        let session = self.store.get_session(session_id)?;
        if session.would_exceed_budget(estimated_cost) {
            // Emit only; the engine's `task:failed` handler performs the one
            // write that applies this to the task row (spec §3, §4.6: the
            // pool manager never writes to `tasks` directly).
            self.bus.emit(Event::TaskFailed {
                session_id: session_id.clone(),
                task_id: task_id.clone(),
                error: TaskFailure {
                    message: "budget exceeded".to_string(),
                    code: None,
                    budget_exceeded: true,
                },
            });
            return Ok(());
        }

        let billing_mode = adapter
            .health_check()
            .await
            .detected_billing_modes
            .first()
            .copied()
            .unwrap_or(substrate_core::cost::BillingMode::Unavailable);
        self.bus.emit(Event::TaskRouted {
            session_id: session_id.clone(),
            task_id: task_id.clone(),
            agent: agent_id.clone(),
            provider: adapter.display_name().to_string(),
            model: "default".to_string(),
            billing_mode,
        });

        let options = substrate_adapters::BuildCommandOptions {
            cwd: PathBuf::from(worktree_path),
            extra_env: Vec::new(),
            timeout_ms: None,
        };
        let descriptor = adapter.build_command(&task.prompt, &options);

        let mut command = Command::new(&descriptor.binary);
        command
            .args(&descriptor.args)
            .current_dir(&descriptor.cwd)
            .stdin(if descriptor.stdin.is_some() {
                std::process::Stdio::piped()
            } else {
                std::process::Stdio::null()
            })
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());
        for (key, value) in &descriptor.env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|e| {
            EngineError::Core(substrate_core::Error::SubprocessFailure(format!(
                "failed to spawn {}: {e}",
                descriptor.binary
            )))
        })?;

        if let Some(stdin_payload) = &descriptor.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                let payload = stdin_payload.clone();
                let _ = stdin.write_all(payload.as_bytes()).await;
            }
        }

        let worker_id = WorkerId::new(UuidIdGen.next());
        let now_ms = SystemClock.now_ms();
        self.store
            .mark_task_running(session_id, task_id, &worker_id, now_ms)?;
        self.bus.emit(Event::TaskStarted {
            session_id: session_id.clone(),
            task_id: task_id.clone(),
            worker_id: worker_id.clone(),
            agent: agent_id.clone(),
        });

        let entry = WorkerEntry {
            worker_id: worker_id.clone(),
            task_id: task_id.clone(),
            session_id: session_id.clone(),
            agent_id: agent_id.clone(),
            status: WorkerStatus::Running,
            started_at_ms: now_ms,
        };
        self.workers
            .lock()
            .insert(worker_id.clone(), RunningWorker { entry, child });
        self.bus.emit(Event::WorkerSpawned {
            session_id: session_id.clone(),
            task_id: task_id.clone(),
            worker_id: worker_id.clone(),
        });

        let pool = self.clone();
        let timeout_ms = descriptor.timeout_ms;
        tokio::spawn(async move {
            pool.wait_for_completion(worker_id, timeout_ms).await;
        });

        Ok(())
    }

    /// Waits out the subprocess, parses its output via the adapter, and
    /// emits exactly one of `task:complete`/`task:failed` (spec §4.7).
    async fn wait_for_completion(&self, worker_id: WorkerId, timeout_ms: Option<u64>) {
        let (session_id, task_id, agent_id, mut child) = {
            let mut workers = self.workers.lock();
            match workers.remove(&worker_id) {
                Some(w) => (w.entry.session_id, w.entry.task_id, w.entry.agent_id, w.child),
                None => return,
            }
        };

        let mut stdout = String::new();
        let mut stderr = String::new();
        if let Some(mut out) = child.stdout.take() {
            let _ = out.read_to_string(&mut stdout).await;
        }
        if let Some(mut err) = child.stderr.take() {
            let _ = err.read_to_string(&mut stderr).await;
        }

        let wait_future = child.wait();
        let status = match timeout_ms {
            Some(ms) => tokio::time::timeout(Duration::from_millis(ms), wait_future).await,
            None => Ok(wait_future.await),
        };

        let exit_code = match status {
            Ok(Ok(status)) => status.code().unwrap_or(-1),
            Ok(Err(e)) => {
                self.fail_task(&session_id, &task_id, &format!("wait failed: {e}"), None)
                    .await;
                return;
            }
            Err(_elapsed) => {
                let _ = child.start_kill();
                self.fail_task(&session_id, &task_id, "task timed out", None)
                    .await;
                return;
            }
        };

        let Some(adapter) = self.registry.get(&agent_id) else {
            self.fail_task(
                &session_id,
                &task_id,
                &format!("agent {agent_id} is not registered"),
                Some(exit_code),
            )
            .await;
            return;
        };

        let parsed = adapter.parse_output(&stdout, &stderr, exit_code);
        if parsed.success {
            self.bus.emit(Event::TaskComplete {
                session_id,
                task_id,
                result: TaskResult {
                    output: parsed.output,
                    exit_code: parsed.exit_code,
                    tokens_used: parsed.tokens_used.or(Some(TokensUsed::default())),
                },
            });
        } else {
            self.bus.emit(Event::TaskFailed {
                session_id,
                task_id,
                error: TaskFailure {
                    message: parsed.error.unwrap_or_else(|| "task failed".to_string()),
                    code: Some(parsed.exit_code),
                    budget_exceeded: false,
                },
            });
        }
    }

    async fn fail_task(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
        message: &str,
        code: Option<i32>,
    ) {
        self.bus.emit(Event::TaskFailed {
            session_id: session_id.clone(),
            task_id: task_id.clone(),
            error: TaskFailure {
                message: message.to_string(),
                code,
                budget_exceeded: false,
            },
        });
    }

    /// Send SIGTERM to one worker's subprocess and drop it from the pool.
    pub async fn terminate_worker(&self, worker_id: &WorkerId) -> Result<(), EngineError> {
        let pid = {
            let mut workers = self.workers.lock();
            if let Some(w) = workers.get_mut(worker_id) {
                w.entry.status = WorkerStatus::Terminating;
            }
            workers.get(worker_id).and_then(|w| w.child.id())
        };
        if let Some(pid) = pid {
            send_signal(pid, "-TERM").await;
        }
        self.workers.lock().remove(worker_id);
        Ok(())
    }

    /// SIGTERM every live worker, wait out [`TERMINATION_GRACE`], then
    /// SIGKILL stragglers, emitting `worker:terminated` only for those
    /// forcibly killed (spec §4.7).
    pub async fn terminate_all(&self) -> Result<(), EngineError> {
        let pids: Vec<(WorkerId, Option<u32>)> = {
            let mut workers = self.workers.lock();
            for w in workers.values_mut() {
                w.entry.status = WorkerStatus::Terminating;
            }
            workers
                .iter()
                .map(|(id, w)| (id.clone(), w.child.id()))
                .collect()
        };
        for (_, pid) in &pids {
            if let Some(pid) = pid {
                send_signal(*pid, "-TERM").await;
            }
        }

        tokio::time::sleep(TERMINATION_GRACE).await;

        for (worker_id, _) in &pids {
            let still_alive = self.workers.lock().contains_key(worker_id);
            if !still_alive {
                continue;
            }
            let pid = self.workers.lock().get(worker_id).and_then(|w| w.child.id());
            if let Some(pid) = pid {
                send_signal(pid, "-KILL").await;
            }
            self.workers.lock().remove(worker_id);
            self.bus.emit(Event::WorkerTerminated {
                worker_id: worker_id.clone(),
                reason: "terminate_all grace period elapsed".to_string(),
            });
        }

        Ok(())
    }
}

/// Send a POSIX signal to `pid` by shelling out to `kill`, matching the
/// teacher's `daemon_process::kill_signal` (`kill -<signal> <pid>`) rather
/// than pulling in a signal-handling crate for two call sites.
async fn send_signal(pid: u32, signal: &str) {
    let _ = Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await;
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
