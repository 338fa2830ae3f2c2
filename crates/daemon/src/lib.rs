// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! substrate-daemon: wires the store, event bus, adapter registry, and every
//! engine subscriber into one coordinator (spec §5's "single logical
//! coordinator"), and runs crash recovery before any session work starts.
//!
//! `substrate-cli`'s `start` command embeds this in-process rather than
//! talking to a long-lived daemon over a socket — spec.md explicitly puts a
//! front-end RPC protocol out of scope, so this crate is a library only,
//! with no standalone daemon binary.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use substrate_adapters::AdapterRegistry;
use substrate_core::{clock::SystemClock, ids::SessionId, status::SessionStatus, EventBus};
use substrate_engine::{cost::CostTracker, pool::Pool, recovery, scheduler::Engine, worktree::WorktreeCoordinator};
use substrate_storage::Store;

/// How often [`Coordinator::wait_for_completion`] polls the store while a
/// session runs; the engine itself is event-driven, this is just the CLI's
/// "block until done" loop.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Everything a process needs to run Substrate sessions against one project.
#[derive(Clone)]
pub struct Coordinator {
    pub store: Arc<Store>,
    pub bus: EventBus,
    pub registry: Arc<AdapterRegistry>,
    pub engine: Engine,
    pub pool: Pool,
    pub worktrees: WorktreeCoordinator,
    pub cost: CostTracker,
    signal_poll_stop: Arc<AtomicBool>,
}

impl Coordinator {
    /// Open the project's store, discover adapters, and wire every
    /// subscriber together (spec §4.4, §5). Does not run recovery or accept
    /// sessions yet — call [`Coordinator::recover`] first.
    pub async fn open(
        project_root: &Path,
        max_concurrent_tasks: usize,
    ) -> Result<Self, substrate_storage::StoreError> {
        let db_path = project_root.join(".substrate").join("state.db");
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(substrate_storage::StoreError::Io)?;
        }
        let store = Arc::new(Store::open(&db_path)?);
        let bus = EventBus::new();
        let (registry, report) = AdapterRegistry::discover().await;
        for (id, reason) in &report.failed {
            tracing::warn!(%id, reason, "adapter failed health check, skipping registration");
        }
        let registry = Arc::new(registry);

        let engine = Engine::new(store.clone(), bus.clone());
        let pool = Pool::new(store.clone(), bus.clone(), registry.clone(), max_concurrent_tasks);
        let worktrees = WorktreeCoordinator::new(project_root.to_path_buf(), store.clone(), bus.clone());
        let cost = CostTracker::new(store.clone(), bus.clone());

        engine.install();
        pool.install();
        worktrees.install();
        cost.install();

        let signal_poll_stop = Arc::new(AtomicBool::new(false));
        spawn_signal_poll_loop(engine.clone(), signal_poll_stop.clone());

        Ok(Self {
            store,
            bus,
            registry,
            engine,
            pool,
            worktrees,
            cost,
            signal_poll_stop,
        })
    }

    /// Run one crash-recovery pass (spec §4.9). Call once, before accepting
    /// any `start` request.
    pub fn recover(&self) -> Result<recovery::RecoverySummary, substrate_engine::EngineError> {
        recovery::recover(&self.engine, &SystemClock)
    }

    /// Poll the store until `session_id` reaches a terminal status, or
    /// `timeout` elapses. Used by the CLI's `start` command, which creates a
    /// session and then blocks for the duration of the run (spec §6: `start`
    /// both creates the session and dispatches it).
    pub async fn wait_for_completion(
        &self,
        session_id: &SessionId,
        timeout: Option<Duration>,
    ) -> Result<SessionStatus, substrate_engine::EngineError> {
        let deadline = timeout.map(|d| std::time::Instant::now() + d);
        loop {
            let session = self.store.get_session(session_id)?;
            if session.status.is_terminal() {
                return Ok(session.status);
            }
            if let Some(deadline) = deadline {
                if std::time::Instant::now() >= deadline {
                    return Ok(session.status);
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Graceful shutdown: SIGTERM every live worker, SIGKILL stragglers
    /// after the pool's termination grace period (spec §4.7, §5).
    pub async fn shutdown(&self) -> Result<(), substrate_engine::EngineError> {
        self.signal_poll_stop.store(true, Ordering::Relaxed);
        self.pool.terminate_all().await
    }
}

/// Background sweep for control signals written by a *different* process
/// (spec §9: "the signals table IS the IPC channel"). A same-process
/// `pause`/`resume`/`cancel` already takes effect through the event bus;
/// this loop is what lets a `substrate start` blocked in one process notice
/// a `substrate resume`/`retry` run against the same project from another.
fn spawn_signal_poll_loop(engine: Engine, stop: Arc<AtomicBool>) {
    tokio::spawn(async move {
        while !stop.load(Ordering::Relaxed) {
            tokio::time::sleep(POLL_INTERVAL).await;
            if stop.load(Ordering::Relaxed) {
                break;
            }
            if let Err(e) = engine.poll_signals(&SystemClock) {
                tracing::error!(error = %e, "signal poll sweep failed");
            }
        }
    });
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
