// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The store handle: a single `rusqlite` connection opened with the pragmas
//! spec §4.1 fixes, wrapped in a mutex so it is `Send + Sync`.

use std::path::Path;

use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, Connection, Transaction};
use substrate_core::{Session, Task, TaskDependency};

use crate::error::StoreError;
use crate::migrations::MigrationRunner;

/// Busy timeout spec §4.1 fixes for write contention.
const BUSY_TIMEOUT_MS: u32 = 5000;

/// A handle to the project-local `.substrate/state.db` file (or an in-memory
/// instance for tests).
///
/// Grounded on the teacher's `Mutex<MaterializedState>` sharing pattern: a
/// single connection behind a lock, safe to share across the daemon's
/// coordinator and any background subscriber, without callers needing to
/// reason about locking around individual statements (spec §4.1).
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (creating if absent) the store file at `path`, apply pragmas,
    /// and run any pending migrations.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let mut conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Self::configure(&conn)?;
        MigrationRunner::new().run(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store for tests; same pragmas and migrations apply.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let mut conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        MigrationRunner::new().run(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn configure(conn: &Connection) -> Result<(), StoreError> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    }

    /// Run `f` inside a single transaction, committing on `Ok` and rolling
    /// back on `Err`. Used for the session-controller operations spec §5
    /// requires to be atomic (status update + signal insert together).
    pub fn transaction<T>(
        &self,
        f: impl FnOnce(&Transaction) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.conn.lock();
        let tx = guard.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    /// Insert a session and its whole task graph in a single transaction
    /// (spec §4.6: a graph is submitted as one atomic unit, never partially).
    pub fn create_session_with_graph(
        &self,
        session: &Session,
        tasks: &[Task],
        dependencies: &[TaskDependency],
    ) -> Result<(), StoreError> {
        self.transaction(|tx| {
            tx.execute(
                "INSERT INTO sessions
                    (id, graph_source, status, base_branch, budget_usd,
                     total_cost_usd, planning_cost_usd, created_at_ms, updated_at_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    session.id.as_str(),
                    session.graph_source,
                    session.status.as_str(),
                    session.base_branch,
                    session.budget_usd,
                    session.total_cost_usd,
                    session.planning_cost_usd,
                    session.created_at_ms,
                    session.updated_at_ms,
                ],
            )?;

            for task in tasks {
                tx.execute(
                    "INSERT INTO tasks
                        (session_id, id, name, prompt, status, agent_id, worker_id,
                         started_at_ms, completed_at_ms, input_tokens, output_tokens,
                         cost_usd, retry_count, max_retries, worktree_path, branch_name,
                         exit_code, error, budget_exceeded)
                     VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19)",
                    params![
                        task.session_id.as_str(),
                        task.id.as_str(),
                        task.name,
                        task.prompt,
                        task.status.as_str(),
                        task.agent_id.as_ref().map(|a| a.as_str()),
                        task.worker_id.as_ref().map(|w| w.as_str()),
                        task.started_at_ms,
                        task.completed_at_ms,
                        task.input_tokens,
                        task.output_tokens,
                        task.cost_usd,
                        task.retry_count,
                        task.max_retries,
                        task.worktree_path,
                        task.branch_name,
                        task.exit_code,
                        task.error,
                        task.budget_exceeded as i64,
                    ],
                )?;
            }

            for dep in dependencies {
                tx.execute(
                    "INSERT INTO task_dependencies (session_id, task_id, depends_on) VALUES (?1,?2,?3)",
                    params![
                        dep.session_id.as_str(),
                        dep.task_id.as_str(),
                        dep.depends_on.as_str()
                    ],
                )?;
            }

            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
