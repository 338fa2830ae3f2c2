// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task and task-dependency CRUD.

use rusqlite::{params, OptionalExtension, Row};
use substrate_core::{
    ids::{AdapterId, SessionId, TaskId, WorkerId},
    status::TaskStatus,
    Task, TaskDependency,
};

use crate::error::StoreError;
use crate::store::Store;

/// Optional filter for [`Store::list_tasks`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
}

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    let agent_id: Option<String> = row.get("agent_id")?;
    let worker_id: Option<String> = row.get("worker_id")?;
    Ok(Task {
        id: TaskId::new(row.get::<_, String>("id")?),
        session_id: SessionId::new(row.get::<_, String>("session_id")?),
        name: row.get("name")?,
        prompt: row.get("prompt")?,
        status: status.parse().map_err(|_| {
            rusqlite::Error::InvalidColumnType(0, "status".into(), rusqlite::types::Type::Text)
        })?,
        agent_id: agent_id.map(AdapterId::new),
        worker_id: worker_id.map(WorkerId::new),
        started_at_ms: row.get("started_at_ms")?,
        completed_at_ms: row.get("completed_at_ms")?,
        input_tokens: row.get("input_tokens")?,
        output_tokens: row.get("output_tokens")?,
        cost_usd: row.get("cost_usd")?,
        retry_count: row.get("retry_count")?,
        max_retries: row.get("max_retries")?,
        worktree_path: row.get("worktree_path")?,
        branch_name: row.get("branch_name")?,
        exit_code: row.get("exit_code")?,
        error: row.get("error")?,
        budget_exceeded: row.get::<_, i64>("budget_exceeded")? != 0,
    })
}

impl Store {
    pub fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        self.lock().execute(
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
                task.agent_id.as_ref().map(AdapterId::as_str),
                task.worker_id.as_ref().map(WorkerId::as_str),
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
        Ok(())
    }

    pub fn insert_dependency(&self, dep: &TaskDependency) -> Result<(), StoreError> {
        self.lock().execute(
            "INSERT INTO task_dependencies (session_id, task_id, depends_on) VALUES (?1,?2,?3)",
            params![
                dep.session_id.as_str(),
                dep.task_id.as_str(),
                dep.depends_on.as_str()
            ],
        )?;
        Ok(())
    }

    pub fn get_task(&self, session_id: &SessionId, id: &TaskId) -> Result<Task, StoreError> {
        self.lock()
            .query_row(
                "SELECT * FROM tasks WHERE session_id = ?1 AND id = ?2",
                params![session_id.as_str(), id.as_str()],
                row_to_task,
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found("task", id.as_str()))
    }

    pub fn find_task(
        &self,
        session_id: &SessionId,
        id: &TaskId,
    ) -> Result<Option<Task>, StoreError> {
        Ok(self
            .lock()
            .query_row(
                "SELECT * FROM tasks WHERE session_id = ?1 AND id = ?2",
                params![session_id.as_str(), id.as_str()],
                row_to_task,
            )
            .optional()?)
    }

    pub fn list_tasks(
        &self,
        session_id: &SessionId,
        filter: TaskFilter,
    ) -> Result<Vec<Task>, StoreError> {
        let conn = self.lock();
        let tasks = match filter.status {
            Some(status) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM tasks WHERE session_id = ?1 AND status = ?2 ORDER BY id ASC",
                )?;
                stmt.query_map(
                    params![session_id.as_str(), status.as_str()],
                    row_to_task,
                )?
                .collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt =
                    conn.prepare("SELECT * FROM tasks WHERE session_id = ?1 ORDER BY id ASC")?;
                stmt.query_map(params![session_id.as_str()], row_to_task)?
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(tasks)
    }

    pub fn list_dependencies(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<TaskDependency>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT session_id, task_id, depends_on FROM task_dependencies WHERE session_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![session_id.as_str()], |row| {
                Ok(TaskDependency {
                    session_id: SessionId::new(row.get::<_, String>(0)?),
                    task_id: TaskId::new(row.get::<_, String>(1)?),
                    depends_on: TaskId::new(row.get::<_, String>(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Predecessor ids declared for `task_id` within `session_id`.
    pub fn predecessors_of(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
    ) -> Result<Vec<TaskId>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT depends_on FROM task_dependencies WHERE session_id = ?1 AND task_id = ?2",
        )?;
        let rows = stmt
            .query_map(params![session_id.as_str(), task_id.as_str()], |row| {
                Ok(TaskId::new(row.get::<_, String>(0)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn mark_task_running(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
        worker_id: &WorkerId,
        now_ms: i64,
    ) -> Result<(), StoreError> {
        self.lock().execute(
            "UPDATE tasks SET status = 'running', worker_id = ?1, started_at_ms = ?2
             WHERE session_id = ?3 AND id = ?4",
            params![
                worker_id.as_str(),
                now_ms,
                session_id.as_str(),
                task_id.as_str()
            ],
        )?;
        Ok(())
    }

    pub fn mark_task_ready(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
    ) -> Result<(), StoreError> {
        self.lock().execute(
            "UPDATE tasks SET status = 'ready' WHERE session_id = ?1 AND id = ?2",
            params![session_id.as_str(), task_id.as_str()],
        )?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn mark_task_completed(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
        exit_code: i32,
        input_tokens: u64,
        output_tokens: u64,
        cost_usd: f64,
        now_ms: i64,
    ) -> Result<(), StoreError> {
        self.lock().execute(
            "UPDATE tasks SET status = 'completed', exit_code = ?1, input_tokens = ?2,
                 output_tokens = ?3, cost_usd = ?4, completed_at_ms = ?5
             WHERE session_id = ?6 AND id = ?7",
            params![
                exit_code,
                input_tokens,
                output_tokens,
                cost_usd,
                now_ms,
                session_id.as_str(),
                task_id.as_str()
            ],
        )?;
        Ok(())
    }

    pub fn mark_task_failed(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
        error: &str,
        exit_code: Option<i32>,
        now_ms: i64,
    ) -> Result<(), StoreError> {
        self.lock().execute(
            "UPDATE tasks SET status = 'failed', error = ?1, exit_code = ?2, completed_at_ms = ?3
             WHERE session_id = ?4 AND id = ?5",
            params![
                error,
                exit_code,
                now_ms,
                session_id.as_str(),
                task_id.as_str()
            ],
        )?;
        Ok(())
    }

    pub fn mark_task_budget_exceeded(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
        now_ms: i64,
    ) -> Result<(), StoreError> {
        self.lock().execute(
            "UPDATE tasks SET status = 'failed', budget_exceeded = 1,
                 error = 'budget exceeded', completed_at_ms = ?1
             WHERE session_id = ?2 AND id = ?3",
            params![now_ms, session_id.as_str(), task_id.as_str()],
        )?;
        Ok(())
    }

    /// Reset a failed task to `pending` for retry (spec §4.6, §4.8).
    pub fn reset_task_for_retry(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
    ) -> Result<(), StoreError> {
        self.lock().execute(
            "UPDATE tasks SET status = 'pending', retry_count = retry_count + 1,
                 error = NULL, exit_code = NULL, worker_id = NULL
             WHERE session_id = ?1 AND id = ?2",
            params![session_id.as_str(), task_id.as_str()],
        )?;
        Ok(())
    }

    /// Reset a crashed `running` task to `pending`, incrementing retries and
    /// clearing the stale worker id (spec §4.9).
    pub fn reset_task_after_crash(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
    ) -> Result<(), StoreError> {
        self.lock().execute(
            "UPDATE tasks SET status = 'pending', retry_count = retry_count + 1, worker_id = NULL
             WHERE session_id = ?1 AND id = ?2",
            params![session_id.as_str(), task_id.as_str()],
        )?;
        Ok(())
    }

    pub fn mark_task_crash_failed(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
    ) -> Result<(), StoreError> {
        self.lock().execute(
            "UPDATE tasks SET status = 'failed', worker_id = NULL,
                 error = 'Process crashed and max retries exceeded'
             WHERE session_id = ?1 AND id = ?2",
            params![session_id.as_str(), task_id.as_str()],
        )?;
        Ok(())
    }

    pub fn cancel_non_terminal_tasks(&self, session_id: &SessionId) -> Result<u64, StoreError> {
        let affected = self.lock().execute(
            "UPDATE tasks SET status = 'cancelled'
             WHERE session_id = ?1 AND status IN ('pending', 'ready', 'running')",
            params![session_id.as_str()],
        )?;
        Ok(affected as u64)
    }

    pub fn set_task_worktree(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
        worktree_path: &str,
        branch_name: &str,
    ) -> Result<(), StoreError> {
        self.lock().execute(
            "UPDATE tasks SET worktree_path = ?1, branch_name = ?2 WHERE session_id = ?3 AND id = ?4",
            params![worktree_path, branch_name, session_id.as_str(), task_id.as_str()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
