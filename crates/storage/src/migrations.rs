// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monotonically numbered, idempotent schema migrations (spec §3, §4.1).
//!
//! Applied versions are recorded in `schema_migrations`; running the runner
//! twice against the same connection is a no-op after the first pass. Most
//! migrations run inside the implicit transaction the runner opens; a
//! migration that needs to toggle `PRAGMA foreign_keys` (required when
//! recreating a table to add a constrained column) sets
//! `managed_own_transaction: true` and manages its own transaction boundary
//! instead, per spec §4.1.

use rusqlite::Connection;

use crate::error::StoreError;

pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub managed_own_transaction: bool,
    pub up: fn(&Connection) -> rusqlite::Result<()>,
}

pub struct MigrationRunner {
    migrations: Vec<Migration>,
}

impl MigrationRunner {
    pub fn new() -> Self {
        Self {
            migrations: builtin_migrations(),
        }
    }

    /// Run every migration not yet recorded in `schema_migrations`, in
    /// ascending version order.
    pub fn run(&self, conn: &mut Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );",
        )?;

        for migration in &self.migrations {
            let already_applied: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = ?1)",
                [migration.version],
                |row| row.get(0),
            )?;
            if already_applied {
                continue;
            }

            if migration.managed_own_transaction {
                (migration.up)(conn).map_err(|source| StoreError::Migration {
                    version: migration.version,
                    description: migration.description,
                    source,
                })?;
                conn.execute(
                    "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, datetime('now'))",
                    [migration.version],
                )?;
            } else {
                let tx = conn.transaction()?;
                (migration.up)(&tx).map_err(|source| StoreError::Migration {
                    version: migration.version,
                    description: migration.description,
                    source,
                })?;
                tx.execute(
                    "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, datetime('now'))",
                    [migration.version],
                )?;
                tx.commit()?;
            }
        }
        Ok(())
    }
}

impl Default for MigrationRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "base schema: sessions, tasks, dependencies, signals, cost, log",
            managed_own_transaction: false,
            up: |conn| {
                conn.execute_batch(
                    "
                    CREATE TABLE sessions (
                        id TEXT PRIMARY KEY,
                        graph_source TEXT NOT NULL,
                        status TEXT NOT NULL,
                        base_branch TEXT NOT NULL,
                        budget_usd REAL,
                        total_cost_usd REAL NOT NULL DEFAULT 0,
                        planning_cost_usd REAL NOT NULL DEFAULT 0,
                        created_at_ms INTEGER NOT NULL,
                        updated_at_ms INTEGER NOT NULL
                    );

                    CREATE TABLE tasks (
                        session_id TEXT NOT NULL REFERENCES sessions(id),
                        id TEXT NOT NULL,
                        name TEXT NOT NULL,
                        prompt TEXT NOT NULL,
                        status TEXT NOT NULL,
                        agent_id TEXT,
                        worker_id TEXT,
                        started_at_ms INTEGER,
                        completed_at_ms INTEGER,
                        input_tokens INTEGER NOT NULL DEFAULT 0,
                        output_tokens INTEGER NOT NULL DEFAULT 0,
                        cost_usd REAL NOT NULL DEFAULT 0,
                        retry_count INTEGER NOT NULL DEFAULT 0,
                        max_retries INTEGER NOT NULL DEFAULT 2,
                        worktree_path TEXT,
                        branch_name TEXT,
                        exit_code INTEGER,
                        error TEXT,
                        budget_exceeded INTEGER NOT NULL DEFAULT 0,
                        PRIMARY KEY (session_id, id)
                    );

                    CREATE TABLE task_dependencies (
                        session_id TEXT NOT NULL REFERENCES sessions(id),
                        task_id TEXT NOT NULL,
                        depends_on TEXT NOT NULL,
                        PRIMARY KEY (session_id, task_id, depends_on),
                        FOREIGN KEY (session_id, task_id) REFERENCES tasks(session_id, id),
                        FOREIGN KEY (session_id, depends_on) REFERENCES tasks(session_id, id)
                    );

                    CREATE TABLE session_signals (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        session_id TEXT NOT NULL REFERENCES sessions(id),
                        signal TEXT NOT NULL,
                        created_at_ms INTEGER NOT NULL,
                        processed_at_ms INTEGER
                    );

                    CREATE TABLE cost_entries (
                        session_id TEXT NOT NULL REFERENCES sessions(id),
                        task_id TEXT NOT NULL,
                        agent TEXT NOT NULL,
                        provider TEXT NOT NULL,
                        model TEXT NOT NULL,
                        input_tokens INTEGER NOT NULL,
                        output_tokens INTEGER NOT NULL,
                        cost_usd REAL NOT NULL,
                        savings_usd REAL NOT NULL DEFAULT 0,
                        billing_mode TEXT NOT NULL,
                        created_at_ms INTEGER NOT NULL
                    );

                    CREATE TABLE log (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        session_id TEXT NOT NULL,
                        task_id TEXT,
                        event TEXT NOT NULL,
                        old_status TEXT,
                        new_status TEXT,
                        agent TEXT,
                        cost_usd REAL,
                        data TEXT,
                        timestamp_ms INTEGER NOT NULL
                    );

                    CREATE INDEX idx_tasks_session_status ON tasks(session_id, status);
                    CREATE INDEX idx_signals_session_unprocessed ON session_signals(session_id, processed_at_ms);
                    CREATE INDEX idx_log_session ON log(session_id, timestamp_ms);
                    ",
                )
            },
        },
        Migration {
            version: 2,
            description: "add savings_usd retained column check (recreate-table pattern demo)",
            managed_own_transaction: true,
            up: |conn| {
                // Exercises the "recreate table to add a constrained column"
                // path spec §4.1 calls out: foreign-key enforcement must be
                // toggled outside any transaction while the table is rebuilt.
                conn.execute_batch(
                    "
                    PRAGMA foreign_keys = OFF;
                    BEGIN;
                    CREATE TABLE cost_entries_new (
                        session_id TEXT NOT NULL REFERENCES sessions(id),
                        task_id TEXT NOT NULL,
                        agent TEXT NOT NULL,
                        provider TEXT NOT NULL,
                        model TEXT NOT NULL,
                        input_tokens INTEGER NOT NULL,
                        output_tokens INTEGER NOT NULL,
                        cost_usd REAL NOT NULL,
                        savings_usd REAL NOT NULL DEFAULT 0 CHECK (savings_usd >= 0),
                        billing_mode TEXT NOT NULL,
                        created_at_ms INTEGER NOT NULL
                    );
                    INSERT INTO cost_entries_new SELECT * FROM cost_entries;
                    DROP TABLE cost_entries;
                    ALTER TABLE cost_entries_new RENAME TO cost_entries;
                    COMMIT;
                    PRAGMA foreign_keys = ON;
                    ",
                )
            },
        },
    ]
}

#[cfg(test)]
#[path = "migrations_tests.rs"]
mod tests;
