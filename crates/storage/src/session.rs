// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session CRUD.

use rusqlite::{params, OptionalExtension, Row};
use substrate_core::{ids::SessionId, status::SessionStatus, Session};

use crate::error::StoreError;
use crate::store::Store;

fn row_to_session(row: &Row) -> rusqlite::Result<Session> {
    let status: String = row.get("status")?;
    Ok(Session {
        id: SessionId::new(row.get::<_, String>("id")?),
        graph_source: row.get("graph_source")?,
        status: status.parse().map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                0,
                "status".into(),
                rusqlite::types::Type::Text,
            )
        })?,
        base_branch: row.get("base_branch")?,
        budget_usd: row.get("budget_usd")?,
        total_cost_usd: row.get("total_cost_usd")?,
        planning_cost_usd: row.get("planning_cost_usd")?,
        created_at_ms: row.get("created_at_ms")?,
        updated_at_ms: row.get("updated_at_ms")?,
    })
}

impl Store {
    /// Insert a brand-new session row. Fails if the id already exists
    /// (spec §8: "submitting the same graph twice under the same session id
    /// is refused").
    pub fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        self.lock().execute(
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
        Ok(())
    }

    pub fn get_session(&self, id: &SessionId) -> Result<Session, StoreError> {
        self.lock()
            .query_row(
                "SELECT * FROM sessions WHERE id = ?1",
                params![id.as_str()],
                row_to_session,
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found("session", id.as_str()))
    }

    pub fn find_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self
            .lock()
            .query_row(
                "SELECT * FROM sessions WHERE id = ?1",
                params![id.as_str()],
                row_to_session,
            )
            .optional()?)
    }

    pub fn list_sessions(&self) -> Result<Vec<Session>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT * FROM sessions ORDER BY created_at_ms ASC")?;
        let rows = stmt
            .query_map([], row_to_session)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// First session in `interrupted` status, if any (spec §4.9).
    pub fn find_interrupted_session(&self) -> Result<Option<Session>, StoreError> {
        Ok(self
            .lock()
            .query_row(
                "SELECT * FROM sessions WHERE status = 'interrupted' ORDER BY created_at_ms ASC LIMIT 1",
                [],
                row_to_session,
            )
            .optional()?)
    }

    /// Every session not yet in a terminal status (spec §4.9: crash recovery scope).
    pub fn list_non_terminal_sessions(&self) -> Result<Vec<Session>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT * FROM sessions WHERE status NOT IN ('completed', 'cancelled', 'abandoned')
             ORDER BY created_at_ms ASC",
        )?;
        let rows = stmt
            .query_map([], row_to_session)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn update_session_status(
        &self,
        id: &SessionId,
        status: SessionStatus,
        now_ms: i64,
    ) -> Result<(), StoreError> {
        self.lock().execute(
            "UPDATE sessions SET status = ?1, updated_at_ms = ?2 WHERE id = ?3",
            params![status.as_str(), now_ms, id.as_str()],
        )?;
        Ok(())
    }

    /// Move an unrecoverable interrupted session to `abandoned` (spec §4.9).
    pub fn archive_session(&self, id: &SessionId, now_ms: i64) -> Result<(), StoreError> {
        self.update_session_status(id, SessionStatus::Abandoned, now_ms)
    }

    pub fn add_session_cost(
        &self,
        id: &SessionId,
        additional_cost: f64,
        now_ms: i64,
    ) -> Result<(), StoreError> {
        self.lock().execute(
            "UPDATE sessions SET total_cost_usd = total_cost_usd + ?1, updated_at_ms = ?2 WHERE id = ?3",
            params![additional_cost, now_ms, id.as_str()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
