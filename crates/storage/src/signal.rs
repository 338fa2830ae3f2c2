// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session signal queue (spec §3 "Session signal", §4.8, §9 "signals as a queue").

use rusqlite::{params, OptionalExtension, Row};
use substrate_core::{ids::SessionId, signal::SignalKind, SessionSignal};

use crate::error::StoreError;
use crate::store::Store;

fn row_to_signal(row: &Row) -> rusqlite::Result<SessionSignal> {
    let kind: String = row.get("signal")?;
    Ok(SessionSignal {
        id: row.get("id")?,
        session_id: SessionId::new(row.get::<_, String>("session_id")?),
        signal: kind.parse().map_err(|_| {
            rusqlite::Error::InvalidColumnType(0, "signal".into(), rusqlite::types::Type::Text)
        })?,
        created_at_ms: row.get("created_at_ms")?,
        processed_at_ms: row.get("processed_at_ms")?,
    })
}

impl Store {
    pub fn insert_signal(
        &self,
        session_id: &SessionId,
        signal: SignalKind,
        now_ms: i64,
    ) -> Result<i64, StoreError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO session_signals (session_id, signal, created_at_ms) VALUES (?1,?2,?3)",
            params![session_id.as_str(), signal.as_str(), now_ms],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Oldest unprocessed signal for this session, if any. The running
    /// orchestrator polls this (spec §4.8, §9: "the signals table IS the
    /// IPC channel").
    pub fn next_unprocessed_signal(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<SessionSignal>, StoreError> {
        Ok(self
            .lock()
            .query_row(
                "SELECT * FROM session_signals
                 WHERE session_id = ?1 AND processed_at_ms IS NULL
                 ORDER BY id ASC LIMIT 1",
                params![session_id.as_str()],
                row_to_signal,
            )
            .optional()?)
    }

    pub fn mark_signal_processed(&self, signal_id: i64, now_ms: i64) -> Result<(), StoreError> {
        self.lock().execute(
            "UPDATE session_signals SET processed_at_ms = ?1 WHERE id = ?2",
            params![now_ms, signal_id],
        )?;
        Ok(())
    }

    pub fn list_signals(&self, session_id: &SessionId) -> Result<Vec<SessionSignal>, StoreError> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT * FROM session_signals WHERE session_id = ?1 ORDER BY id ASC")?;
        let rows = stmt
            .query_map(params![session_id.as_str()], row_to_signal)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
