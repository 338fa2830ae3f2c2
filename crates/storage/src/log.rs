// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only audit trail (spec §3 "Log entry").

use rusqlite::{params, Row};
use substrate_core::{
    ids::{AdapterId, SessionId, TaskId},
    LogEntry,
};

use crate::error::StoreError;
use crate::store::Store;

fn row_to_log_entry(row: &Row) -> rusqlite::Result<LogEntry> {
    let task_id: Option<String> = row.get("task_id")?;
    let agent: Option<String> = row.get("agent")?;
    let data: Option<String> = row.get("data")?;
    Ok(LogEntry {
        id: row.get("id")?,
        session_id: SessionId::new(row.get::<_, String>("session_id")?),
        task_id: task_id.map(TaskId::new),
        event: row.get("event")?,
        old_status: row.get("old_status")?,
        new_status: row.get("new_status")?,
        agent: agent.map(AdapterId::new),
        cost_usd: row.get("cost_usd")?,
        data: data
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?,
        timestamp_ms: row.get("timestamp_ms")?,
    })
}

impl Store {
    #[allow(clippy::too_many_arguments)]
    pub fn append_log(
        &self,
        session_id: &SessionId,
        task_id: Option<&TaskId>,
        event: &str,
        old_status: Option<&str>,
        new_status: Option<&str>,
        agent: Option<&AdapterId>,
        cost_usd: Option<f64>,
        data: Option<&serde_json::Value>,
        now_ms: i64,
    ) -> Result<(), StoreError> {
        let data_json = data.map(serde_json::Value::to_string);
        self.lock().execute(
            "INSERT INTO log
                (session_id, task_id, event, old_status, new_status, agent, cost_usd, data, timestamp_ms)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
            params![
                session_id.as_str(),
                task_id.map(TaskId::as_str),
                event,
                old_status,
                new_status,
                agent.map(AdapterId::as_str),
                cost_usd,
                data_json,
                now_ms,
            ],
        )?;
        Ok(())
    }

    pub fn list_log(&self, session_id: &SessionId) -> Result<Vec<LogEntry>, StoreError> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT * FROM log WHERE session_id = ?1 ORDER BY timestamp_ms ASC, id ASC")?;
        let rows = stmt
            .query_map(params![session_id.as_str()], row_to_log_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
