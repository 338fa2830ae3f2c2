// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only cost ledger (spec §3 "Cost entry", §4.10, §8 invariant 2).

use rusqlite::{params, Row};
use substrate_core::{
    cost::BillingMode,
    ids::{AdapterId, SessionId, TaskId},
    CostEntry,
};

use crate::error::StoreError;
use crate::store::Store;

/// Optional filter for [`Store::list_cost_entries`].
#[derive(Debug, Clone, Default)]
pub struct CostFilter {
    pub task_id: Option<TaskId>,
}

fn row_to_cost_entry(row: &Row) -> rusqlite::Result<CostEntry> {
    let billing_mode: String = row.get("billing_mode")?;
    Ok(CostEntry {
        session_id: SessionId::new(row.get::<_, String>("session_id")?),
        task_id: TaskId::new(row.get::<_, String>("task_id")?),
        agent: AdapterId::new(row.get::<_, String>("agent")?),
        provider: row.get("provider")?,
        model: row.get("model")?,
        input_tokens: row.get("input_tokens")?,
        output_tokens: row.get("output_tokens")?,
        cost_usd: row.get("cost_usd")?,
        savings_usd: row.get("savings_usd")?,
        billing_mode: billing_mode.parse().map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                0,
                "billing_mode".into(),
                rusqlite::types::Type::Text,
            )
        })?,
        created_at_ms: row.get("created_at_ms")?,
    })
}

impl Store {
    pub fn insert_cost_entry(&self, entry: &CostEntry) -> Result<(), StoreError> {
        debug_assert!(
            entry.billing_mode != BillingMode::Unavailable,
            "unavailable billing mode must never reach the cost ledger"
        );
        self.lock().execute(
            "INSERT INTO cost_entries
                (session_id, task_id, agent, provider, model, input_tokens,
                 output_tokens, cost_usd, savings_usd, billing_mode, created_at_ms)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
            params![
                entry.session_id.as_str(),
                entry.task_id.as_str(),
                entry.agent.as_str(),
                entry.provider,
                entry.model,
                entry.input_tokens,
                entry.output_tokens,
                entry.cost_usd,
                entry.savings_usd,
                entry.billing_mode.as_str(),
                entry.created_at_ms,
            ],
        )?;
        Ok(())
    }

    pub fn list_cost_entries(
        &self,
        session_id: &SessionId,
        filter: CostFilter,
    ) -> Result<Vec<CostEntry>, StoreError> {
        let conn = self.lock();
        let entries = match filter.task_id {
            Some(task_id) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM cost_entries WHERE session_id = ?1 AND task_id = ?2
                     ORDER BY created_at_ms ASC",
                )?;
                stmt.query_map(
                    params![session_id.as_str(), task_id.as_str()],
                    row_to_cost_entry,
                )?
                .collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM cost_entries WHERE session_id = ?1 ORDER BY created_at_ms ASC",
                )?;
                stmt.query_map(params![session_id.as_str()], row_to_cost_entry)?
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(entries)
    }

    /// Sum of `cost_usd` across every entry for a session (spec §8 invariant 2
    /// is verified against this at the call site, not enforced by the store).
    pub fn sum_session_cost(&self, session_id: &SessionId) -> Result<f64, StoreError> {
        let total: Option<f64> = self.lock().query_row(
            "SELECT SUM(cost_usd) FROM cost_entries WHERE session_id = ?1",
            params![session_id.as_str()],
            |row| row.get(0),
        )?;
        Ok(total.unwrap_or(0.0))
    }
}

#[cfg(test)]
#[path = "cost_tests.rs"]
mod tests;
