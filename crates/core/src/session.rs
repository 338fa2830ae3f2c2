// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session: one execution of a task graph.

use crate::ids::SessionId;
use crate::status::SessionStatus;
use serde::{Deserialize, Serialize};

/// One execution of a task graph; holds the root budget and status for crash recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// Reference to the graph source this session was created from (e.g. a file path).
    pub graph_source: String,
    pub status: SessionStatus,
    pub base_branch: String,
    /// Budget cap in USD, if the session declared one.
    pub budget_usd: Option<f64>,
    pub total_cost_usd: f64,
    pub planning_cost_usd: f64,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl Session {
    pub fn new(
        id: SessionId,
        graph_source: impl Into<String>,
        base_branch: impl Into<String>,
        budget_usd: Option<f64>,
        now_ms: i64,
    ) -> Self {
        Self {
            id,
            graph_source: graph_source.into(),
            status: SessionStatus::Active,
            base_branch: base_branch.into(),
            budget_usd,
            total_cost_usd: 0.0,
            planning_cost_usd: 0.0,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    /// Would `additional_cost` push accumulated cost past the session's budget cap?
    ///
    /// A session with no declared cap never exceeds budget.
    pub fn would_exceed_budget(&self, additional_cost: f64) -> bool {
        match self.budget_usd {
            Some(cap) => self.total_cost_usd + additional_cost > cap,
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
