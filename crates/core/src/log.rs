// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only audit log entries.

use crate::ids::{AdapterId, SessionId, TaskId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of the append-only audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub session_id: SessionId,
    pub task_id: Option<TaskId>,
    pub event: String,
    pub old_status: Option<String>,
    pub new_status: Option<String>,
    pub agent: Option<AdapterId>,
    pub cost_usd: Option<f64>,
    pub data: Option<Value>,
    pub timestamp_ms: i64,
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
