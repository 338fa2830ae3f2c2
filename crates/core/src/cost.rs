// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cost accounting records.

use crate::ids::{AdapterId, SessionId, TaskId};
use serde::{Deserialize, Serialize};

/// Which cost-account model a given adapter invocation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingMode {
    Subscription,
    Api,
    Free,
    /// Sentinel meaning the task was never actually routed to an adapter.
    Unavailable,
}

impl BillingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BillingMode::Subscription => "subscription",
            BillingMode::Api => "api",
            BillingMode::Free => "free",
            BillingMode::Unavailable => "unavailable",
        }
    }
}

impl std::str::FromStr for BillingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscription" => Ok(BillingMode::Subscription),
            "api" => Ok(BillingMode::Api),
            "free" => Ok(BillingMode::Free),
            "unavailable" => Ok(BillingMode::Unavailable),
            other => Err(format!("invalid billing mode: {other}")),
        }
    }
}

/// Append-only cost ledger row. Sums per-session must equal
/// `sessions.total_cost_usd` within rounding tolerance (spec §8 invariant 2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    pub session_id: SessionId,
    pub task_id: TaskId,
    pub agent: AdapterId,
    pub provider: String,
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
    pub savings_usd: f64,
    pub billing_mode: BillingMode,
    pub created_at_ms: i64,
}

#[cfg(test)]
#[path = "cost_tests.rs"]
mod tests;
