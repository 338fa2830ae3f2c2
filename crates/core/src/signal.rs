// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session control signals: the durable queue that stands in for OS signals.

use crate::ids::SessionId;
use serde::{Deserialize, Serialize};

/// A control signal the session controller can enqueue for the running orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Pause,
    Resume,
    Cancel,
}

impl SignalKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalKind::Pause => "pause",
            SignalKind::Resume => "resume",
            SignalKind::Cancel => "cancel",
        }
    }
}

impl std::str::FromStr for SignalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pause" => Ok(SignalKind::Pause),
            "resume" => Ok(SignalKind::Resume),
            "cancel" => Ok(SignalKind::Cancel),
            other => Err(format!("invalid signal kind: {other}")),
        }
    }
}

/// A queued, durable signal row. Never deleted; `processed_at_ms` is set once consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSignal {
    pub id: i64,
    pub session_id: SessionId,
    pub signal: SignalKind,
    pub created_at_ms: i64,
    pub processed_at_ms: Option<i64>,
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
