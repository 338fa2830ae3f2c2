// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::LogEntry;
use crate::ids::{SessionId, TaskId};

#[test]
fn round_trips_through_json() {
    let entry = LogEntry {
        id: 1,
        session_id: SessionId::new("s1"),
        task_id: Some(TaskId::new("t1")),
        event: "task:complete".into(),
        old_status: Some("running".into()),
        new_status: Some("completed".into()),
        agent: None,
        cost_usd: Some(0.42),
        data: None,
        timestamp_ms: 1_000,
    };

    let json = serde_json::to_string(&entry).unwrap();
    let back: LogEntry = serde_json::from_str(&json).unwrap();
    assert_eq!(entry, back);
}

#[test]
fn session_level_entries_have_no_task_id() {
    let entry = LogEntry {
        id: 2,
        session_id: SessionId::new("s1"),
        task_id: None,
        event: "session:pause".into(),
        old_status: Some("active".into()),
        new_status: Some("paused".into()),
        agent: None,
        cost_usd: None,
        data: None,
        timestamp_ms: 2_000,
    };

    assert!(entry.task_id.is_none());
}
