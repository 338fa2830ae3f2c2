// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `status [sessionId] [--watch] [--show-graph]` (spec §6).

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use substrate_core::{clock::Clock, ids::SessionId, status::TaskStatus, Session, Task};
use substrate_storage::{Store, TaskFilter};

use crate::exit_error;
use crate::output::{print_json, OutputFormat};
use crate::project_store::open_store;

/// How often `--watch` re-polls and re-renders the store (human display
/// only; JSON mode prints one snapshot and exits).
const WATCH_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Args)]
pub struct StatusArgs {
    /// Session to report on; omit to report every session in the project.
    pub session_id: Option<String>,

    /// Re-render the status view every second until interrupted.
    #[arg(long)]
    pub watch: bool,

    /// Include each task's dependency edges in the rendering.
    #[arg(long = "show-graph")]
    pub show_graph: bool,
}

pub fn handle(args: StatusArgs, project_root: &Path, format: OutputFormat) -> Result<i32> {
    let store = open_store(project_root)?;

    loop {
        let exit_code = render(&store, &args, format)?;
        if !args.watch || format == OutputFormat::Json {
            return Ok(exit_code);
        }
        std::thread::sleep(WATCH_INTERVAL);
        if format == OutputFormat::Human {
            print!("\x1B[2J\x1B[H");
        }
    }
}

fn render(store: &Store, args: &StatusArgs, format: OutputFormat) -> Result<i32> {
    let sessions = match &args.session_id {
        Some(id) => {
            let session_id = SessionId::new(id.clone());
            match store.find_session(&session_id).map_err(exit_error::typed)? {
                Some(session) => vec![session],
                None => {
                    if format == OutputFormat::Json {
                        print_json(&serde_json::json!({"error": format!("session {id} not found")}));
                    } else {
                        println!("session {id} not found");
                    }
                    return Ok(2);
                }
            }
        }
        None => store.list_sessions().map_err(exit_error::typed)?,
    };

    match format {
        OutputFormat::Json => {
            let mut rows = Vec::with_capacity(sessions.len());
            for session in &sessions {
                rows.push(session_json(store, session, args.show_graph)?);
            }
            print_json(&serde_json::json!({ "sessions": rows }));
        }
        OutputFormat::Human => {
            for session in &sessions {
                render_session_human(store, session, args.show_graph)?;
            }
        }
    }

    Ok(0)
}

fn session_json(store: &Store, session: &Session, show_graph: bool) -> Result<serde_json::Value> {
    let tasks = store
        .list_tasks(&session.id, TaskFilter::default())
        .map_err(exit_error::typed)?;
    let deps = if show_graph {
        store.list_dependencies(&session.id).map_err(exit_error::typed)?
    } else {
        Vec::new()
    };

    Ok(serde_json::json!({
        "id": session.id.as_str(),
        "status": session.status.as_str(),
        "base_branch": session.base_branch,
        "budget_usd": session.budget_usd,
        "total_cost_usd": session.total_cost_usd,
        "planning_cost_usd": session.planning_cost_usd,
        "tasks": tasks.iter().map(task_json).collect::<Vec<_>>(),
        "dependencies": deps.iter().map(|d| serde_json::json!({
            "task_id": d.task_id.as_str(),
            "depends_on": d.depends_on.as_str(),
        })).collect::<Vec<_>>(),
    }))
}

fn task_json(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "id": task.id.as_str(),
        "name": task.name,
        "status": task.status.as_str(),
        "agent": task.agent_id.as_ref().map(|a| a.as_str()),
        "retry_count": task.retry_count,
        "max_retries": task.max_retries,
        "cost_usd": task.cost_usd,
        "budget_exceeded": task.budget_exceeded,
        "error": task.error,
    })
}

fn render_session_human(store: &Store, session: &Session, show_graph: bool) -> Result<()> {
    println!(
        "session {} [{}]  cost=${:.2}{}",
        session.id,
        session.status,
        session.total_cost_usd,
        session
            .budget_usd
            .map(|b| format!(" / ${b:.2}"))
            .unwrap_or_default()
    );

    let tasks = store
        .list_tasks(&session.id, TaskFilter::default())
        .map_err(exit_error::typed)?;
    for task in &tasks {
        let marker = match task.status {
            TaskStatus::Completed => "✓",
            TaskStatus::Failed => "✗",
            TaskStatus::Running => "▶",
            _ => "·",
        };
        println!(
            "  {} {:<12} {:<10} retries={}/{} cost=${:.2} elapsed={}",
            marker,
            task.id,
            task.status,
            task.retry_count,
            task.max_retries,
            task.cost_usd,
            task_elapsed(task)
        );
        if let Some(error) = &task.error {
            println!("      error: {error}");
        }
    }

    if show_graph {
        let deps = store.list_dependencies(&session.id).map_err(exit_error::typed)?;
        if deps.is_empty() {
            println!("  graph: (no dependencies)");
        } else {
            println!("  graph:");
            for dep in &deps {
                println!("    {} -> {}", dep.depends_on, dep.task_id);
            }
        }
    }

    Ok(())
}

fn task_elapsed(task: &Task) -> String {
    let Some(started) = task.started_at_ms else {
        return "-".to_string();
    };
    let end = task
        .completed_at_ms
        .unwrap_or_else(|| substrate_core::clock::SystemClock.now_ms());
    crate::output::format_elapsed(end - started)
}
