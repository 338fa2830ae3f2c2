// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pause` / `resume` / `cancel` / `retry` — session lifecycle control
//! (spec §4.8, §6), thin wrappers over [`substrate_engine::session_control::SessionController`].

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use substrate_core::{clock::SystemClock, ids::SessionId, ids::TaskId, EventBus};
use substrate_engine::session_control::SessionController;

use crate::exit_error;
use crate::output::{print_json, OutputFormat};
use crate::project_store::open_store;

#[derive(Args)]
pub struct SessionIdArg {
    pub session_id: String,
}

#[derive(Args)]
pub struct RetryArgs {
    pub session_id: String,

    /// Retry only this task instead of every retryable failed task.
    #[arg(long = "task")]
    pub task: Option<String>,

    /// Report what would be retried without changing any state.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

fn open_controller(project_root: &Path) -> Result<SessionController> {
    let store = Arc::new(open_store(project_root)?);
    Ok(SessionController::new(store, EventBus::new()))
}

/// Exit codes per spec §6: 0 ok, 1 usage error (wrong state), 2 not found.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<crate::exit_error::ExitError>()
        .map(|e| e.code)
        .unwrap_or(1)
}

pub fn pause(args: SessionIdArg, project_root: &Path, format: OutputFormat) -> Result<i32> {
    let controller = open_controller(project_root)?;
    let session_id = SessionId::new(args.session_id.clone());
    match controller.pause(&session_id, &SystemClock) {
        Ok(()) => {
            report_ok("paused", &args.session_id, format);
            Ok(0)
        }
        Err(e) => {
            let wrapped = exit_error::typed(e);
            report_err(&wrapped, format);
            Ok(exit_code_for(&wrapped))
        }
    }
}

pub fn resume(args: SessionIdArg, project_root: &Path, format: OutputFormat) -> Result<i32> {
    let controller = open_controller(project_root)?;
    let session_id = SessionId::new(args.session_id.clone());
    match controller.resume(&session_id, &SystemClock) {
        Ok(()) => {
            report_ok("resumed", &args.session_id, format);
            Ok(0)
        }
        Err(e) => {
            let wrapped = exit_error::typed(e);
            report_err(&wrapped, format);
            Ok(exit_code_for(&wrapped))
        }
    }
}

pub fn cancel(args: SessionIdArg, project_root: &Path, format: OutputFormat) -> Result<i32> {
    let controller = open_controller(project_root)?;
    let session_id = SessionId::new(args.session_id.clone());
    match controller.cancel(&session_id, &SystemClock) {
        Ok(()) => {
            report_ok("cancelled", &args.session_id, format);
            Ok(0)
        }
        Err(e) => {
            let wrapped = exit_error::typed(e);
            report_err(&wrapped, format);
            Ok(exit_code_for(&wrapped))
        }
    }
}

pub fn retry(args: RetryArgs, project_root: &Path, format: OutputFormat) -> Result<i32> {
    let controller = open_controller(project_root)?;
    let session_id = SessionId::new(args.session_id.clone());
    let task_id = args.task.as_ref().map(|t| TaskId::new(t.clone()));

    match controller.retry(&session_id, task_id.as_ref(), args.dry_run, &SystemClock) {
        Ok(report) => {
            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "dry_run": report.dry_run,
                    "retried": report.retried.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
                    "skipped_retry_limit": report.skipped_retry_limit.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
                    "skipped_predecessors_incomplete": report.skipped_predecessors_incomplete.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
                })),
                OutputFormat::Human => {
                    let verb = if report.dry_run { "would retry" } else { "retried" };
                    if report.retried.is_empty() {
                        println!("nothing to retry");
                    } else {
                        println!(
                            "{verb}: {}",
                            report
                                .retried
                                .iter()
                                .map(|t| t.as_str())
                                .collect::<Vec<_>>()
                                .join(", ")
                        );
                    }
                    for id in &report.skipped_retry_limit {
                        println!("skipped {id}: retry limit reached");
                    }
                    for id in &report.skipped_predecessors_incomplete {
                        println!("skipped {id}: predecessors not yet complete");
                    }
                }
            }
            // An explicit `--task` target that got skipped is the caller's
            // one candidate coming back empty-handed — exit 2 (spec §6:
            // "retry: ... 2 not found / dep unmet"). A bulk retry-all run
            // reports its skips informationally and still exits 0.
            let explicit_target_skipped = task_id.is_some()
                && report.retried.is_empty()
                && (!report.skipped_predecessors_incomplete.is_empty()
                    || !report.skipped_retry_limit.is_empty());
            Ok(if explicit_target_skipped { 2 } else { 0 })
        }
        Err(e) => {
            let wrapped = exit_error::typed(e);
            report_err(&wrapped, format);
            Ok(exit_code_for(&wrapped))
        }
    }
}

fn report_ok(verb: &str, session_id: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "session_id": session_id, "result": verb })),
        OutputFormat::Human => println!("session {session_id} {verb}"),
    }
}

fn report_err(err: &anyhow::Error, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "error": err.to_string() })),
        OutputFormat::Human => eprintln!("error: {err}"),
    }
}
