// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! substrate-engine: the orchestration core sitting between the embedded
//! store and the adapter layer — graph validation, the ready-set scheduler,
//! the git worktree coordinator, the worker pool, cost accounting, session
//! control, and crash recovery (spec §4.5–§4.10).
//!
//! Every piece here is an `EventBus` subscriber wired up through `install()`
//! (spec §5); a daemon process constructs one of each, calls `install` on
//! all of them, runs [`recovery::recover`] once at startup, and is then
//! ready to accept `create_session` calls.

pub mod cost;
pub mod error;
pub mod graph;
pub mod pool;
pub mod recovery;
pub mod scheduler;
pub mod session_control;
pub mod worktree;

pub use cost::{CostTracker, INPUT_COST_PER_MILLION_TOKENS_USD, OUTPUT_COST_PER_MILLION_TOKENS_USD};
pub use error::EngineError;
pub use graph::{load_graph_file, validate, ValidatedGraph, ValidatedTask};
pub use pool::{Pool, WorkerEntry, WorkerStatus, TERMINATION_GRACE};
pub use recovery::{recover, RecoverySummary};
pub use scheduler::Engine;
pub use session_control::{RetryReport, SessionController};
pub use worktree::{WorktreeCoordinator, WorktreeEntry, WorktreeManager, GIT_WORKTREE_TIMEOUT, WORKTREE_DIR};
