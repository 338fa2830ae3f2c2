//! Behavioral specifications for the `substrate` CLI.
//!
//! These tests are black-box: they invoke the compiled binary and verify
//! stdout, stderr, and exit codes against spec.md §6 and §8.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// cli/
#[path = "specs/cli/adapters.rs"]
mod cli_adapters;
#[path = "specs/cli/control.rs"]
mod cli_control;
#[path = "specs/cli/graph.rs"]
mod cli_graph;
#[path = "specs/cli/status.rs"]
mod cli_status;
#[path = "specs/cli/worktrees.rs"]
mod cli_worktrees;
