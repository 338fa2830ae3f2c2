// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `substrate`: the command-line front end for the orchestration core
//! (spec §6). Embeds the core in-process rather than talking to a
//! long-lived daemon over a socket — see `substrate-daemon`'s crate docs.

mod commands;
mod exit_error;
mod output;
mod project_store;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::adapters::AdaptersArgs;
use commands::control::{RetryArgs, SessionIdArg};
use commands::graph::GraphArgs;
use commands::start::StartArgs;
use commands::status::StatusArgs;
use commands::worktrees::WorktreesArgs;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "substrate", version, about = "Drives DAG task graphs across coding-agent CLIs.")]
struct Cli {
    /// Run as if `substrate` was started in this directory.
    #[arg(short = 'C', long = "directory", global = true)]
    directory: Option<PathBuf>,

    /// How to render command output.
    #[arg(long = "output-format", global = true, default_value = "human")]
    output_format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect registered agent adapters.
    Adapters(AdaptersArgs),
    /// Validate and render a task graph file.
    Graph(GraphArgs),
    /// Create a session from a graph file and run it to completion.
    Start(StartArgs),
    /// Report session and task status.
    Status(StatusArgs),
    /// Pause a running session.
    Pause(SessionIdArg),
    /// Resume a paused session.
    Resume(SessionIdArg),
    /// Cancel a session.
    Cancel(SessionIdArg),
    /// Retry failed tasks in a session.
    Retry(RetryArgs),
    /// List (or prune) git worktrees managed by the project.
    Worktrees(WorktreesArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project_root = match &cli.directory {
        Some(dir) => dir.clone(),
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("error: failed to read current directory: {e}");
                return ExitCode::from(1);
            }
        },
    };
    let format = cli.output_format;

    let result = run(cli.command, &project_root, format).await;
    match result {
        Ok(code) => code_to_exit(code),
        Err(err) => {
            let code = err
                .downcast_ref::<exit_error::ExitError>()
                .map(|e| e.code)
                .unwrap_or(1);
            eprintln!("error: {err}");
            code_to_exit(code)
        }
    }
}

fn code_to_exit(code: i32) -> ExitCode {
    ExitCode::from(code.clamp(0, 255) as u8)
}

async fn run(command: Commands, project_root: &PathBuf, format: OutputFormat) -> anyhow::Result<i32> {
    match command {
        Commands::Adapters(args) => {
            let _ = args;
            Ok(commands::adapters::handle(format).await)
        }
        Commands::Graph(args) => {
            commands::graph::handle(args, format).await?;
            Ok(0)
        }
        Commands::Start(args) => {
            commands::start::handle(args, project_root, format).await?;
            Ok(0)
        }
        Commands::Status(args) => commands::status::handle(args, project_root, format),
        Commands::Pause(args) => commands::control::pause(args, project_root, format),
        Commands::Resume(args) => commands::control::resume(args, project_root, format),
        Commands::Cancel(args) => commands::control::cancel(args, project_root, format),
        Commands::Retry(args) => commands::control::retry(args, project_root, format),
        Commands::Worktrees(args) => commands::worktrees::handle(args, project_root, format).await,
    }
}
