// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `graph <file>` — validate and render a task graph file without creating
//! a session (spec §4.6, §6).

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use substrate_adapters::AdapterRegistry;
use substrate_engine::graph::{load_graph_file, validate};

use crate::exit_error;
use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct GraphArgs {
    /// Path to a task graph YAML file.
    pub file: PathBuf,
}

pub async fn handle(args: GraphArgs, format: OutputFormat) -> Result<()> {
    let (registry, _report) = AdapterRegistry::discover().await;
    let known_agents = registry.ids();

    let file = load_graph_file(&args.file).map_err(exit_error::typed)?;
    let validated = validate(&file, &known_agents).map_err(exit_error::typed)?;

    match format {
        OutputFormat::Json => {
            print_json(&serde_json::json!({
                "session_name": validated.session_name,
                "budget_usd": validated.budget_usd,
                "task_count": validated.tasks.len(),
                "warnings": validated.warnings,
                "tasks": validated.tasks.iter().map(|t| serde_json::json!({
                    "id": t.id.as_str(),
                    "name": t.name,
                    "agent": t.agent_id.as_ref().map(|a| a.as_str()),
                    "depends_on": t.depends_on.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
                    "max_retries": t.max_retries,
                })).collect::<Vec<_>>(),
            }));
        }
        OutputFormat::Human => {
            println!(
                "graph ok: session '{}' ({} task{})",
                validated.session_name,
                validated.tasks.len(),
                if validated.tasks.len() == 1 { "" } else { "s" }
            );
            if let Some(budget) = validated.budget_usd {
                println!("budget: ${budget:.2}");
            }
            for task in &validated.tasks {
                let deps = if task.depends_on.is_empty() {
                    "-".to_string()
                } else {
                    task.depends_on
                        .iter()
                        .map(|d| d.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                let agent = task
                    .agent_id
                    .as_ref()
                    .map(|a| a.as_str())
                    .unwrap_or("-");
                println!("  {:<12} agent={:<14} depends_on=[{}]", task.id, agent, deps);
            }
            for warning in &validated.warnings {
                println!("warning: {warning}");
            }
        }
    }

    Ok(())
}
