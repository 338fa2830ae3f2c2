// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `adapters list` / `adapters check` (spec §4.4, §6).

use clap::{Args, Subcommand};
use serde::Serialize;
use substrate_adapters::agent::{AgentAdapter, ClaudeCodeAdapter, CodexAdapter, GeminiAdapter};

use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct AdaptersArgs {
    #[command(subcommand)]
    pub command: AdaptersCommand,
}

#[derive(Subcommand)]
pub enum AdaptersCommand {
    /// Run health checks and report which adapters registered.
    List,
    /// Alias for `list` (spec §6 lists both spellings for the same report).
    Check,
}

#[derive(Serialize)]
struct AdapterReportRow {
    id: String,
    display_name: &'static str,
    healthy: bool,
    version: Option<String>,
    detected_billing_modes: Vec<String>,
    error: Option<String>,
}

/// Exit codes per spec §6: 0 all healthy, 1 some unhealthy, 2 none installed.
pub async fn handle(format: OutputFormat) -> i32 {
    let candidates: Vec<Box<dyn AgentAdapter>> = vec![
        Box::new(ClaudeCodeAdapter::new()),
        Box::new(CodexAdapter::new()),
        Box::new(GeminiAdapter::new()),
    ];

    let mut rows = Vec::with_capacity(candidates.len());
    let mut healthy_count = 0usize;
    for adapter in &candidates {
        let health = adapter.health_check().await;
        if health.healthy {
            healthy_count += 1;
        }
        rows.push(AdapterReportRow {
            id: adapter.id().as_str().to_string(),
            display_name: adapter.display_name(),
            healthy: health.healthy,
            version: health.version,
            detected_billing_modes: health
                .detected_billing_modes
                .iter()
                .map(|m| m.as_str().to_string())
                .collect(),
            error: health.error,
        });
    }

    match format {
        OutputFormat::Json => {
            print_json(&serde_json::json!({
                "registered_count": healthy_count,
                "failed_count": rows.len() - healthy_count,
                "results": rows,
            }));
        }
        OutputFormat::Human => {
            println!("{:<14} {:<9} {:<22} {}", "ADAPTER", "STATUS", "NAME", "DETAIL");
            for row in &rows {
                let status = if row.healthy { "healthy" } else { "unhealthy" };
                let detail = row
                    .error
                    .clone()
                    .or_else(|| row.version.clone())
                    .unwrap_or_default();
                println!(
                    "{:<14} {:<9} {:<22} {}",
                    row.id, status, row.display_name, detail
                );
            }
        }
    }

    if healthy_count == 0 {
        2
    } else if healthy_count < rows.len() {
        1
    } else {
        0
    }
}
