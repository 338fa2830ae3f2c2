// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Codex adapter (spec §4.3 table): prompt delivered via stdin, JSON output
//! via `exec --json`, API-only billing (no subscription mode).

use async_trait::async_trait;
use substrate_core::ids::AdapterId;

use super::{
    parse_json_plan_output, parse_json_task_output, AdapterCapabilities, AgentAdapter,
    BuildCommandOptions, HealthCheckResult, ParsedOutput, PlanParseResult, PlanningOptions,
    PlanningRequest, SpawnDescriptor,
};
use crate::env;

const BINARY: &str = "codex";

#[derive(Debug, Clone, Default)]
pub struct CodexAdapter;

impl CodexAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AgentAdapter for CodexAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::new("codex")
    }

    fn display_name(&self) -> &'static str {
        "Codex"
    }

    async fn health_check(&self) -> HealthCheckResult {
        super::probe_binary_version(
            BINARY,
            &["--version"],
            false,
            env::openai_api_key().is_some(),
        )
        .await
    }

    fn build_command(&self, prompt: &str, options: &BuildCommandOptions) -> SpawnDescriptor {
        let mut env_vars = options.extra_env.clone();
        if let Some(key) = env::openai_api_key() {
            env_vars.push((env::OPENAI_API_KEY.to_string(), key));
        }
        SpawnDescriptor {
            binary: BINARY.to_string(),
            args: vec!["exec".to_string(), "--json".to_string()],
            env: env_vars,
            cwd: options.cwd.clone(),
            stdin: Some(prompt.to_string()),
            timeout_ms: options.timeout_ms,
        }
    }

    fn parse_output(&self, stdout: &str, stderr: &str, exit_code: i32) -> ParsedOutput {
        parse_json_task_output(stdout, stderr, exit_code, &["output", "message"])
    }

    fn build_planning_command(
        &self,
        request: &PlanningRequest,
        options: &PlanningOptions,
    ) -> SpawnDescriptor {
        let mut prompt = format!("Produce a task graph plan for: {}", request.goal);
        if let Some(context) = &request.context {
            prompt.push_str("\n\nContext:\n");
            prompt.push_str(context);
        }
        let mut env_vars = options.extra_env.clone();
        if let Some(key) = env::openai_api_key() {
            env_vars.push((env::OPENAI_API_KEY.to_string(), key));
        }
        SpawnDescriptor {
            binary: BINARY.to_string(),
            args: vec!["exec".to_string(), "--json".to_string()],
            env: env_vars,
            cwd: options.cwd.clone(),
            stdin: Some(prompt),
            timeout_ms: None,
        }
    }

    fn parse_plan_output(&self, stdout: &str, stderr: &str, exit_code: i32) -> PlanParseResult {
        parse_json_plan_output(stdout, stderr, exit_code)
    }

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities {
            supports_planning: true,
            supports_headless: true,
            supports_subscription_billing: false,
        }
    }
}

#[cfg(test)]
#[path = "codex_tests.rs"]
mod tests;
