// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gemini adapter (spec §4.3 table): prompt via `-p <prompt>` for task
//! execution but as a bare positional argument for planning calls, JSON
//! output via `--output-format json`, subscription billing supported.

use async_trait::async_trait;
use substrate_core::ids::AdapterId;

use super::{
    parse_json_plan_output, parse_json_task_output, AdapterCapabilities, AgentAdapter,
    BuildCommandOptions, HealthCheckResult, ParsedOutput, PlanParseResult, PlanningOptions,
    PlanningRequest, SpawnDescriptor,
};
use crate::env;

const BINARY: &str = "gemini";

#[derive(Debug, Clone, Default)]
pub struct GeminiAdapter;

impl GeminiAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AgentAdapter for GeminiAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::new("gemini")
    }

    fn display_name(&self) -> &'static str {
        "Gemini"
    }

    async fn health_check(&self) -> HealthCheckResult {
        super::probe_binary_version(
            BINARY,
            &["--version"],
            true,
            env::gemini_api_key().is_some(),
        )
        .await
    }

    fn build_command(&self, prompt: &str, options: &BuildCommandOptions) -> SpawnDescriptor {
        let mut env_vars = options.extra_env.clone();
        if let Some(key) = env::gemini_api_key() {
            env_vars.push((env::GEMINI_API_KEY.to_string(), key));
        }
        SpawnDescriptor {
            binary: BINARY.to_string(),
            args: vec![
                "-p".to_string(),
                prompt.to_string(),
                "--output-format".to_string(),
                "json".to_string(),
            ],
            env: env_vars,
            cwd: options.cwd.clone(),
            stdin: None,
            timeout_ms: options.timeout_ms,
        }
    }

    fn parse_output(&self, stdout: &str, stderr: &str, exit_code: i32) -> ParsedOutput {
        parse_json_task_output(stdout, stderr, exit_code, &["response", "output"])
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
        if let Some(key) = env::gemini_api_key() {
            env_vars.push((env::GEMINI_API_KEY.to_string(), key));
        }
        // Planning calls pass the prompt positionally, not behind `-p`
        // (spec §4.3 table: "positional (plan)").
        SpawnDescriptor {
            binary: BINARY.to_string(),
            args: vec![prompt, "--output-format".to_string(), "json".to_string()],
            env: env_vars,
            cwd: options.cwd.clone(),
            stdin: None,
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
            supports_subscription_billing: true,
        }
    }
}

#[cfg(test)]
#[path = "gemini_tests.rs"]
mod tests;
