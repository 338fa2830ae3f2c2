// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ClaudeCode adapter (spec §4.3 table): prompt via `-p <prompt>`, JSON
//! output via `--output-format json`, subscription billing supported.

use async_trait::async_trait;
use substrate_core::cost::BillingMode;
use substrate_core::ids::AdapterId;

use super::{
    parse_json_plan_output, parse_json_task_output, AdapterCapabilities, AgentAdapter,
    BuildCommandOptions, HealthCheckResult, ParsedOutput, PlanParseResult, PlanningOptions,
    PlanningRequest, SpawnDescriptor,
};
use crate::env;

const BINARY: &str = "claude";

#[derive(Debug, Clone, Default)]
pub struct ClaudeCodeAdapter;

impl ClaudeCodeAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AgentAdapter for ClaudeCodeAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::new("claude-code")
    }

    fn display_name(&self) -> &'static str {
        "Claude Code"
    }

    async fn health_check(&self) -> HealthCheckResult {
        super::probe_binary_version(
            BINARY,
            &["--version"],
            true,
            env::anthropic_api_key().is_some(),
        )
        .await
    }

    fn build_command(&self, prompt: &str, options: &BuildCommandOptions) -> SpawnDescriptor {
        let mut env_vars = options.extra_env.clone();
        if let Some(key) = env::anthropic_api_key() {
            env_vars.push((env::ANTHROPIC_API_KEY.to_string(), key));
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
        parse_json_task_output(stdout, stderr, exit_code, &["result", "output"])
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
        if let Some(key) = env::anthropic_api_key() {
            env_vars.push((env::ANTHROPIC_API_KEY.to_string(), key));
        }
        SpawnDescriptor {
            binary: BINARY.to_string(),
            args: vec![
                "-p".to_string(),
                prompt,
                "--output-format".to_string(),
                "json".to_string(),
            ],
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

/// Billing mode ClaudeCode reports when no `ADT_BILLING_MODE` override is
/// present and an API key is configured.
pub fn default_billing_mode(has_api_key: bool) -> BillingMode {
    if has_api_key {
        BillingMode::Api
    } else {
        BillingMode::Subscription
    }
}

#[cfg(test)]
#[path = "claude_tests.rs"]
mod tests;
