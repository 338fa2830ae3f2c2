// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker adapter abstraction (spec §4.3).
//!
//! `AgentAdapter` is a capability-based polymorphism over three concrete
//! agents: [`claude::ClaudeCodeAdapter`], [`codex::CodexAdapter`], and
//! [`gemini::GeminiAdapter`]. The variant is fixed at registration
//! ([`crate::registry::AdapterRegistry::discover`]); there is no virtual
//! dispatch beyond the one `Box<dyn AgentAdapter>` indirection, matching the
//! teacher's `#[async_trait] pub trait AgentAdapter` shape in
//! `crates/adapters/src/agent/mod.rs`, generalized here from a long-lived
//! tmux-session model to a one-shot spawn/wait/parse model.

pub mod claude;
pub mod codex;
pub mod gemini;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use substrate_core::cost::BillingMode;
use substrate_core::event::TokensUsed;
use substrate_core::ids::AdapterId;

pub use claude::ClaudeCodeAdapter;
pub use codex::CodexAdapter;
pub use gemini::GeminiAdapter;

/// Characters-per-token heuristic used by [`AgentAdapter::estimate_tokens`]
/// (spec §4.3: "3 chars/token, output ratio 0.5").
pub const CHARS_PER_TOKEN: f64 = 3.0;
/// Assumed ratio of output tokens to input tokens when no usage data exists yet.
pub const OUTPUT_TOKEN_RATIO: f64 = 0.5;

/// Result of [`AgentAdapter::health_check`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub healthy: bool,
    pub version: Option<String>,
    pub cli_path: Option<String>,
    pub detected_billing_modes: Vec<BillingMode>,
    pub supports_headless: bool,
    pub error: Option<String>,
}

/// Options that shape a single task-execution command.
#[derive(Debug, Clone, Default)]
pub struct BuildCommandOptions {
    pub cwd: PathBuf,
    pub extra_env: Vec<(String, String)>,
    pub timeout_ms: Option<u64>,
}

/// A ready-to-spawn subprocess descriptor (spec §4.3).
#[derive(Debug, Clone)]
pub struct SpawnDescriptor {
    pub binary: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: PathBuf,
    pub stdin: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// Normalized outcome of parsing a finished subprocess's stdout/stderr.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOutput {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
    pub exit_code: i32,
    pub execution_time_ms: Option<u64>,
    pub tokens_used: Option<TokensUsed>,
}

/// A plan-generation request (not a task execution).
#[derive(Debug, Clone)]
pub struct PlanningRequest {
    pub goal: String,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PlanningOptions {
    pub cwd: PathBuf,
    pub extra_env: Vec<(String, String)>,
}

/// One task a plan-generation call proposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTask {
    pub name: String,
    pub prompt: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// Normalized outcome of parsing a plan-generation call's output.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanParseResult {
    pub success: bool,
    pub tasks: Vec<PlanTask>,
    pub error: Option<String>,
    pub raw_output: Option<String>,
}

/// What a registered adapter can do, reported by the registry
/// (spec §4.3 "getCapabilities()").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterCapabilities {
    pub supports_planning: bool,
    pub supports_headless: bool,
    pub supports_subscription_billing: bool,
}

/// Uniform capability surface over a specific external agent binary.
#[async_trait]
pub trait AgentAdapter: Send + Sync {
    fn id(&self) -> AdapterId;
    fn display_name(&self) -> &'static str;

    async fn health_check(&self) -> HealthCheckResult;

    /// Build the spawn descriptor for a single task prompt.
    fn build_command(&self, prompt: &str, options: &BuildCommandOptions) -> SpawnDescriptor;

    /// Parse a finished subprocess's output into a normalized result.
    ///
    /// Parsing rules (spec §4.3): non-zero exit is always a failure carrying
    /// stderr; empty stdout on a zero exit is an empty-output success; a
    /// JSON parse failure falls back to treating stdout as opaque success
    /// text; an explicit `error` field inside parsed JSON is a failure.
    fn parse_output(&self, stdout: &str, stderr: &str, exit_code: i32) -> ParsedOutput;

    /// Build the spawn descriptor for a plan-generation call.
    fn build_planning_command(
        &self,
        request: &PlanningRequest,
        options: &PlanningOptions,
    ) -> SpawnDescriptor;

    /// Parse a plan-generation call's output.
    ///
    /// Markdown code fences are stripped before JSON parsing (spec §4.3).
    fn parse_plan_output(&self, stdout: &str, stderr: &str, exit_code: i32) -> PlanParseResult;

    /// Characters-per-token heuristic estimate; `(input, output)` tokens.
    fn estimate_tokens(&self, prompt: &str) -> (u64, u64) {
        let input = (prompt.len() as f64 / CHARS_PER_TOKEN).ceil() as u64;
        let output = (input as f64 * OUTPUT_TOKEN_RATIO).ceil() as u64;
        (input, output)
    }

    fn capabilities(&self) -> AdapterCapabilities;
}

/// Strip leading/trailing ``` fences (optionally language-tagged) from a
/// plan-generation response before attempting JSON parsing.
pub fn strip_markdown_fences(s: &str) -> &str {
    let trimmed = s.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let after_open = after_open
        .trim_start_matches(|c: char| c.is_ascii_alphanumeric())
        .trim_start_matches('\n');
    after_open.strip_suffix("```").unwrap_or(after_open).trim()
}

/// Both adapter token shapes normalize to the same [`TokensUsed`] (spec §4.3):
/// a direct `tokens_used{input,output}` block, or a vendor-native
/// `usage_metadata.{prompt_token_count,candidates_token_count}` block.
pub fn normalize_tokens_used(value: &serde_json::Value) -> Option<TokensUsed> {
    if let Some(direct) = value.get("tokensUsed").or_else(|| value.get("tokens_used")) {
        let input = direct.get("input").and_then(|v| v.as_u64()).unwrap_or(0);
        let output = direct.get("output").and_then(|v| v.as_u64()).unwrap_or(0);
        return Some(TokensUsed { input, output });
    }
    if let Some(usage) = value.get("usageMetadata").or_else(|| value.get("usage_metadata")) {
        let input = usage
            .get("promptTokenCount")
            .or_else(|| usage.get("prompt_token_count"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let output = usage
            .get("candidatesTokenCount")
            .or_else(|| usage.get("candidates_token_count"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        return Some(TokensUsed { input, output });
    }
    None
}

/// Shared non-zero-exit / JSON-fallback / explicit-error parsing rules
/// (spec §4.3), parameterized only by where the adapter's JSON keeps its
/// free-form text.
pub fn parse_json_task_output(
    stdout: &str,
    stderr: &str,
    exit_code: i32,
    text_keys: &[&str],
) -> ParsedOutput {
    if exit_code != 0 {
        return ParsedOutput {
            success: false,
            output: String::new(),
            error: Some(if stderr.trim().is_empty() {
                format!("process exited with code {exit_code}")
            } else {
                stderr.trim().to_string()
            }),
            exit_code,
            execution_time_ms: None,
            tokens_used: None,
        };
    }

    if stdout.trim().is_empty() {
        return ParsedOutput {
            success: true,
            output: String::new(),
            error: None,
            exit_code,
            execution_time_ms: None,
            tokens_used: None,
        };
    }

    match serde_json::from_str::<serde_json::Value>(stdout.trim()) {
        Ok(value) => {
            if let Some(error) = value.get("error").and_then(|v| v.as_str()) {
                return ParsedOutput {
                    success: false,
                    output: String::new(),
                    error: Some(error.to_string()),
                    exit_code,
                    execution_time_ms: None,
                    tokens_used: normalize_tokens_used(&value),
                };
            }
            let output = text_keys
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
                .unwrap_or(stdout.trim())
                .to_string();
            let execution_time_ms = value
                .get("executionTime")
                .or_else(|| value.get("execution_time"))
                .and_then(|v| v.as_u64());
            ParsedOutput {
                success: true,
                output,
                error: None,
                exit_code,
                execution_time_ms,
                tokens_used: normalize_tokens_used(&value),
            }
        }
        // Fall back to treating stdout as opaque success text (spec §4.3).
        Err(_) => ParsedOutput {
            success: true,
            output: stdout.trim().to_string(),
            error: None,
            exit_code,
            execution_time_ms: None,
            tokens_used: None,
        },
    }
}

/// Shared plan-output parsing: strip fences, parse a `{tasks: [...]}`
/// document, surface an explicit `error` field as failure.
pub fn parse_json_plan_output(stdout: &str, stderr: &str, exit_code: i32) -> PlanParseResult {
    if exit_code != 0 {
        return PlanParseResult {
            success: false,
            tasks: Vec::new(),
            error: Some(if stderr.trim().is_empty() {
                format!("process exited with code {exit_code}")
            } else {
                stderr.trim().to_string()
            }),
            raw_output: Some(stdout.to_string()),
        };
    }

    let cleaned = strip_markdown_fences(stdout);
    match serde_json::from_str::<serde_json::Value>(cleaned) {
        Ok(value) => {
            if let Some(error) = value.get("error").and_then(|v| v.as_str()) {
                return PlanParseResult {
                    success: false,
                    tasks: Vec::new(),
                    error: Some(error.to_string()),
                    raw_output: Some(stdout.to_string()),
                };
            }
            let tasks: Vec<PlanTask> = value
                .get("tasks")
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default();
            PlanParseResult {
                success: true,
                tasks,
                error: None,
                raw_output: Some(stdout.to_string()),
            }
        }
        Err(e) => PlanParseResult {
            success: false,
            tasks: Vec::new(),
            error: Some(format!("failed to parse plan output: {e}")),
            raw_output: Some(stdout.to_string()),
        },
    }
}

/// `HashMap` for adapter-specific session config, retained for adapters that
/// want to carry vendor-specific fields through without widening the shared
/// trait surface.
pub type AdapterConfig = HashMap<String, serde_json::Value>;

/// Timeout for a `<binary> --version`-style health probe.
const HEALTH_CHECK_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Shared health-check shape: spawn `<binary> <version_args>`, report
/// healthy iff it exits zero, and derive `detected_billing_modes` from the
/// `ADT_BILLING_MODE` override when present, else from API-key presence and
/// whether this adapter supports subscription billing at all (spec §4.3,
/// §4.4: "health-check results distinguish detectedBillingModes from the
/// ADT_BILLING_MODE override").
pub(crate) async fn probe_binary_version(
    binary: &str,
    version_args: &[&str],
    subscription_capable: bool,
    has_api_key: bool,
) -> HealthCheckResult {
    let detected_billing_modes = if let Some(mode) = crate::env::billing_mode_override() {
        vec![mode]
    } else if has_api_key {
        vec![BillingMode::Api]
    } else if subscription_capable {
        vec![BillingMode::Subscription]
    } else {
        Vec::new()
    };

    let mut cmd = tokio::process::Command::new(binary);
    cmd.args(version_args);
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());

    match tokio::time::timeout(HEALTH_CHECK_TIMEOUT, cmd.output()).await {
        Ok(Ok(output)) if output.status.success() => HealthCheckResult {
            healthy: true,
            version: Some(String::from_utf8_lossy(&output.stdout).trim().to_string()),
            cli_path: Some(binary.to_string()),
            detected_billing_modes,
            supports_headless: true,
            error: None,
        },
        Ok(Ok(output)) => HealthCheckResult {
            healthy: false,
            version: None,
            cli_path: Some(binary.to_string()),
            detected_billing_modes,
            supports_headless: true,
            error: Some(String::from_utf8_lossy(&output.stderr).trim().to_string()),
        },
        Ok(Err(io_err)) => HealthCheckResult {
            healthy: false,
            version: None,
            cli_path: None,
            detected_billing_modes,
            supports_headless: true,
            error: Some(io_err.to_string()),
        },
        Err(_elapsed) => HealthCheckResult {
            healthy: false,
            version: None,
            cli_path: Some(binary.to_string()),
            detected_billing_modes,
            supports_headless: true,
            error: Some(format!("{binary} --version timed out")),
        },
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
