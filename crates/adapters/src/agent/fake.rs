// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A deterministic, no-subprocess adapter for engine/pool tests
//! (`test-support` feature), grounded on the teacher's `FakeAgentAdapter`.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use substrate_core::ids::AdapterId;

use super::{
    AdapterCapabilities, AgentAdapter, BuildCommandOptions, HealthCheckResult, ParsedOutput,
    PlanParseResult, PlanTask, PlanningOptions, PlanningRequest, SpawnDescriptor,
};

/// Scripted behavior for [`FakeAdapter`].
#[derive(Debug, Clone)]
pub struct FakeAdapterConfig {
    pub id: AdapterId,
    pub healthy: bool,
    pub parse_success: bool,
    pub parse_error: Option<String>,
    pub plan_tasks: Vec<PlanTask>,
}

impl Default for FakeAdapterConfig {
    fn default() -> Self {
        Self {
            id: AdapterId::new("fake"),
            healthy: true,
            parse_success: true,
            parse_error: None,
            plan_tasks: Vec::new(),
        }
    }
}

/// An in-memory adapter double. `build_command` produces a descriptor whose
/// binary is `"true"`/`"false"` (always present on the host) rather than a
/// real agent CLI, so pool tests can spawn a real, instantly-exiting
/// subprocess without depending on any external binary.
#[derive(Debug, Clone)]
pub struct FakeAdapter {
    config: FakeAdapterConfig,
    commands_built: Arc<Mutex<Vec<String>>>,
}

impl FakeAdapter {
    pub fn new(config: FakeAdapterConfig) -> Self {
        Self {
            config,
            commands_built: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn commands_built(&self) -> Vec<String> {
        self.commands_built.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl AgentAdapter for FakeAdapter {
    fn id(&self) -> AdapterId {
        self.config.id.clone()
    }

    fn display_name(&self) -> &'static str {
        "Fake Adapter"
    }

    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            healthy: self.config.healthy,
            version: Some("0.0.0-fake".to_string()),
            cli_path: Some("(fake)".to_string()),
            detected_billing_modes: vec![substrate_core::cost::BillingMode::Free],
            supports_headless: true,
            error: if self.config.healthy {
                None
            } else {
                Some("fake adapter configured unhealthy".to_string())
            },
        }
    }

    fn build_command(&self, prompt: &str, options: &BuildCommandOptions) -> SpawnDescriptor {
        self.commands_built.lock().unwrap_or_else(|e| e.into_inner()).push(prompt.to_string());
        SpawnDescriptor {
            binary: if self.config.parse_success {
                "true".to_string()
            } else {
                "false".to_string()
            },
            args: Vec::new(),
            env: Vec::new(),
            cwd: options.cwd.clone(),
            stdin: None,
            timeout_ms: options.timeout_ms,
        }
    }

    fn parse_output(&self, _stdout: &str, _stderr: &str, exit_code: i32) -> ParsedOutput {
        ParsedOutput {
            success: self.config.parse_success && exit_code == 0,
            output: if self.config.parse_success {
                "fake output".to_string()
            } else {
                String::new()
            },
            error: self.config.parse_error.clone(),
            exit_code,
            execution_time_ms: Some(1),
            tokens_used: Some(substrate_core::event::TokensUsed {
                input: 40,
                output: 60,
            }),
        }
    }

    fn build_planning_command(
        &self,
        _request: &PlanningRequest,
        options: &PlanningOptions,
    ) -> SpawnDescriptor {
        SpawnDescriptor {
            binary: "true".to_string(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: options.cwd.clone(),
            stdin: None,
            timeout_ms: None,
        }
    }

    fn parse_plan_output(&self, _stdout: &str, _stderr: &str, _exit_code: i32) -> PlanParseResult {
        PlanParseResult {
            success: self.config.parse_success,
            tasks: self.config.plan_tasks.clone(),
            error: self.config.parse_error.clone(),
            raw_output: None,
        }
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
#[path = "fake_tests.rs"]
mod tests;
