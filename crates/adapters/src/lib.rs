// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! substrate-adapters: the worker-adapter abstraction and built-in adapters
//! for the three supported coding agents (spec §4.3, §4.4).

pub mod agent;
pub mod env;
pub mod error;
pub mod registry;

pub use agent::{
    AgentAdapter, AdapterCapabilities, BuildCommandOptions, HealthCheckResult,
    PlanParseResult, PlanTask, PlanningOptions, PlanningRequest, SpawnDescriptor,
};
pub use error::AdapterError;
pub use registry::{AdapterRegistry, DiscoveryReport};

#[cfg(any(test, feature = "test-support"))]
pub use agent::fake::{FakeAdapter, FakeAdapterConfig};
