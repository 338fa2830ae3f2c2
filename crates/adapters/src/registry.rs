// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter discovery and registry (spec §4.4).

use std::collections::HashMap;

use substrate_core::ids::AdapterId;

use crate::agent::{AgentAdapter, ClaudeCodeAdapter, CodexAdapter, GeminiAdapter};

/// Outcome of [`AdapterRegistry::discover`].
#[derive(Debug, Clone)]
pub struct DiscoveryReport {
    pub registered: Vec<AdapterId>,
    pub failed: Vec<(AdapterId, String)>,
}

impl DiscoveryReport {
    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// Holds every healthy adapter, keyed by id. Unhealthy built-ins are
/// reported in [`DiscoveryReport`] but never registered and never block
/// startup (spec §4.4).
pub struct AdapterRegistry {
    adapters: HashMap<String, Box<dyn AgentAdapter>>,
}

impl AdapterRegistry {
    /// Instantiate the three built-in adapters, run `health_check()` on each
    /// sequentially, and register only the healthy ones.
    pub async fn discover() -> (Self, DiscoveryReport) {
        let candidates: Vec<Box<dyn AgentAdapter>> = vec![
            Box::new(ClaudeCodeAdapter::new()),
            Box::new(CodexAdapter::new()),
            Box::new(GeminiAdapter::new()),
        ];

        let mut registry = Self {
            adapters: HashMap::new(),
        };
        let mut report = DiscoveryReport {
            registered: Vec::new(),
            failed: Vec::new(),
        };

        for adapter in candidates {
            let health = adapter.health_check().await;
            let id = adapter.id();
            if health.healthy {
                report.registered.push(id.clone());
                registry.adapters.insert(id.as_str().to_string(), adapter);
            } else {
                report.failed.push((
                    id,
                    health.error.unwrap_or_else(|| "unhealthy".to_string()),
                ));
            }
        }

        (registry, report)
    }

    /// Build a registry from an arbitrary adapter set, bypassing discovery.
    /// Used by engine/daemon tests that wire in [`crate::FakeAdapter`]s.
    pub fn from_adapters(adapters: Vec<Box<dyn AgentAdapter>>) -> Self {
        let mut map = HashMap::new();
        for adapter in adapters {
            map.insert(adapter.id().as_str().to_string(), adapter);
        }
        Self { adapters: map }
    }

    pub fn get(&self, id: &AdapterId) -> Option<&dyn AgentAdapter> {
        self.adapters.get(id.as_str()).map(|b| b.as_ref())
    }

    pub fn is_registered(&self, id: &AdapterId) -> bool {
        self.adapters.contains_key(id.as_str())
    }

    pub fn ids(&self) -> Vec<AdapterId> {
        self.adapters.keys().map(|k| AdapterId::new(k.clone())).collect()
    }

    /// Adapters whose capabilities report planning support.
    pub fn planning_capable(&self) -> Vec<AdapterId> {
        self.adapters
            .iter()
            .filter(|(_, a)| a.capabilities().supports_planning)
            .map(|(id, _)| AdapterId::new(id.clone()))
            .collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
