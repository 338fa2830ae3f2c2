// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative task graph file format (spec §6).
//!
//! ```yaml
//! version: "1"
//! session: { name: build-feature, budget_usd: 5.0 }
//! tasks:
//!   a:
//!     name: write tests
//!     prompt: "Add unit tests for the parser"
//!     type: testing
//!     depends_on: []
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Task graph file versions this loader accepts.
pub const SUPPORTED_VERSIONS: &[&str] = &["1", "1.0"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Coding,
    Testing,
    Review,
    Refactor,
    Debug,
    Document,
    Analyze,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphFileSession {
    pub name: String,
    #[serde(default)]
    pub budget_usd: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphFileTask {
    pub name: String,
    pub prompt: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub max_retries: Option<u32>,
}

/// The document as parsed from disk, before graph validation.
///
/// Uses `IndexMap` (not `HashMap`) so task iteration order matches
/// declaration order in the file — used for deterministic rendering when
/// a graph has no other tiebreaker.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskGraphFile {
    pub version: String,
    pub session: GraphFileSession,
    pub tasks: IndexMap<String, GraphFileTask>,
}

impl TaskGraphFile {
    pub fn parse_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    pub fn is_supported_version(&self) -> bool {
        SUPPORTED_VERSIONS.contains(&self.version.as_str())
    }
}

#[cfg(test)]
#[path = "graph_file_tests.rs"]
mod tests;
