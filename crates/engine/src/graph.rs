// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task graph loading, validation, and atomic persistence (spec §4.6).
//!
//! Validation order matches spec §4.6: unsupported version is rejected
//! first, then dangling dependency references, then cycles (rendered with
//! `→` joins per spec §8 scenario S6), and finally unknown agent ids are
//! collected as warnings rather than errors so graphs can be authored
//! without a full adapter set.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use substrate_core::{
    graph_file::{GraphFileTask, TaskGraphFile},
    ids::{AdapterId, TaskId},
    task::DEFAULT_MAX_RETRIES,
    Error as CoreError,
};

/// One task as validated out of the graph file, ready to persist.
#[derive(Debug, Clone)]
pub struct ValidatedTask {
    pub id: TaskId,
    pub name: String,
    pub prompt: String,
    pub agent_id: Option<AdapterId>,
    pub depends_on: Vec<TaskId>,
    pub max_retries: u32,
    pub description: Option<String>,
}

/// A graph file that has passed every structural check.
#[derive(Debug, Clone)]
pub struct ValidatedGraph {
    pub session_name: String,
    pub budget_usd: Option<f64>,
    pub tasks: Vec<ValidatedTask>,
    /// Non-fatal findings, e.g. an `agent:` referencing an unregistered adapter id.
    pub warnings: Vec<String>,
}

/// Parse a task graph YAML document from disk (spec §6 file format).
pub fn load_graph_file(path: &Path) -> Result<TaskGraphFile, CoreError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| CoreError::Validation(format!("failed to read {}: {e}", path.display())))?;
    TaskGraphFile::parse_yaml(&contents)
        .map_err(|e| CoreError::Validation(format!("failed to parse graph file: {e}")))
}

/// Validate a parsed graph file: version, dangling deps, cycles.
/// Unknown agent ids (relative to `known_agents`) are warnings, not errors.
pub fn validate(
    file: &TaskGraphFile,
    known_agents: &[AdapterId],
) -> Result<ValidatedGraph, CoreError> {
    if !file.is_supported_version() {
        return Err(CoreError::Validation(format!(
            "unsupported graph file version: {:?}",
            file.version
        )));
    }

    if file.tasks.is_empty() {
        return Ok(ValidatedGraph {
            session_name: file.session.name.clone(),
            budget_usd: file.session.budget_usd,
            tasks: Vec::new(),
            warnings: Vec::new(),
        });
    }

    let known_ids: HashSet<&str> = file.tasks.keys().map(|s| s.as_str()).collect();
    for (task_id, task) in &file.tasks {
        for dep in &task.depends_on {
            if !known_ids.contains(dep.as_str()) {
                return Err(CoreError::Validation(format!(
                    "task {task_id:?} depends on undeclared task {dep:?}"
                )));
            }
        }
    }

    if let Some(cycle) = find_cycle(file) {
        return Err(CoreError::Validation(format!(
            "Circular dependency detected: {}",
            cycle.join(" \u{2192} ")
        )));
    }

    let mut warnings = Vec::new();
    let mut tasks = Vec::with_capacity(file.tasks.len());
    for (task_id, task) in &file.tasks {
        let agent_id = task.agent.as_ref().map(|a| AdapterId::new(a.clone()));
        if let Some(agent) = &agent_id {
            if !known_agents.iter().any(|k| k == agent) {
                warnings.push(format!(
                    "task {task_id:?} references unregistered agent id {:?}",
                    agent.as_str()
                ));
            }
        }
        tasks.push(build_validated_task(task_id, task, agent_id));
    }

    Ok(ValidatedGraph {
        session_name: file.session.name.clone(),
        budget_usd: file.session.budget_usd,
        tasks,
        warnings,
    })
}

fn build_validated_task(
    task_id: &str,
    task: &GraphFileTask,
    agent_id: Option<AdapterId>,
) -> ValidatedTask {
    ValidatedTask {
        id: TaskId::new(task_id.to_string()),
        name: task.name.clone(),
        prompt: task.prompt.clone(),
        agent_id,
        depends_on: task
            .depends_on
            .iter()
            .map(|d| TaskId::new(d.clone()))
            .collect(),
        max_retries: task.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
        description: task.description.clone(),
    }
}

/// DFS cycle detection that returns the first cycle found, rendered as the
/// path of task ids that closes back on itself (spec §8 S6:
/// `a → b → a`). `None` if the graph is acyclic.
fn find_cycle(file: &TaskGraphFile) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut stack: Vec<&str> = Vec::new();

    fn visit<'a>(
        node: &'a str,
        file: &'a TaskGraphFile,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        if let Some(Mark::Visiting) = marks.get(node) {
            let start = stack.iter().position(|n| *n == node).unwrap_or(0);
            let mut cycle: Vec<String> = stack[start..].iter().map(|s| s.to_string()).collect();
            cycle.push(node.to_string());
            return Some(cycle);
        }
        if marks.get(node) == Some(&Mark::Done) {
            return None;
        }
        marks.insert(node, Mark::Visiting);
        stack.push(node);
        if let Some(task) = file.tasks.get(node) {
            for dep in &task.depends_on {
                if let Some(cycle) = visit(dep.as_str(), file, marks, stack) {
                    return Some(cycle);
                }
            }
        }
        stack.pop();
        marks.insert(node, Mark::Done);
        None
    }

    for node in file.tasks.keys() {
        if marks.contains_key(node.as_str()) {
            continue;
        }
        if let Some(cycle) = visit(node.as_str(), file, &mut marks, &mut stack) {
            return Some(cycle);
        }
    }
    None
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
