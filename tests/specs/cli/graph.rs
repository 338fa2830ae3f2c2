//! `graph <file>` specs (spec §4.6, §6).

use crate::prelude::*;

#[test]
fn valid_graph_passes_and_renders_task() {
    let project = Project::empty();
    let graph = project.file("graph.yaml", SINGLE_TASK_GRAPH);

    project
        .substrate()
        .args(&[
            "graph",
            graph.to_str().unwrap(),
        ])
        .passes()
        .stdout_has("single-task")
        .stdout_has("write tests");
}

#[test]
fn cyclic_graph_fails_with_exit_code_2() {
    let project = Project::empty();
    let graph = project.file("graph.yaml", CYCLIC_GRAPH);

    project
        .substrate()
        .args(&["graph", graph.to_str().unwrap()])
        .fails()
        .code_eq(2)
        .stderr_has("Circular dependency");
}

#[test]
fn dangling_dependency_fails_with_exit_code_2() {
    let project = Project::empty();
    let graph = project.file("graph.yaml", DANGLING_DEP_GRAPH);

    project
        .substrate()
        .args(&["graph", graph.to_str().unwrap()])
        .fails()
        .code_eq(2)
        .stderr_has("undeclared task");
}

#[test]
fn unknown_agent_is_a_warning_not_a_failure() {
    let project = Project::empty();
    let graph = project.file("graph.yaml", UNKNOWN_AGENT_GRAPH);

    project
        .substrate()
        .args(&["graph", graph.to_str().unwrap()])
        .passes()
        .stdout_has("warning");
}

#[test]
fn missing_file_fails() {
    let project = Project::empty();

    project
        .substrate()
        .args(&["graph", "does-not-exist.yaml"])
        .fails();
}

#[test]
fn json_output_is_single_line_and_parses() {
    let project = Project::empty();
    let graph = project.file("graph.yaml", SINGLE_TASK_GRAPH);

    let result = project
        .substrate()
        .args(&[
            "--output-format",
            "json",
            "graph",
            graph.to_str().unwrap(),
        ])
        .passes();

    assert_eq!(result.stdout().lines().count(), 1);
    let value = result.stdout_json();
    assert_eq!(value["session_name"], "single-task");
    assert_eq!(value["task_count"], 1);
}
