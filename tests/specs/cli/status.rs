//! `status [sessionId] [--watch] [--show-graph]` specs (spec §6).

use crate::prelude::*;

#[test]
fn status_of_unknown_session_exits_2() {
    let project = Project::empty();

    project
        .substrate()
        .args(&["status", "no-such-session"])
        .fails()
        .code_eq(2)
        .stdout_has("not found");
}

#[test]
fn status_after_start_reports_completed_session_for_agentless_graph() {
    let project = Project::empty();
    let graph = project.file("graph.yaml", SINGLE_TASK_GRAPH);

    // No `agent:` is set on the task, so the pool fails it immediately
    // (spec §4.7: a task with no assigned agent can never be routed) and
    // the session still reaches a terminal status we can assert on.
    project
        .substrate()
        .args(&[
            "start",
            graph.to_str().unwrap(),
            "--session",
            "s1",
            "--timeout-secs",
            "20",
        ])
        .passes();

    project
        .substrate()
        .args(&["status", "s1"])
        .passes()
        .stdout_has("s1")
        .stdout_has("completed");
}

#[test]
fn status_show_graph_renders_dependency_edges() {
    let project = Project::empty();
    let graph = project.file(
        "graph.yaml",
        r#"
version: "1"
session: { name: two-tasks }
tasks:
  a:
    name: first
    prompt: "do a"
    type: coding
    depends_on: []
  b:
    name: second
    prompt: "do b"
    type: coding
    depends_on: [a]
"#,
    );

    project
        .substrate()
        .args(&[
            "start",
            graph.to_str().unwrap(),
            "--session",
            "s2",
            "--timeout-secs",
            "20",
        ])
        .passes();

    project
        .substrate()
        .args(&["status", "s2", "--show-graph"])
        .passes()
        .stdout_has("a -> b");
}
