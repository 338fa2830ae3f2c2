//! `worktrees [--include-orphaned]` / `worktrees prune` specs (spec §4.5, §6).

use crate::prelude::*;

#[test]
fn no_worktrees_in_a_fresh_project() {
    let project = Project::empty();

    project
        .substrate()
        .args(&["worktrees"])
        .passes()
        .stdout_has("no worktrees");
}

#[test]
fn worktree_created_for_dispatched_task_is_listed() {
    let project = Project::empty();
    let graph = project.file("graph.yaml", SINGLE_TASK_GRAPH);

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
        .args(&["worktrees"])
        .passes()
        .stdout_has("substrate/task-a");
}

#[test]
fn json_output_lists_branch_and_path() {
    let project = Project::empty();
    let graph = project.file("graph.yaml", SINGLE_TASK_GRAPH);

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

    let result = project
        .substrate()
        .args(&["--output-format", "json", "worktrees"])
        .passes();

    let value = result.stdout_json();
    let worktrees = value["worktrees"].as_array().unwrap();
    assert_eq!(worktrees.len(), 1);
    assert_eq!(worktrees[0]["branch"], "substrate/task-a");
}
