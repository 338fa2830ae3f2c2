use super::*;
use substrate_core::graph_file::{GraphFileSession, TaskType};
use indexmap::IndexMap;

fn task(prompt: &str, depends_on: &[&str]) -> GraphFileTask {
    GraphFileTask {
        name: prompt.to_string(),
        prompt: prompt.to_string(),
        task_type: TaskType::Coding,
        depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
        agent: None,
        description: None,
        max_retries: None,
    }
}

fn graph(tasks: Vec<(&str, GraphFileTask)>) -> TaskGraphFile {
    let mut map = IndexMap::new();
    for (id, t) in tasks {
        map.insert(id.to_string(), t);
    }
    TaskGraphFile {
        version: "1".to_string(),
        session: GraphFileSession {
            name: "test-session".to_string(),
            budget_usd: Some(5.0),
        },
        tasks: map,
    }
}

#[test]
fn rejects_unsupported_version() {
    let mut file = graph(vec![("a", task("write tests", &[]))]);
    file.version = "99".to_string();
    let err = validate(&file, &[]).unwrap_err();
    assert!(err.to_string().contains("unsupported graph file version"));
}

#[test]
fn rejects_dangling_dependency() {
    let file = graph(vec![("a", task("write tests", &["missing"]))]);
    let err = validate(&file, &[]).unwrap_err();
    assert!(err.to_string().contains("undeclared task"));
}

#[test]
fn accepts_linear_chain() {
    let file = graph(vec![
        ("a", task("first", &[])),
        ("b", task("second", &["a"])),
        ("c", task("third", &["b"])),
    ]);
    let validated = validate(&file, &[]).unwrap();
    assert_eq!(validated.tasks.len(), 3);
    assert!(validated.warnings.is_empty());
}

#[test]
fn detects_direct_cycle() {
    let file = graph(vec![
        ("a", task("first", &["b"])),
        ("b", task("second", &["a"])),
    ]);
    let err = validate(&file, &[]).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Circular dependency detected"));
    assert!(message.contains('\u{2192}'));
}

#[test]
fn detects_self_cycle() {
    let file = graph(vec![("a", task("first", &["a"]))]);
    let err = validate(&file, &[]).unwrap_err();
    assert!(err.to_string().contains("Circular dependency detected"));
}

#[test]
fn unknown_agent_is_a_warning_not_an_error() {
    let mut t = task("first", &[]);
    t.agent = Some("ghost-adapter".to_string());
    let file = graph(vec![("a", t)]);
    let validated = validate(&file, &[]).unwrap();
    assert_eq!(validated.tasks.len(), 1);
    assert_eq!(validated.warnings.len(), 1);
    assert!(validated.warnings[0].contains("ghost-adapter"));
}

#[test]
fn known_agent_produces_no_warning() {
    use substrate_core::ids::AdapterId;
    let mut t = task("first", &[]);
    t.agent = Some("claude-code".to_string());
    let file = graph(vec![("a", t)]);
    let validated = validate(&file, &[AdapterId::new("claude-code")]).unwrap();
    assert!(validated.warnings.is_empty());
}

#[test]
fn empty_graph_is_valid() {
    let file = graph(vec![]);
    let validated = validate(&file, &[]).unwrap();
    assert!(validated.tasks.is_empty());
}

// Property-based coverage for spec §8 invariant 4 ("the load-validate-
// persist pipeline rejects any input for which the dependency set contains
// a cycle") and the acyclic half of invariant 3.
mod props {
    use super::*;
    use proptest::prelude::*;

    /// Builds a graph of `n` tasks where task `i` may depend only on tasks
    /// with a strictly smaller index — by construction, always acyclic.
    fn acyclic_graph(edges: Vec<Vec<usize>>) -> TaskGraphFile {
        let n = edges.len();
        let ids: Vec<String> = (0..n).map(|i| format!("t{i}")).collect();
        let tasks = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let deps: Vec<&str> = edges[i]
                    .iter()
                    .filter(|&&d| d < i)
                    .map(|&d| ids[d].as_str())
                    .collect();
                (id.as_str(), task("do work", &deps))
            })
            .collect();
        graph(tasks)
    }

    prop_compose! {
        /// A vector of `n` dependency lists, each a subset of `0..n`.
        fn dag_edges(n: usize)(edges in proptest::collection::vec(
            proptest::collection::vec(0..n.max(1), 0..n.min(4)),
            n,
        )) -> Vec<Vec<usize>> {
            edges
        }
    }

    proptest! {
        #[test]
        fn any_dag_built_from_forward_only_edges_validates_cleanly(
            edges in (1usize..8).prop_flat_map(dag_edges)
        ) {
            let file = acyclic_graph(edges);
            prop_assert!(validate(&file, &[]).is_ok());
        }

        /// Take an acyclic graph and add one edge from its first task back
        /// to its last task, guaranteeing a cycle through the chain that
        /// forward-only construction already established reaches task 0.
        #[test]
        fn closing_the_loop_on_a_chain_is_always_rejected(n in 2usize..8) {
            let ids: Vec<String> = (0..n).map(|i| format!("t{i}")).collect();
            let tasks = ids
                .iter()
                .enumerate()
                .map(|(i, id)| {
                    let deps: Vec<&str> = if i == 0 {
                        vec![ids[n - 1].as_str()]
                    } else {
                        vec![ids[i - 1].as_str()]
                    };
                    (id.as_str(), task("do work", &deps))
                })
                .collect();
            let file = graph(tasks);
            let err = validate(&file, &[]).unwrap_err();
            prop_assert!(err.to_string().contains("Circular dependency detected"));
        }
    }
}
