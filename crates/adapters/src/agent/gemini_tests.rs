use super::*;
use std::path::PathBuf;

#[test]
fn build_command_uses_dash_p_prompt() {
    let adapter = GeminiAdapter::new();
    let cmd = adapter.build_command(
        "review this diff",
        &BuildCommandOptions {
            cwd: PathBuf::from("/tmp/worktree"),
            ..Default::default()
        },
    );
    assert_eq!(
        cmd.args,
        vec!["-p", "review this diff", "--output-format", "json"]
    );
}

#[test]
fn build_planning_command_uses_positional_prompt_not_dash_p() {
    let adapter = GeminiAdapter::new();
    let cmd = adapter.build_planning_command(
        &PlanningRequest {
            goal: "ship feature X".to_string(),
            context: None,
        },
        &PlanningOptions {
            cwd: PathBuf::from("/tmp"),
            ..Default::default()
        },
    );
    assert!(!cmd.args.contains(&"-p".to_string()));
    assert!(cmd.args[0].contains("ship feature X"));
}

#[test]
fn parse_output_reads_response_field() {
    let adapter = GeminiAdapter::new();
    let stdout = serde_json::json!({"response": "ok"}).to_string();
    let parsed = adapter.parse_output(&stdout, "", 0);
    assert!(parsed.success);
    assert_eq!(parsed.output, "ok");
}
