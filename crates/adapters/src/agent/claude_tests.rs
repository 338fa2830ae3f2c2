use super::*;
use std::path::PathBuf;

#[test]
fn build_command_uses_dash_p_prompt_and_json_output_flag() {
    let adapter = ClaudeCodeAdapter::new();
    let cmd = adapter.build_command(
        "write tests",
        &BuildCommandOptions {
            cwd: PathBuf::from("/tmp/worktree"),
            ..Default::default()
        },
    );
    assert_eq!(cmd.binary, "claude");
    assert_eq!(
        cmd.args,
        vec!["-p", "write tests", "--output-format", "json"]
    );
    assert_eq!(cmd.stdin, None);
    assert_eq!(cmd.cwd, PathBuf::from("/tmp/worktree"));
}

#[test]
fn parse_output_reads_result_field() {
    let adapter = ClaudeCodeAdapter::new();
    let stdout = serde_json::json!({"result": "done", "tokensUsed": {"input": 10, "output": 5}})
        .to_string();
    let parsed = adapter.parse_output(&stdout, "", 0);
    assert!(parsed.success);
    assert_eq!(parsed.output, "done");
    assert_eq!(parsed.tokens_used.unwrap().total(), 15);
}

#[test]
fn capabilities_report_subscription_and_planning_support() {
    let adapter = ClaudeCodeAdapter::new();
    let caps = adapter.capabilities();
    assert!(caps.supports_subscription_billing);
    assert!(caps.supports_planning);
}

#[test]
fn estimate_tokens_uses_three_chars_per_token_heuristic() {
    let adapter = ClaudeCodeAdapter::new();
    let (input, output) = adapter.estimate_tokens("123456789"); // 9 chars
    assert_eq!(input, 3);
    assert_eq!(output, 2); // ceil(3 * 0.5)
}
