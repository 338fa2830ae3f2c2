use super::*;

#[test]
fn strip_markdown_fences_removes_language_tagged_fence() {
    let input = "```json\n{\"tasks\":[]}\n```";
    assert_eq!(strip_markdown_fences(input), "{\"tasks\":[]}");
}

#[test]
fn strip_markdown_fences_is_noop_without_fences() {
    assert_eq!(strip_markdown_fences("{\"tasks\":[]}"), "{\"tasks\":[]}");
}

#[test]
fn normalize_tokens_used_reads_direct_shape() {
    let value = serde_json::json!({"tokensUsed": {"input": 10, "output": 20}});
    let tokens = normalize_tokens_used(&value).unwrap();
    assert_eq!(tokens.input, 10);
    assert_eq!(tokens.output, 20);
}

#[test]
fn normalize_tokens_used_reads_vendor_native_shape() {
    let value = serde_json::json!({
        "usageMetadata": {"promptTokenCount": 5, "candidatesTokenCount": 15}
    });
    let tokens = normalize_tokens_used(&value).unwrap();
    assert_eq!(tokens.input, 5);
    assert_eq!(tokens.output, 15);
}

#[test]
fn parse_json_task_output_nonzero_exit_is_failure_with_stderr() {
    let parsed = parse_json_task_output("", "boom", 1, &["output"]);
    assert!(!parsed.success);
    assert_eq!(parsed.error.as_deref(), Some("boom"));
    assert_eq!(parsed.exit_code, 1);
}

#[test]
fn parse_json_task_output_empty_stdout_on_success_is_empty_output() {
    let parsed = parse_json_task_output("", "", 0, &["output"]);
    assert!(parsed.success);
    assert_eq!(parsed.output, "");
}

#[test]
fn parse_json_task_output_falls_back_to_opaque_text_on_parse_failure() {
    let parsed = parse_json_task_output("not json at all", "", 0, &["output"]);
    assert!(parsed.success);
    assert_eq!(parsed.output, "not json at all");
}

#[test]
fn parse_json_task_output_explicit_error_field_is_failure() {
    let stdout = serde_json::json!({"error": "rate limited"}).to_string();
    let parsed = parse_json_task_output(&stdout, "", 0, &["output"]);
    assert!(!parsed.success);
    assert_eq!(parsed.error.as_deref(), Some("rate limited"));
}

#[test]
fn parse_json_plan_output_strips_fences_before_parsing() {
    let stdout = "```json\n{\"tasks\":[{\"name\":\"a\",\"prompt\":\"do a\"}]}\n```";
    let parsed = parse_json_plan_output(stdout, "", 0);
    assert!(parsed.success);
    assert_eq!(parsed.tasks.len(), 1);
    assert_eq!(parsed.tasks[0].name, "a");
}

#[test]
fn parse_json_plan_output_nonzero_exit_is_failure() {
    let parsed = parse_json_plan_output("", "plan generation failed", 2);
    assert!(!parsed.success);
    assert_eq!(parsed.error.as_deref(), Some("plan generation failed"));
}
