//! `adapters list` / `adapters check` specs (spec §4.4, §6).
//!
//! The sandbox this test suite runs in has none of `claude`/`codex`/`gemini`
//! on `PATH`, so every adapter's health check fails — exercising the "2:
//! none installed" exit code deterministically without needing real CLIs.

use crate::prelude::*;

#[test]
fn no_adapters_installed_exits_2() {
    let project = Project::empty();

    project
        .substrate()
        .args(&["adapters", "list"])
        .fails()
        .code_eq(2)
        .stdout_has("claude-code")
        .stdout_has("codex")
        .stdout_has("gemini");
}

#[test]
fn check_is_an_alias_for_list() {
    let project = Project::empty();

    let list = project.substrate().args(&["adapters", "list"]).fails();
    let check = project.substrate().args(&["adapters", "check"]).fails();

    assert_eq!(list.code(), check.code());
}

#[test]
fn json_report_includes_failed_count() {
    let project = Project::empty();

    let result = project
        .substrate()
        .args(&["--output-format", "json", "adapters", "list"])
        .fails();

    let value = result.stdout_json();
    assert_eq!(value["registered_count"], 0);
    assert_eq!(value["failed_count"], 3);
}
