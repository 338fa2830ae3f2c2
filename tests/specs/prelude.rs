//! Test helpers for behavioral specifications.
//!
//! Provides a high-level DSL for black-box `substrate` CLI tests: invoke the
//! compiled binary and assert on stdout, stderr, and exit code.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Returns the path to the `substrate` binary, built alongside this test.
fn binary_path() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let standard = manifest_dir.join("target/debug/substrate");
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join("substrate");
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

/// Create a CLI builder for `substrate` commands.
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

pub struct CliBuilder {
    args: Vec<String>,
    dir: Option<PathBuf>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            dir: None,
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn pwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = Some(path.into());
        self
    }

    pub fn command(self) -> Command {
        let mut cmd = Command::new(binary_path());
        cmd.args(&self.args);
        if let Some(dir) = self.dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    pub fn run(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("substrate should run");
        RunAssert { output }
    }

    /// Run and expect exit code 0.
    pub fn passes(self) -> RunAssert {
        let result = self.run();
        assert!(
            result.output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            result.output.status.code(),
            result.stdout(),
            result.stderr()
        );
        result
    }

    /// Run and expect a non-zero exit code.
    pub fn fails(self) -> RunAssert {
        let result = self.run();
        assert!(
            !result.output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            result.stdout(),
            result.stderr()
        );
        result
    }
}

/// Result of a CLI run, for chaining assertions.
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    pub fn code_eq(self, expected: i32) -> Self {
        assert_eq!(
            self.code(),
            Some(expected),
            "stdout: {}\nstderr: {}",
            self.stdout(),
            self.stderr()
        );
        self
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{expected}'\nstdout: {stdout}"
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{expected}'\nstderr: {stderr}"
        );
        self
    }

    pub fn stdout_json(&self) -> serde_json::Value {
        serde_json::from_str(self.stdout().trim())
            .unwrap_or_else(|e| panic!("stdout is not valid JSON ({e}): {}", self.stdout()))
    }
}

// =============================================================================
// Project
// =============================================================================

/// Temporary project directory with a git repo and `.substrate` state.
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    /// Create an empty project with an initialized git repository and one
    /// commit on `main` (task graph `base_branch` defaults to `main`).
    pub fn empty() -> Self {
        let project = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        project.git(&["init", "-q", "-b", "main"]);
        project.git(&["config", "user.email", "test@example.com"]);
        project.git(&["config", "user.name", "test"]);
        project.file("README.md", "substrate test fixture\n");
        project.git(&["add", "."]);
        project.git(&["commit", "-q", "-m", "initial"]);
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn git(&self, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .status()
            .expect("git should run");
        assert!(status.success(), "git {args:?} failed");
    }

    /// Write a file at the given path (parent directories created automatically).
    pub fn file(&self, path: impl AsRef<Path>, content: &str) -> PathBuf {
        let full_path = self.dir.path().join(path.as_ref());
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&full_path, content).unwrap();
        full_path
    }

    /// Run a `substrate` command scoped to this project's directory.
    pub fn substrate(&self) -> CliBuilder {
        cli().pwd(self.path())
    }
}

/// A graph with a single task requiring no registered agent.
pub const SINGLE_TASK_GRAPH: &str = r#"
version: "1"
session: { name: single-task, budget_usd: 5.0 }
tasks:
  a:
    name: write tests
    prompt: "Add unit tests for the parser"
    type: testing
    depends_on: []
"#;

/// A graph with a dependency cycle (a -> b -> a).
pub const CYCLIC_GRAPH: &str = r#"
version: "1"
session: { name: cyclic }
tasks:
  a:
    name: task a
    prompt: "do a"
    type: coding
    depends_on: [b]
  b:
    name: task b
    prompt: "do b"
    type: coding
    depends_on: [a]
"#;

/// A graph referencing a task id that was never declared.
pub const DANGLING_DEP_GRAPH: &str = r#"
version: "1"
session: { name: dangling }
tasks:
  a:
    name: task a
    prompt: "do a"
    type: coding
    depends_on: [missing]
"#;

/// A two-task graph referencing an unregistered agent id (a warning, not an error).
pub const UNKNOWN_AGENT_GRAPH: &str = r#"
version: "1"
session: { name: unknown-agent }
tasks:
  a:
    name: task a
    prompt: "do a"
    type: coding
    agent: not-a-real-adapter
    depends_on: []
"#;
