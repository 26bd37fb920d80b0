/// Execution Strategy - Abstraction for Running Submitted Code
///
/// **Core Responsibility:**
/// Run untrusted submission code against one test input and capture its
/// output as a JSON value.
///
/// **Critical Architectural Boundary:**
/// - Strategy knows HOW to execute (subprocess, container, VM, etc.)
/// - Strategy does NOT know comparison or scoring rules
/// - Strategy returns one output (or one error) per invocation
///
/// **Why This Exists:**
/// The grader must never embed an execution mechanism inline. Swapping the
/// shipped subprocess runner for a sandboxed backend must not touch grading
/// logic.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// A single failed execution. Always contained in the owning TestResult,
/// never propagated past the grader.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to run submission: {0}")]
    Io(#[from] std::io::Error),

    #[error("execution timed out after {0}ms")]
    Timeout(u64),

    #[error("runner exited with status {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("runner produced non-JSON output: {0}")]
    InvalidOutput(String),
}

/// Pluggable execution backend.
///
/// `input` is the test case's opaque input text, handed to the submission
/// unmodified; the return value is the submission's output parsed as JSON.
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    async fn execute(&self, code: &str, input: &str) -> Result<Value, ExecutionError>;
}

/// Interpreter settings for [`CommandStrategy`], loaded from a JSON file.
///
/// The configured command receives the staged code file as its final
/// argument and the test input on stdin, and must print the submission's
/// output as JSON on stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub file_extension: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: "node".to_string(),
            args: Vec::new(),
            file_extension: "js".to_string(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl RunnerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read runner config: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse runner config: {}", path.display()))
    }
}

/// Subprocess-based execution strategy.
///
/// Stages the submission code in a temp file, spawns the configured
/// interpreter, pipes the input on stdin, and enforces the per-test
/// timeout. A timed-out or crashed run is an [`ExecutionError`] for that
/// test case only - the process is killed and the grader moves on.
pub struct CommandStrategy {
    config: RunnerConfig,
}

impl CommandStrategy {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ExecutionStrategy for CommandStrategy {
    async fn execute(&self, code: &str, input: &str) -> Result<Value, ExecutionError> {
        let dir = tempfile::tempdir()?;
        let code_path = dir
            .path()
            .join(format!("submission.{}", self.config.file_extension));
        tokio::fs::write(&code_path, code).await?;

        debug!(
            command = %self.config.command,
            timeout_ms = self.config.timeout_ms,
            "Executing submission"
        );

        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .arg(&code_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // The stdin handoff must sit inside the timed region: a child that
        // never reads its input leaves the write blocked once the pipe
        // buffer fills, which would otherwise stall the drain loop forever.
        let stdin = child.stdin.take();
        let feed_input = async {
            if let Some(mut stdin) = stdin {
                // A child that exits without consuming stdin surfaces
                // through its exit status, not through this write.
                let _ = stdin.write_all(input.as_bytes()).await;
                // Dropping stdin closes the pipe so the runner sees EOF.
            }
        };

        let timeout = Duration::from_millis(self.config.timeout_ms);
        let interaction = async {
            let (_, output) = tokio::join!(feed_input, child.wait_with_output());
            output
        };
        let output = match tokio::time::timeout(timeout, interaction).await {
            Ok(result) => result?,
            // kill_on_drop reaps the abandoned child.
            Err(_) => return Err(ExecutionError::Timeout(self.config.timeout_ms)),
        };

        if !output.status.success() {
            return Err(ExecutionError::Failed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(stdout.trim())
            .map_err(|_| ExecutionError::InvalidOutput(stdout.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shell(script: &str, timeout_ms: u64) -> CommandStrategy {
        // `sh -c <script> runner <file>`: the staged code file lands in $1.
        CommandStrategy::new(RunnerConfig {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "runner".to_string()],
            file_extension: "txt".to_string(),
            timeout_ms,
        })
    }

    #[tokio::test]
    async fn test_runs_command_and_parses_json() {
        let strategy = shell("cat >/dev/null; echo '[1, 2]'", 5000);
        let output = strategy.execute("ignored", "input").await.unwrap();
        assert_eq!(output, json!([1, 2]));
    }

    #[tokio::test]
    async fn test_code_file_and_stdin_reach_runner() {
        // Echo the staged code and the stdin input back as a JSON array.
        let strategy = shell(r#"printf '["%s","%s"]' "$(cat "$1")" "$(cat)""#, 5000);
        let output = strategy.execute("the-code", "the-input").await.unwrap();
        assert_eq!(output, json!(["the-code", "the-input"]));
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr() {
        let strategy = shell("cat >/dev/null; echo boom >&2; exit 3", 5000);
        let err = strategy.execute("", "").await.unwrap_err();
        match err {
            ExecutionError::Failed { code, stderr } => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_output_rejected() {
        let strategy = shell("cat >/dev/null; echo 'not json at all'", 5000);
        let err = strategy.execute("", "").await.unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidOutput(_)));
    }

    #[tokio::test]
    async fn test_timeout_enforced() {
        let strategy = shell("cat >/dev/null; sleep 10", 100);
        let err = strategy.execute("", "").await.unwrap_err();
        assert!(matches!(err, ExecutionError::Timeout(100)));
    }

    #[tokio::test]
    async fn test_timeout_covers_stdin_handoff() {
        // Child that never reads stdin, with an input well past the OS
        // pipe buffer: the blocked write must not outlive the timeout.
        let strategy = shell("sleep 10", 200);
        let input = "x".repeat(1 << 20);

        let result = tokio::time::timeout(
            Duration::from_secs(3),
            strategy.execute("", &input),
        )
        .await
        .expect("execute must honor its configured timeout");

        assert!(matches!(result.unwrap_err(), ExecutionError::Timeout(200)));
    }

    #[test]
    fn test_config_defaults() {
        let config: RunnerConfig =
            serde_json::from_str(r#"{"command": "deno", "file_extension": "ts"}"#).unwrap();
        assert_eq!(config.command, "deno");
        assert!(config.args.is_empty());
        assert_eq!(config.timeout_ms, 5000);
    }
}
