//! Worker contract enforcement
//!
//! The runner crate runs the process; this module decides what the run means.
//! A worker must exit 0 and print exactly one JSON object with a boolean
//! `success` field on stdout. stderr is diagnostic only.

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

use followfetch_config::DEFAULT_ERROR_EXCERPT_CHARS;
use followfetch_runner::{CommandSpec, ProcessOutput, ProcessRunner, RunnerError};

/// Result of one worker invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationOutcome {
    /// Exit 0 with a contract-shaped JSON object on stdout
    Completed {
        payload: Map<String, Value>,
        stderr: String,
    },
    /// Spawn failure, non-zero exit, timeout, or malformed output
    Failed { error: String },
}

impl InvocationOutcome {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }
}

/// Runs worker commands and applies the worker contract to what they print.
#[derive(Clone)]
pub struct ProcessInvoker {
    runner: Arc<dyn ProcessRunner>,
    excerpt_chars: usize,
}

impl std::fmt::Debug for ProcessInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessInvoker")
            .field("excerpt_chars", &self.excerpt_chars)
            .finish_non_exhaustive()
    }
}

impl ProcessInvoker {
    #[must_use]
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            excerpt_chars: DEFAULT_ERROR_EXCERPT_CHARS,
        }
    }

    /// Limit on raw worker text quoted in error messages.
    #[must_use]
    pub fn with_excerpt_chars(mut self, excerpt_chars: usize) -> Self {
        self.excerpt_chars = excerpt_chars.max(1);
        self
    }

    /// Run one worker to completion (or timeout) and classify the result.
    ///
    /// Dropping the returned future kills the worker.
    pub async fn invoke(&self, cmd: &CommandSpec, timeout: Duration) -> InvocationOutcome {
        match self.runner.run(cmd, timeout).await {
            Ok(output) => self.classify(&output),
            Err(RunnerError::Timeout { .. }) => InvocationOutcome::failed("timeout"),
            Err(RunnerError::SpawnFailed { program, reason }) => InvocationOutcome::failed(
                format!("execution failed: could not start '{program}': {reason}"),
            ),
            Err(RunnerError::Io { reason }) => {
                InvocationOutcome::failed(format!("execution failed: {reason}"))
            }
        }
    }

    fn classify(&self, output: &ProcessOutput) -> InvocationOutcome {
        let stdout = output.stdout_string();
        let stderr = output.stderr_string();

        if !output.success() {
            let status = match output.exit_code {
                Some(code) => format!("exit code {code}"),
                None => "terminated by signal".to_string(),
            };
            let mut diagnostic = vec![status];
            for stream in [stderr.trim(), stdout.trim()] {
                if !stream.is_empty() {
                    diagnostic.push(truncate_chars(stream, self.excerpt_chars));
                }
            }
            return InvocationOutcome::failed(format!(
                "execution failed: {}",
                diagnostic.join(": ")
            ));
        }

        let trimmed = stdout.trim();
        if output.stdout_truncated {
            return self.malformed(trimmed);
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(payload)) if payload.get("success").is_some_and(Value::is_boolean) => {
                InvocationOutcome::Completed { payload, stderr }
            }
            _ => self.malformed(trimmed),
        }
    }

    fn malformed(&self, stdout: &str) -> InvocationOutcome {
        let excerpt = if stdout.is_empty() {
            "(empty stdout)".to_string()
        } else {
            truncate_chars(stdout, self.excerpt_chars)
        };
        InvocationOutcome::failed(format!("malformed worker output: {excerpt}"))
    }
}

/// Truncate to at most `max` characters, marking the cut with `...`.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedResponse, ScriptedRunner};
    use proptest::prelude::*;

    async fn invoke_with(response: ScriptedResponse) -> InvocationOutcome {
        let runner = Arc::new(ScriptedRunner::new().on("worker", response));
        ProcessInvoker::new(runner)
            .with_excerpt_chars(20)
            .invoke(&CommandSpec::new("worker"), Duration::from_secs(1))
            .await
    }

    #[tokio::test]
    async fn test_contract_shaped_stdout_completes() {
        let outcome = invoke_with(ScriptedResponse::stdout(
            "  {\"success\":true,\"followers\":[]}\n",
        ))
        .await;
        match outcome {
            InvocationOutcome::Completed { payload, .. } => {
                assert_eq!(payload["success"], Value::Bool(true));
            }
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stderr_is_not_fatal() {
        let outcome = invoke_with(
            ScriptedResponse::stdout(r#"{"success":false,"error":"private account"}"#)
                .with_stderr("Loaded session from file"),
        )
        .await;
        match outcome {
            InvocationOutcome::Completed { payload, stderr } => {
                assert_eq!(payload["error"], Value::from("private account"));
                assert_eq!(stderr, "Loaded session from file");
            }
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_not_json_is_malformed() {
        let outcome = invoke_with(ScriptedResponse::stdout("Not JSON")).await;
        assert_eq!(
            outcome,
            InvocationOutcome::Failed {
                error: "malformed worker output: Not JSON".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_trailing_content_is_malformed() {
        let outcome = invoke_with(ScriptedResponse::stdout(
            "{\"success\":true,\"followers\":[]}\n{\"success\":true}",
        ))
        .await;
        assert!(matches!(
            outcome,
            InvocationOutcome::Failed { ref error } if error.starts_with("malformed worker output: ")
        ));
    }

    #[tokio::test]
    async fn test_missing_success_flag_is_malformed() {
        for stdout in [r#"{"followers":[]}"#, r#"{"success":"yes"}"#, "[1,2]", ""] {
            let outcome = invoke_with(ScriptedResponse::stdout(stdout)).await;
            assert!(!outcome.is_ok(), "accepted {stdout:?}");
        }
        assert_eq!(
            invoke_with(ScriptedResponse::stdout("   ")).await,
            InvocationOutcome::Failed {
                error: "malformed worker output: (empty stdout)".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_long_malformed_output_is_truncated() {
        let outcome = invoke_with(ScriptedResponse::stdout(&"x".repeat(100))).await;
        assert_eq!(
            outcome,
            InvocationOutcome::Failed {
                error: format!("malformed worker output: {}...", "x".repeat(20))
            }
        );
    }

    #[tokio::test]
    async fn test_truncated_stdout_is_malformed() {
        let outcome = invoke_with(
            ScriptedResponse::stdout(r#"{"success":true,"followers":[]}"#).truncated(),
        )
        .await;
        assert!(!outcome.is_ok());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_execution_failure_even_with_json() {
        let outcome = invoke_with(
            ScriptedResponse::stdout(r#"{"success":true,"followers":[]}"#)
                .with_stderr("Traceback")
                .with_exit_code(1),
        )
        .await;
        assert_eq!(
            outcome,
            InvocationOutcome::Failed {
                error: "execution failed: exit code 1: Traceback: {\"success\":true,\"fol..."
                    .to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_signal_exit() {
        let outcome = invoke_with(ScriptedResponse::stdout("").with_exit(None)).await;
        assert_eq!(
            outcome,
            InvocationOutcome::Failed {
                error: "execution failed: terminated by signal".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_runner_errors_map_to_failures() {
        let timeout = invoke_with(ScriptedResponse::Error(RunnerError::Timeout {
            timeout_ms: 1000,
        }))
        .await;
        assert_eq!(
            timeout,
            InvocationOutcome::Failed {
                error: "timeout".to_string()
            }
        );

        let spawn = invoke_with(ScriptedResponse::Error(RunnerError::SpawnFailed {
            program: "python3".to_string(),
            reason: "No such file or directory".to_string(),
        }))
        .await;
        assert_eq!(
            spawn,
            InvocationOutcome::Failed {
                error: "execution failed: could not start 'python3': No such file or directory"
                    .to_string()
            }
        );
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé...");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    proptest! {
        #[test]
        fn prop_truncate_chars_bounded(text in ".{0,200}", max in 1usize..64) {
            let out = truncate_chars(&text, max);
            prop_assert!(out.chars().count() <= max + 3);
            if text.chars().count() <= max {
                prop_assert_eq!(out, text);
            } else {
                prop_assert!(out.ends_with("..."));
            }
        }
    }
}
