//! Scripted process runner for orchestrator tests.
//!
//! Responses are matched by substring against the program and arguments of
//! each command, so a rule keyed `"method2"` answers for
//! `python3 scripts/method2_wrapper.py alice`. Every call is recorded.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use followfetch_runner::{CommandSpec, ProcessOutput, ProcessRunner, RunnerError};
use followfetch_utils::test_support::{failure_payload, success_payload};

/// What a scripted worker does when invoked.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Output(ProcessOutput),
    Error(RunnerError),
    /// Never completes; the caller must time out or cancel.
    Hang,
}

impl ScriptedResponse {
    /// Exit 0 with the given stdout.
    #[must_use]
    pub fn stdout(stdout: &str) -> Self {
        Self::Output(ProcessOutput::new(
            stdout.as_bytes().to_vec(),
            Vec::new(),
            Some(0),
        ))
    }

    /// Exit 0 with a success payload listing the given usernames.
    #[must_use]
    pub fn followers(usernames: &[&str]) -> Self {
        Self::stdout(&success_payload(usernames))
    }

    /// Exit 0 with `{"success": false, "error": ...}`.
    #[must_use]
    pub fn failure(error: &str) -> Self {
        Self::stdout(&failure_payload(error))
    }

    #[must_use]
    pub fn with_stderr(self, stderr: &str) -> Self {
        self.map_output(|mut out| {
            out.stderr = stderr.as_bytes().to_vec();
            out
        })
    }

    #[must_use]
    pub fn with_exit_code(self, code: i32) -> Self {
        self.with_exit(Some(code))
    }

    #[must_use]
    pub fn with_exit(self, code: Option<i32>) -> Self {
        self.map_output(|mut out| {
            out.exit_code = code;
            out
        })
    }

    /// Mark stdout as cut off by the capture cap.
    #[must_use]
    pub fn truncated(self) -> Self {
        self.map_output(|out| out.with_stdout_truncated(true))
    }

    fn map_output(self, f: impl FnOnce(ProcessOutput) -> ProcessOutput) -> Self {
        match self {
            Self::Output(out) => Self::Output(f(out)),
            other => other,
        }
    }
}

/// A [`ProcessRunner`] that answers from a script instead of spawning processes.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Vec<(String, ScriptedResponse)>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands mentioning `key` with `response`. Earlier rules win.
    #[must_use]
    pub fn on(mut self, key: &str, response: ScriptedResponse) -> Self {
        self.rules.push((key.to_string(), response));
        self
    }

    /// Every command received, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock poisoned").len()
    }

    /// Number of received commands mentioning `key`.
    #[must_use]
    pub fn calls_matching(&self, key: &str) -> usize {
        self.calls()
            .iter()
            .filter(|cmd| mentions(cmd, key))
            .count()
    }

    fn response_for(&self, cmd: &CommandSpec) -> Option<ScriptedResponse> {
        self.rules
            .iter()
            .find(|(key, _)| mentions(cmd, key))
            .map(|(_, response)| response.clone())
    }
}

fn mentions(cmd: &CommandSpec, key: &str) -> bool {
    std::iter::once(&cmd.program)
        .chain(cmd.args.iter())
        .any(|part| part.to_string_lossy().contains(key))
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, cmd: &CommandSpec, timeout: Duration) -> Result<ProcessOutput, RunnerError> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(cmd.clone());

        match self.response_for(cmd) {
            Some(ScriptedResponse::Output(output)) => Ok(output),
            Some(ScriptedResponse::Error(err)) => Err(err),
            Some(ScriptedResponse::Hang) => {
                tokio::time::sleep(timeout).await;
                Err(RunnerError::Timeout {
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
            None => Ok(ProcessOutput::new(
                Vec::new(),
                format!("no scripted response for {}", cmd.program_display()).into_bytes(),
                Some(127),
            )),
        }
    }
}
