use crate::error::RunnerError;
use async_trait::async_trait;
use std::time::Duration;

use super::CommandSpec;

// ============================================================================
// ProcessRunner Trait - worker execution seam
// ============================================================================

/// Output from a completed worker process.
///
/// Streams are captured whole (up to the configured caps) after the process
/// exits; nothing is streamed incrementally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Standard output from the process
    pub stdout: Vec<u8>,
    /// Standard error from the process
    pub stderr: Vec<u8>,
    /// Exit code from the process (None if terminated by signal)
    pub exit_code: Option<i32>,
    /// Whether stdout exceeded its capture cap and lost bytes
    pub stdout_truncated: bool,
}

impl ProcessOutput {
    /// Create a new `ProcessOutput` with the given values.
    #[must_use]
    pub fn new(stdout: Vec<u8>, stderr: Vec<u8>, exit_code: Option<i32>) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
            stdout_truncated: false,
        }
    }

    /// Mark stdout as truncated by the capture cap.
    #[must_use]
    pub fn with_stdout_truncated(mut self, truncated: bool) -> Self {
        self.stdout_truncated = truncated;
        self
    }

    /// Get stdout as a UTF-8 string, lossy conversion.
    #[must_use]
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a UTF-8 string, lossy conversion.
    #[must_use]
    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// Check if the process exited successfully (exit code 0).
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Trait for worker process execution.
///
/// Implementations MUST use argv-style APIs only (no shell string evaluation).
///
/// # Cancellation
///
/// Dropping the returned future before it resolves MUST terminate the child
/// process. Callers rely on this to abandon an in-flight attempt.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use followfetch_runner::{CommandSpec, ProcessOutput, ProcessRunner, RunnerError};
/// use std::time::Duration;
///
/// struct CannedRunner;
///
/// #[async_trait]
/// impl ProcessRunner for CannedRunner {
///     async fn run(&self, _cmd: &CommandSpec, _timeout: Duration) -> Result<ProcessOutput, RunnerError> {
///         Ok(ProcessOutput::new(br#"{"success":true,"followers":[]}"#.to_vec(), Vec::new(), Some(0)))
///     }
/// }
/// ```
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Execute a command with the given timeout.
    ///
    /// # Returns
    ///
    /// * `Ok(ProcessOutput)` - The process completed (possibly with non-zero exit code)
    /// * `Err(RunnerError::Timeout)` - The process timed out and was terminated
    /// * `Err(RunnerError::SpawnFailed)` - The process could not be started
    async fn run(&self, cmd: &CommandSpec, timeout: Duration) -> Result<ProcessOutput, RunnerError>;
}
