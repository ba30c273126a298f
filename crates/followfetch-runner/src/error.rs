//! Error types for runner module

use thiserror::Error;

/// Process-level failures while running a worker.
///
/// A non-zero exit is *not* an error at this layer; it is reported through
/// [`ProcessOutput::exit_code`](crate::ProcessOutput::exit_code).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunnerError {
    #[error("Failed to spawn process '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("Process I/O failed: {reason}")]
    Io { reason: String },

    #[error("Execution timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
}

impl RunnerError {
    /// True when the process was terminated because it exceeded its deadline.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
