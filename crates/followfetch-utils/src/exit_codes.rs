//! Exit code constants for followfetch.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | A method returned followers |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments, configuration, or unknown method |
//! | 3 | `ALL_METHODS_FAILED` | Every selected method failed |
//! | 130 | `CANCELLED` | The request was cancelled (Ctrl-C) before finishing |

/// Type-safe process exit code.
///
/// ```rust
/// use followfetch_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::ALL_METHODS_FAILED.as_i32(), 3);
/// assert_eq!(ExitCode::from_i32(0), ExitCode::SUCCESS);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - a method returned followers
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments, configuration, or method id
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Every selected method was attempted and failed
    pub const ALL_METHODS_FAILED: ExitCode = ExitCode(3);

    /// Interrupted before the fallback sequence finished (128 + SIGINT)
    pub const CANCELLED: ExitCode = ExitCode(130);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values_are_stable() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::INTERNAL.as_i32(), 1);
        assert_eq!(ExitCode::CLI_ARGS.as_i32(), 2);
        assert_eq!(ExitCode::ALL_METHODS_FAILED.as_i32(), 3);
        assert_eq!(ExitCode::CANCELLED.as_i32(), 130);
        assert_eq!(i32::from(ExitCode::CLI_ARGS), 2);
    }
}
