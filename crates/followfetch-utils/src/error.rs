use std::fmt;
use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Library-level error type with user-friendly reporting.
///
/// Only *precondition* failures surface as `FollowfetchError`: bad configuration,
/// a malformed request, or a selection that names an unknown method. Failures of
/// individual retrieval methods are never errors at this level; they are recorded
/// in the attempt log of a normal outcome value.
///
/// # Exit Code Mapping
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration, request, and selection errors |
/// | 1 | Other errors |
#[derive(Error, Debug)]
pub enum FollowfetchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Method selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("Invalid request: {0}")]
    Request(#[from] RequestError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Request,
    FileSystem,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Request => write!(f, "Request"),
            Self::FileSystem => write!(f, "File System"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },

    #[error("Configuration discovery failed: {reason}")]
    DiscoveryFailed { reason: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => format!("Configuration file not found: {path}"),
            Self::DiscoveryFailed { reason } => {
                format!("Failed to discover configuration: {reason}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with optional [defaults], [workers], [selection] and [methods.<id>] sections."
                    .to_string(),
            ),
            Self::InvalidValue { key, .. } => Some(format!(
                "The '{key}' configuration option has specific format requirements."
            )),
            Self::NotFound { .. } | Self::DiscoveryFailed { .. } => Some(
                "followfetch searches for .followfetch/config.toml starting from the current directory upward."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax using a TOML validator".to_string(),
                "Run 'followfetch config' to see the effective configuration".to_string(),
            ],
            Self::InvalidValue { key, .. } => match key.as_str() {
                "timeout_secs" => vec!["Use a whole number of seconds between 1 and 3600".to_string()],
                "stdout_cap_bytes" | "stderr_cap_bytes" => {
                    vec!["Use a byte count of at least 1024".to_string()]
                }
                "auto_order" => vec![
                    "List only registered method ids in [selection].auto_order".to_string(),
                    "Run 'followfetch methods' to see registered ids".to_string(),
                ],
                _ => vec![
                    "Remove the option to use the default value".to_string(),
                ],
            },
            Self::NotFound { .. } => vec![
                "Check the path passed to --config".to_string(),
                "Omit --config to use discovery and defaults".to_string(),
            ],
            Self::DiscoveryFailed { .. } => vec![
                "Check directory permissions".to_string(),
                "Use --config <path> to specify the configuration file explicitly".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Failures while turning a request into an ordered method list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Unknown method '{id}' (registered: {})", .known.join(", "))]
    UnknownMethod { id: String, known: Vec<String> },

    #[error("Method id '{id}' is registered more than once")]
    DuplicateMethod { id: String },
}

impl UserFriendlyError for SelectionError {
    fn user_message(&self) -> String {
        match self {
            Self::UnknownMethod { id, .. } => format!("No retrieval method is registered as '{id}'"),
            Self::DuplicateMethod { id } => format!("Retrieval method '{id}' is registered twice"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::UnknownMethod { known, .. } => {
                Some(format!("Registered methods: {}", known.join(", ")))
            }
            Self::DuplicateMethod { .. } => {
                Some("Method ids must be unique across the registry.".to_string())
            }
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::UnknownMethod { .. } => vec![
                "Use --method auto to try every applicable method".to_string(),
                "Run 'followfetch methods' to list method ids".to_string(),
            ],
            Self::DuplicateMethod { .. } => {
                vec!["Rename or remove the duplicate registration".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Malformed inbound requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("target account is required")]
    EmptyTarget,

    #[error("request payload is not valid: {0}")]
    InvalidPayload(String),
}

impl UserFriendlyError for RequestError {
    fn user_message(&self) -> String {
        match self {
            Self::EmptyTarget => "A target account handle is required".to_string(),
            Self::InvalidPayload(reason) => format!("The request could not be read: {reason}"),
        }
    }

    fn context(&self) -> Option<String> {
        Some(
            "Requests look like {\"targetAccount\": \"alice\", \"selectionMode\": \"auto\", \"credentials\": {}}."
                .to_string(),
        )
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::EmptyTarget => vec!["Pass the account handle: followfetch scrape <account>".to_string()],
            Self::InvalidPayload(_) => vec![
                "Check the JSON syntax of the request file".to_string(),
                "selectionMode must be \"auto\" or a method id".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Request
    }
}

impl UserFriendlyError for FollowfetchError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(e) => e.user_message(),
            Self::Selection(e) => e.user_message(),
            Self::Request(e) => e.user_message(),
            Self::Io(e) => format!("File operation failed: {e}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(e) => e.context(),
            Self::Selection(e) => e.context(),
            Self::Request(e) => e.context(),
            Self::Io(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(e) => e.suggestions(),
            Self::Selection(e) => e.suggestions(),
            Self::Request(e) => e.suggestions(),
            Self::Io(_) => vec!["Check that the file exists and is readable".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(e) => e.category(),
            Self::Selection(e) => e.category(),
            Self::Request(e) => e.category(),
            Self::Io(_) => ErrorCategory::FileSystem,
        }
    }
}

impl FollowfetchError {
    /// Get a user-facing message with context and suggestions.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = format!("Error: {}\n", self.user_message());

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {ctx}\n"));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }

    /// Map this error to the CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) | Self::Selection(_) | Self::Request(_) => ExitCode::CLI_ARGS,
            Self::Io(_) => ExitCode::INTERNAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_method_lists_known_ids() {
        let err = SelectionError::UnknownMethod {
            id: "method9".to_string(),
            known: vec!["method2".to_string(), "method5".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Unknown method 'method9' (registered: method2, method5)"
        );
    }

    #[test]
    fn test_precondition_errors_map_to_cli_args() {
        let errors: Vec<FollowfetchError> = vec![
            ConfigError::InvalidFile("bad".to_string()).into(),
            SelectionError::DuplicateMethod {
                id: "method2".to_string(),
            }
            .into(),
            RequestError::EmptyTarget.into(),
        ];
        for err in errors {
            assert_eq!(err.to_exit_code(), ExitCode::CLI_ARGS, "{err}");
        }
    }

    #[test]
    fn test_display_for_user_includes_suggestions() {
        let err = FollowfetchError::from(SelectionError::UnknownMethod {
            id: "nope".to_string(),
            known: vec!["method2".to_string()],
        });
        let message = err.display_for_user();
        assert!(message.starts_with("Error: No retrieval method is registered as 'nope'"));
        assert!(message.contains("Context: Registered methods: method2"));
        assert!(message.contains("Suggestions:"));
        assert!(message.contains("--method auto"));
    }

    #[test]
    fn test_io_error_category() {
        let err = FollowfetchError::from(std::io::Error::other("disk gone"));
        assert_eq!(err.category(), ErrorCategory::FileSystem);
        assert_eq!(err.to_exit_code(), ExitCode::INTERNAL);
    }
}
