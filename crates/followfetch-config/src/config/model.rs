use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

use followfetch_utils::logging::LogFormat;

/// Default per-invocation timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Default worker stdout capture cap (4 MiB)
pub const DEFAULT_STDOUT_CAP_BYTES: usize = 4 * 1024 * 1024;
/// Default worker stderr capture cap (64 KiB)
pub const DEFAULT_STDERR_CAP_BYTES: usize = 64 * 1024;
/// Characters of raw worker output kept in malformed-output errors
pub const DEFAULT_ERROR_EXCERPT_CHARS: usize = 500;
pub const DEFAULT_SCRIPTS_DIR: &str = "scripts";
pub const DEFAULT_PYTHON: &str = "python3";
pub const DEFAULT_NODE: &str = "node";

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Command-line flag (highest precedence)
    Cli,
    /// `FOLLOWFETCH_*` environment variable
    Env,
    /// Configuration file
    Config,
    /// Built-in default (lowest precedence)
    Default,
}

impl ConfigSource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Env => "env",
            Self::Config => "config",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for followfetch.
///
/// Use [`Config::discover()`] for CLI behavior: searches for
/// `.followfetch/config.toml` upward from the current directory, falls back to
/// `$FOLLOWFETCH_HOME/config.toml`, then applies environment and CLI overrides.
///
/// # Configuration File Format
///
/// ```toml
/// [defaults]
/// timeout_secs = 120
/// log_format = "compact"
///
/// [workers]
/// scripts_dir = "scripts"
/// python = "python3"
/// node = "node"
///
/// [methods.method6]
/// enabled = false
///
/// [selection]
/// auto_order = ["method2", "method4"]
/// ```
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub defaults: Defaults,
    pub workers: WorkersConfig,
    /// Per-method overrides keyed by method id.
    pub methods: BTreeMap<String, MethodOverride>,
    pub selection: SelectionConfig,
    /// Credentials resolved from CLI flags or environment. Never read from file.
    pub credentials: CredentialSettings,
    /// The configuration file that was loaded, if any.
    pub config_path: Option<PathBuf>,
    /// Source attribution for each setting (for `followfetch config`).
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// `[defaults]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    pub timeout_secs: Option<u64>,
    pub stdout_cap_bytes: Option<usize>,
    pub stderr_cap_bytes: Option<usize>,
    pub error_excerpt_chars: Option<usize>,
    pub verbose: Option<bool>,
    pub log_format: Option<LogFormat>,
}

/// `[workers]` section: where worker scripts live and which interpreters run them
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct WorkersConfig {
    pub scripts_dir: Option<PathBuf>,
    pub python: Option<String>,
    pub node: Option<String>,
}

/// `[methods.<id>]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MethodOverride {
    pub enabled: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub script: Option<PathBuf>,
}

/// `[selection]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SelectionConfig {
    /// Replaces the built-in Auto priority order when set.
    pub auto_order: Option<Vec<String>>,
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialSettings {
    pub session_token: Option<String>,
    pub api_key: Option<String>,
}

impl fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSettings")
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}
