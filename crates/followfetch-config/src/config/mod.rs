//! Configuration management for followfetch
//!
//! Supports TOML configuration files with `[defaults]`, `[workers]`,
//! `[selection]` and `[methods.<id>]` sections.

mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

pub use cli_args::CliArgs;
pub use model::*;

use std::path::PathBuf;
use std::time::Duration;

impl Config {
    /// Per-invocation timeout for a method.
    ///
    /// A global timeout given on the command line or in the environment wins;
    /// otherwise `[methods.<id>].timeout_secs` applies, else the global value.
    #[must_use]
    pub fn method_timeout(&self, method_id: &str) -> Duration {
        let global_overridden = matches!(
            self.source_attribution.get("timeout_secs"),
            Some(ConfigSource::Cli | ConfigSource::Env)
        );
        let per_method = if global_overridden {
            None
        } else {
            self.methods.get(method_id).and_then(|m| m.timeout_secs)
        };
        Duration::from_secs(per_method.unwrap_or_else(|| self.timeout_secs()))
    }

    /// Whether a method is enabled. Methods without an override are enabled.
    #[must_use]
    pub fn method_enabled(&self, method_id: &str) -> bool {
        self.methods
            .get(method_id)
            .and_then(|m| m.enabled)
            .unwrap_or(true)
    }

    /// Resolve a worker script path.
    ///
    /// An explicit `[methods.<id>].script` is used as given; otherwise the
    /// default script name is joined onto `scripts_dir`.
    #[must_use]
    pub fn script_path(&self, method_id: &str, default_script: &str) -> PathBuf {
        if let Some(script) = self.methods.get(method_id).and_then(|m| m.script.clone()) {
            return script;
        }
        self.scripts_dir().join(default_script)
    }

    #[must_use]
    pub fn timeout_secs(&self) -> u64 {
        self.defaults.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    #[must_use]
    pub fn stdout_cap_bytes(&self) -> usize {
        self.defaults
            .stdout_cap_bytes
            .unwrap_or(DEFAULT_STDOUT_CAP_BYTES)
    }

    #[must_use]
    pub fn stderr_cap_bytes(&self) -> usize {
        self.defaults
            .stderr_cap_bytes
            .unwrap_or(DEFAULT_STDERR_CAP_BYTES)
    }

    #[must_use]
    pub fn error_excerpt_chars(&self) -> usize {
        self.defaults
            .error_excerpt_chars
            .unwrap_or(DEFAULT_ERROR_EXCERPT_CHARS)
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.defaults.verbose.unwrap_or(false)
    }

    #[must_use]
    pub fn log_format(&self) -> followfetch_utils::logging::LogFormat {
        self.defaults.log_format.unwrap_or_default()
    }

    #[must_use]
    pub fn scripts_dir(&self) -> PathBuf {
        self.workers
            .scripts_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRIPTS_DIR))
    }

    #[must_use]
    pub fn python(&self) -> &str {
        self.workers.python.as_deref().unwrap_or(DEFAULT_PYTHON)
    }

    #[must_use]
    pub fn node(&self) -> &str {
        self.workers.node.as_deref().unwrap_or(DEFAULT_NODE)
    }
}
