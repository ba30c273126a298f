use std::path::PathBuf;

use followfetch_utils::logging::LogFormat;

/// CLI overrides applied on top of environment, file, and defaults.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub scripts_dir: Option<PathBuf>,
    pub python: Option<String>,
    pub node: Option<String>,
    pub verbose: Option<bool>,
    pub log_format: Option<LogFormat>,
    pub session_token: Option<String>,
    pub api_key: Option<String>,
}
