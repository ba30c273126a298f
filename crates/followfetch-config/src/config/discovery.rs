use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use followfetch_utils::error::{ConfigError, FollowfetchError};

use super::{
    CliArgs, Config, ConfigSource, CredentialSettings, Defaults, MethodOverride, SelectionConfig,
    WorkersConfig,
};

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
struct TomlConfig {
    defaults: Option<Defaults>,
    workers: Option<WorkersConfig>,
    methods: Option<BTreeMap<String, MethodOverride>>,
    selection: Option<SelectionConfig>,
}

/// Keys reported by `effective_config()` that start out as built-in defaults.
const DEFAULTED_KEYS: &[&str] = &[
    "timeout_secs",
    "stdout_cap_bytes",
    "stderr_cap_bytes",
    "error_excerpt_chars",
    "verbose",
    "log_format",
    "scripts_dir",
    "python",
    "node",
    "auto_order",
];

impl Config {
    /// Discover and load configuration with precedence: CLI > env > file > defaults
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = std::env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover configuration starting from a specific directory, reading the process environment.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        Self::discover_with_env(start_dir, cli_args, |key| std::env::var(key).ok())
    }

    /// Path-driven, environment-injected variant of [`Config::discover_from`].
    ///
    /// Empty environment values are treated as unset.
    pub fn discover_with_env<F>(start_dir: &Path, cli_args: &CliArgs, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|v| !v.is_empty());
        let mut source_attribution: HashMap<String, ConfigSource> = DEFAULTED_KEYS
            .iter()
            .map(|key| ((*key).to_string(), ConfigSource::Default))
            .collect();

        let mut config = Config::default();

        // Explicit path > project discovery > $FOLLOWFETCH_HOME
        let config_path = if let Some(explicit_path) = &cli_args.config_path {
            if !explicit_path.exists() {
                return Err(FollowfetchError::Config(ConfigError::NotFound {
                    path: explicit_path.display().to_string(),
                })
                .into());
            }
            Some(explicit_path.clone())
        } else if let Some(found) = Self::discover_config_file_from(start_dir)? {
            Some(found)
        } else {
            lookup("FOLLOWFETCH_HOME")
                .map(|home| PathBuf::from(home).join("config.toml"))
                .filter(|path| path.exists())
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            config.apply_file(file_config, &mut source_attribution);
        }
        config.config_path = config_path;

        config.apply_env(&lookup, &mut source_attribution)?;
        config.apply_cli(cli_args, &mut source_attribution);
        config.source_attribution = source_attribution;

        config.validate()?;

        Ok(config)
    }

    fn apply_file(&mut self, file: TomlConfig, sources: &mut HashMap<String, ConfigSource>) {
        let mut mark = |key: &str| {
            sources.insert(key.to_string(), ConfigSource::Config);
        };

        if let Some(defaults) = file.defaults {
            if defaults.timeout_secs.is_some() {
                self.defaults.timeout_secs = defaults.timeout_secs;
                mark("timeout_secs");
            }
            if defaults.stdout_cap_bytes.is_some() {
                self.defaults.stdout_cap_bytes = defaults.stdout_cap_bytes;
                mark("stdout_cap_bytes");
            }
            if defaults.stderr_cap_bytes.is_some() {
                self.defaults.stderr_cap_bytes = defaults.stderr_cap_bytes;
                mark("stderr_cap_bytes");
            }
            if defaults.error_excerpt_chars.is_some() {
                self.defaults.error_excerpt_chars = defaults.error_excerpt_chars;
                mark("error_excerpt_chars");
            }
            if defaults.verbose.is_some() {
                self.defaults.verbose = defaults.verbose;
                mark("verbose");
            }
            if defaults.log_format.is_some() {
                self.defaults.log_format = defaults.log_format;
                mark("log_format");
            }
        }

        if let Some(workers) = file.workers {
            if workers.scripts_dir.is_some() {
                self.workers.scripts_dir = workers.scripts_dir;
                mark("scripts_dir");
            }
            if workers.python.is_some() {
                self.workers.python = workers.python;
                mark("python");
            }
            if workers.node.is_some() {
                self.workers.node = workers.node;
                mark("node");
            }
        }

        if let Some(methods) = file.methods {
            for id in methods.keys() {
                mark(&format!("methods.{id}"));
            }
            self.methods = methods;
        }

        if let Some(selection) = file.selection
            && selection.auto_order.is_some()
        {
            self.selection.auto_order = selection.auto_order;
            mark("auto_order");
        }
    }

    fn apply_env(
        &mut self,
        env: &dyn Fn(&str) -> Option<String>,
        sources: &mut HashMap<String, ConfigSource>,
    ) -> Result<()> {
        if let Some(raw) = env("FOLLOWFETCH_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                FollowfetchError::Config(ConfigError::InvalidValue {
                    key: "timeout_secs".to_string(),
                    value: format!("FOLLOWFETCH_TIMEOUT_SECS='{raw}' is not a whole number"),
                })
            })?;
            self.defaults.timeout_secs = Some(secs);
            sources.insert("timeout_secs".to_string(), ConfigSource::Env);
        }
        if let Some(dir) = env("FOLLOWFETCH_SCRIPTS_DIR") {
            self.workers.scripts_dir = Some(PathBuf::from(dir));
            sources.insert("scripts_dir".to_string(), ConfigSource::Env);
        }
        if let Some(python) = env("FOLLOWFETCH_PYTHON") {
            self.workers.python = Some(python);
            sources.insert("python".to_string(), ConfigSource::Env);
        }
        if let Some(node) = env("FOLLOWFETCH_NODE") {
            self.workers.node = Some(node);
            sources.insert("node".to_string(), ConfigSource::Env);
        }

        let session_token = env("FOLLOWFETCH_SESSION_TOKEN");
        let api_key = env("FOLLOWFETCH_API_KEY").or_else(|| env("SCRAPFLY_KEY"));
        if session_token.is_some() {
            sources.insert("session_token".to_string(), ConfigSource::Env);
        }
        if api_key.is_some() {
            sources.insert("api_key".to_string(), ConfigSource::Env);
        }
        self.credentials = CredentialSettings {
            session_token,
            api_key,
        };

        Ok(())
    }

    fn apply_cli(&mut self, cli: &CliArgs, sources: &mut HashMap<String, ConfigSource>) {
        let mut mark = |key: &str| {
            sources.insert(key.to_string(), ConfigSource::Cli);
        };

        if cli.timeout_secs.is_some() {
            self.defaults.timeout_secs = cli.timeout_secs;
            mark("timeout_secs");
        }
        if cli.scripts_dir.is_some() {
            self.workers.scripts_dir = cli.scripts_dir.clone();
            mark("scripts_dir");
        }
        if cli.python.is_some() {
            self.workers.python = cli.python.clone();
            mark("python");
        }
        if cli.node.is_some() {
            self.workers.node = cli.node.clone();
            mark("node");
        }
        if cli.verbose.is_some() {
            self.defaults.verbose = cli.verbose;
            mark("verbose");
        }
        if cli.log_format.is_some() {
            self.defaults.log_format = cli.log_format;
            mark("log_format");
        }
        if let Some(token) = cli.session_token.clone().filter(|t| !t.is_empty()) {
            self.credentials.session_token = Some(token);
            mark("session_token");
        }
        if let Some(key) = cli.api_key.clone().filter(|k| !k.is_empty()) {
            self.credentials.api_key = Some(key);
            mark("api_key");
        }
    }

    /// Discover config file by searching upward from a given directory
    ///
    /// Walks up the directory tree looking for `.followfetch/config.toml`,
    /// stopping at repository root markers (.git, .hg, .svn) or filesystem root.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = start_dir.to_path_buf();

        loop {
            let config_path = current_dir.join(".followfetch").join("config.toml");
            if config_path.exists() {
                return Ok(Some(config_path));
            }

            if current_dir.join(".git").exists()
                || current_dir.join(".hg").exists()
                || current_dir.join(".svn").exists()
            {
                break;
            }

            match current_dir.parent() {
                Some(parent) => current_dir = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content).map_err(|e| {
            FollowfetchError::Config(ConfigError::InvalidFile(format!(
                "{}: {}",
                path.display(),
                e.message()
            )))
            .into()
        })
    }
}
