//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use followfetch_utils::logging::LogFormat;

/// followfetch - follower retrieval with ordered fallback
#[derive(Parser, Debug)]
#[command(name = "followfetch")]
#[command(about = "Retrieve an account's followers, falling back across retrieval methods")]
#[command(long_about = r#"
followfetch tries each selected retrieval method in turn, stops at the first
one that returns followers, and reports every attempt.

EXAMPLES:
  # Try every applicable method in priority order
  followfetch scrape alice --session-token "$SESSION"

  # Use exactly one method
  followfetch scrape alice --method method2

  # Read a JSON request from stdin and print the outcome as JSON
  echo '{"targetAccount":"alice","selectionMode":"auto"}' | followfetch scrape --request - --json

  # List registered methods and show effective configuration
  followfetch methods
  followfetch config

CONFIGURATION:
  Precedence: CLI flags > FOLLOWFETCH_* environment > config file > defaults
  The config file is found by searching upward from CWD for .followfetch/config.toml,
  then $FOLLOWFETCH_HOME/config.toml. Use --config to name one explicitly.

EXIT CODES:
  0 followers retrieved, 2 invalid arguments or unknown method,
  3 every method failed, 130 interrupted
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging, including worker stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log line format on stderr (compact or json)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Directory containing worker scripts
    #[arg(long, global = true)]
    pub scripts_dir: Option<PathBuf>,

    /// Python interpreter for Python workers
    #[arg(long, global = true)]
    pub python: Option<String>,

    /// Node interpreter for Node workers
    #[arg(long, global = true)]
    pub node: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Retrieve followers for an account
    Scrape {
        /// Target account handle
        #[arg(required_unless_present = "request")]
        account: Option<String>,

        /// Method id to use, or "auto" for ordered fallback
        #[arg(short, long, default_value = "auto")]
        method: String,

        /// Session token for session-backed methods
        #[arg(long)]
        session_token: Option<String>,

        /// API key for vendor-backed methods
        #[arg(long)]
        api_key: Option<String>,

        /// Per-method timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Read the request as JSON from a file ("-" for stdin)
        #[arg(long, conflicts_with_all = ["account", "method"])]
        request: Option<PathBuf>,

        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// List registered retrieval methods
    Methods {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show effective configuration and where each value came from
    Config,
}
