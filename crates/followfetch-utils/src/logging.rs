//! Logging and observability infrastructure for followfetch
//!
//! Structured logging goes to stderr through `tracing`; stdout is reserved for
//! command results. Callers pass already-redacted text to the `log_*` helpers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{Level, info, span, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line output
    #[default]
    Compact,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected compact or json)")),
        }
    }
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise verbose mode enables debug output for
/// followfetch crates, including worker stderr.
pub fn init_tracing(verbose: bool, format: LogFormat) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("followfetch=debug,followfetch_engine=debug,info")
            } else {
                EnvFilter::try_new("followfetch=info,followfetch_engine=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tfmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tfmt::layer()
                        .with_target(verbose)
                        .with_thread_ids(false)
                        .with_thread_names(false)
                        .with_line_number(false)
                        .with_file(false)
                        .with_writer(std::io::stderr)
                        .compact(),
                )
                .try_init()?;
        }
    }

    Ok(())
}

/// Span covering one scrape request from selection to outcome.
pub fn request_span(target: &str, mode: &str) -> tracing::Span {
    span!(Level::INFO, "scrape_request", target = %target, mode = %mode)
}

/// Span covering one method attempt.
pub fn attempt_span(method_id: &str, attempt: usize) -> tracing::Span {
    span!(Level::INFO, "method_attempt", method_id = %method_id, attempt = attempt)
}

pub fn log_attempt_start(method_id: &str, display_name: &str) {
    info!(method_id = %method_id, "Attempting {display_name}");
}

pub fn log_attempt_success(method_id: &str, followers: usize, duration_ms: u64) {
    info!(
        method_id = %method_id,
        followers = followers,
        duration_ms = duration_ms,
        "Method succeeded"
    );
}

/// `error` must already be redacted.
pub fn log_attempt_failure(method_id: &str, error: &str, duration_ms: u64) {
    warn!(
        method_id = %method_id,
        duration_ms = duration_ms,
        error = %error,
        "Method failed"
    );
}
