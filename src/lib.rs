//! followfetch - follower retrieval with ordered fallback across methods
//!
//! Retrieving a follower list is unreliable: every approach (an authenticated
//! session, an anonymous scraper, a paid vendor API) fails under some
//! condition. followfetch registers each approach as a *method* backed by an
//! external worker process, tries the selected methods one at a time, stops at
//! the first success, and returns a uniform result with a full attempt log.
//!
//! followfetch can be used in two ways:
//! - **CLI**: `followfetch scrape <account>`
//! - **Library**: build a [`FallbackOrchestrator`] and call
//!   [`FallbackOrchestrator::run`]
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! # Try every applicable method in priority order
//! followfetch scrape alice --session-token "$SESSION"
//!
//! # Force one method and print the outcome as JSON
//! followfetch scrape alice --method method2 --json
//!
//! # List registered methods
//! followfetch methods
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use followfetch::{CliArgs, Config, Credentials, FallbackOrchestrator, ScrapeRequest, SelectionMode};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::discover(&CliArgs::default())?;
//! let orchestrator = FallbackOrchestrator::from_config(&config)?;
//!
//! let request = ScrapeRequest::new("alice", SelectionMode::Auto, Credentials::new())?;
//! let outcome = orchestrator.run(&request).await;
//!
//! if outcome.success {
//!     println!("{} followers via {:?}", outcome.followers.len(), outcome.method_used);
//! } else {
//!     eprintln!("{:?}", outcome.error_summary);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Worker Contract
//!
//! A worker receives positional arguments (target first, then credentials in
//! the method's declared order), exits 0, and prints exactly one JSON object
//! with a boolean `success` field to stdout. Anything else is a failed attempt.

// ============================================================================
// Stable Public API
// ============================================================================

pub use followfetch_config::{CliArgs, Config, ConfigSource};
pub use followfetch_engine::{
    AttemptRecord, AttemptStatus, CredentialKind, Credentials, FallbackOrchestrator,
    FollowerRecord, MethodDescriptor, MethodRegistry, OutcomeState, ScrapeOutcome, ScrapeRequest,
    SelectionMode,
};
pub use followfetch_utils::error::{
    ConfigError, FollowfetchError, RequestError, SelectionError, UserFriendlyError,
};
pub use followfetch_utils::exit_codes::ExitCode;

// ============================================================================
// Internal Modules
// ============================================================================

#[doc(hidden)]
pub mod cli;

/// Exit code for a finished outcome.
///
/// ```rust
/// use followfetch::{ExitCode, ScrapeOutcome, exit_code_for};
///
/// let outcome = ScrapeOutcome::cancelled(Vec::new());
/// assert_eq!(exit_code_for(&outcome), ExitCode::CANCELLED);
/// ```
#[must_use]
pub fn exit_code_for(outcome: &ScrapeOutcome) -> ExitCode {
    match outcome.state {
        OutcomeState::Succeeded => ExitCode::SUCCESS,
        OutcomeState::Exhausted => ExitCode::ALL_METHODS_FAILED,
        OutcomeState::Cancelled => ExitCode::CANCELLED,
        OutcomeState::Rejected => ExitCode::CLI_ARGS,
    }
}
