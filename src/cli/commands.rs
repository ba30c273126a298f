//! Command implementations for the followfetch CLI
//!
//! Each command returns the exit code it wants. Errors returned here are
//! precondition failures (bad request, bad config); method failures are part
//! of a normal outcome.

use anyhow::Result;
use serde_json::json;
use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use followfetch_engine::{
    AttemptStatus, CredentialKind, Credentials, FallbackOrchestrator, MethodDescriptor,
    MethodRegistry, OutcomeState, ScrapeOutcome, ScrapeRequest, SelectionMode,
};
use followfetch_utils::error::{FollowfetchError, RequestError};

use crate::{Config, ExitCode, exit_code_for};

const CREDENTIAL_KINDS: [CredentialKind; 2] = [CredentialKind::SessionToken, CredentialKind::ApiKey];

// ============================================================================
// scrape
// ============================================================================

/// Where the request comes from.
#[derive(Debug, Clone)]
pub enum RequestSource<'a> {
    /// Positional account plus `--method`
    Args { account: &'a str, method: &'a str },
    /// JSON request file, or stdin for `-`
    File(&'a Path),
}

pub async fn execute_scrape_command(
    source: RequestSource<'_>,
    json: bool,
    config: &Config,
) -> Result<ExitCode> {
    let request = build_request(source, config)?;
    let orchestrator = FallbackOrchestrator::from_config(config)?;

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling");
                cancel.cancel();
            }
        })
    };

    let outcome = orchestrator.run_with_cancel(&request, &cancel).await;
    interrupt.abort();

    info!(
        success = outcome.success,
        attempts = outcome.attempt_log.len(),
        "Request finished"
    );

    if json {
        println!("{}", outcome.to_json_pretty()?);
    } else if outcome.success {
        print!("{}", render_success(request.target_account(), &outcome));
    } else {
        eprint!("{}", render_failure(request.target_account(), &outcome));
    }

    Ok(exit_code_for(&outcome))
}

/// Build the request from arguments or a JSON document.
///
/// Credentials resolved by configuration (CLI flags, then environment) fill
/// any kind the request itself does not carry.
pub fn build_request(source: RequestSource<'_>, config: &Config) -> Result<ScrapeRequest> {
    let configured = configured_credentials(config);

    let request = match source {
        RequestSource::Args { account, method } => {
            ScrapeRequest::new(account, SelectionMode::from(method), configured)
                .map_err(FollowfetchError::from)?
        }
        RequestSource::File(path) => {
            let text = read_request_text(path)?;
            let parsed = ScrapeRequest::from_json(&text).map_err(FollowfetchError::from)?;
            let mut credentials = configured;
            for kind in CREDENTIAL_KINDS {
                if let Some(value) = parsed.credentials().get(kind) {
                    credentials = credentials.with(kind, value);
                }
            }
            ScrapeRequest::new(
                parsed.target_account(),
                parsed.selection_mode().clone(),
                credentials,
            )
            .map_err(FollowfetchError::from)?
        }
    };
    Ok(request)
}

fn configured_credentials(config: &Config) -> Credentials {
    let settings = &config.credentials;
    Credentials::new()
        .with(
            CredentialKind::SessionToken,
            settings.session_token.clone().unwrap_or_default(),
        )
        .with(
            CredentialKind::ApiKey,
            settings.api_key.clone().unwrap_or_default(),
        )
}

fn read_request_text(path: &Path) -> Result<String, FollowfetchError> {
    let unreadable = |e: std::io::Error| {
        FollowfetchError::Request(RequestError::InvalidPayload(format!(
            "cannot read {}: {e}",
            path.display()
        )))
    };

    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(unreadable)?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).map_err(unreadable)
    }
}

/// Human-readable report for a successful outcome.
pub fn render_success(target: &str, outcome: &ScrapeOutcome) -> String {
    let method = outcome.method_used.as_deref().unwrap_or("unknown method");
    let mut out = String::new();

    if outcome.followers.is_empty() {
        let _ = writeln!(out, "✓ No followers returned for {target} via {method}");
        if let Some(reason) = &outcome.empty_reason {
            let _ = writeln!(out, "  Reason: {reason}");
        }
        if let Some(info) = &outcome.worker_info {
            let _ = writeln!(out, "  Info: {info}");
        }
    } else {
        let _ = writeln!(
            out,
            "✓ {} follower(s) of {target} via {method}",
            outcome.followers.len()
        );
        let width = outcome
            .followers
            .iter()
            .map(|f| f.username.chars().count())
            .max()
            .unwrap_or(0)
            .max("USERNAME".len());
        let _ = writeln!(out);
        let _ = writeln!(out, "  {:<width$}  {:<24}  ID", "USERNAME", "FULL NAME");
        for follower in &outcome.followers {
            let _ = writeln!(
                out,
                "  {:<width$}  {:<24}  {}",
                follower.username, follower.full_name, follower.id
            );
        }
    }

    if outcome.attempt_log.len() > 1 {
        let _ = writeln!(out, "\n  Attempts:");
        render_attempts(&mut out, outcome);
    }
    out
}

/// Human-readable report for a rejected, exhausted, or cancelled outcome.
pub fn render_failure(target: &str, outcome: &ScrapeOutcome) -> String {
    let summary = outcome.error_summary.as_deref().unwrap_or("Unknown error");
    let mut out = String::new();

    match outcome.state {
        OutcomeState::Rejected => {
            let _ = writeln!(out, "✗ {summary}");
            let _ = writeln!(out, "\n  Run 'followfetch methods' to list method ids.");
        }
        OutcomeState::Cancelled => {
            let _ = writeln!(out, "✗ Cancelled: {summary}");
        }
        OutcomeState::Exhausted | OutcomeState::Succeeded => {
            let _ = writeln!(out, "✗ All methods failed for {target}");
        }
    }

    if !outcome.attempt_log.is_empty() {
        let _ = writeln!(out, "\n  Attempts:");
        render_attempts(&mut out, outcome);
    } else if outcome.state == OutcomeState::Exhausted {
        let _ = writeln!(out, "  {summary}");
    }
    out
}

fn render_attempts(out: &mut String, outcome: &ScrapeOutcome) {
    for attempt in &outcome.attempt_log {
        let status = match attempt.status {
            AttemptStatus::Success => "ok",
            AttemptStatus::Failure => "failed",
        };
        let _ = write!(
            out,
            "    {}. {} [{status}, {} ms]",
            attempt.timestamp_order + 1,
            attempt.display_name,
            attempt.duration_ms
        );
        match &attempt.error {
            Some(error) => {
                let _ = writeln!(out, ": {error}");
            }
            None => {
                let _ = writeln!(out);
            }
        }
    }
}

// ============================================================================
// methods
// ============================================================================

pub fn execute_methods_command(json: bool, config: &Config) -> Result<ExitCode> {
    let registry = MethodRegistry::builtin(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&methods_json(&registry))?);
    } else {
        print!("{}", render_methods(&registry));
    }
    Ok(ExitCode::SUCCESS)
}

fn auto_position(registry: &MethodRegistry, method: &MethodDescriptor) -> Option<usize> {
    registry
        .auto_methods()
        .position(|m| m.id == method.id)
        .map(|i| i + 1)
}

fn program_of(method: &MethodDescriptor) -> String {
    method.invocation.command_spec(&[]).program_display()
}

pub fn methods_json(registry: &MethodRegistry) -> serde_json::Value {
    let methods: Vec<_> = registry
        .methods()
        .iter()
        .map(|m| {
            json!({
                "id": m.id,
                "displayName": m.display_name,
                "program": program_of(m),
                "requiredCredentials": m.required_credentials(),
                "optionalCredentials": m.optional_credentials(),
                "timeoutSecs": m.timeout.as_secs(),
                "autoPosition": auto_position(registry, m),
                "autoRequires": m.auto_requires,
            })
        })
        .collect();
    json!({ "methods": methods })
}

pub fn render_methods(registry: &MethodRegistry) -> String {
    let mut out = String::new();
    if registry.is_empty() {
        let _ = writeln!(out, "No methods are enabled.");
        return out;
    }

    let id_width = registry
        .methods()
        .iter()
        .map(|m| m.id.len())
        .max()
        .unwrap_or(0)
        .max("ID".len());
    let name_width = registry
        .methods()
        .iter()
        .map(|m| m.display_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    let _ = writeln!(
        out,
        "{:<id_width$}  {:<name_width$}  {:<8}  {:<7}  CREDENTIALS",
        "ID", "NAME", "AUTO", "TIMEOUT"
    );
    for method in registry.methods() {
        let auto = match (auto_position(registry, method), method.auto_requires) {
            (Some(pos), Some(kind)) => format!("{pos}*{}", short_kind(kind)),
            (Some(pos), None) => pos.to_string(),
            (None, _) => "-".to_string(),
        };
        let mut credentials: Vec<String> = method
            .required_credentials()
            .into_iter()
            .map(|k| k.to_string())
            .collect();
        credentials.extend(
            method
                .optional_credentials()
                .into_iter()
                .map(|k| format!("{k}?")),
        );
        let credentials = if credentials.is_empty() {
            "-".to_string()
        } else {
            credentials.join(", ")
        };
        let _ = writeln!(
            out,
            "{:<id_width$}  {:<name_width$}  {:<8}  {:<7}  {credentials}",
            method.id,
            method.display_name,
            auto,
            format!("{}s", method.timeout.as_secs()),
        );
    }
    let _ = writeln!(
        out,
        "\n  ? optional credential; * Auto only when the credential is present"
    );
    out
}

fn short_kind(kind: CredentialKind) -> &'static str {
    match kind {
        CredentialKind::SessionToken => "session",
        CredentialKind::ApiKey => "key",
    }
}

// ============================================================================
// config
// ============================================================================

pub fn execute_config_command(config: &Config) -> Result<ExitCode> {
    match &config.config_path {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none found, using defaults)"),
    }
    println!("\nEffective configuration:");
    for (key, (value, source)) in config.effective_config() {
        println!("  {key} = {value} (from {source})");
    }
    Ok(ExitCode::SUCCESS)
}
