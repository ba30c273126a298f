//! Sequential fallback over the selected methods
//!
//! Per request: `Selecting -> Attempting(i) -> Succeeded | Exhausted`, plus
//! `Cancelled` when the caller's token fires. Attempts never overlap; the first
//! success ends the sequence.

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, warn};

use followfetch_config::Config;
use followfetch_runner::{BufferConfig, NativeRunner, ProcessRunner};
use followfetch_utils::error::FollowfetchError;
use followfetch_utils::logging::{
    attempt_span, log_attempt_failure, log_attempt_start, log_attempt_success, request_span,
};
use followfetch_utils::redaction::CredentialRedactor;

use crate::invoker::{InvocationOutcome, ProcessInvoker};
use crate::normalizer::{NormalizedPayload, normalize};
use crate::registry::{MethodDescriptor, MethodRegistry};
use crate::types::{AttemptRecord, AttemptStatus, OutcomeState, ScrapeOutcome, ScrapeRequest};

/// Delimiter between per-method entries in an exhaustion summary.
const SUMMARY_DELIMITER: &str = " | ";

/// How one attempt ended.
enum AttemptResult {
    Succeeded(NormalizedPayload),
    Failed(String),
    Cancelled,
}

/// Runs the fallback sequence for requests.
///
/// Holds only immutable state; one instance serves concurrent requests.
///
/// # Example
///
/// ```rust,no_run
/// use followfetch_config::{CliArgs, Config};
/// use followfetch_engine::{Credentials, FallbackOrchestrator, ScrapeRequest, SelectionMode};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::discover(&CliArgs::default())?;
/// let orchestrator = FallbackOrchestrator::from_config(&config)?;
/// let request = ScrapeRequest::new("alice", SelectionMode::Auto, Credentials::new())?;
/// let outcome = orchestrator.run(&request).await;
/// println!("{}", outcome.to_json_pretty()?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FallbackOrchestrator {
    registry: Arc<MethodRegistry>,
    invoker: ProcessInvoker,
}

impl FallbackOrchestrator {
    #[must_use]
    pub fn new(registry: Arc<MethodRegistry>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            registry,
            invoker: ProcessInvoker::new(runner),
        }
    }

    /// Built-in registry and a native runner configured from `config`.
    pub fn from_config(config: &Config) -> Result<Self, FollowfetchError> {
        let registry = MethodRegistry::builtin(config)?;
        let runner = NativeRunner::with_buffer_config(BufferConfig {
            stdout_cap_bytes: config.stdout_cap_bytes(),
            stderr_cap_bytes: config.stderr_cap_bytes(),
        });
        Ok(Self::new(Arc::new(registry), Arc::new(runner))
            .with_error_excerpt_chars(config.error_excerpt_chars()))
    }

    #[must_use]
    pub fn with_error_excerpt_chars(mut self, chars: usize) -> Self {
        self.invoker = self.invoker.with_excerpt_chars(chars);
        self
    }

    #[must_use]
    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Run the fallback sequence to completion.
    pub async fn run(&self, request: &ScrapeRequest) -> ScrapeOutcome {
        self.run_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Run the fallback sequence, stopping early if `cancel` fires.
    ///
    /// Cancellation kills the in-flight worker, attempts nothing further, and
    /// returns an outcome with `cancelled: true`.
    pub async fn run_with_cancel(
        &self,
        request: &ScrapeRequest,
        cancel: &CancellationToken,
    ) -> ScrapeOutcome {
        let span = request_span(request.target_account(), &request.selection_mode().to_string());
        self.drive(request, cancel).instrument(span).await
    }

    async fn drive(&self, request: &ScrapeRequest, cancel: &CancellationToken) -> ScrapeOutcome {
        let redactor = CredentialRedactor::new(request.credentials().values());

        // Selecting
        let methods = match self.registry.select_methods(request) {
            Ok(methods) => methods,
            Err(err) => {
                let text = redactor.redact(&err.to_string());
                warn!(error = %text, "Method selection failed");
                return ScrapeOutcome::rejected(text);
            }
        };
        debug!(
            methods = ?methods.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            "Selected methods"
        );

        // Attempting(i)
        let mut attempt_log: Vec<AttemptRecord> = Vec::with_capacity(methods.len());
        for (order, method) in methods.iter().enumerate() {
            if cancel.is_cancelled() {
                return ScrapeOutcome::cancelled(attempt_log);
            }

            let started = Instant::now();
            let result = self
                .attempt(method, request, &redactor, cancel)
                .instrument(attempt_span(&method.id, order))
                .await;
            let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            let record = |status, error| AttemptRecord {
                method_id: method.id.clone(),
                display_name: method.display_name.clone(),
                status,
                error,
                timestamp_order: order,
                duration_ms,
            };

            match result {
                AttemptResult::Succeeded(payload) => {
                    log_attempt_success(&method.id, payload.followers.len(), duration_ms);
                    attempt_log.push(record(AttemptStatus::Success, None));
                    return succeeded(method, payload, attempt_log);
                }
                AttemptResult::Failed(error) => {
                    let error = redactor.redact(&error);
                    log_attempt_failure(&method.id, &error, duration_ms);
                    attempt_log.push(record(AttemptStatus::Failure, Some(error)));
                }
                AttemptResult::Cancelled => {
                    warn!(method_id = %method.id, "Attempt cancelled");
                    attempt_log.push(record(AttemptStatus::Failure, Some("cancelled".to_string())));
                    return ScrapeOutcome::cancelled(attempt_log);
                }
            }
        }

        // Exhausted
        let summary = if attempt_log.is_empty() {
            format!(
                "no applicable methods for selection '{}'",
                request.selection_mode()
            )
        } else {
            attempt_log
                .iter()
                .map(|a| {
                    format!(
                        "{}: {}",
                        a.display_name,
                        a.error.as_deref().unwrap_or("Unknown error")
                    )
                })
                .collect::<Vec<_>>()
                .join(SUMMARY_DELIMITER)
        };
        warn!(attempts = attempt_log.len(), "All methods failed");
        ScrapeOutcome::exhausted(attempt_log, summary)
    }

    async fn attempt(
        &self,
        method: &MethodDescriptor,
        request: &ScrapeRequest,
        redactor: &CredentialRedactor,
        cancel: &CancellationToken,
    ) -> AttemptResult {
        log_attempt_start(&method.id, &method.display_name);

        let args = match method.invocation.marshal_args(request) {
            Ok(args) => args,
            Err(kind) => {
                return AttemptResult::Failed(format!("missing required credential: {kind}"));
            }
        };
        let cmd = method.invocation.command_spec(&args);

        // Losing the race drops the invoke future, which kills the worker.
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => return AttemptResult::Cancelled,
            outcome = self.invoker.invoke(&cmd, method.timeout) => outcome,
        };

        match outcome {
            InvocationOutcome::Failed { error } => AttemptResult::Failed(error),
            InvocationOutcome::Completed { payload, stderr } => {
                if !stderr.trim().is_empty() {
                    debug!(stderr = %redactor.redact(stderr.trim()), "Worker stderr");
                }
                interpret_payload(&payload)
            }
        }
    }
}

/// Apply the worker's own `success` verdict and normalize on success.
fn interpret_payload(payload: &Map<String, Value>) -> AttemptResult {
    if payload.get("success").and_then(Value::as_bool) != Some(true) {
        let mut error = payload
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string();
        if payload.get("requires_login").and_then(Value::as_bool) == Some(true) {
            error.push_str(" (login required)");
        }
        return AttemptResult::Failed(error);
    }

    match normalize(payload) {
        Ok(normalized) => AttemptResult::Succeeded(normalized),
        Err(err) => AttemptResult::Failed(format!("invalid follower payload: {err}")),
    }
}

fn succeeded(
    method: &MethodDescriptor,
    payload: NormalizedPayload,
    attempt_log: Vec<AttemptRecord>,
) -> ScrapeOutcome {
    ScrapeOutcome {
        success: true,
        state: OutcomeState::Succeeded,
        method_used: Some(method.display_name.clone()),
        followers: payload.followers,
        attempt_log,
        error_summary: None,
        cancelled: false,
        worker_info: payload.info,
        worker_label: payload.label,
        empty_reason: payload.reason,
    }
}
