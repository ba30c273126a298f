//! End-to-end fallback against real worker processes
//!
//! Workers are small `sh` scripts so the tests exercise spawning, exit-status
//! handling, timeouts, and stdout capture without Python or Node installed.

#![cfg(unix)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use followfetch_engine::{
    ArgSlot, AttemptStatus, CredentialKind, Credentials, ExecutableKind, FallbackOrchestrator,
    MethodDescriptor, MethodRegistry, OutcomeState, ProcessInvocationSpec, ScrapeRequest,
    SelectionMode,
};
use followfetch_runner::NativeRunner;

/// A method whose worker is `sh -c <script> worker <target> [session]`.
fn sh_method(id: &str, script: &str, timeout: Duration) -> MethodDescriptor {
    MethodDescriptor::new(
        id,
        format!("Shell {id}"),
        ProcessInvocationSpec::new(
            ExecutableKind::Command {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), script.to_string(), "worker".to_string()],
            },
            vec![
                ArgSlot::Target,
                ArgSlot::Credential {
                    kind: CredentialKind::SessionToken,
                    required: false,
                },
            ],
        ),
        timeout,
    )
}

fn orchestrator(methods: Vec<MethodDescriptor>) -> FallbackOrchestrator {
    let registry = MethodRegistry::in_order(methods).expect("valid registry");
    FallbackOrchestrator::new(Arc::new(registry), Arc::new(NativeRunner::new()))
}

fn request(mode: SelectionMode) -> ScrapeRequest {
    ScrapeRequest::new("alice", mode, Credentials::new()).expect("valid request")
}

const ECHO_TARGET: &str =
    r#"printf '{"success":true,"followers":[{"username":"%s_fan","full_name":"Fan","id":"1"}]}' "$1""#;

#[tokio::test]
async fn test_worker_receives_target_and_succeeds() {
    let orch = orchestrator(vec![sh_method("echo", ECHO_TARGET, Duration::from_secs(10))]);

    let outcome = orch.run(&request(SelectionMode::Auto)).await;

    assert!(outcome.success, "{:?}", outcome.error_summary);
    assert_eq!(outcome.method_used.as_deref(), Some("Shell echo"));
    assert_eq!(outcome.followers.len(), 1);
    assert_eq!(outcome.followers[0].username, "alice_fan");
}

#[tokio::test]
async fn test_falls_back_past_crash_and_bad_output() {
    let orch = orchestrator(vec![
        sh_method("crash", "echo 'Traceback: boom' >&2; exit 1", Duration::from_secs(10)),
        sh_method("chatty", "echo 'Not JSON'", Duration::from_secs(10)),
        sh_method("echo", ECHO_TARGET, Duration::from_secs(10)),
    ]);

    let outcome = orch.run(&request(SelectionMode::Auto)).await;

    assert!(outcome.success);
    assert_eq!(outcome.method_used.as_deref(), Some("Shell echo"));
    let errors: Vec<_> = outcome
        .attempt_log
        .iter()
        .map(|a| a.error.clone().unwrap_or_default())
        .collect();
    assert_eq!(errors[0], "execution failed: exit code 1: Traceback: boom");
    assert_eq!(errors[1], "malformed worker output: Not JSON");
    assert_eq!(errors[2], "");
    assert_eq!(outcome.attempt_log[2].status, AttemptStatus::Success);
}

#[tokio::test]
async fn test_hung_worker_times_out_and_fallback_continues() {
    let orch = orchestrator(vec![
        sh_method("hang", "sleep 30", Duration::from_millis(300)),
        sh_method("echo", ECHO_TARGET, Duration::from_secs(10)),
    ]);

    let started = Instant::now();
    let outcome = orch.run(&request(SelectionMode::Auto)).await;

    assert!(outcome.success);
    assert_eq!(outcome.attempt_log[0].error.as_deref(), Some("timeout"));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_exhaustion_against_real_workers() {
    let orch = orchestrator(vec![
        sh_method("one", r#"echo '{"success":false,"error":"rate limited"}'"#, Duration::from_secs(10)),
        sh_method("two", "exit 3", Duration::from_secs(10)),
    ]);

    let outcome = orch.run(&request(SelectionMode::Auto)).await;

    assert_eq!(outcome.state, OutcomeState::Exhausted);
    assert_eq!(
        outcome.error_summary.as_deref(),
        Some("Shell one: rate limited | Shell two: execution failed: exit code 3")
    );
}

#[tokio::test]
async fn test_explicit_selection_runs_only_that_worker() {
    let orch = orchestrator(vec![
        sh_method("crash", "exit 1", Duration::from_secs(10)),
        sh_method("echo", ECHO_TARGET, Duration::from_secs(10)),
    ]);

    let outcome = orch
        .run(&request(SelectionMode::Explicit("echo".to_string())))
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.attempt_log.len(), 1);
    assert_eq!(outcome.attempt_log[0].method_id, "echo");
}

#[tokio::test]
async fn test_optional_session_is_passed_positionally() {
    let orch = orchestrator(vec![sh_method(
        "session",
        r#"[ "$2" = "sess-1" ] && echo '{"success":true,"followers":[]}' || echo '{"success":false,"error":"no session"}'"#,
        Duration::from_secs(10),
    )]);
    let with_session = ScrapeRequest::new(
        "alice",
        SelectionMode::Auto,
        Credentials::new().with(CredentialKind::SessionToken, "sess-1"),
    )
    .expect("valid request");

    assert!(orch.run(&with_session).await.success);
    let without = orch.run(&request(SelectionMode::Auto)).await;
    assert!(!without.success);
    assert_eq!(without.attempt_log[0].error.as_deref(), Some("no session"));
}
