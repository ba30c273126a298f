//! End-to-end CLI tests
//!
//! Each test runs the compiled binary in an isolated temp directory with the
//! followfetch environment cleared. Scrape tests on unix point the Python
//! interpreter at `sh` and the scripts directory at small shell workers.

use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use serde_json::Value;
use std::process::Command;
use tempfile::TempDir;

const FOLLOWFETCH_ENV: &[&str] = &[
    "FOLLOWFETCH_HOME",
    "FOLLOWFETCH_TIMEOUT_SECS",
    "FOLLOWFETCH_SCRIPTS_DIR",
    "FOLLOWFETCH_PYTHON",
    "FOLLOWFETCH_NODE",
    "FOLLOWFETCH_SESSION_TOKEN",
    "FOLLOWFETCH_API_KEY",
    "SCRAPFLY_KEY",
    "RUST_LOG",
];

/// A workspace whose config discovery stops at its own `.git`.
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join(".git")).unwrap();
    dir
}

fn followfetch(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("followfetch"));
    cmd.current_dir(dir.path());
    for var in FOLLOWFETCH_ENV {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn methods_json_lists_builtin_catalogue() {
    let dir = workspace();
    let output = followfetch(&dir).args(["methods", "--json"]).output().unwrap();
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<_> = value["methods"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, ["method5", "method6", "method4", "method2"]);
}

#[test]
fn methods_respects_config_file() {
    let dir = workspace();
    std::fs::create_dir(dir.path().join(".followfetch")).unwrap();
    std::fs::write(
        dir.path().join(".followfetch/config.toml"),
        "[methods.method5]\nenabled = false\n",
    )
    .unwrap();

    followfetch(&dir)
        .arg("methods")
        .assert()
        .success()
        .stdout(predicate::str::contains("method4"))
        .stdout(predicate::str::contains("method5").not());
}

#[test]
fn unknown_method_exits_with_cli_args_code() {
    let dir = workspace();
    followfetch(&dir)
        .args(["scrape", "alice", "--method", "nope"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown method 'nope'"));
}

#[test]
fn unknown_method_json_outcome_has_empty_attempt_log() {
    let dir = workspace();
    let output = followfetch(&dir)
        .args(["scrape", "alice", "--method", "nope", "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["success"], Value::Bool(false));
    assert_eq!(value["attemptLog"], serde_json::json!([]));
}

#[test]
fn empty_target_is_rejected() {
    let dir = workspace();
    followfetch(&dir)
        .args(["scrape", ""])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("target account handle is required"));
}

#[test]
fn missing_explicit_config_is_rejected() {
    let dir = workspace();
    followfetch(&dir)
        .args(["--config", "missing.toml", "methods"])
        .assert()
        .code(2);
}

#[test]
fn config_shows_sources() {
    let dir = workspace();
    followfetch(&dir)
        .env("FOLLOWFETCH_TIMEOUT_SECS", "30")
        .env("FOLLOWFETCH_SESSION_TOKEN", "very-secret-token")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("timeout_secs = 30 (from env)"))
        .stdout(predicate::str::contains("python = python3 (from default)"))
        .stdout(predicate::str::contains("session_token = *** (from env)"))
        .stdout(predicate::str::contains("very-secret-token").not());
}

#[cfg(unix)]
mod workers {
    use super::*;

    /// Install a shell worker under the Python script name for `id`.
    fn install_worker(dir: &TempDir, id: &str, body: &str) {
        let scripts = dir.path().join("scripts");
        std::fs::create_dir_all(&scripts).unwrap();
        std::fs::write(scripts.join(format!("{id}_wrapper.py")), body).unwrap();
    }

    fn scrape(dir: &TempDir) -> Command {
        let mut cmd = followfetch(dir);
        cmd.env("FOLLOWFETCH_PYTHON", "sh")
            .env("FOLLOWFETCH_SCRIPTS_DIR", dir.path().join("scripts"));
        cmd
    }

    const FANS: &str = r#"printf '{"success":true,"followers":[{"username":"%s_fan","full_name":"Fan","id":"1"}]}' "$1"
"#;

    #[test]
    fn auto_falls_back_to_working_worker() {
        let dir = workspace();
        install_worker(&dir, "method4", "echo 'rate limited' >&2\nexit 1\n");
        install_worker(&dir, "method2", FANS);

        scrape(&dir)
            .args(["scrape", "alice"])
            .assert()
            .success()
            .stdout(predicate::str::contains("alice_fan"))
            .stdout(predicate::str::contains("Method 2 (Instaloader w/ Session)"));
    }

    #[test]
    fn json_outcome_records_every_attempt() {
        let dir = workspace();
        install_worker(&dir, "method4", "echo 'Not JSON'\n");
        install_worker(&dir, "method2", FANS);

        let output = scrape(&dir)
            .args(["scrape", "alice", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let value: Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(value["success"], Value::Bool(true));
        assert_eq!(value["methodUsed"], "Method 2 (Instaloader w/ Session)");
        assert_eq!(value["followers"][0]["username"], "alice_fan");

        let log = value["attemptLog"].as_array().unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0]["methodId"], "method6");
        assert_eq!(log[0]["error"], "missing required credential: sessionToken");
        assert_eq!(log[1]["methodId"], "method4");
        assert_eq!(log[1]["error"], "malformed worker output: Not JSON");
        assert_eq!(log[2]["status"], "success");
    }

    #[test]
    fn every_method_failing_exits_with_code_3() {
        let dir = workspace();
        install_worker(
            &dir,
            "method4",
            r#"echo '{"success":false,"error":"private account"}'
"#,
        );
        install_worker(&dir, "method2", "exit 1\n");

        scrape(&dir)
            .args(["scrape", "alice"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("All methods failed for alice"))
            .stderr(predicate::str::contains("private account"));
    }

    #[test]
    fn session_token_reaches_worker_but_not_output() {
        let dir = workspace();
        install_worker(
            &dir,
            "method4",
            r#"echo "bad session $2" >&2
exit 1
"#,
        );
        install_worker(&dir, "method2", "exit 1\n");

        scrape(&dir)
            .args([
                "scrape",
                "alice",
                "--method",
                "method4",
                "--session-token",
                "tok-SECRET-42",
            ])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("bad session ***"))
            .stderr(predicate::str::contains("tok-SECRET-42").not());
    }

    #[test]
    fn request_document_from_stdin() {
        let dir = workspace();
        install_worker(&dir, "method2", FANS);

        let output = scrape(&dir)
            .args(["scrape", "--request", "-", "--json"])
            .env("FOLLOWFETCH_TIMEOUT_SECS", "10")
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .spawn()
            .and_then(|mut child| {
                use std::io::Write;
                child
                    .stdin
                    .take()
                    .unwrap()
                    .write_all(br#"{"targetAccount":"bob","selectionMode":"method2"}"#)?;
                child.wait_with_output()
            })
            .unwrap();
        assert!(output.status.success());

        let value: Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(value["followers"][0]["username"], "bob_fan");
        assert_eq!(value["attemptLog"].as_array().unwrap().len(), 1);
    }
}
