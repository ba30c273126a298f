//! Shared helpers for tests across the followfetch workspace.

use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serializes tests that mutate process environment variables.
///
/// Restores every touched variable to its previous value on drop.
pub struct EnvGuard {
    saved: Vec<(String, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvGuard {
    #[must_use]
    pub fn new() -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Self {
            saved: Vec::new(),
            _lock: lock,
        }
    }

    fn remember(&mut self, key: &str) {
        if !self.saved.iter().any(|(k, _)| k == key) {
            self.saved.push((key.to_string(), std::env::var_os(key)));
        }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.remember(key);
        // SAFETY: callers hold ENV_LOCK, so no other guarded test touches the environment.
        unsafe { std::env::set_var(key, value) };
    }

    pub fn remove(&mut self, key: &str) {
        self.remember(key);
        // SAFETY: see `set`.
        unsafe { std::env::remove_var(key) };
    }
}

impl Default for EnvGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..).rev() {
            // SAFETY: ENV_LOCK is still held until `_lock` drops after this body.
            unsafe {
                match value {
                    Some(v) => std::env::set_var(&key, v),
                    None => std::env::remove_var(&key),
                }
            }
        }
    }
}

/// A worker stdout payload reporting success with the given usernames.
#[must_use]
pub fn success_payload(usernames: &[&str]) -> String {
    let followers: Vec<String> = usernames
        .iter()
        .enumerate()
        .map(|(i, name)| {
            format!(r#"{{"username":"{name}","full_name":"","id":"{}"}}"#, i + 1)
        })
        .collect();
    format!(r#"{{"success":true,"followers":[{}]}}"#, followers.join(","))
}

/// A worker stdout payload reporting failure with the given error.
#[must_use]
pub fn failure_payload(error: &str) -> String {
    format!(r#"{{"success":false,"error":"{error}"}}"#)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_guard_restores() {
        let key = "FOLLOWFETCH_TEST_SUPPORT_PROBE";
        {
            let mut guard = EnvGuard::new();
            guard.set(key, "1");
            assert_eq!(std::env::var(key).as_deref(), Ok("1"));
        }
        assert!(std::env::var(key).is_err());
    }

    #[test]
    fn test_payloads_are_json_shaped() {
        assert_eq!(
            success_payload(&["alice"]),
            r#"{"success":true,"followers":[{"username":"alice","full_name":"","id":"1"}]}"#
        );
        assert_eq!(
            failure_payload("private account"),
            r#"{"success":false,"error":"private account"}"#
        );
    }
}
