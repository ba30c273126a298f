use std::collections::HashSet;

use followfetch_utils::error::{ConfigError, FollowfetchError};

use super::Config;

const MIN_TIMEOUT_SECS: u64 = 1;
const MAX_TIMEOUT_SECS: u64 = 3600;
const MIN_CAP_BYTES: usize = 1024;

fn invalid(key: impl Into<String>, value: impl Into<String>) -> FollowfetchError {
    FollowfetchError::Config(ConfigError::InvalidValue {
        key: key.into(),
        value: value.into(),
    })
}

fn check_timeout(key: &str, secs: u64) -> Result<(), FollowfetchError> {
    if secs < MIN_TIMEOUT_SECS {
        return Err(invalid(key, "must be at least 1 second"));
    }
    if secs > MAX_TIMEOUT_SECS {
        return Err(invalid(
            key,
            "exceeds maximum limit of 3600 seconds (1 hour)",
        ));
    }
    Ok(())
}

impl Config {
    /// Validate merged configuration values.
    ///
    /// Method ids in `[methods.*]` and `auto_order` are checked against the
    /// registry when it is built; here only their shape is checked.
    pub(crate) fn validate(&self) -> Result<(), FollowfetchError> {
        if let Some(secs) = self.defaults.timeout_secs {
            check_timeout("timeout_secs", secs)?;
        }

        if let Some(cap) = self.defaults.stdout_cap_bytes
            && cap < MIN_CAP_BYTES
        {
            return Err(invalid(
                "stdout_cap_bytes",
                "must be at least 1024 bytes (1 KiB)",
            ));
        }

        if let Some(cap) = self.defaults.stderr_cap_bytes
            && cap < MIN_CAP_BYTES
        {
            return Err(invalid(
                "stderr_cap_bytes",
                "must be at least 1024 bytes (1 KiB)",
            ));
        }

        if self.defaults.error_excerpt_chars == Some(0) {
            return Err(invalid("error_excerpt_chars", "must be greater than 0"));
        }

        if self.workers.python.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(invalid("python", "must not be empty"));
        }
        if self.workers.node.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(invalid("node", "must not be empty"));
        }

        for (id, method) in &self.methods {
            if let Some(secs) = method.timeout_secs {
                check_timeout(&format!("methods.{id}.timeout_secs"), secs)?;
            }
            if method
                .script
                .as_ref()
                .is_some_and(|s| s.as_os_str().is_empty())
            {
                return Err(invalid(format!("methods.{id}.script"), "must not be empty"));
            }
        }

        if let Some(order) = &self.selection.auto_order {
            if order.is_empty() {
                return Err(invalid("auto_order", "must list at least one method id"));
            }
            let mut seen = HashSet::new();
            for id in order {
                if id.trim().is_empty() {
                    return Err(invalid("auto_order", "method ids must not be empty"));
                }
                if !seen.insert(id.as_str()) {
                    return Err(invalid("auto_order", format!("'{id}' is listed more than once")));
                }
            }
        }

        Ok(())
    }
}
