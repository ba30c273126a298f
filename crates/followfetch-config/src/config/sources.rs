use std::collections::BTreeMap;

use super::{Config, ConfigSource};

impl Config {
    fn source_label(&self, key: &str) -> String {
        self.source_attribution
            .get(key)
            .copied()
            .unwrap_or(ConfigSource::Default)
            .to_string()
    }

    /// Get effective configuration as key -> (value, source) pairs.
    ///
    /// Credential values are never shown; only whether one is set.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add = |key: &str, value: String| {
            let source = self.source_label(key);
            config.insert(key.to_string(), (value, source));
        };

        add("timeout_secs", self.timeout_secs().to_string());
        add("stdout_cap_bytes", self.stdout_cap_bytes().to_string());
        add("stderr_cap_bytes", self.stderr_cap_bytes().to_string());
        add("error_excerpt_chars", self.error_excerpt_chars().to_string());
        add("verbose", self.verbose().to_string());
        add("log_format", self.log_format().to_string());
        add("scripts_dir", self.scripts_dir().display().to_string());
        add("python", self.python().to_string());
        add("node", self.node().to_string());

        if let Some(order) = &self.selection.auto_order {
            add("auto_order", order.join(", "));
        }

        for (id, method) in &self.methods {
            let mut parts = Vec::new();
            if let Some(enabled) = method.enabled {
                parts.push(format!("enabled={enabled}"));
            }
            if let Some(secs) = method.timeout_secs {
                parts.push(format!("timeout_secs={secs}"));
            }
            if let Some(script) = &method.script {
                parts.push(format!("script={}", script.display()));
            }
            add(&format!("methods.{id}"), parts.join(" "));
        }

        if self.credentials.session_token.is_some() {
            add("session_token", "***".to_string());
        }
        if self.credentials.api_key.is_some() {
            add("api_key", "***".to_string());
        }

        config
    }
}
