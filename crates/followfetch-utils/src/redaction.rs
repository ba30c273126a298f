//! Credential redaction for text that leaves the process boundary
//!
//! Worker stderr, error strings in the attempt log, and log lines may echo the
//! session token or API key a worker was handed. Everything user-visible passes
//! through a [`CredentialRedactor`] built from the request's credentials.

use regex::Regex;
use std::sync::LazyLock;

/// Replacement text for any redacted value.
pub const REDACTED: &str = "***";

/// Literal secrets shorter than this are not masked.
pub const MIN_SECRET_LEN: usize = 8;

/// Session cookie fragments (`sessionid=...`, `"sessionid": "..."`) that workers
/// commonly print in tracebacks even when the raw token was never logged.
static SESSION_COOKIE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?i)(sessionid["']?\s*[=:]\s*["']?)[^\s;&"',}]+"#).ok()
});

/// Masks known credential values and session cookie fragments.
#[derive(Debug, Clone, Default)]
pub struct CredentialRedactor {
    secrets: Vec<String>,
}

impl CredentialRedactor {
    /// Build a redactor for the given literal secrets.
    ///
    /// Values shorter than [`MIN_SECRET_LEN`] are ignored.
    pub fn new<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut secrets: Vec<String> = secrets
            .into_iter()
            .map(Into::into)
            .filter(|s| s.chars().count() >= MIN_SECRET_LEN)
            .collect();
        // Longest first so a secret containing another is masked whole.
        secrets.sort_by_key(|s| std::cmp::Reverse(s.len()));
        secrets.dedup();
        Self { secrets }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Redact credentials from a string, replacing them with `***`.
    #[must_use]
    pub fn redact(&self, text: &str) -> String {
        let mut redacted = text.to_string();

        for secret in &self.secrets {
            if redacted.contains(secret.as_str()) {
                redacted = redacted.replace(secret.as_str(), REDACTED);
            }
        }

        if let Some(regex) = SESSION_COOKIE.as_ref() {
            redacted = regex
                .replace_all(&redacted, format!("${{1}}{REDACTED}").as_str())
                .into_owned();
        }

        redacted
    }

    #[must_use]
    pub fn redact_optional(&self, text: Option<&str>) -> Option<String> {
        text.map(|s| self.redact(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_redacts_literal_secret() {
        let redactor = CredentialRedactor::new(["tok-123456"]);
        assert_eq!(
            redactor.redact("login failed for token tok-123456"),
            "login failed for token ***"
        );
    }

    #[test]
    fn test_redacts_session_cookie_fragment() {
        let redactor = CredentialRedactor::default();
        assert_eq!(
            redactor.redact("Cookie: sessionid=abc%3A123; csrftoken=x"),
            "Cookie: sessionid=***; csrftoken=x"
        );
        assert_eq!(
            redactor.redact(r#"{"sessionid": "abc123"}"#),
            r#"{"sessionid": "***"}"#
        );
    }

    #[test]
    fn test_empty_secrets_are_ignored() {
        let redactor = CredentialRedactor::new(["", ""]);
        assert!(redactor.is_empty());
        assert_eq!(redactor.redact("nothing to hide"), "nothing to hide");
    }

    #[test]
    fn test_overlapping_secrets_mask_longest() {
        let redactor = CredentialRedactor::new(["tok-abcdefgh", "tok-abcdefgh-long"]);
        assert_eq!(redactor.redact("key=tok-abcdefgh-long"), "key=***");
    }

    #[test]
    fn test_redact_optional() {
        let redactor = CredentialRedactor::new(["s3cret-value"]);
        assert_eq!(redactor.redact_optional(None), None);
        assert_eq!(
            redactor.redact_optional(Some("s3cret-value")),
            Some("***".to_string())
        );
    }

    #[test]
    fn test_short_secrets_leave_text_alone() {
        let redactor = CredentialRedactor::new(["a", "1", "short"]);
        assert!(redactor.is_empty());
        assert_eq!(redactor.redact("private account"), "private account");
        assert_eq!(redactor.redact("exit code 1"), "exit code 1");
    }

    proptest! {
        #[test]
        fn prop_secret_never_survives(
            prefix in "[a-z ]{0,20}",
            secret in "[A-Za-z0-9]{8,32}",
            suffix in "[a-z ]{0,20}",
        ) {
            let redactor = CredentialRedactor::new([secret.clone()]);
            let redacted = redactor.redact(&format!("{prefix}{secret}{suffix}"));
            prop_assert!(!redacted.contains(&secret));
        }
    }
}
