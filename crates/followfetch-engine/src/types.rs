//! Request, attempt, and outcome types
//!
//! Wire forms use camelCase keys. `attemptLog` is always serialized, even when
//! empty, so callers can render a diagnostic trail for every outcome.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use followfetch_utils::error::RequestError;

// ============================================================================
// Request
// ============================================================================

/// Kind of credential a worker may need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CredentialKind {
    SessionToken,
    ApiKey,
}

impl CredentialKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SessionToken => "sessionToken",
            Self::ApiKey => "apiKey",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials carried by a request. Empty and `null` values count as absent.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<CredentialKind, Option<String>>",
    into = "BTreeMap<CredentialKind, String>"
)]
pub struct Credentials(BTreeMap<CredentialKind, String>);

impl From<BTreeMap<CredentialKind, Option<String>>> for Credentials {
    fn from(raw: BTreeMap<CredentialKind, Option<String>>) -> Self {
        raw.into_iter()
            .filter_map(|(kind, value)| value.map(|v| (kind, v)))
            .fold(Self::new(), |creds, (kind, value)| creds.with(kind, value))
    }
}

impl From<Credentials> for BTreeMap<CredentialKind, String> {
    fn from(creds: Credentials) -> Self {
        creds.0
    }
}

impl Credentials {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential. Empty values are ignored.
    #[must_use]
    pub fn with(mut self, kind: CredentialKind, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.0.insert(kind, value);
        }
        self
    }

    #[must_use]
    pub fn get(&self, kind: CredentialKind) -> Option<&str> {
        self.0
            .get(&kind)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    #[must_use]
    pub fn contains(&self, kind: CredentialKind) -> bool {
        self.get(kind).is_some()
    }

    /// Secret values, for redaction.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(String::as_str)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.keys().map(|k| (k, "***")))
            .finish()
    }
}

/// How the methods for a request are chosen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SelectionMode {
    /// Every applicable method in registry priority order
    Auto,
    /// Exactly one method, by id
    Explicit(String),
}

impl From<String> for SelectionMode {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("auto") {
            Self::Auto
        } else {
            Self::Explicit(value)
        }
    }
}

impl From<&str> for SelectionMode {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<SelectionMode> for String {
    fn from(mode: SelectionMode) -> Self {
        match mode {
            SelectionMode::Auto => "auto".to_string(),
            SelectionMode::Explicit(id) => id,
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Explicit(id) => f.write_str(id),
        }
    }
}

/// One retrieval request. Immutable once constructed.
///
/// ```rust
/// use followfetch_engine::{CredentialKind, ScrapeRequest, SelectionMode};
///
/// let request = ScrapeRequest::from_json(
///     r#"{"targetAccount":"alice","selectionMode":"auto","credentials":{"sessionToken":"s"}}"#,
/// ).unwrap();
/// assert_eq!(request.target_account(), "alice");
/// assert_eq!(request.selection_mode(), &SelectionMode::Auto);
/// assert!(request.credentials().contains(CredentialKind::SessionToken));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    target_account: String,
    #[serde(default = "default_selection_mode")]
    selection_mode: SelectionMode,
    #[serde(default)]
    credentials: Credentials,
}

fn default_selection_mode() -> SelectionMode {
    SelectionMode::Auto
}

impl ScrapeRequest {
    /// Create a request. The target account is trimmed and must not be empty.
    pub fn new(
        target_account: impl Into<String>,
        selection_mode: SelectionMode,
        credentials: Credentials,
    ) -> Result<Self, RequestError> {
        let target_account = target_account.into().trim().to_string();
        if target_account.is_empty() {
            return Err(RequestError::EmptyTarget);
        }
        Ok(Self {
            target_account,
            selection_mode,
            credentials,
        })
    }

    /// Parse the inbound request surface `{targetAccount, selectionMode, credentials}`.
    pub fn from_json(json: &str) -> Result<Self, RequestError> {
        let raw: ScrapeRequest =
            serde_json::from_str(json).map_err(|e| RequestError::InvalidPayload(e.to_string()))?;
        Self::new(raw.target_account, raw.selection_mode, raw.credentials)
    }

    #[must_use]
    pub fn target_account(&self) -> &str {
        &self.target_account
    }

    #[must_use]
    pub fn selection_mode(&self) -> &SelectionMode {
        &self.selection_mode
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

// ============================================================================
// Results
// ============================================================================

/// One follower as reported by a worker.
///
/// Optional fields are `None` when the worker did not report them or reported
/// them with the wrong type. Absence means unknown, not zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowerRecord {
    pub username: String,
    pub full_name: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follower_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttemptStatus {
    Success,
    Failure,
}

/// One method attempt. Created once, appended in invocation order, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub method_id: String,
    pub display_name: String,
    pub status: AttemptStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 0-based position in the attempt sequence
    pub timestamp_order: usize,
    /// Wall-clock duration of the attempt
    pub duration_ms: u64,
}

impl AttemptRecord {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == AttemptStatus::Success
    }
}

/// Terminal state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutcomeState {
    /// A method returned followers
    Succeeded,
    /// Every selected method was attempted and failed
    Exhausted,
    /// The request was cancelled before the sequence finished
    Cancelled,
    /// Selection failed; no method was attempted
    Rejected,
}

/// Terminal result of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeOutcome {
    pub success: bool,
    pub state: OutcomeState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_used: Option<String>,
    pub followers: Vec<FollowerRecord>,
    pub attempt_log: Vec<AttemptRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_summary: Option<String>,
    pub cancelled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_reason: Option<String>,
}

impl ScrapeOutcome {
    /// Outcome for a request whose method selection failed.
    #[must_use]
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            state: OutcomeState::Rejected,
            method_used: None,
            followers: Vec::new(),
            attempt_log: Vec::new(),
            error_summary: Some(error.into()),
            cancelled: false,
            worker_info: None,
            worker_label: None,
            empty_reason: None,
        }
    }

    /// Outcome after every selected method failed.
    #[must_use]
    pub fn exhausted(attempt_log: Vec<AttemptRecord>, error_summary: String) -> Self {
        Self {
            state: OutcomeState::Exhausted,
            attempt_log,
            error_summary: Some(error_summary),
            ..Self::rejected(String::new())
        }
    }

    /// Outcome for a request cancelled mid-sequence.
    #[must_use]
    pub fn cancelled(attempt_log: Vec<AttemptRecord>) -> Self {
        let n = attempt_log.len();
        Self {
            state: OutcomeState::Cancelled,
            cancelled: true,
            attempt_log,
            error_summary: Some(format!("cancelled after {n} attempt(s)")),
            ..Self::rejected(String::new())
        }
    }

    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        self.state == OutcomeState::Rejected
    }

    /// Serialize to the outbound result surface.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_rejects_blank_target() {
        let err = ScrapeRequest::new("  ", SelectionMode::Auto, Credentials::new()).unwrap_err();
        assert_eq!(err, RequestError::EmptyTarget);

        let err = ScrapeRequest::from_json(r#"{"targetAccount":""}"#).unwrap_err();
        assert_eq!(err, RequestError::EmptyTarget);
    }

    #[test]
    fn test_request_wire_form() {
        let request = ScrapeRequest::from_json(
            r#"{"targetAccount":" alice ","selectionMode":"method4","credentials":{"apiKey":"k"}}"#,
        )
        .unwrap();
        assert_eq!(request.target_account(), "alice");
        assert_eq!(
            request.selection_mode(),
            &SelectionMode::Explicit("method4".to_string())
        );
        assert_eq!(request.credentials().get(CredentialKind::ApiKey), Some("k"));
        assert_eq!(request.credentials().get(CredentialKind::SessionToken), None);
    }

    #[test]
    fn test_request_defaults_to_auto_without_credentials() {
        let request = ScrapeRequest::from_json(r#"{"targetAccount":"alice"}"#).unwrap();
        assert_eq!(request.selection_mode(), &SelectionMode::Auto);
        assert_eq!(request.credentials(), &Credentials::new());
    }

    #[test]
    fn test_request_rejects_malformed_json() {
        let err = ScrapeRequest::from_json("{not json").unwrap_err();
        assert!(matches!(err, RequestError::InvalidPayload(_)));

        let err = ScrapeRequest::from_json(r#"{"targetAccount":"a","credentials":{"cookie":"x"}}"#)
            .unwrap_err();
        assert!(matches!(err, RequestError::InvalidPayload(_)));
    }

    #[test]
    fn test_empty_credential_values_are_absent() {
        let creds = Credentials::new()
            .with(CredentialKind::SessionToken, "")
            .with(CredentialKind::ApiKey, "key");
        assert!(!creds.contains(CredentialKind::SessionToken));
        assert!(creds.contains(CredentialKind::ApiKey));

        let parsed = ScrapeRequest::from_json(
            r#"{"targetAccount":"a","credentials":{"sessionToken":""}}"#,
        )
        .unwrap();
        assert!(!parsed.credentials().contains(CredentialKind::SessionToken));
    }

    #[test]
    fn test_null_credential_values_are_absent() {
        let parsed = ScrapeRequest::from_json(
            r#"{"targetAccount":"a","credentials":{"sessionToken":null,"apiKey":"key"}}"#,
        )
        .unwrap();
        assert!(!parsed.credentials().contains(CredentialKind::SessionToken));
        assert_eq!(parsed.credentials().get(CredentialKind::ApiKey), Some("key"));
        assert_eq!(parsed.credentials().values().count(), 1);
    }

    #[test]
    fn test_credentials_debug_hides_values() {
        let creds = Credentials::new().with(CredentialKind::SessionToken, "hunter2");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_selection_mode_parsing() {
        assert_eq!(SelectionMode::from("auto"), SelectionMode::Auto);
        assert_eq!(SelectionMode::from("AUTO"), SelectionMode::Auto);
        assert_eq!(
            SelectionMode::from("method2"),
            SelectionMode::Explicit("method2".to_string())
        );
        assert_eq!(String::from(SelectionMode::Auto), "auto");
    }

    #[test]
    fn test_outcome_always_serializes_attempt_log() {
        let outcome = ScrapeOutcome::rejected("Unknown method 'x'");
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["attemptLog"], json!([]));
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["state"], json!("rejected"));
        assert_eq!(value["errorSummary"], json!("Unknown method 'x'"));
        assert!(value.get("methodUsed").is_none());
    }

    #[test]
    fn test_cancelled_outcome_summary() {
        let record = AttemptRecord {
            method_id: "method2".to_string(),
            display_name: "Method 2".to_string(),
            status: AttemptStatus::Failure,
            error: Some("cancelled".to_string()),
            timestamp_order: 0,
            duration_ms: 5,
        };
        let outcome = ScrapeOutcome::cancelled(vec![record]);
        assert!(outcome.cancelled);
        assert!(!outcome.success);
        assert_eq!(outcome.state, OutcomeState::Cancelled);
        assert_eq!(
            outcome.error_summary.as_deref(),
            Some("cancelled after 1 attempt(s)")
        );
    }

    #[test]
    fn test_follower_record_camel_case() {
        let record = FollowerRecord {
            username: "bob".to_string(),
            full_name: "Bob B".to_string(),
            id: "123".to_string(),
            follower_count: Some(7),
            biography: None,
            email: None,
            is_verified: Some(true),
            is_private: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({"username":"bob","fullName":"Bob B","id":"123","followerCount":7,"isVerified":true})
        );
    }
}
