//! Method registry and selection
//!
//! Methods are declarative data: an id, a display name, how to launch the
//! worker, and an ordered list of argument slots filled from the request.
//! Adding a method never touches orchestration control flow.

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use followfetch_config::Config;
use followfetch_runner::CommandSpec;
use followfetch_utils::error::{ConfigError, FollowfetchError, SelectionError};

use crate::types::{CredentialKind, ScrapeRequest, SelectionMode};

/// Built-in Auto priority: the paid vendor method (only with an API key), then
/// session-backed methods, then the anonymous-capable method.
pub const BUILTIN_AUTO_ORDER: &[&str] = &["method5", "method6", "method4", "method2"];

// ============================================================================
// Descriptors
// ============================================================================

/// How a worker process is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutableKind {
    /// `<interpreter> <script>`
    Python { interpreter: String, script: PathBuf },
    /// `<interpreter> <script>`
    Node { interpreter: String, script: PathBuf },
    /// Arbitrary program with fixed leading arguments
    Command { program: String, args: Vec<String> },
}

/// One positional argument filled per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgSlot {
    /// The target account handle
    Target,
    /// A credential; absent optional credentials are omitted positionally
    Credential { kind: CredentialKind, required: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocationSpec {
    pub executable: ExecutableKind,
    pub slots: Vec<ArgSlot>,
}

impl ProcessInvocationSpec {
    #[must_use]
    pub fn new(executable: ExecutableKind, slots: Vec<ArgSlot>) -> Self {
        Self { executable, slots }
    }

    /// Fill the argument slots from a request.
    ///
    /// Returns the first missing *required* credential as the error.
    pub fn marshal_args(&self, request: &ScrapeRequest) -> Result<Vec<String>, CredentialKind> {
        let mut args = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            match *slot {
                ArgSlot::Target => args.push(request.target_account().to_string()),
                ArgSlot::Credential { kind, required } => {
                    match request.credentials().get(kind) {
                        Some(value) => args.push(value.to_string()),
                        None if required => return Err(kind),
                        None => {}
                    }
                }
            }
        }
        Ok(args)
    }

    /// Build the argv command for already-marshaled arguments.
    #[must_use]
    pub fn command_spec(&self, args: &[String]) -> CommandSpec {
        let cmd = match &self.executable {
            ExecutableKind::Python {
                interpreter,
                script,
            }
            | ExecutableKind::Node {
                interpreter,
                script,
            } => CommandSpec::new(interpreter).arg(script),
            ExecutableKind::Command { program, args: fixed } => CommandSpec::new(program).args(fixed),
        };
        cmd.args(args)
    }
}

/// A registered retrieval method. Read-only after registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub id: String,
    pub display_name: String,
    pub invocation: ProcessInvocationSpec,
    /// Per-invocation timeout
    pub timeout: Duration,
    /// In Auto mode, include this method only when the request carries this credential.
    pub auto_requires: Option<CredentialKind>,
}

impl MethodDescriptor {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        invocation: ProcessInvocationSpec,
        timeout: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            invocation,
            timeout,
            auto_requires: None,
        }
    }

    #[must_use]
    pub fn auto_requires(mut self, kind: CredentialKind) -> Self {
        self.auto_requires = Some(kind);
        self
    }

    /// Credentials without which the method cannot run.
    #[must_use]
    pub fn required_credentials(&self) -> BTreeSet<CredentialKind> {
        self.invocation
            .slots
            .iter()
            .filter_map(|slot| match slot {
                ArgSlot::Credential {
                    kind,
                    required: true,
                } => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// Credentials the method uses when present.
    #[must_use]
    pub fn optional_credentials(&self) -> BTreeSet<CredentialKind> {
        self.invocation
            .slots
            .iter()
            .filter_map(|slot| match slot {
                ArgSlot::Credential {
                    kind,
                    required: false,
                } => Some(*kind),
                _ => None,
            })
            .collect()
    }

    fn applies_in_auto(&self, request: &ScrapeRequest) -> bool {
        self.auto_requires
            .is_none_or(|kind| request.credentials().contains(kind))
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Immutable set of methods plus the Auto priority order.
///
/// Safe to share across concurrent requests.
#[derive(Debug, Clone)]
pub struct MethodRegistry {
    methods: Vec<MethodDescriptor>,
    auto_order: Vec<String>,
}

impl MethodRegistry {
    /// Build a registry. Ids must be unique and `auto_order` may only name
    /// registered ids.
    pub fn new(
        methods: Vec<MethodDescriptor>,
        auto_order: Vec<String>,
    ) -> Result<Self, SelectionError> {
        let mut seen = HashSet::new();
        for method in &methods {
            if !seen.insert(method.id.as_str()) {
                return Err(SelectionError::DuplicateMethod {
                    id: method.id.clone(),
                });
            }
        }

        let registry = Self {
            methods,
            auto_order: Vec::new(),
        };
        for id in &auto_order {
            if registry.get(id).is_none() {
                return Err(registry.unknown(id));
            }
        }

        Ok(Self {
            auto_order,
            ..registry
        })
    }

    /// Registry with Auto order equal to registration order.
    pub fn in_order(methods: Vec<MethodDescriptor>) -> Result<Self, SelectionError> {
        let order = methods.iter().map(|m| m.id.clone()).collect();
        Self::new(methods, order)
    }

    /// The built-in worker catalogue, adjusted by configuration.
    ///
    /// Disabled methods are not registered. `[methods.<id>]` and
    /// `[selection].auto_order` may only reference catalogue ids.
    pub fn builtin(config: &Config) -> Result<Self, FollowfetchError> {
        let catalogue = builtin_catalogue(config);
        let known: Vec<String> = catalogue.iter().map(|m| m.id.clone()).collect();

        for id in config.methods.keys() {
            if !known.contains(id) {
                return Err(FollowfetchError::Config(ConfigError::InvalidValue {
                    key: format!("methods.{id}"),
                    value: format!("unknown method id (known: {})", known.join(", ")),
                }));
            }
        }

        let order: Vec<String> = match &config.selection.auto_order {
            Some(order) => {
                if let Some(unknown) = order.iter().find(|id| !known.contains(*id)) {
                    return Err(FollowfetchError::Config(ConfigError::InvalidValue {
                        key: "auto_order".to_string(),
                        value: format!(
                            "unknown method id '{unknown}' (known: {})",
                            known.join(", ")
                        ),
                    }));
                }
                order.clone()
            }
            None => BUILTIN_AUTO_ORDER.iter().map(ToString::to_string).collect(),
        };

        let methods: Vec<MethodDescriptor> = catalogue
            .into_iter()
            .filter(|m| config.method_enabled(&m.id))
            .collect();
        let order = order
            .into_iter()
            .filter(|id| methods.iter().any(|m| &m.id == id))
            .collect();

        Ok(Self::new(methods, order)?)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.id == id)
    }

    /// All registered ids in registration order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.methods.iter().map(|m| m.id.clone()).collect()
    }

    /// Methods in Auto priority order.
    pub fn auto_methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.auto_order.iter().filter_map(|id| self.get(id))
    }

    #[must_use]
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Ordered methods to attempt for a request.
    ///
    /// `Explicit(id)` yields that one method whether or not its credentials
    /// are present; a missing credential is reported later as an attempt
    /// failure. `Auto` yields the priority order minus methods gated on a
    /// credential the request lacks. Deterministic for a given request.
    pub fn select_methods(
        &self,
        request: &ScrapeRequest,
    ) -> Result<Vec<&MethodDescriptor>, SelectionError> {
        match request.selection_mode() {
            SelectionMode::Explicit(id) => self
                .get(id)
                .map(|method| vec![method])
                .ok_or_else(|| self.unknown(id)),
            SelectionMode::Auto => Ok(self
                .auto_methods()
                .filter(|m| m.applies_in_auto(request))
                .collect()),
        }
    }

    fn unknown(&self, id: &str) -> SelectionError {
        SelectionError::UnknownMethod {
            id: id.to_string(),
            known: self.ids(),
        }
    }
}

fn builtin_catalogue(config: &Config) -> Vec<MethodDescriptor> {
    let python = |id: &str, script: &str| ExecutableKind::Python {
        interpreter: config.python().to_string(),
        script: config.script_path(id, script),
    };
    let node = |id: &str, script: &str| ExecutableKind::Node {
        interpreter: config.node().to_string(),
        script: config.script_path(id, script),
    };
    let credential = |kind, required| ArgSlot::Credential { kind, required };

    vec![
        MethodDescriptor::new(
            "method5",
            "Method 5 (ScrapFly)",
            ProcessInvocationSpec::new(
                python("method5", "method5_wrapper.py"),
                vec![ArgSlot::Target, credential(CredentialKind::ApiKey, true)],
            ),
            config.method_timeout("method5"),
        )
        .auto_requires(CredentialKind::ApiKey),
        MethodDescriptor::new(
            "method6",
            "Method 6 (InstaTouch)",
            ProcessInvocationSpec::new(
                node("method6", "method6_wrapper.js"),
                vec![ArgSlot::Target, credential(CredentialKind::SessionToken, true)],
            ),
            config.method_timeout("method6"),
        ),
        MethodDescriptor::new(
            "method4",
            "Method 4 (Instabot)",
            ProcessInvocationSpec::new(
                python("method4", "method4_wrapper.py"),
                vec![
                    ArgSlot::Target,
                    credential(CredentialKind::SessionToken, false),
                ],
            ),
            config.method_timeout("method4"),
        ),
        MethodDescriptor::new(
            "method2",
            "Method 2 (Instaloader w/ Session)",
            ProcessInvocationSpec::new(
                python("method2", "method2_wrapper.py"),
                vec![
                    ArgSlot::Target,
                    credential(CredentialKind::SessionToken, false),
                ],
            ),
            config.method_timeout("method2"),
        ),
    ]
}
