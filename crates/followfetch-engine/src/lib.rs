//! Fallback orchestration for follower retrieval
//!
//! A request names a target account and either a specific retrieval method or
//! `auto`. The [`MethodRegistry`] turns that into an ordered list of methods;
//! the [`FallbackOrchestrator`] runs each method's external worker in turn via
//! the [`ProcessInvoker`], stops at the first success, and returns a
//! [`ScrapeOutcome`] carrying the normalized followers and the full attempt log.
//!
//! Method failures never surface as Rust errors. They are recorded in the
//! attempt log and the loop moves on; only a request that selects an unknown
//! method is rejected up front.

pub mod error;
pub mod invoker;
pub mod normalizer;
pub mod orchestrator;
pub mod registry;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use error::{ConfigurationError, ShapeError};
pub use invoker::{InvocationOutcome, ProcessInvoker};
pub use normalizer::{NormalizedPayload, normalize};
pub use orchestrator::FallbackOrchestrator;
pub use registry::{
    ArgSlot, BUILTIN_AUTO_ORDER, ExecutableKind, MethodDescriptor, MethodRegistry,
    ProcessInvocationSpec,
};
pub use types::{
    AttemptRecord, AttemptStatus, CredentialKind, Credentials, FollowerRecord, OutcomeState,
    ScrapeOutcome, ScrapeRequest, SelectionMode,
};
