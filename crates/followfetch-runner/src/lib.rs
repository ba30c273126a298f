//! Process execution for retrieval workers
//!
//! Every worker attempt is one transient child process. This crate owns the
//! mechanics of running it: argv-style command construction, a timeout,
//! bounded capture of stdout/stderr, and termination of the whole process
//! group when the timeout fires or the caller stops waiting.
//!
//! # Security Model
//!
//! All process execution goes through [`CommandSpec`] to ensure argv-style invocation.
//! Target account names and credentials are passed as discrete arguments and are
//! never interpreted by a shell.

pub mod command_spec;
pub mod error;
pub mod native;
pub mod process;
pub mod ring_buffer;

pub use command_spec::CommandSpec;
pub use error::RunnerError;
pub use native::{BufferConfig, NativeRunner};
pub use process::{ProcessOutput, ProcessRunner};
pub use ring_buffer::RingBuffer;
