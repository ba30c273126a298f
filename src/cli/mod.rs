//! Command-line interface for followfetch
//!
//! ## Module Structure
//!
//! - `args`: CLI argument definitions (clap)
//! - `run`: entry point, config discovery, and dispatch
//! - `commands`: command implementations and output rendering

pub mod args;
mod commands;
mod run;

pub use args::{Cli, Commands};
pub use run::run;
