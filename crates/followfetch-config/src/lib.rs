//! Configuration for followfetch
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > environment > file > defaults.

mod config;

pub use config::*;
