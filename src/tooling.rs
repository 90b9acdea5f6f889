//! Tooling & Integration Layer
//!
//! The CLI surface and report formatting used by the `fluentconf` binary.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, CommandOutput, Commands};
