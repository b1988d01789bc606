//! CLI module
//!
//! Provides command-line interface for:
//! - init: Reconcile collection validators and indexes
//! - seed: Insert sample data, optionally clearing existing data first

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{execute, init, run, run_command, seed};
pub use errors::{CliError, CliErrorCode, CliResult};
