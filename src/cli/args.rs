//! CLI argument definitions using clap
//!
//! Commands:
//! - triage-db init
//! - triage-db seed [--drop]
//!
//! Connection settings come from `MONGODB_URL` and `MONGODB_DB` (a `.env`
//! file in the working directory is honoured).

use clap::{Parser, Subcommand};

/// Database bootstrap utilities for the triage document store
#[derive(Parser, Debug)]
#[command(name = "triage-db")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Create or update collection validators and ensure indexes
    Init,

    /// Insert sample patients and triage entries
    Seed {
        /// Delete existing documents in all three collections first
        #[arg(long)]
        drop: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
