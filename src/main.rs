//! # Avatar Compose CLI
//!
//! This is the binary entry point for the `avatar-compose` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Installing the `env_logger` backend for the library's `log` output.
//! - Executing the appropriate command based on the parsed arguments.
//!
//! The composition logic lives in the `avatar_compose` library; the binary is
//! a thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
