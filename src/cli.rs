//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Avatar Compose - Build avatar menus and animation controllers from features
#[derive(Parser, Debug)]
#[command(name = "avatar-compose")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (error, warn, info, debug, trace). RUST_LOG takes precedence.
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the features of a build file and print the composed menu
    Compose(commands::compose::ComposeArgs),

    /// Normalize a runtime controller document
    Normalize(commands::normalize::NormalizeArgs),

    /// Display a menu document as a tree
    Tree(commands::tree::TreeArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        self.init_logging();

        match self.command {
            Commands::Compose(args) => commands::compose::execute(args),
            Commands::Normalize(args) => commands::normalize::execute(args),
            Commands::Tree(args) => commands::tree::execute(args),
        }
    }

    fn init_logging(&self) {
        let env = env_logger::Env::default().default_filter_or(self.log_level.as_str());
        // A logger may already be installed when running under a test harness.
        let _ = env_logger::Builder::from_env(env)
            .format_timestamp(None)
            .target(env_logger::Target::Stderr)
            .try_init();
    }
}
