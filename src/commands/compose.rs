//! # Compose Command Implementation
//!
//! This module implements the `compose` subcommand. It reads a build file,
//! runs every feature it declares in a build session, and prints the
//! composed menu together with the parameters registered in the FX
//! controller.
//!
//! A failing feature aborts the whole build; nothing is printed except the
//! failure message.

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;

use avatar_compose::config;
use avatar_compose::controller::{AnimatorController, VfController};
use avatar_compose::menu::MenuTree;
use avatar_compose::session::BuildSession;

use super::tree::print_menu;

/// How to print the composed result.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ComposeFormat {
    /// Menu hierarchy followed by the parameter list
    #[default]
    Tree,
    Yaml,
    Json,
}

/// Compose a menu and FX parameters from a build file
#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// Path to the build file.
    #[arg(value_name = "BUILD")]
    pub build: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = ComposeFormat::Tree)]
    pub format: ComposeFormat,

    /// Directory that menu documents are resolved against.
    ///
    /// Defaults to the directory containing the build file.
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,
}

#[derive(Serialize)]
struct ComposeOutput<'a> {
    menu: &'a MenuTree,
    fx: &'a AnimatorController,
}

/// Execute the `compose` command.
pub fn execute(args: ComposeArgs) -> Result<()> {
    let build = config::from_file(&args.build).map_err(|e| {
        anyhow::anyhow!("Failed to load build file {}: {}", args.build.display(), e)
    })?;
    let base_dir = args.base_dir.clone().unwrap_or_else(|| {
        args.build
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    });

    let mut session = BuildSession::new(MenuTree::default(), VfController::empty("FX"));
    build.register(&mut session, &base_dir);
    let output = session.safe_run().map_err(|failure| anyhow::anyhow!(failure.message))?;

    match args.format {
        ComposeFormat::Tree => {
            print_menu(&output.menu)?;
            println!();
            println!("Parameters:");
            for param in output.fx.parameters() {
                println!("  {} ({:?})", param.name, param.kind());
            }
        }
        ComposeFormat::Yaml => {
            let doc = ComposeOutput {
                menu: &output.menu,
                fx: output.fx.raw(),
            };
            print!("{}", config::to_yaml_string(&doc)?);
        }
        ComposeFormat::Json => {
            let doc = ComposeOutput {
                menu: &output.menu,
                fx: output.fx.raw(),
            };
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }
    Ok(())
}
