//! # Normalize Command Implementation
//!
//! This module implements the `normalize` subcommand, which loads a runtime
//! controller document (an animator controller, possibly wrapped in override
//! controllers) and prints the normalized controller: overrides applied,
//! synced layers flattened, masks propagated from the base layer, and
//! invalid built-in parameters removed.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

use avatar_compose::config;
use avatar_compose::controller::{LayerType, RuntimeController, VfController};

/// Document format for the normalized controller.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DocumentFormat {
    #[default]
    Yaml,
    Json,
}

/// Normalize a runtime controller document
#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Path to the controller document.
    #[arg(value_name = "CONTROLLER")]
    pub controller: PathBuf,

    /// Which playable layer the controller drives.
    #[arg(long, value_name = "TYPE", default_value = "fx")]
    pub layer_type: LayerType,

    /// Output format.
    #[arg(long, value_enum, default_value_t = DocumentFormat::Yaml)]
    pub format: DocumentFormat,
}

/// Execute the `normalize` command.
pub fn execute(args: NormalizeArgs) -> Result<()> {
    let source: RuntimeController = config::load_document(&args.controller)
        .with_context(|| format!("Failed to load controller from {}", args.controller.display()))?;

    let Some(normalized) = VfController::copy_and_load(Some(&source), args.layer_type) else {
        anyhow::bail!(
            "{} does not lead to an animator controller",
            args.controller.display()
        );
    };

    match args.format {
        DocumentFormat::Yaml => print!("{}", config::to_yaml_string(normalized.raw())?),
        DocumentFormat::Json => println!("{}", serde_json::to_string_pretty(normalized.raw())?),
    }
    Ok(())
}
