//! Command-line interface for partstrack.
//!
//! This module provides the CLI structure for the `partstrack` binary. The
//! handlers live in `main.rs`.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ClassifyCommand, ConfigCommand, PartCommand, RefreshCommand};

/// partstrack - Track shipments for your restoration parts
///
/// Classifies tracking numbers, records part status and keeps carrier
/// checkpoints up to date.
#[derive(Debug, Parser)]
#[command(name = "partstrack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Identify the carrier of a tracking string
    Classify(ClassifyCommand),

    /// Add, inspect and update parts
    #[command(subcommand)]
    Part(PartCommand),

    /// Fetch the latest tracking for a part
    Refresh(RefreshCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
