//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::part::PartId;
use crate::status::StatusLabel;

/// Classify command arguments.
#[derive(Debug, Args)]
pub struct ClassifyCommand {
    /// Tracking number, link or carrier label
    pub tracking: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Refresh command arguments.
#[derive(Debug, Args)]
pub struct RefreshCommand {
    /// Part id
    pub id: PartId,
}

/// Part commands.
#[derive(Debug, Subcommand)]
pub enum PartCommand {
    /// Record a new part
    Add {
        /// What the part is
        name: String,

        /// Tracking number, link or carrier label
        #[arg(short, long)]
        tracking: Option<String>,

        /// Initial status
        #[arg(short, long, value_enum, default_value = "pending")]
        status: StatusArg,
    },

    /// List all parts
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show a part, refreshing stale tracking
    Show {
        /// Part id
        id: PartId,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,

        /// Show every checkpoint instead of the latest few
        #[arg(short, long)]
        all: bool,
    },

    /// Replace a part's tracking value
    SetTracking {
        /// Part id
        id: PartId,

        /// New tracking number, link or carrier label
        tracking: String,
    },

    /// Move a part to a new status
    SetStatus {
        /// Part id
        id: PartId,

        /// Target status
        #[arg(value_enum)]
        status: StatusArg,

        /// Tracking number to record when marking shipped
        #[arg(short, long, conflicts_with = "skip_tracking")]
        tracking: Option<String>,

        /// Mark shipped without asking for a tracking number
        #[arg(long)]
        skip_tracking: bool,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Status argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    /// Not yet bought
    Pending,
    /// Ordered
    Purchased,
    /// On its way
    Shipped,
    /// Arrived
    Delivered,
}

impl From<StatusArg> for StatusLabel {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => Self::Pending,
            StatusArg::Purchased => Self::Purchased,
            StatusArg::Shipped => Self::Shipped,
            StatusArg::Delivered => Self::Delivered,
        }
    }
}
