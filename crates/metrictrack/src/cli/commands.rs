//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::period::Period;

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Indicator name
    pub name: String,

    /// Indicator value (kept as text)
    pub value: String,

    /// Reporting month as YYYY-MM (defaults to the current month)
    #[arg(short, long, value_parser = parse_period)]
    pub period: Option<Period>,

    /// Section the indicator belongs to
    #[arg(short, long)]
    pub section: Option<String>,

    /// Alternate report template file name
    #[arg(short, long)]
    pub template: Option<String>,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Collapse a section group (repeatable)
    #[arg(long, value_name = "SECTION")]
    pub collapse: Vec<String>,

    /// Output the view model as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Remove command arguments.
#[derive(Debug, Args)]
pub struct RemoveCommand {
    /// Display position of the metric, as shown by `list`
    pub position: usize,
}

/// Clear command arguments.
#[derive(Debug, Args)]
pub struct ClearCommand {
    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Report command arguments.
#[derive(Debug, Args)]
pub struct ReportCommand {
    /// Display position of the metric, as shown by `list`
    pub position: usize,
}

/// Summary command arguments.
#[derive(Debug, Args)]
pub struct SummaryCommand {
    /// Display positions of the metrics to combine
    #[arg(required = true, num_args = 1..)]
    pub positions: Vec<usize>,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Write to this file (or into this directory) instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// JSON file produced by `export`
    pub file: PathBuf,
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

fn parse_period(text: &str) -> Result<Period, String> {
    Period::parse(text).map_err(|e| e.to_string())
}
