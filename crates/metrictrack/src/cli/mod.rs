//! Command-line interface for metrictrack.
//!
//! This module provides the CLI structure for the `mtrack` binary. Each
//! subcommand plays the part of one form or button of the tracker.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ClearCommand, ConfigCommand, ExportCommand, ImportCommand, ListCommand,
    RemoveCommand, ReportCommand, SummaryCommand,
};

use crate::logging::Verbosity;

/// mtrack - Track monthly indicators and generate reports
///
/// Records named values per reporting month and section, keeps them in a
/// local database, and fills report templates from them.
#[derive(Debug, Parser)]
#[command(name = "mtrack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Show a single list instead of section groups (positions follow)
    #[arg(long, global = true)]
    pub flat: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a metric
    Add(AddCommand),

    /// Show metrics, newest period first
    List(ListCommand),

    /// Delete a metric by its displayed position
    Remove(RemoveCommand),

    /// Delete all metrics
    Clear(ClearCommand),

    /// Generate the report of one metric
    Report(ReportCommand),

    /// Generate one combined report for several metrics
    Summary(SummaryCommand),

    /// Export all metrics as JSON
    Export(ExportCommand),

    /// Replace all metrics with an exported JSON file
    Import(ImportCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                2 => Verbosity::Debug,
                _ => Verbosity::Trace,
            }
        }
    }
}
