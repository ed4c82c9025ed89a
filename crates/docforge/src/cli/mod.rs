//! Command-line interface for docforge.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    CheckCommand, ConfigCommand, IndexCommand, LedgerCommand, ListCommand, OutputFormat,
    StampCommand, SummarizeCommand,
};

/// docforge - metadata automation for Markdown documentation vaults
///
/// Builds the documentation index from front matter, stamps `updated`
/// dates, checks links and required metadata, and generates AI summaries.
#[derive(Debug, Parser)]
#[command(name = "docforge")]
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
    /// Regenerate the documentation index page
    Index(IndexCommand),

    /// Set `updated` to today's date in the given files
    Stamp(StampCommand),

    /// Generate an AI summary for a Markdown document
    Summarize(SummarizeCommand),

    /// Check front matter, wikilinks, and navigation pages
    Check(CheckCommand),

    /// List documents with their metadata
    List(ListCommand),

    /// Inspect or prune the summary ledger
    #[command(subcommand)]
    Ledger(LedgerCommand),

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
