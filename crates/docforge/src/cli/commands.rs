//! CLI subcommand arguments.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::summary::SummaryOptions;

/// `index` arguments.
#[derive(Debug, Args)]
pub struct IndexCommand {
    /// Documentation root (overrides `docs.root`)
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Where to write the index (overrides `docs.index_path`)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the index instead of writing it
    #[arg(long)]
    pub stdout: bool,
}

/// `stamp` arguments.
#[derive(Debug, Args)]
pub struct StampCommand {
    /// Files to stamp; non-Markdown and missing paths are skipped
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Date to stamp instead of today (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub date: Option<NaiveDate>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// `summarize` arguments.
#[derive(Debug, Args)]
pub struct SummarizeCommand {
    /// Markdown file to summarize
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Model to use (overrides `summary.model`)
    #[arg(long)]
    pub model: Option<String>,

    /// Maximum tokens in the summary (overrides `summary.max_tokens`)
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Sampling temperature (overrides `summary.temperature`)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Summarize even if the ledger says the summary is current
    #[arg(short, long)]
    pub force: bool,

    /// Do not read or write the summary ledger
    #[arg(long)]
    pub no_ledger: bool,
}

impl SummarizeCommand {
    /// Apply command-line overrides to configured options.
    ///
    /// The result is not validated; call [`SummaryOptions::validate`].
    #[must_use]
    pub fn apply(&self, mut options: SummaryOptions) -> SummaryOptions {
        if let Some(model) = &self.model {
            options.model.clone_from(model);
        }
        if let Some(max_tokens) = self.max_tokens {
            options.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            options.temperature = temperature;
        }
        options.force = self.force;
        options
    }
}

/// `check` arguments.
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Documentation root (overrides `docs.root`)
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Fail on warnings as well as errors
    #[arg(long)]
    pub strict: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// `list` arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Documentation root (overrides `docs.root`)
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Only list documents in this section (top-level directory)
    #[arg(short, long)]
    pub section: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Summary ledger commands.
#[derive(Debug, Subcommand)]
pub enum LedgerCommand {
    /// List recorded summaries, newest first
    List {
        /// Maximum number of entries
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Remove entries whose source document no longer exists
    Prune,

    /// Show ledger statistics
    Stats {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
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

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Aligned columns
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SummaryConfig;

    fn summarize(model: Option<&str>, max_tokens: Option<u32>, temperature: Option<f32>) -> SummarizeCommand {
        SummarizeCommand {
            file: PathBuf::from("doc.md"),
            model: model.map(ToString::to_string),
            max_tokens,
            temperature,
            force: true,
            no_ledger: false,
        }
    }

    #[test]
    fn test_apply_overrides() {
        let base = SummaryOptions::from_config(&SummaryConfig::default());
        let options = summarize(Some("gpt-4o"), Some(900), Some(0.9)).apply(base);

        assert_eq!(options.model, "gpt-4o");
        assert_eq!(options.max_tokens, 900);
        assert!((options.temperature - 0.9).abs() < f32::EPSILON);
        assert!(options.force);
    }

    #[test]
    fn test_apply_keeps_configured_values() {
        let base = SummaryOptions::from_config(&SummaryConfig::default());
        let options = summarize(None, None, None).apply(base.clone());

        assert_eq!(options.model, base.model);
        assert_eq!(options.max_tokens, base.max_tokens);
    }

    #[test]
    fn test_apply_out_of_range_overrides_fail_validation() {
        let base = SummaryOptions::from_config(&SummaryConfig::default());

        let err = summarize(None, None, Some(7.0))
            .apply(base.clone())
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("temperature (7)"));

        let err = summarize(None, Some(0), None)
            .apply(base)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("max_tokens"));
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }
}
