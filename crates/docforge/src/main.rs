//! `docforge` - CLI for documentation metadata automation
//!
//! Regenerates the index page, stamps `updated` dates, checks the vault,
//! and generates AI summaries.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tracing::debug;

use docforge::check::run_checks;
use docforge::cli::{
    CheckCommand, Cli, Command, ConfigCommand, IndexCommand, LedgerCommand, ListCommand,
    OutputFormat, StampCommand, SummarizeCommand,
};
use docforge::collect::{collect_documents, CollectOptions};
use docforge::index::IndexBuilder;
use docforge::ledger::Ledger;
use docforge::summary::{
    current_summary, OpenAiProvider, Summarizer, SummaryOptions, SummaryOutcome,
};
use docforge::timestamps::{stamp_files, StampOutcome};
use docforge::{init_logging, Config, Document, Error};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Index(cmd) => handle_index(&config, &cmd),
        Command::Stamp(cmd) => handle_stamp(&cmd),
        Command::Summarize(cmd) => handle_summarize(&config, &cmd).await,
        Command::Check(cmd) => handle_check(&config, &cmd),
        Command::List(cmd) => handle_list(&config, &cmd),
        Command::Ledger(cmd) => handle_ledger(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cli.config.as_deref(), cmd),
    }
}

fn load_documents(config: &Config, root: Option<&Path>) -> anyhow::Result<Vec<Document>> {
    let root = root.unwrap_or(&config.docs.root);
    let documents = collect_documents(root, &CollectOptions::from_config(config))
        .with_context(|| format!("collecting documents under {}", root.display()))?;
    Ok(documents)
}

fn handle_index(config: &Config, cmd: &IndexCommand) -> anyhow::Result<ExitCode> {
    let documents = load_documents(config, cmd.root.as_deref())?;
    let builder = IndexBuilder::new(config, &documents);
    let today = Local::now().date_naive();

    if cmd.stdout {
        print!("{}", builder.render(today));
    } else {
        let output = cmd.output.as_ref().unwrap_or(&config.docs.index_path);
        builder.write_to(output, today)?;
        println!(
            "Index written to {} ({} documents in {} sections)",
            output.display(),
            builder.document_count(),
            builder.section_count()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_stamp(cmd: &StampCommand) -> anyhow::Result<ExitCode> {
    let today = cmd.date.unwrap_or_else(|| Local::now().date_naive());
    let report = stamp_files(&cmd.files, today);

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain | OutputFormat::Table => {
            for (path, outcome) in &report.entries {
                match outcome {
                    StampOutcome::Updated | StampOutcome::Created => {
                        println!("Updated timestamp: {}", path.display());
                    }
                    StampOutcome::Skipped(reason) => {
                        debug!(path = %path.display(), %reason, "not stamped");
                    }
                    StampOutcome::Unchanged => {}
                }
            }
            if report.modified_count() == 0 {
                println!("No timestamps updated.");
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn handle_summarize(config: &Config, cmd: &SummarizeCommand) -> anyhow::Result<ExitCode> {
    let options = cmd.apply(SummaryOptions::from_config(&config.summary));
    options.validate()?;
    if !cmd.file.is_file() {
        return Err(Error::DocumentNotFound {
            path: cmd.file.clone(),
        }
        .into());
    }

    let ledger = if config.ledger.enabled && !cmd.no_ledger {
        Some(Ledger::open(config.ledger_path())?)
    } else {
        None
    };
    if let Some(output) = ledger
        .as_ref()
        .map(|ledger| current_summary(ledger, &cmd.file, &options))
        .transpose()?
        .flatten()
    {
        print_up_to_date(&output);
        return Ok(ExitCode::SUCCESS);
    }

    let provider = Arc::new(OpenAiProvider::from_config(&config.summary)?);
    let mut summarizer = Summarizer::new(provider);
    if let Some(ledger) = ledger {
        summarizer = summarizer.with_ledger(ledger);
    }

    match summarizer.summarize_file(&cmd.file, &options).await? {
        SummaryOutcome::Written { output, model } => {
            println!("Summary written to {} ({model})", output.display());
        }
        SummaryOutcome::UpToDate { output } => print_up_to_date(&output),
    }
    Ok(ExitCode::SUCCESS)
}

fn print_up_to_date(output: &Path) {
    println!(
        "Summary is up to date: {} (use --force to regenerate)",
        output.display()
    );
}

fn handle_check(config: &Config, cmd: &CheckCommand) -> anyhow::Result<ExitCode> {
    let documents = load_documents(config, cmd.root.as_deref())?;
    let report = run_checks(&config.check, &documents);

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain | OutputFormat::Table => {
            for finding in &report.findings {
                println!("{finding}");
            }
            println!(
                "{} documents checked: {} errors, {} warnings",
                report.documents_checked,
                report.error_count(),
                report.warning_count()
            );
        }
    }

    Ok(if report.is_failure(cmd.strict) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn handle_list(config: &Config, cmd: &ListCommand) -> anyhow::Result<ExitCode> {
    let documents: Vec<Document> = load_documents(config, cmd.root.as_deref())?
        .into_iter()
        .filter(|d| cmd.section.as_ref().is_none_or(|s| &d.section == s))
        .collect();

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&documents)?),
        OutputFormat::Plain => {
            for doc in &documents {
                println!("{}\t{}\t{}", doc.rel_path, doc.display_title(), doc.status());
            }
        }
        OutputFormat::Table => {
            let width = documents
                .iter()
                .map(|d| d.rel_path.len())
                .max()
                .unwrap_or(4)
                .max(4);
            println!("{:<width$}  {:<10}  {:<10}  TITLE", "PATH", "STATUS", "UPDATED");
            for doc in &documents {
                println!(
                    "{:<width$}  {:<10}  {:<10}  {}",
                    doc.rel_path,
                    doc.status(),
                    doc.updated(),
                    doc.display_title()
                );
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_ledger(config: &Config, cmd: &LedgerCommand) -> anyhow::Result<ExitCode> {
    let ledger = Ledger::open(config.ledger_path())?;

    match cmd {
        LedgerCommand::List { limit, format } => {
            let entries = ledger.recent(*limit)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
                OutputFormat::Plain | OutputFormat::Table => {
                    if entries.is_empty() {
                        println!("No summaries recorded.");
                    }
                    for entry in &entries {
                        println!(
                            "{}  {:<16}  {}  {}",
                            entry.created_at.format("%Y-%m-%d %H:%M"),
                            entry.model,
                            entry.content_hash.get(..12).unwrap_or(&entry.content_hash),
                            entry.source_path
                        );
                    }
                }
            }
        }
        LedgerCommand::Prune => {
            let removed = ledger.prune_missing()?;
            println!("Removed {removed} entries for missing documents");
        }
        LedgerCommand::Stats { json } => {
            let stats = ledger.stats()?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                let date = |d: Option<chrono::DateTime<chrono::Utc>>| {
                    d.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string())
                };
                println!("Ledger:            {}", ledger.path().display());
                println!("Summaries:         {}", stats.total_entries);
                println!("Documents:         {}", stats.distinct_sources);
                println!("Oldest:            {}", date(stats.oldest_entry));
                println!("Newest:            {}", date(stats.newest_entry));
                println!("Size (bytes):      {}", stats.db_size_bytes);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_config(
    config: &Config,
    explicit_path: Option<&Path>,
    cmd: ConfigCommand,
) -> anyhow::Result<ExitCode> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Docs]");
                println!("  Root:               {}", config.docs.root.display());
                println!("  Index path:         {}", config.docs.index_path.display());
                println!("  Excluded files:     {}", config.docs.excluded_files.join(", "));
                println!("  Exclude summaries:  {}", config.docs.exclude_summaries);
                println!();
                println!("[Check]");
                println!("  Required keys:      {}", config.check.required_keys.join(", "));
                println!("  MOC page:           {}", config.check.moc_page);
                println!("  Home page:          {}", config.check.home_page);
                println!();
                println!("[Summary]");
                println!("  Model:              {}", config.summary.model);
                println!("  Max tokens:         {}", config.summary.max_tokens);
                println!("  Temperature:        {}", config.summary.temperature);
                println!("  API base:           {}", config.summary.api_base);
                println!("  API key variable:   {}", config.summary.api_key_env);
                println!();
                println!("[Ledger]");
                println!("  Enabled:            {}", config.ledger.enabled);
                println!("  Database path:      {}", config.ledger_path().display());
            }
        }
        ConfigCommand::Path => {
            let path = explicit_path.map_or_else(Config::default_config_path, Path::to_path_buf);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path: PathBuf = file
                .or_else(|| explicit_path.map(Path::to_path_buf))
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => {
                    println!("Configuration error: {e}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
