//! `docforge` - metadata automation for Markdown documentation vaults
//!
//! Reads the YAML front matter of an Obsidian/MkDocs documentation tree to
//! build an index page, keep `updated` dates current, check wikilinks and
//! required metadata, and generate AI summaries of individual documents.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod check;
pub mod cli;
pub mod collect;
pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod ledger;
pub mod links;
pub mod logging;
pub mod summary;
pub mod timestamps;

pub use check::{run_checks, CheckReport, Finding, Rule, Severity};
pub use collect::{collect_documents, CollectOptions};
pub use config::Config;
pub use document::{DocMetadata, Document};
pub use error::{Error, Result};
pub use index::IndexBuilder;
pub use ledger::{Ledger, LedgerEntry, LedgerStats};
pub use links::{extract_wikilinks, LinkResolver, WikiLink};
pub use logging::init_logging;
pub use summary::{LlmProvider, OpenAiProvider, Summarizer, SummaryOptions, SummaryOutcome};
pub use timestamps::{stamp_file, stamp_files, StampOutcome, StampReport};
