//! AI-generated document summaries.
//!
//! [`Summarizer`] sends a document body to an [`LlmProvider`] and writes the
//! answer to `<stem>.summary.md` next to the source, carrying the source's
//! front matter forward with `generated`, `source`, and `type` set.

mod openai;
mod provider;

pub use openai::{resolve_api_key, OpenAiProvider};
pub use provider::{Completion, CompletionRequest, LlmProvider, MockLlmProvider};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::collect::SUMMARY_SUFFIX;
use crate::config::{SummaryConfig, TEMPERATURE_RANGE};
use crate::document::{render, split};
use crate::error::{Error, Result};
use crate::ledger::{compute_hash, Ledger, LedgerEntry};

/// System prompt used unless one is supplied.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a documentation engineer. Summarize the content of the \
Markdown document into a clean, structured technical summary. Your output MUST be Markdown. \
Avoid opinions. Keep it concise, informative, and suitable for a doc-as-code environment.\n\n\
Structure your output like this:\n\n\
## Overview\n- What the document covers\n\n\
## Key Points\n- Bullet list of essential concepts\n\n\
## Recommended Uses\n- Where this summary is useful\n";

/// Per-run model settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOptions {
    /// Model identifier.
    pub model: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Summarize even when the ledger says the summary is current.
    pub force: bool,
}

impl SummaryOptions {
    /// Options taken from the `[summary]` configuration.
    #[must_use]
    pub fn from_config(config: &SummaryConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            force: false,
        }
    }

    /// Check the values with the same rules as the `[summary]` section.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty model, zero `max_tokens`, or
    /// a temperature outside 0.0 to 2.0.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::validation("model must not be empty"));
        }
        if self.max_tokens == 0 {
            return Err(Error::validation("max_tokens must be greater than 0"));
        }
        if !TEMPERATURE_RANGE.contains(&self.temperature) {
            return Err(Error::validation(format!(
                "temperature ({}) must be between 0.0 and 2.0",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryOutcome {
    /// A summary was generated and written.
    Written {
        /// Summary file.
        output: PathBuf,
        /// Model that answered.
        model: String,
    },
    /// The existing summary matches the current body and model.
    UpToDate {
        /// Existing summary file.
        output: PathBuf,
    },
}

impl SummaryOutcome {
    /// Summary file path.
    #[must_use]
    pub fn output(&self) -> &Path {
        match self {
            Self::Written { output, .. } | Self::UpToDate { output } => output,
        }
    }
}

/// Output path for a source document: `guide.md` becomes `guide.summary.md`.
#[must_use]
pub fn summary_path(source: &Path) -> PathBuf {
    source.with_extension(SUMMARY_SUFFIX.trim_start_matches('.'))
}

/// Render a summary file from the source's front matter.
///
/// # Errors
///
/// Returns an error if the front matter cannot be serialized.
pub fn render_summary(source_meta: &Mapping, source_name: &str, summary: &str) -> Result<String> {
    let mut mapping = source_meta.clone();
    mapping.insert(Value::from("generated"), Value::from(true));
    mapping.insert(Value::from("source"), Value::from(source_name));
    mapping.insert(Value::from("type"), Value::from("summary"));
    render(&mapping, summary)
}

/// Generates summaries through a provider, optionally tracked in a ledger.
pub struct Summarizer {
    provider: Arc<dyn LlmProvider>,
    ledger: Option<Ledger>,
    system_prompt: String,
}

impl std::fmt::Debug for Summarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Summarizer")
            .field("ledger", &self.ledger)
            .field("system_prompt_len", &self.system_prompt.len())
            .finish_non_exhaustive()
    }
}

impl Summarizer {
    /// Create a summarizer without a ledger.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            ledger: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Track generated summaries in `ledger`.
    #[must_use]
    pub fn with_ledger(mut self, ledger: Ledger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Replace the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// The ledger, if one is attached.
    #[must_use]
    pub fn ledger(&self) -> Option<&Ledger> {
        self.ledger.as_ref()
    }

    /// Summarize one Markdown file.
    ///
    /// # Errors
    ///
    /// Returns a validation error for unusable `options`,
    /// [`Error::DocumentNotFound`] if `path` does not exist, a provider error
    /// if the model call fails, or an I/O or ledger error.
    pub async fn summarize_file(
        &self,
        path: &Path,
        options: &SummaryOptions,
    ) -> Result<SummaryOutcome> {
        options.validate()?;
        let text = read_source(path)?;
        let parsed = split(&text);
        let body = summary_input(parsed.body());
        let output = summary_path(path);
        let source_key = ledger_key(path);
        let hash = compute_hash(body);

        if let Some(ledger) = &self.ledger {
            if is_fresh(ledger, &source_key, &hash, &output, options)? {
                debug!(path = %path.display(), "summary is up to date");
                return Ok(SummaryOutcome::UpToDate { output });
            }
        }

        let request = CompletionRequest::new(&options.model, body)
            .with_system_prompt(&self.system_prompt)
            .with_max_tokens(options.max_tokens)
            .with_temperature(options.temperature);
        let completion = self.provider.complete(request).await?;

        let source_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let meta = parsed.mapping().cloned().unwrap_or_default();
        let content = render_summary(&meta, &source_name, &completion.content)?;

        std::fs::write(&output, content).map_err(|source| Error::FileWrite {
            path: output.clone(),
            source,
        })?;

        if let Some(ledger) = &self.ledger {
            ledger.record(&LedgerEntry::new(
                source_key,
                hash,
                &options.model,
                output.to_string_lossy(),
            ))?;
        }

        info!(
            source = %path.display(),
            output = %output.display(),
            model = %completion.model,
            "summary written"
        );
        Ok(SummaryOutcome::Written {
            output,
            model: completion.model,
        })
    }
}

/// The existing summary of `path`, if the ledger says it is current.
///
/// Lets callers skip building a provider when there is nothing to do.
///
/// # Errors
///
/// Returns [`Error::DocumentNotFound`] if `path` does not exist, or a read
/// or ledger error.
pub fn current_summary(
    ledger: &Ledger,
    path: &Path,
    options: &SummaryOptions,
) -> Result<Option<PathBuf>> {
    let text = read_source(path)?;
    let hash = compute_hash(summary_input(split(&text).body()));
    let output = summary_path(path);
    let fresh = is_fresh(ledger, &ledger_key(path), &hash, &output, options)?;
    Ok(fresh.then_some(output))
}

fn read_source(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(Error::DocumentNotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Text sent to the model: the body without leading blank lines.
fn summary_input(body: &str) -> &str {
    body.trim_start_matches(['\r', '\n'])
}

fn is_fresh(
    ledger: &Ledger,
    source_key: &str,
    hash: &str,
    output: &Path,
    options: &SummaryOptions,
) -> Result<bool> {
    Ok(!options.force && output.is_file() && ledger.is_current(source_key, hash, &options.model)?)
}

/// Ledger key for a source: its absolute path when resolvable.
fn ledger_key(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}
