//! Auto-generated documentation index.
//!
//! Groups documents by top-level section and renders a Markdown page with a
//! one-line metadata summary per document:
//!
//! ```markdown
//! ## API Documentation
//!
//! - [API Style Guide](api/style-guide.md) — status: `draft` · updated: `2024-05-01` · tags: `api`
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use chrono::NaiveDate;
use tracing::info;

use crate::config::Config;
use crate::document::Document;
use crate::error::{Error, Result};

/// Builds the index page from a set of documents.
#[derive(Debug)]
pub struct IndexBuilder<'a> {
    config: &'a Config,
    sections: BTreeMap<String, Vec<&'a Document>>,
}

impl<'a> IndexBuilder<'a> {
    /// Group `documents` by section.
    #[must_use]
    pub fn new(config: &'a Config, documents: &'a [Document]) -> Self {
        let mut sections: BTreeMap<String, Vec<&Document>> = BTreeMap::new();
        for doc in documents {
            sections.entry(doc.section.clone()).or_default().push(doc);
        }
        for docs in sections.values_mut() {
            docs.sort_by_cached_key(|d| d.display_title().to_lowercase());
        }
        Self { config, sections }
    }

    /// Number of sections that will be rendered.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Number of documents that will be listed.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }

    /// Render the index page for the given date.
    #[must_use]
    pub fn render(&self, today: NaiveDate) -> String {
        let mut out = String::new();

        // Writing to a String cannot fail
        let _ = write!(
            out,
            "---\ntitle: {}\nupdated: {}\nstatus: generated\ntype: index\n---\n\n",
            self.config.index.title,
            today.format("%Y-%m-%d")
        );
        out.push_str("# Documentation Index\n\n");
        out.push_str("> This page is generated automatically from YAML metadata.\n\n");

        for (key, docs) in &self.sections {
            let _ = writeln!(out, "## {}\n", self.config.section_name(key));
            for doc in docs {
                let _ = writeln!(out, "{}", entry_line(doc));
            }
            out.push('\n');
        }

        out
    }

    /// Render and write the index page, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn write_to(&self, path: &Path, today: NaiveDate) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        std::fs::write(path, self.render(today)).map_err(|source| Error::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;

        info!(
            path = %path.display(),
            sections = self.section_count(),
            documents = self.document_count(),
            "index written"
        );
        Ok(())
    }
}

fn entry_line(doc: &Document) -> String {
    let mut summary = format!(
        "status: `{}` · updated: `{}`",
        doc.status(),
        doc.updated()
    );

    if let Some(version) = &doc.metadata.version {
        let _ = write!(summary, " · version: `{version}`");
    }

    let tags = if doc.metadata.tags.is_empty() {
        "`none`".to_string()
    } else {
        doc.metadata
            .tags
            .iter()
            .map(|t| format!("`{t}`"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let _ = write!(summary, " · tags: {tags}");

    format!("- [{}]({}) — {summary}", doc.display_title(), doc.rel_path)
}
