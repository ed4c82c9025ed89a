//! Markdown documents and their front matter.
//!
//! A [`Document`] is one Markdown file inside the docs tree. Its section is
//! the first directory below the docs root, which is how the generated index
//! groups pages.

mod frontmatter;
mod metadata;

use std::path::{Path, PathBuf};

use serde::Serialize;

pub use frontmatter::{render, scalar_to_string, split, Frontmatter, DELIMITER};
pub use metadata::{DocMetadata, KNOWN_KEYS};

use crate::error::{Error, Result};

/// Status shown for documents that do not declare one.
pub const DEFAULT_STATUS: &str = "draft";

/// Update date shown for documents that do not declare one.
pub const DEFAULT_UPDATED: &str = "n/a";

/// A Markdown file in the documentation tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Path relative to the docs root, `/`-separated.
    pub rel_path: String,
    /// First path component, or empty for top-level files.
    pub section: String,
    /// Parsed front matter.
    pub metadata: DocMetadata,
    /// Whether a valid front matter block was found.
    pub has_frontmatter: bool,
    /// Whether a front matter block was present but unusable.
    pub malformed_frontmatter: bool,
    /// Content after the front matter.
    #[serde(skip)]
    pub body: String,
    /// 1-based file line on which `body` starts.
    #[serde(skip)]
    pub body_line: usize,
}

impl Document {
    /// Build a document from its relative path and file contents.
    #[must_use]
    pub fn from_text(rel_path: impl Into<String>, text: &str) -> Self {
        let rel_path = normalize_rel_path(&rel_path.into());
        let parsed = split(text);
        let section = rel_path
            .split_once('/')
            .map(|(first, _)| first.to_string())
            .unwrap_or_default();

        Self {
            section,
            metadata: parsed.metadata(),
            has_frontmatter: parsed.has_frontmatter(),
            malformed_frontmatter: parsed.is_malformed(),
            body: parsed.body().to_string(),
            body_line: parsed.body_line(),
            rel_path,
        }
    }

    /// Read a document from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not below `root` or cannot be read.
    pub fn load(root: &Path, path: &Path) -> Result<Self> {
        let rel = path.strip_prefix(root).map_err(|_| {
            Error::internal(format!(
                "{} is not inside {}",
                path.display(),
                root.display()
            ))
        })?;
        let text = std::fs::read_to_string(path).map_err(|source| Error::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_text(rel.to_string_lossy(), &text))
    }

    /// File name without the `.md` extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        let name = self.rel_path.rsplit('/').next().unwrap_or(&self.rel_path);
        name.strip_suffix(".md").unwrap_or(name)
    }

    /// File name including extension.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.rel_path.rsplit('/').next().unwrap_or(&self.rel_path)
    }

    /// Title from front matter, or one derived from the file name.
    ///
    /// `api-style-guide.md` becomes `Api Style Guide`.
    #[must_use]
    pub fn display_title(&self) -> String {
        self.metadata
            .title
            .clone()
            .unwrap_or_else(|| title_case(&self.stem().replace('-', " ")))
    }

    /// Declared status, or [`DEFAULT_STATUS`].
    #[must_use]
    pub fn status(&self) -> &str {
        self.metadata.status.as_deref().unwrap_or(DEFAULT_STATUS)
    }

    /// Declared update date, or [`DEFAULT_UPDATED`].
    #[must_use]
    pub fn updated(&self) -> &str {
        self.metadata.updated.as_deref().unwrap_or(DEFAULT_UPDATED)
    }

    /// File line for a 1-based line number within the body.
    #[must_use]
    pub fn file_line(&self, body_line: usize) -> usize {
        self.body_line + body_line.saturating_sub(1)
    }

    /// Absolute location of this document below `root`.
    #[must_use]
    pub fn path_in(&self, root: &Path) -> PathBuf {
        root.join(&self.rel_path)
    }
}

/// Title-case each whitespace-separated word.
///
/// The first letter of a word is upper-cased and the rest lower-cased.
#[must_use]
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn normalize_rel_path(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches("./").to_string()
}
