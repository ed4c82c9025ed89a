//! Front matter `updated:` stamping.
//!
//! Meant to run in CI over the Markdown files changed by a commit. Files
//! that are not Markdown, that no longer exist, or whose front matter cannot
//! be parsed are skipped without failing the run.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info, warn};

use crate::document::{render, scalar_to_string, split, DELIMITER};
use crate::error::{Error, Result};

/// Front matter key that gets stamped.
pub const UPDATED_KEY: &str = "updated";

/// Why a file was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The file does not have a `.md` extension.
    NotMarkdown,
    /// The file does not exist.
    Missing,
    /// The front matter block could not be parsed.
    Malformed,
    /// The file could not be read or written.
    Unreadable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotMarkdown => write!(f, "not markdown"),
            Self::Missing => write!(f, "missing"),
            Self::Malformed => write!(f, "malformed front matter"),
            Self::Unreadable => write!(f, "unreadable"),
        }
    }
}

/// What stamping did to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "reason")]
pub enum StampOutcome {
    /// An existing front matter block got a new `updated` value.
    Updated,
    /// A front matter block was created for the file.
    Created,
    /// `updated` already held today's date.
    Unchanged,
    /// The file was not touched.
    Skipped(SkipReason),
}

impl StampOutcome {
    /// Check if the file was rewritten.
    #[must_use]
    pub fn modified(self) -> bool {
        matches!(self, Self::Updated | Self::Created)
    }
}

/// Outcomes for a batch of files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StampReport {
    /// One entry per input path, in input order.
    pub entries: Vec<(PathBuf, StampOutcome)>,
}

impl StampReport {
    /// Paths that were rewritten.
    pub fn modified(&self) -> impl Iterator<Item = &Path> {
        self.entries
            .iter()
            .filter(|(_, outcome)| outcome.modified())
            .map(|(path, _)| path.as_path())
    }

    /// Number of rewritten files.
    #[must_use]
    pub fn modified_count(&self) -> usize {
        self.modified().count()
    }
}

/// Set `updated: <today>` in one file's front matter.
///
/// # Errors
///
/// Returns an error when an existing Markdown file cannot be read or
/// written, or its front matter cannot be rendered back.
pub fn stamp_file(path: &Path, today: NaiveDate) -> Result<StampOutcome> {
    if path.extension().is_none_or(|ext| ext != "md") {
        return Ok(StampOutcome::Skipped(SkipReason::NotMarkdown));
    }
    if !path.is_file() {
        return Ok(StampOutcome::Skipped(SkipReason::Missing));
    }

    let text = std::fs::read_to_string(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let today = today.format("%Y-%m-%d").to_string();

    let stamped =
        stamp_text(&text, &today).map_err(|e| Error::frontmatter(path, e.to_string()))?;
    let (content, outcome) = match stamped {
        Stamped::Unchanged => return Ok(StampOutcome::Unchanged),
        Stamped::Malformed => {
            warn!(path = %path.display(), "front matter is malformed; leaving file untouched");
            return Ok(StampOutcome::Skipped(SkipReason::Malformed));
        }
        Stamped::Updated(content) => (content, StampOutcome::Updated),
        Stamped::Created(content) => (content, StampOutcome::Created),
    };

    std::fs::write(path, content).map_err(|source| Error::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "timestamp updated");
    Ok(outcome)
}

/// Stamp every path in `paths`, in order.
///
/// A file that fails is logged and reported as
/// [`SkipReason::Unreadable`]; the remaining files are still stamped.
#[must_use]
pub fn stamp_files<P: AsRef<Path>>(paths: &[P], today: NaiveDate) -> StampReport {
    let mut report = StampReport::default();
    for path in paths {
        let path = path.as_ref();
        let outcome = stamp_file(path, today).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "could not stamp file");
            StampOutcome::Skipped(SkipReason::Unreadable)
        });
        debug!(path = %path.display(), ?outcome, "stamp result");
        report.entries.push((path.to_path_buf(), outcome));
    }
    report
}

enum Stamped {
    Updated(String),
    Created(String),
    Unchanged,
    Malformed,
}

fn stamp_text(text: &str, today: &str) -> Result<Stamped> {
    let parsed = split(text);

    if parsed.is_malformed() {
        return Ok(Stamped::Malformed);
    }

    let Some(mut mapping) = parsed.mapping().cloned() else {
        let mut mapping = Mapping::new();
        mapping.insert(Value::from(UPDATED_KEY), Value::from(today));
        let yaml = serde_yaml::to_string(&mapping)?;
        return Ok(Stamped::Created(format!(
            "{DELIMITER}\n{}\n{DELIMITER}\n\n{}\n",
            yaml.trim_end(),
            text.trim()
        )));
    };

    let current = mapping.get(UPDATED_KEY).and_then(scalar_to_string);
    if current.as_deref() == Some(today) {
        return Ok(Stamped::Unchanged);
    }

    // Replaces in place when the key exists, appends otherwise
    mapping.insert(Value::from(UPDATED_KEY), Value::from(today));
    Ok(Stamped::Updated(render(&mapping, parsed.body())?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_updates_existing_value_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "doc.md",
            "---\ntitle: Doc\nupdated: 2023-01-01\nstatus: draft\n---\n\n# Body\n",
        );

        assert_eq!(stamp_file(&path, today()).unwrap(), StampOutcome::Updated);

        let text = std::fs::read_to_string(&path).unwrap();
        let doc = Document::from_text("doc.md", &text);
        assert_eq!(doc.metadata.updated.as_deref(), Some("2024-06-01"));

        // Key order kept: title, updated, status
        let title = text.find("title").unwrap();
        let updated = text.find("updated").unwrap();
        let status = text.find("status").unwrap();
        assert!(title < updated && updated < status);
        assert!(text.ends_with("---\n\n# Body\n"));
    }

    #[test]
    fn test_inserts_missing_key_at_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "doc.md", "---\ntitle: Doc\n---\nBody");

        assert_eq!(stamp_file(&path, today()).unwrap(), StampOutcome::Updated);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.find("title").unwrap() < text.find("updated").unwrap());
        assert!(text.ends_with("\n\nBody"));
    }

    #[test]
    fn test_unchanged_when_already_today() {
        let dir = tempfile::tempdir().unwrap();
        let original = "---\nupdated: 2024-06-01\n---\nBody";
        let path = write(dir.path(), "doc.md", original);

        assert_eq!(stamp_file(&path, today()).unwrap(), StampOutcome::Unchanged);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_creates_block_without_frontmatter() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "doc.md", "\n\n# Heading\n\nText\n\n");

        assert_eq!(stamp_file(&path, today()).unwrap(), StampOutcome::Created);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("---\nupdated:"));
        assert!(text.contains("2024-06-01"));
        assert!(text.ends_with("---\n\n# Heading\n\nText\n"));
    }

    #[test]
    fn test_malformed_frontmatter_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let original = "---\ntitle: [broken\n---\nBody";
        let path = write(dir.path(), "doc.md", original);

        assert_eq!(
            stamp_file(&path, today()).unwrap(),
            StampOutcome::Skipped(SkipReason::Malformed)
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_unclosed_frontmatter_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let original = "---\ntitle: Open\nBody";
        let path = write(dir.path(), "doc.md", original);

        assert_eq!(
            stamp_file(&path, today()).unwrap(),
            StampOutcome::Skipped(SkipReason::Malformed)
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_non_markdown_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "notes.txt", "text");

        assert_eq!(
            stamp_file(&path, today()).unwrap(),
            StampOutcome::Skipped(SkipReason::NotMarkdown)
        );
    }

    #[test]
    fn test_missing_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.md");

        assert_eq!(
            stamp_file(&path, today()).unwrap(),
            StampOutcome::Skipped(SkipReason::Missing)
        );
    }

    #[test]
    fn test_stamp_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "doc.md", "---\ntitle: Doc\n---\n\nBody\n");

        stamp_file(&path, today()).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        assert_eq!(stamp_file(&path, today()).unwrap(), StampOutcome::Unchanged);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn test_stamp_files_report() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.md", "# A");
        let b = write(dir.path(), "b.txt", "B");
        let c = write(dir.path(), "c.md", "---\nupdated: 2024-06-01\n---\n");

        let report = stamp_files(&[&a, &b, &c], today());

        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.modified_count(), 1);
        assert_eq!(report.modified().next(), Some(a.as_path()));
        assert_eq!(report.entries[2].1, StampOutcome::Unchanged);
    }

    #[test]
    fn test_invalid_utf8_does_not_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("a.md");
        std::fs::write(&bad, [0xff, 0xfe, b'x']).unwrap();
        let good = write(dir.path(), "b.md", "---\ntitle: B\n---\nBody");

        let err = stamp_file(&bad, today()).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));

        let report = stamp_files(&[&bad, &good], today());

        assert_eq!(
            report.entries[0].1,
            StampOutcome::Skipped(SkipReason::Unreadable)
        );
        assert_eq!(report.entries[1].1, StampOutcome::Updated);
        let text = std::fs::read_to_string(&good).unwrap();
        assert!(text.contains("2024-06-01"));
        assert_eq!(std::fs::read(&bad).unwrap(), vec![0xff, 0xfe, b'x']);
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::Malformed.to_string(), "malformed front matter");
        assert_eq!(SkipReason::Unreadable.to_string(), "unreadable");
        assert!(!StampOutcome::Skipped(SkipReason::Missing).modified());
        assert!(StampOutcome::Created.modified());
    }
}
