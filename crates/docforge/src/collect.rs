//! Documentation tree traversal.

use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::document::Document;
use crate::error::{Error, Result};

/// Suffix of generated summary files.
pub const SUMMARY_SUFFIX: &str = ".summary.md";

/// Which files to skip while walking the docs tree.
#[derive(Debug, Clone, Default)]
pub struct CollectOptions {
    /// File names that are never documents.
    pub excluded_files: Vec<String>,
    /// Skip generated `*.summary.md` files.
    pub exclude_summaries: bool,
}

impl CollectOptions {
    /// Options from the `[docs]` configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            excluded_files: config.excluded_file_names(),
            exclude_summaries: config.docs.exclude_summaries,
        }
    }

    fn accepts(&self, file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .is_some_and(|ext| ext == "md")
            && !self.excluded_files.iter().any(|f| f == file_name)
            && !(self.exclude_summaries && file_name.ends_with(SUMMARY_SUFFIX))
    }
}

/// Collect every Markdown document below `root`, sorted by relative path.
///
/// Entries that cannot be read, including unreadable directories and
/// symlink loops, are logged and skipped.
///
/// # Errors
///
/// Returns an error if `root` does not exist.
pub fn collect_documents(root: &Path, options: &CollectOptions) -> Result<Vec<Document>> {
    if !root.is_dir() {
        return Err(Error::DocsDirNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry in docs tree");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if !options.accepts(&file_name) {
            continue;
        }

        match Document::load(root, entry.path()) {
            Ok(doc) => {
                debug!(path = %doc.rel_path, section = %doc.section, "collected document");
                documents.push(doc);
            }
            Err(e) => warn!(path = %entry.path().display(), error = %e, "skipping unreadable document"),
        }
    }

    documents.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    debug!(count = documents.len(), root = %root.display(), "collection finished");
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    fn options() -> CollectOptions {
        CollectOptions {
            excluded_files: vec!["auto-index.md".to_string()],
            exclude_summaries: true,
        }
    }

    #[test]
    fn test_collects_markdown_recursively_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "workflows/publish.md", "# Publish");
        write(dir.path(), "index.md", "# Home");
        write(dir.path(), "api/style.md", "# Style");
        write(dir.path(), "api/notes.txt", "not markdown");

        let docs = collect_documents(dir.path(), &options()).unwrap();
        let paths: Vec<_> = docs.iter().map(|d| d.rel_path.as_str()).collect();

        assert_eq!(paths, vec!["api/style.md", "index.md", "workflows/publish.md"]);
    }

    #[test]
    fn test_excludes_index_and_summaries() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "system/auto-index.md", "generated");
        write(dir.path(), "system/overview.md", "# Overview");
        write(dir.path(), "system/overview.summary.md", "summary");

        let docs = collect_documents(dir.path(), &options()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].rel_path, "system/overview.md");
    }

    #[test]
    fn test_summaries_included_when_not_excluded() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "overview.summary.md", "summary");

        let opts = CollectOptions::default();
        let docs = collect_documents(dir.path(), &opts).unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn test_missing_root_is_error() {
        let err = collect_documents(Path::new("/nonexistent/docs"), &options()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.md", "# Home");
        write(dir.path(), "sub/page.md", "# Page");
        std::os::unix::fs::symlink("..", dir.path().join("sub").join("loop")).unwrap();

        let docs = collect_documents(dir.path(), &options()).unwrap();
        let paths: Vec<_> = docs.iter().map(|d| d.rel_path.as_str()).collect();

        assert_eq!(paths, vec!["index.md", "sub/page.md"]);
    }

    #[test]
    fn test_invalid_utf8_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.md", "# Home");
        std::fs::write(dir.path().join("binary.md"), [0xff, 0xfe, b'x']).unwrap();

        let docs = collect_documents(dir.path(), &options()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].rel_path, "index.md");
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.docs.index_path = "docs/catalog.md".into();
        config.docs.exclude_summaries = false;

        let opts = CollectOptions::from_config(&config);
        assert!(opts.excluded_files.contains(&"catalog.md".to_string()));
        assert!(opts.excluded_files.contains(&"auto-index.md".to_string()));
        assert!(!opts.exclude_summaries);
    }
}
