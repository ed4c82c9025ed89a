//! YAML front matter splitting and rendering.
//!
//! Front matter is a YAML mapping at the top of a Markdown file, delimited by
//! lines containing only `---`:
//!
//! ```markdown
//! ---
//! title: API Style Guide
//! tags:
//!   - api
//! ---
//!
//! # API Style Guide
//! ```
//!
//! Mappings keep their key order, so rewriting a file never reshuffles the
//! author's metadata.

use serde_yaml::{Mapping, Value};
use tracing::warn;

use super::metadata::DocMetadata;
use crate::error::Result;

/// Front matter delimiter line.
pub const DELIMITER: &str = "---";

/// Result of splitting a Markdown text into front matter and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter<'a> {
    mapping: Option<Mapping>,
    body: &'a str,
    body_line: usize,
    had_delimiters: bool,
    malformed: bool,
}

impl<'a> Frontmatter<'a> {
    fn absent(body: &'a str) -> Self {
        Self {
            mapping: None,
            body,
            body_line: 1,
            had_delimiters: false,
            malformed: false,
        }
    }

    /// Check if a valid front matter mapping was found.
    #[must_use]
    pub fn has_frontmatter(&self) -> bool {
        self.mapping.is_some()
    }

    /// Check if an opening delimiter was present, valid or not.
    #[must_use]
    pub fn had_delimiters(&self) -> bool {
        self.had_delimiters
    }

    /// Check if delimiters were present but the block was unusable.
    ///
    /// Covers a missing closing delimiter, invalid YAML, and YAML that is
    /// not a mapping.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        self.malformed
    }

    /// The parsed mapping, if any.
    #[must_use]
    pub fn mapping(&self) -> Option<&Mapping> {
        self.mapping.as_ref()
    }

    /// Everything after the closing delimiter (or the whole text).
    #[must_use]
    pub fn body(&self) -> &'a str {
        self.body
    }

    /// 1-based line of the original text on which the body starts.
    #[must_use]
    pub fn body_line(&self) -> usize {
        self.body_line
    }

    /// Get a scalar field rendered as a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.mapping.as_ref()?.get(key).and_then(scalar_to_string)
    }

    /// Typed view of the mapping. Empty when there is no front matter.
    #[must_use]
    pub fn metadata(&self) -> DocMetadata {
        self.mapping
            .as_ref()
            .map(DocMetadata::from_mapping)
            .unwrap_or_default()
    }
}

/// Split Markdown text into front matter and body.
///
/// Front matter exists only when the first line is `---` (surrounding
/// whitespace ignored). The block ends at the next `---` line.
///
/// # Example
///
/// ```
/// use docforge::document::split;
///
/// let parsed = split("---\ntitle: Home\n---\n\n# Welcome\n");
/// assert!(parsed.has_frontmatter());
/// assert_eq!(parsed.get_str("title").as_deref(), Some("Home"));
/// assert_eq!(parsed.body(), "\n# Welcome\n");
/// ```
#[must_use]
pub fn split(text: &str) -> Frontmatter<'_> {
    let mut lines = text.split_inclusive('\n');

    let Some(first) = lines.next() else {
        return Frontmatter::absent(text);
    };
    if first.trim() != DELIMITER {
        return Frontmatter::absent(text);
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if line.trim() == DELIMITER {
            let yaml = &text[yaml_start..offset];
            let body_start = offset + line.len();
            let body_line = text[..body_start].matches('\n').count() + 1;
            return parse_block(yaml, &text[body_start..], body_line);
        }
        offset += line.len();
    }

    warn!("front matter opening delimiter found but no closing delimiter");
    Frontmatter {
        mapping: None,
        body: text,
        body_line: 1,
        had_delimiters: true,
        malformed: true,
    }
}

fn parse_block<'a>(yaml: &str, body: &'a str, body_line: usize) -> Frontmatter<'a> {
    let parsed = if yaml.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_yaml::from_str::<Value>(yaml)
    };

    let mapping = match parsed {
        Ok(Value::Mapping(mapping)) => Some(mapping),
        Ok(Value::Null) => Some(Mapping::new()),
        Ok(other) => {
            warn!(kind = value_kind(&other), "front matter is not a mapping");
            None
        }
        Err(e) => {
            warn!(error = %e, "failed to parse front matter YAML");
            None
        }
    };

    Frontmatter {
        malformed: mapping.is_none(),
        mapping,
        body,
        body_line,
        had_delimiters: true,
    }
}

/// Render a mapping and body back into a Markdown file.
///
/// Leading blank lines of `body` are dropped so a single blank line always
/// separates the block from the content.
///
/// # Errors
///
/// Returns an error if the mapping cannot be serialized.
pub fn render(mapping: &Mapping, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(mapping)?;
    let body = body.trim_start_matches(['\r', '\n']);
    Ok(format!(
        "{DELIMITER}\n{}\n{DELIMITER}\n\n{body}",
        yaml.trim_end()
    ))
}

/// Render a YAML scalar as a plain string.
///
/// Returns `None` for nulls, sequences, and mappings.
#[must_use]
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}
