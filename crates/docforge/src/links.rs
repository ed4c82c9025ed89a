//! Obsidian-style wikilinks.
//!
//! Recognized forms: `[[Target]]`, `[[Target|Alias]]`, `[[Target#Heading]]`,
//! `[[Target#Heading|Alias]]`, and embeds written with a leading `!`.
//! Links inside fenced code blocks and inline code spans are ignored.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::document::Document;

static WIKILINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(!?)\[\[([^\[\]\n]+?)\]\]").expect("wikilink pattern is valid")
});

/// A wikilink found in a document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WikiLink {
    /// Linked page name; empty for same-page heading links like `[[#Intro]]`.
    pub target: String,
    /// Heading anchor after `#`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    /// Display text after `|`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// 1-based line number in the scanned text.
    pub line: usize,
    /// Whether the link is an embed (`![[...]]`).
    pub embed: bool,
}

impl WikiLink {
    fn parse(inner: &str, line: usize, embed: bool) -> Self {
        let (target_part, alias) = match inner.split_once('|') {
            Some((t, a)) => (t, non_empty(a)),
            None => (inner, None),
        };
        let (target, heading) = match target_part.split_once('#') {
            Some((t, h)) => (t, non_empty(h)),
            None => (target_part, None),
        };

        Self {
            target: target.trim().to_string(),
            heading,
            alias,
            line,
            embed,
        }
    }

    /// Check if this link points into the document that contains it.
    #[must_use]
    pub fn is_self_reference(&self) -> bool {
        self.target.is_empty()
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Extract all wikilinks from Markdown text.
///
/// # Example
///
/// ```
/// use docforge::links::extract_wikilinks;
///
/// let links = extract_wikilinks("See [[API Style Guide|the guide]].");
/// assert_eq!(links[0].target, "API Style Guide");
/// assert_eq!(links[0].alias.as_deref(), Some("the guide"));
/// ```
#[must_use]
pub fn extract_wikilinks(text: &str) -> Vec<WikiLink> {
    let mut links = Vec::new();
    let mut fences = CodeFences::default();

    for (idx, line) in text.lines().enumerate() {
        if fences.is_code(line) {
            continue;
        }

        let visible = blank_code_spans(line);
        for caps in WIKILINK.captures_iter(&visible) {
            let embed = !caps[1].is_empty();
            links.push(WikiLink::parse(&caps[2], idx + 1, embed));
        }
    }

    links
}

/// Line-by-line tracker for fenced code blocks.
///
/// A fence closes only on the marker that opened it, so a `~~~` line inside
/// a backtick fence is still code.
#[derive(Debug, Default)]
pub(crate) struct CodeFences {
    open: Option<&'static str>,
}

impl CodeFences {
    const MARKERS: [&'static str; 2] = ["```", "~~~"];

    /// Feed the next line; true when it is a fence line or inside a fence.
    pub(crate) fn is_code(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();
        if let Some(marker) = self.open {
            if trimmed.starts_with(marker) {
                self.open = None;
            }
            return true;
        }
        self.open = Self::MARKERS
            .into_iter()
            .find(|marker| trimmed.starts_with(marker));
        self.open.is_some()
    }
}

/// Replace inline code spans with spaces so their contents are not scanned.
fn blank_code_spans(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_code = false;
    for ch in line.chars() {
        if ch == '`' {
            in_code = !in_code;
            out.push(' ');
        } else if in_code {
            out.push(' ');
        } else {
            out.push(ch);
        }
    }
    out
}

/// Case-insensitive lookup of link targets in a document set.
///
/// A document answers to its display title, its file stem, and its
/// relative path without the `.md` extension.
#[derive(Debug)]
pub struct LinkResolver<'a> {
    documents: &'a [Document],
    keys: HashMap<String, usize>,
}

impl<'a> LinkResolver<'a> {
    /// Index `documents` for resolution.
    #[must_use]
    pub fn new(documents: &'a [Document]) -> Self {
        let mut keys = HashMap::new();
        for (i, doc) in documents.iter().enumerate() {
            let rel = doc.rel_path.strip_suffix(".md").unwrap_or(&doc.rel_path);
            for key in [doc.display_title(), doc.stem().to_string(), rel.to_string()] {
                keys.entry(normalize(&key)).or_insert(i);
            }
        }
        Self { documents, keys }
    }

    /// Find the document a target refers to.
    #[must_use]
    pub fn resolve(&self, target: &str) -> Option<&'a Document> {
        self.keys
            .get(&normalize(target))
            .map(|&i| &self.documents[i])
    }

    /// Check if a link resolves, treating same-page links as resolved.
    #[must_use]
    pub fn is_resolved(&self, link: &WikiLink) -> bool {
        link.is_self_reference() || self.resolve(&link.target).is_some()
    }
}

fn normalize(target: &str) -> String {
    let target = target.trim().replace('\\', "/").to_lowercase();
    target
        .strip_suffix(".md")
        .map_or_else(|| target.clone(), ToString::to_string)
}
