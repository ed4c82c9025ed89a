//! Documentation authoring checks.
//!
//! Rules:
//!
//! | rule                    | severity | what it checks                                      |
//! |-------------------------|----------|-----------------------------------------------------|
//! | `missing-frontmatter`   | warning  | document has no front matter (opt-in)               |
//! | `malformed-frontmatter` | error    | delimiters present but the block does not parse     |
//! | `required-frontmatter`  | warning  | front matter lacks a configured key                 |
//! | `broken-wikilink`       | error    | `[[Target]]` does not name any document             |
//! | `moc-headings`          | warning  | map-of-content page lacks a configured heading      |
//! | `home-categories`       | warning  | home page lists fewer categories than configured    |

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::config::CheckConfig;
use crate::document::Document;
use crate::links::{extract_wikilinks, CodeFences, LinkResolver};

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Worth fixing; fails only in strict mode.
    Warning,
    /// Always fails the check run.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Check rule identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    /// Document has no front matter.
    MissingFrontmatter,
    /// Front matter block does not parse.
    MalformedFrontmatter,
    /// Front matter lacks a required key.
    RequiredFrontmatter,
    /// Wikilink target not found.
    BrokenWikilink,
    /// Map-of-content heading missing.
    MocHeadings,
    /// Home page lists too few categories.
    HomeCategories,
}

impl Rule {
    /// Default severity of the rule.
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::MalformedFrontmatter | Self::BrokenWikilink => Severity::Error,
            Self::MissingFrontmatter
            | Self::RequiredFrontmatter
            | Self::MocHeadings
            | Self::HomeCategories => Severity::Warning,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MissingFrontmatter => "missing-frontmatter",
            Self::MalformedFrontmatter => "malformed-frontmatter",
            Self::RequiredFrontmatter => "required-frontmatter",
            Self::BrokenWikilink => "broken-wikilink",
            Self::MocHeadings => "moc-headings",
            Self::HomeCategories => "home-categories",
        };
        f.write_str(name)
    }
}

/// One problem found in the documentation set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Rule that produced the finding.
    pub rule: Rule,
    /// Severity of the finding.
    pub severity: Severity,
    /// Relative path of the document (or the expected page name).
    pub path: String,
    /// 1-based line in the file, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Human-readable description.
    pub message: String,
}

impl Finding {
    fn new(rule: Rule, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule,
            severity: rule.severity(),
            path: path.into(),
            line: None,
            message: message.into(),
        }
    }

    fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{line}", self.path)?,
            None => write!(f, "{}", self.path)?,
        }
        write!(f, ": {} [{}] {}", self.severity, self.rule, self.message)
    }
}

/// Outcome of a check run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// Number of documents inspected.
    pub documents_checked: usize,
    /// Findings, ordered by path then line.
    pub findings: Vec<Finding>,
}

impl CheckReport {
    /// Number of error findings.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Number of warning findings.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Check if any finding is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Check if the run should fail; strict mode also fails on warnings.
    #[must_use]
    pub fn is_failure(&self, strict: bool) -> bool {
        self.has_errors() || (strict && self.warning_count() > 0)
    }

    /// Findings produced by one rule.
    pub fn by_rule(&self, rule: Rule) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.rule == rule)
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }
}

/// Run every check over `documents`.
#[must_use]
pub fn run_checks(config: &CheckConfig, documents: &[Document]) -> CheckReport {
    let resolver = LinkResolver::new(documents);
    let mut findings = Vec::new();

    for doc in documents {
        check_frontmatter(config, doc, &mut findings);
        check_links(&resolver, doc, &mut findings);
    }
    check_moc(config, documents, &mut findings);
    check_home(config, documents, &mut findings);

    findings.sort_by(|a, b| a.path.cmp(&b.path).then(a.line.cmp(&b.line)));
    debug!(
        documents = documents.len(),
        findings = findings.len(),
        "checks finished"
    );

    CheckReport {
        documents_checked: documents.len(),
        findings,
    }
}

fn check_frontmatter(config: &CheckConfig, doc: &Document, findings: &mut Vec<Finding>) {
    if doc.malformed_frontmatter {
        findings.push(Finding::new(
            Rule::MalformedFrontmatter,
            &doc.rel_path,
            "front matter block is present but could not be parsed as a YAML mapping",
        ));
        return;
    }

    if !doc.has_frontmatter {
        if config.require_frontmatter {
            findings.push(Finding::new(
                Rule::MissingFrontmatter,
                &doc.rel_path,
                "document has no front matter",
            ));
        }
        return;
    }

    let missing: Vec<&str> = config
        .required_keys
        .iter()
        .map(String::as_str)
        .filter(|key| !doc.metadata.declares(key))
        .collect();
    if !missing.is_empty() {
        findings.push(Finding::new(
            Rule::RequiredFrontmatter,
            &doc.rel_path,
            format!("front matter is missing: {}", missing.join(", ")),
        ));
    }
}

fn check_links(resolver: &LinkResolver<'_>, doc: &Document, findings: &mut Vec<Finding>) {
    for link in extract_wikilinks(&doc.body) {
        if (link.embed && is_attachment(&link.target)) || resolver.is_resolved(&link) {
            continue;
        }
        findings.push(
            Finding::new(
                Rule::BrokenWikilink,
                &doc.rel_path,
                format!("[[{}]] does not match any document", link.target),
            )
            .at_line(doc.file_line(link.line)),
        );
    }
}

fn check_moc(config: &CheckConfig, documents: &[Document], findings: &mut Vec<Finding>) {
    let Some(moc) = find_page(documents, &config.moc_page) else {
        findings.push(Finding::new(
            Rule::MocHeadings,
            &config.moc_page,
            "map-of-content page not found",
        ));
        return;
    };

    let present: Vec<String> = headings(&moc.body)
        .into_iter()
        .map(|h| h.to_lowercase())
        .collect();
    for expected in &config.moc_headings {
        if !present.contains(&expected.to_lowercase()) {
            findings.push(Finding::new(
                Rule::MocHeadings,
                &moc.rel_path,
                format!("missing heading \"{expected}\""),
            ));
        }
    }
}

fn check_home(config: &CheckConfig, documents: &[Document], findings: &mut Vec<Finding>) {
    let Some(home) = find_page(documents, &config.home_page) else {
        findings.push(Finding::new(
            Rule::HomeCategories,
            &config.home_page,
            "home page not found",
        ));
        return;
    };

    let listed = first_list_len(&home.body);
    if listed < config.home_categories {
        findings.push(Finding::new(
            Rule::HomeCategories,
            &home.rel_path,
            format!(
                "home page lists {listed} categories, expected at least {}",
                config.home_categories
            ),
        ));
    }
}

/// Embedded files other than notes (images, PDFs) are not documents.
fn is_attachment(target: &str) -> bool {
    std::path::Path::new(target)
        .extension()
        .is_some_and(|ext| !ext.eq_ignore_ascii_case("md"))
}

/// Find a page by file name, preferring one at the docs root.
fn find_page<'a>(documents: &'a [Document], name: &str) -> Option<&'a Document> {
    documents
        .iter()
        .find(|d| d.rel_path.eq_ignore_ascii_case(name))
        .or_else(|| {
            documents
                .iter()
                .find(|d| d.file_name().eq_ignore_ascii_case(name))
        })
}

/// ATX heading texts outside code fences.
fn headings(body: &str) -> Vec<String> {
    let mut fences = CodeFences::default();
    let mut out = Vec::new();
    for line in body.lines() {
        if fences.is_code(line) {
            continue;
        }
        let trimmed = line.trim_start();
        let hashes = trimmed.chars().take_while(|&c| c == '#').count();
        if (1..=6).contains(&hashes) {
            let rest = &trimmed[hashes..];
            if rest.is_empty() || rest.starts_with([' ', '\t']) {
                let text = rest.trim().trim_end_matches('#').trim();
                out.push(text.to_string());
            }
        }
    }
    out
}

/// Number of top-level items in the first list of `body`.
fn first_list_len(body: &str) -> usize {
    let mut count = 0;
    let mut started = false;
    for line in body.lines() {
        if is_list_item(line) {
            count += 1;
            started = true;
        } else if started
            && !(line.trim().is_empty() || line.starts_with(' ') || line.starts_with('\t'))
        {
            break;
        }
    }
    count
}

fn is_list_item(line: &str) -> bool {
    if ["- ", "* ", "+ "].iter().any(|m| line.starts_with(m)) {
        return true;
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    digits > 0 && (line[digits..].starts_with(". ") || line[digits..].starts_with(") "))
}
