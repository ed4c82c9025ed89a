//! Typed view of document front matter.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use super::frontmatter::scalar_to_string;

/// Front matter keys with a typed representation.
pub const KNOWN_KEYS: &[&str] = &[
    "title", "created", "updated", "tags", "status", "version", "type",
];

/// Typed front matter of a document.
///
/// Every field is optional. Keys outside [`KNOWN_KEYS`] are kept in
/// `extra`, in their original order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocMetadata {
    /// Document title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Creation date as written by the author.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Last update date as written by the author or `docforge stamp`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    /// Tags; a single string is read as one tag.
    pub tags: Vec<String>,
    /// Publication status (`draft`, `review`, `published`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Document version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Document type (`summary`, `index`, ...).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    /// Remaining keys.
    #[serde(skip_serializing_if = "Mapping::is_empty")]
    pub extra: Mapping,
}

impl DocMetadata {
    /// Build typed metadata from a parsed front matter mapping.
    #[must_use]
    pub fn from_mapping(mapping: &Mapping) -> Self {
        let text = |key: &str| {
            mapping
                .get(key)
                .and_then(scalar_to_string)
                .filter(|s| !s.trim().is_empty())
        };

        let extra = mapping
            .iter()
            .filter(|(k, _)| k.as_str().map_or(true, |k| !KNOWN_KEYS.contains(&k)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            title: text("title"),
            created: text("created"),
            updated: text("updated"),
            tags: mapping.get("tags").map(tags_from_value).unwrap_or_default(),
            status: text("status"),
            version: text("version"),
            doc_type: text("type"),
            extra,
        }
    }

    /// Check whether the mapping this was read from declared `key`.
    ///
    /// Known keys count as declared only when they carry a value.
    #[must_use]
    pub fn declares(&self, key: &str) -> bool {
        match key {
            "title" => self.title.is_some(),
            "created" => self.created.is_some(),
            "updated" => self.updated.is_some(),
            "tags" => !self.tags.is_empty(),
            "status" => self.status.is_some(),
            "version" => self.version.is_some(),
            "type" => self.doc_type.is_some(),
            other => self.extra.contains_key(other),
        }
    }
}

fn tags_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items
            .iter()
            .filter_map(scalar_to_string)
            .filter(|t| !t.trim().is_empty())
            .collect(),
        other => scalar_to_string(other)
            .filter(|t| !t.trim().is_empty())
            .into_iter()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_from_mapping_known_keys() {
        let meta = DocMetadata::from_mapping(&mapping(
            "title: Home\ncreated: 2024-01-02\nupdated: 2024-03-04\ntags: [docs, moc]\nstatus: published\nversion: 1.0\n",
        ));

        assert_eq!(meta.title.as_deref(), Some("Home"));
        assert_eq!(meta.created.as_deref(), Some("2024-01-02"));
        assert_eq!(meta.updated.as_deref(), Some("2024-03-04"));
        assert_eq!(meta.tags, vec!["docs", "moc"]);
        assert_eq!(meta.status.as_deref(), Some("published"));
        assert_eq!(meta.version.as_deref(), Some("1.0"));
        assert!(meta.extra.is_empty());
    }

    #[test]
    fn test_scalar_tag_is_single_tag() {
        let meta = DocMetadata::from_mapping(&mapping("tags: api\n"));
        assert_eq!(meta.tags, vec!["api"]);
    }

    #[test]
    fn test_empty_values_are_absent() {
        let meta = DocMetadata::from_mapping(&mapping("title: ''\ntags: []\nstatus:\n"));

        assert!(meta.title.is_none());
        assert!(meta.tags.is_empty());
        assert!(meta.status.is_none());
        assert!(!meta.declares("title"));
        assert!(!meta.declares("tags"));
    }

    #[test]
    fn test_extra_keys_kept_in_order() {
        let meta = DocMetadata::from_mapping(&mapping("title: T\nowner: docs-team\naliases: [x]\n"));

        let keys: Vec<_> = meta.extra.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["owner", "aliases"]);
        assert!(meta.declares("owner"));
        assert!(!meta.declares("reviewer"));
    }

    #[test]
    fn test_type_key() {
        let meta = DocMetadata::from_mapping(&mapping("type: summary\n"));
        assert_eq!(meta.doc_type.as_deref(), Some("summary"));
        assert!(meta.declares("type"));
    }
}
