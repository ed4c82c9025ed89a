//! Configuration management for docforge.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Project-local configuration file, looked up in the working directory.
pub const LOCAL_CONFIG_FILE_NAME: &str = "docforge.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "docforge";

/// Default ledger file name.
const LEDGER_FILE_NAME: &str = "ledger.db";

/// Environment variable prefix.
const ENV_PREFIX: &str = "DOCFORGE_";

/// Sampling temperatures accepted by OpenAI-compatible APIs.
pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=2.0;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `DOCFORGE_`, sections split on `__`)
/// 2. `docforge.toml` in the working directory
/// 3. TOML config file at `~/.config/docforge/config.toml`
/// 4. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Documentation tree configuration.
    pub docs: DocsConfig,
    /// Auto-index configuration.
    pub index: IndexConfig,
    /// Authoring check configuration.
    pub check: CheckConfig,
    /// AI summary configuration.
    pub summary: SummaryConfig,
    /// Summary ledger configuration.
    pub ledger: LedgerConfig,
}

/// Where the documentation lives and which files to skip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Root of the documentation tree.
    pub root: PathBuf,
    /// Path of the generated index page.
    pub index_path: PathBuf,
    /// File names never treated as documents.
    pub excluded_files: Vec<String>,
    /// Skip generated `*.summary.md` files.
    pub exclude_summaries: bool,
}

/// Auto-index page settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Title written into the index front matter.
    pub title: String,
    /// Display names for top-level sections, keyed by directory name.
    /// The empty key names files at the root of the docs tree.
    pub section_names: BTreeMap<String, String>,
}

/// Authoring check settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Keys every front matter block must declare.
    pub required_keys: Vec<String>,
    /// Report documents that have no front matter at all.
    pub require_frontmatter: bool,
    /// File name of the map-of-content page.
    pub moc_page: String,
    /// Headings the map-of-content page must contain.
    pub moc_headings: Vec<String>,
    /// File name of the home page.
    pub home_page: String,
    /// Minimum number of categories listed on the home page.
    pub home_categories: usize,
}

/// AI summary settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Chat model used for summaries.
    pub model: String,
    /// Maximum tokens in the generated summary.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// API key; takes precedence over `api_key_env` when set.
    /// Never serialized, so `config show` cannot print it.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Summary ledger settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Record summaries and skip unchanged documents.
    pub enabled: bool,
    /// Path to the database file.
    /// Defaults to `~/.local/share/docforge/ledger.db`
    pub database_path: Option<PathBuf>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("docs"),
            index_path: PathBuf::from("docs/system/auto-index.md"),
            excluded_files: vec!["auto-index.md".to_string()],
            exclude_summaries: true,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            title: "Auto-Generated Index".to_string(),
            section_names: default_section_names(),
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            required_keys: ["title", "created", "updated", "tags", "status", "version"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            require_frontmatter: false,
            moc_page: "moc.md".to_string(),
            moc_headings: default_moc_headings(),
            home_page: "index.md".to_string(),
            home_categories: 5,
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 600,
            temperature: 0.2,
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: None,
        }
    }
}

/// Default section display names.
fn default_section_names() -> BTreeMap<String, String> {
    [
        ("api", "API Documentation"),
        ("system", "System Documentation"),
        ("workflows", "Workflow Documentation"),
        ("templates", "Templates"),
        ("", "General"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Default map-of-content headings.
fn default_moc_headings() -> Vec<String> {
    vec![
        "System Documentation".to_string(),
        "Workflows".to_string(),
        "Templates".to_string(),
        "API Documentation".to_string(),
        "Future Additions".to_string(),
    ]
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// An explicit path replaces both the user config file and the
    /// project-local `docforge.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        figment = match config_path {
            Some(path) => figment.merge(Toml::file(path)),
            None => figment
                .merge(Toml::file(Self::default_config_path()))
                .merge(Toml::file(LOCAL_CONFIG_FILE_NAME)),
        };

        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.docs.root.as_os_str().is_empty() {
            return Err(Error::validation("docs.root must not be empty"));
        }

        if !TEMPERATURE_RANGE.contains(&self.summary.temperature) {
            return Err(Error::validation(format!(
                "summary.temperature ({}) must be between 0.0 and 2.0",
                self.summary.temperature
            )));
        }

        if self.summary.max_tokens == 0 {
            return Err(Error::validation(
                "summary.max_tokens must be greater than 0",
            ));
        }

        if self.summary.timeout_secs == 0 {
            return Err(Error::validation(
                "summary.timeout_secs must be greater than 0",
            ));
        }

        if self.check.moc_page.trim().is_empty() || self.check.home_page.trim().is_empty() {
            return Err(Error::validation(
                "check.moc_page and check.home_page must not be empty",
            ));
        }

        Ok(())
    }

    /// Get the ledger path, resolving defaults if not set.
    #[must_use]
    pub fn ledger_path(&self) -> PathBuf {
        self.ledger
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(LEDGER_FILE_NAME))
    }

    /// Display name for a section key.
    ///
    /// Falls back to the key with dashes turned into spaces, title-cased.
    #[must_use]
    pub fn section_name(&self, key: &str) -> String {
        self.index
            .section_names
            .get(key)
            .cloned()
            .unwrap_or_else(|| crate::document::title_case(&key.replace('-', " ")))
    }

    /// File names excluded from collection, including the index page itself.
    #[must_use]
    pub fn excluded_file_names(&self) -> Vec<String> {
        let mut names = self.docs.excluded_files.clone();
        if let Some(name) = file_name(&self.docs.index_path) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_docs_config() {
        let docs = DocsConfig::default();

        assert_eq!(docs.root, PathBuf::from("docs"));
        assert_eq!(docs.index_path, PathBuf::from("docs/system/auto-index.md"));
        assert!(docs.excluded_files.contains(&"auto-index.md".to_string()));
        assert!(docs.exclude_summaries);
    }

    #[test]
    fn test_default_section_names() {
        let index = IndexConfig::default();

        assert_eq!(index.section_names["api"], "API Documentation");
        assert_eq!(index.section_names["system"], "System Documentation");
        assert_eq!(index.section_names["workflows"], "Workflow Documentation");
        assert_eq!(index.section_names["templates"], "Templates");
        assert_eq!(index.section_names[""], "General");
    }

    #[test]
    fn test_default_check_config() {
        let check = CheckConfig::default();

        assert_eq!(check.required_keys.len(), 6);
        assert!(check.required_keys.contains(&"version".to_string()));
        assert!(!check.require_frontmatter);
        assert_eq!(check.moc_headings.len(), 5);
        assert_eq!(check.home_categories, 5);
    }

    #[test]
    fn test_default_summary_config() {
        let summary = SummaryConfig::default();

        assert_eq!(summary.model, "gpt-4o-mini");
        assert_eq!(summary.max_tokens, 600);
        assert!((summary.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(summary.api_key_env, "OPENAI_API_KEY");
        assert!(summary.api_key.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_temperature_out_of_range() {
        let mut config = Config::default();
        config.summary.temperature = 3.5;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("temperature"));
    }

    #[test]
    fn test_validate_zero_max_tokens() {
        let mut config = Config::default();
        config.summary.max_tokens = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_tokens"));
    }

    #[test]
    fn test_validate_empty_root() {
        let mut config = Config::default();
        config.docs.root = PathBuf::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("docs.root"));
    }

    #[test]
    fn test_ledger_path_default() {
        let config = Config::default();
        assert!(config.ledger_path().to_string_lossy().contains("ledger.db"));
    }

    #[test]
    fn test_ledger_path_custom() {
        let mut config = Config::default();
        config.ledger.database_path = Some(PathBuf::from("/custom/ledger.sqlite"));

        assert_eq!(config.ledger_path(), PathBuf::from("/custom/ledger.sqlite"));
    }

    #[test]
    fn test_section_name_known_and_fallback() {
        let config = Config::default();

        assert_eq!(config.section_name("api"), "API Documentation");
        assert_eq!(config.section_name(""), "General");
        assert_eq!(config.section_name("release-notes"), "Release Notes");
    }

    #[test]
    fn test_excluded_file_names_includes_index() {
        let mut config = Config::default();
        config.docs.excluded_files.clear();
        config.docs.index_path = PathBuf::from("docs/generated/catalog.md");

        assert_eq!(config.excluded_file_names(), vec!["catalog.md".to_string()]);
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("docforge"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config.docs, DocsConfig::default());
        assert_eq!(config.summary.model, "gpt-4o-mini");
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docforge.toml");
        std::fs::write(
            &path,
            r#"
[docs]
root = "handbook"

[summary]
model = "gpt-4o"
temperature = 0.5

[index.section_names]
guides = "User Guides"
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.docs.root, PathBuf::from("handbook"));
        assert_eq!(config.summary.model, "gpt-4o");
        assert_eq!(config.section_name("guides"), "User Guides");
        // Defaults merge underneath the file
        assert_eq!(config.section_name("api"), "API Documentation");
        assert_eq!(config.summary.max_tokens, 600);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[summary]\ntemperature = 9.0\n").unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_api_key_not_serialized_when_unset() {
        let json = serde_json::to_string(&SummaryConfig::default()).unwrap();
        assert!(!json.contains("\"api_key\""));
        assert!(json.contains("api_key_env"));
    }

    #[test]
    fn test_api_key_never_serialized() {
        let mut config = Config::default();
        config.summary.api_key = Some("sk-SECRET".to_string());

        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(!json.contains("sk-SECRET"));
        assert!(!json.contains("\"api_key\""));
    }

    #[test]
    fn test_api_key_still_loaded_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docforge.toml");
        std::fs::write(&path, "[summary]\napi_key = \"sk-file\"\n").unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.summary.api_key.as_deref(), Some("sk-file"));
    }
}
