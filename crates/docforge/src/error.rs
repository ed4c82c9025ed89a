//! Error types for docforge.
//!
//! This module defines all error types used throughout the docforge crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for docforge operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Document Errors ===
    /// A document that was asked for by path does not exist.
    #[error("document not found: {path}")]
    DocumentNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The documentation root directory does not exist.
    #[error("docs directory not found: {path}")]
    DocsDirNotFound {
        /// Configured docs root.
        path: PathBuf,
    },

    /// Front matter could not be parsed or rendered.
    #[error("front matter error in {path}: {message}")]
    Frontmatter {
        /// File whose front matter was being processed.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    /// Failed to read a file.
    #[error("failed to read {path}: {source}")]
    FileRead {
        /// Path that couldn't be read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write {path}: {source}")]
    FileWrite {
        /// Path that couldn't be written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Ledger Errors ===
    /// Failed to open or create the ledger database.
    #[error("failed to open ledger at {path}: {source}")]
    LedgerOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A ledger query failed.
    #[error("ledger query failed: {0}")]
    LedgerQuery(#[from] rusqlite::Error),

    /// Failed to run ledger migrations.
    #[error("ledger migration failed: {message}")]
    LedgerMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Summary Provider Errors ===
    /// No API key is available for the summary provider.
    #[error("no API key found: set {env_var} or summary.api_key in the configuration")]
    MissingApiKey {
        /// Environment variable that was consulted.
        env_var: String,
    },

    /// The HTTP request to the provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with an error or an unusable response.
    #[error("summary provider error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Provider {
        /// HTTP status code, when the provider responded at all.
        status: Option<u16>,
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// YAML serialization/deserialization failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for docforge operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a front matter error for the given file.
    #[must_use]
    pub fn frontmatter(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Frontmatter {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a provider error, optionally carrying the HTTP status.
    #[must_use]
    pub fn provider(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Provider {
            status,
            message: message.into(),
        }
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error means a document or the docs root is missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DocumentNotFound { .. } | Self::DocsDirNotFound { .. }
        )
    }

    /// Check if this error came from the summary provider.
    #[must_use]
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            Self::Provider { .. } | Self::Http(_) | Self::MissingApiKey { .. }
        )
    }
}
