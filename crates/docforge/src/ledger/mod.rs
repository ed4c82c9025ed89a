//! Summary ledger.
//!
//! Records which document bodies have already been summarized with which
//! model, so `docforge summarize` can skip work that would produce the same
//! output again.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// BLAKE3 hex digest of a document body.
#[must_use]
pub fn compute_hash(body: &str) -> String {
    blake3::hash(body.as_bytes()).to_hex().to_string()
}

/// One generated summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    /// Row ID, `None` until recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Summarized document.
    pub source_path: String,
    /// [`compute_hash`] of the document body at summary time.
    pub content_hash: String,
    /// Model that produced the summary.
    pub model: String,
    /// Written summary file.
    pub output_path: String,
    /// When the summary was recorded.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create an unrecorded entry stamped with the current time.
    #[must_use]
    pub fn new(
        source_path: impl Into<String>,
        content_hash: impl Into<String>,
        model: impl Into<String>,
        output_path: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            source_path: source_path.into(),
            content_hash: content_hash.into(),
            model: model.into(),
            output_path: output_path.into(),
            created_at: Utc::now(),
        }
    }
}

/// Ledger counts and date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    /// Number of recorded summaries.
    pub total_entries: i64,
    /// Number of distinct source documents.
    pub distinct_sources: i64,
    /// Oldest entry.
    pub oldest_entry: Option<DateTime<Utc>>,
    /// Newest entry.
    pub newest_entry: Option<DateTime<Utc>>,
    /// Size of the database file in bytes; 0 in memory.
    pub db_size_bytes: u64,
}

/// `SQLite`-backed summary ledger.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    conn: Connection,
}

const SELECT_COLUMNS: &str =
    "SELECT id, source_path, content_hash, model, output_path, created_at FROM summaries";

impl Ledger {
    /// Open or create the ledger at `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or database cannot be created or
    /// the schema cannot be initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let conn = Connection::open(&path).map_err(|source| Error::LedgerOpen {
            path: path.clone(),
            source,
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        debug!(path = %path.display(), "ledger opened");
        Ok(Self { path, conn })
    }

    /// Open a throwaway in-memory ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` cannot create the database.
    pub fn open_in_memory() -> Result<Self> {
        let path = PathBuf::from(":memory:");
        let conn = Connection::open_in_memory().map_err(|source| Error::LedgerOpen {
            path: path.clone(),
            source,
        })?;
        migrations::initialize_schema(&conn)?;
        Ok(Self { path, conn })
    }

    /// Database location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if `source` with body hash `hash` was already summarized by `model`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn is_current(&self, source: &str, hash: &str, model: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM summaries WHERE source_path = ?1 AND content_hash = ?2 AND model = ?3",
            params![source, hash, model],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Record a summary and return its row ID.
    ///
    /// Recording the same source, hash, and model again refreshes the
    /// output path and timestamp of the existing row.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn record(&self, entry: &LedgerEntry) -> Result<i64> {
        let id: i64 = self.conn.query_row(
            r"
            INSERT INTO summaries (source_path, content_hash, model, output_path, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(source_path, content_hash, model)
            DO UPDATE SET output_path = excluded.output_path, created_at = excluded.created_at
            RETURNING id
            ",
            params![
                entry.source_path,
                entry.content_hash,
                entry.model,
                entry.output_path,
                entry.created_at.to_rfc3339(),
            ],
            |row| row.get(0),
        )?;
        debug!(id, source = %entry.source_path, "summary recorded");
        Ok(id)
    }

    /// Latest entry for a source document.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn latest_for(&self, source: &str) -> Result<Option<LedgerEntry>> {
        let entry = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE source_path = ?1 ORDER BY created_at DESC, id DESC LIMIT 1"),
                [source],
                Self::row_to_entry,
            )
            .optional()?;
        Ok(entry)
    }

    /// Most recent entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn recent(&self, limit: usize) -> Result<Vec<LedgerEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC LIMIT ?1"
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let entries = stmt
            .query_map([limit], Self::row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Total number of entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM summaries", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete entries whose source file no longer exists.
    ///
    /// Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn prune_missing(&self) -> Result<usize> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT source_path FROM summaries")?;
        let sources = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut removed = 0;
        for source in sources.iter().filter(|s| !Path::new(s).exists()) {
            removed += self
                .conn
                .execute("DELETE FROM summaries WHERE source_path = ?1", [source])?;
        }

        if removed > 0 {
            info!(removed, "pruned ledger entries for missing documents");
        }
        Ok(removed)
    }

    /// Ledger statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn stats(&self) -> Result<LedgerStats> {
        let (total_entries, distinct_sources, oldest, newest): (
            i64,
            i64,
            Option<String>,
            Option<String>,
        ) = self.conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT source_path), MIN(created_at), MAX(created_at) FROM summaries",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

        let db_size_bytes = if self.path == Path::new(":memory:") {
            0
        } else {
            std::fs::metadata(&self.path).map_or(0, |m| m.len())
        };

        Ok(LedgerStats {
            total_entries,
            distinct_sources,
            oldest_entry: oldest.as_deref().and_then(parse_timestamp),
            newest_entry: newest.as_deref().and_then(parse_timestamp),
            db_size_bytes,
        })
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<LedgerEntry> {
        let created_at: String = row.get(5)?;
        Ok(LedgerEntry {
            id: Some(row.get(0)?),
            source_path: row.get(1)?,
            content_hash: row.get(2)?,
            model: row.get(3)?,
            output_path: row.get(4)?,
            created_at: parse_timestamp(&created_at).unwrap_or_default(),
        })
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
