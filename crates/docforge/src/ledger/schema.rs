//! `SQLite` schema for the summary ledger.

/// Generated summaries, one row per (source, body hash, model).
pub const CREATE_SUMMARIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS summaries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_path TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    model TEXT NOT NULL,
    output_path TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// A source/hash/model triple is recorded at most once.
pub const CREATE_FRESHNESS_INDEX: &str = r"
CREATE UNIQUE INDEX IF NOT EXISTS idx_summaries_freshness
    ON summaries(source_path, content_hash, model)
";

/// Listing is newest first.
pub const CREATE_CREATED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_summaries_created ON summaries(created_at DESC)
";

/// Key-value table; holds `schema_version`.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Base schema, in creation order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_SUMMARIES_TABLE,
    CREATE_FRESHNESS_INDEX,
    CREATE_CREATED_INDEX,
    CREATE_METADATA_TABLE,
];
