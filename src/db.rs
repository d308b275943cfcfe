//! SQLite schema and connection helper.
//!
//! Each repository module (`job`, `processed_cache`, `scan_item`, `sit`,
//! `rulepack`) issues explicit SQL against the connection opened here,
//! mirroring how the teacher's `sqlite_export` module hand-writes its
//! schema and batched inserts rather than going through an ORM.

use rusqlite::Connection;

use crate::error::Result;

const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS jobs (
    id TEXT PRIMARY KEY,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    file_name TEXT,
    error TEXT,
    total_files INTEGER NOT NULL DEFAULT 0,
    processed_files INTEGER NOT NULL DEFAULT 0,
    entities_found INTEGER NOT NULL DEFAULT 0,
    findings_created INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS processed_files (
    file_hash TEXT PRIMARY KEY,
    path TEXT NOT NULL,
    last_scanned_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS scan_items (
    id TEXT PRIMARY KEY,
    job_id TEXT NOT NULL,
    virtual_path TEXT NOT NULL,
    source_path TEXT,
    mime_type TEXT,
    extraction_method TEXT NOT NULL,
    ocr_used INTEGER NOT NULL DEFAULT 0,
    text_chars INTEGER NOT NULL DEFAULT 0,
    text_preview TEXT,
    warnings TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS scan_findings (
    id TEXT PRIMARY KEY,
    job_id TEXT NOT NULL,
    file_path TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    entity_text TEXT,
    score REAL NOT NULL,
    start INTEGER NOT NULL,
    end INTEGER NOT NULL,
    context TEXT NOT NULL,
    primary_regex TEXT NOT NULL,
    supporting_keywords TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS keyword_list (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS keyword_list_item (
    id TEXT PRIMARY KEY,
    keyword_list_id TEXT NOT NULL REFERENCES keyword_list(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sit (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sit_version (
    id TEXT PRIMARY KEY,
    sit_id TEXT NOT NULL REFERENCES sit(id) ON DELETE CASCADE,
    version_number INTEGER NOT NULL,
    entity_type TEXT,
    confidence TEXT,
    source TEXT,
    created_at TEXT NOT NULL,
    UNIQUE(sit_id, version_number)
);

CREATE TABLE IF NOT EXISTS sit_primary_element (
    sit_version_id TEXT PRIMARY KEY REFERENCES sit_version(id) ON DELETE CASCADE,
    element_type TEXT NOT NULL,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sit_supporting_logic (
    sit_version_id TEXT PRIMARY KEY REFERENCES sit_version(id) ON DELETE CASCADE,
    mode TEXT NOT NULL,
    min_n INTEGER,
    max_n INTEGER
);

CREATE TABLE IF NOT EXISTS sit_supporting_group (
    id TEXT PRIMARY KEY,
    sit_version_id TEXT NOT NULL REFERENCES sit_version(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    position INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS sit_supporting_item (
    id TEXT PRIMARY KEY,
    group_id TEXT NOT NULL REFERENCES sit_supporting_group(id) ON DELETE CASCADE,
    item_type TEXT NOT NULL,
    value TEXT,
    keyword_list_id TEXT REFERENCES keyword_list(id),
    position INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS rulepack (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    version TEXT NOT NULL,
    description TEXT,
    publisher TEXT,
    locale TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS rulepack_selection (
    rulepack_id TEXT NOT NULL REFERENCES rulepack(id) ON DELETE CASCADE,
    sit_version_id TEXT NOT NULL REFERENCES sit_version(id) ON DELETE CASCADE,
    PRIMARY KEY (rulepack_id, sit_version_id)
);
"#;

/// Open a SQLite connection at `path` (use `":memory:"` for tests) and
/// ensure the schema exists.
pub fn open(path: &str) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_in_memory_and_creates_schema() {
        let conn = open(":memory:").unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='jobs'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}
