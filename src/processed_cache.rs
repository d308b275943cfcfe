//! Processed-file cache: skips re-scanning files whose content hash was
//! already seen, keyed on a SHA-256 digest the same way the Python original's
//! `file_hash` helper keys its dedup table.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::error::Result;

const CHUNK_SIZE: usize = 1024 * 1024;

/// Hash a file's contents in 1MiB chunks, matching the original's streaming
/// digest so identical files hash identically regardless of extraction path.
pub fn file_hash(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Returns `true` if `hash` has already been recorded as processed.
pub fn is_hash_processed(conn: &Connection, hash: &str) -> Result<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT file_hash FROM processed_files WHERE file_hash = ?1",
            params![hash],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Record `hash` (and the path it was last seen at) as processed.
pub fn mark_processed(conn: &Connection, hash: &str, path: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO processed_files (file_hash, path, last_scanned_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(file_hash) DO UPDATE SET path = excluded.path, last_scanned_at = excluded.last_scanned_at",
        params![hash, path, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn hashes_are_stable_and_cache_round_trips() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "hello world").unwrap();
        let hash = file_hash(file.path()).unwrap();

        let conn = crate::db::open(":memory:").unwrap();
        assert!(!is_hash_processed(&conn, &hash).unwrap());
        mark_processed(&conn, &hash, "hello.txt").unwrap();
        assert!(is_hash_processed(&conn, &hash).unwrap());
    }
}
