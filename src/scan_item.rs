//! Scan-item recorder: persists one row per ingested virtual path, the
//! audit trail of what was read and how, independent of any findings it
//! produced.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Text previews longer than this are truncated before being stored, so the
/// audit trail stays cheap to list even for very large documents.
const PREVIEW_LIMIT: usize = 4000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanItem {
    pub id: Uuid,
    pub job_id: Uuid,
    pub virtual_path: String,
    pub source_path: Option<String>,
    pub mime_type: Option<String>,
    pub extraction_method: String,
    pub ocr_used: bool,
    pub text_chars: usize,
    pub text_preview: Option<String>,
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
}

fn truncate_preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_LIMIT {
        text.to_string()
    } else {
        text.chars().take(PREVIEW_LIMIT).collect()
    }
}

/// Build a new in-memory [`ScanItem`] for a just-processed virtual path.
pub fn new_item(
    job_id: Uuid,
    virtual_path: impl Into<String>,
    source_path: Option<String>,
    mime_type: Option<String>,
    extraction_method: impl Into<String>,
    ocr_used: bool,
    text: &str,
    warnings: Vec<String>,
) -> ScanItem {
    ScanItem {
        id: Uuid::new_v4(),
        job_id,
        virtual_path: virtual_path.into(),
        source_path,
        mime_type,
        extraction_method: extraction_method.into(),
        ocr_used,
        text_chars: text.chars().count(),
        text_preview: Some(truncate_preview(text)),
        warnings,
        created_at: Utc::now(),
    }
}

/// Persist a scan item.
pub fn add_item(conn: &Connection, item: &ScanItem) -> Result<()> {
    conn.execute(
        "INSERT INTO scan_items (
            id, job_id, virtual_path, source_path, mime_type, extraction_method,
            ocr_used, text_chars, text_preview, warnings, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            item.id.to_string(),
            item.job_id.to_string(),
            item.virtual_path,
            item.source_path,
            item.mime_type,
            item.extraction_method,
            item.ocr_used as i64,
            item.text_chars as i64,
            item.text_preview,
            serde_json::to_string(&item.warnings).unwrap_or_else(|_| "[]".to_string()),
            item.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// List every scan item recorded for a job, oldest first.
pub fn list_items(conn: &Connection, job_id: Uuid) -> Result<Vec<ScanItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, job_id, virtual_path, source_path, mime_type, extraction_method,
                ocr_used, text_chars, text_preview, warnings, created_at
         FROM scan_items WHERE job_id = ?1 ORDER BY created_at ASC",
    )?;
    let rows = stmt.query_map(params![job_id.to_string()], |row| {
        let warnings_json: String = row.get(9)?;
        let created_at: String = row.get(10)?;
        Ok(ScanItem {
            id: row.get::<_, String>(0)?.parse().unwrap_or_default(),
            job_id: row.get::<_, String>(1)?.parse().unwrap_or_default(),
            virtual_path: row.get(2)?,
            source_path: row.get(3)?,
            mime_type: row.get(4)?,
            extraction_method: row.get(5)?,
            ocr_used: row.get::<_, i64>(6)? != 0,
            text_chars: row.get::<_, i64>(7)? as usize,
            text_preview: row.get(8)?,
            warnings: serde_json::from_str(&warnings_json).unwrap_or_default(),
            created_at: created_at.parse().unwrap_or_else(|_| Utc::now()),
        })
    })?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_list_round_trips() {
        let conn = crate::db::open(":memory:").unwrap();
        let job_id = Uuid::new_v4();
        let item = new_item(
            job_id,
            "report.txt",
            Some("/tmp/report.txt".to_string()),
            Some("text/plain".to_string()),
            "text",
            false,
            "hello world",
            vec![],
        );
        add_item(&conn, &item).unwrap();

        let items = list_items(&conn, job_id).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].virtual_path, "report.txt");
        assert_eq!(items[0].text_chars, 11);
    }

    #[test]
    fn preview_is_truncated() {
        let long_text = "x".repeat(PREVIEW_LIMIT + 500);
        let item = new_item(
            Uuid::new_v4(),
            "big.txt",
            None,
            None,
            "text",
            false,
            &long_text,
            vec![],
        );
        assert_eq!(item.text_preview.unwrap().chars().count(), PREVIEW_LIMIT);
        assert_eq!(item.text_chars, PREVIEW_LIMIT + 500);
    }
}
