//! Job coordinator: persisted job lifecycle, mirroring the Celery task
//! lifecycle (`queued` -> `running` -> `completed`/`skipped`/`failed`) of
//! the original system. The §5 worker-pool/queue transport itself is an
//! external collaborator (out of scope per spec.md §1); this module covers
//! only the in-process coordination the CLI calls directly per job.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Skipped,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Skipped => "skipped",
            JobStatus::Failed => "failed",
        }
    }

    fn parse(value: &str) -> Self {
        match value {
            "running" => JobStatus::Running,
            "completed" => JobStatus::Completed,
            "skipped" => JobStatus::Skipped,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Queued,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub file_name: Option<String>,
    pub error: Option<String>,
    pub total_files: u64,
    pub processed_files: u64,
    pub entities_found: u64,
    pub findings_created: u64,
}

/// Options controlling a single file's scan. Unknown fields are rejected
/// rather than silently ignored, so a client-supplied typo surfaces
/// immediately instead of quietly scanning with defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanOptions {
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
    #[serde(default)]
    pub ocr_mode: OcrMode,
    #[serde(default = "default_true")]
    pub include_headers: bool,
    #[serde(default = "default_true")]
    pub parse_html: bool,
    #[serde(default = "default_true")]
    pub include_attachments: bool,
    #[serde(default = "default_true")]
    pub include_inline_images: bool,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_score_threshold() -> f32 {
    0.5
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrMode {
    #[default]
    Auto,
    Force,
    Off,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            language: default_language(),
            score_threshold: default_score_threshold(),
            ocr_mode: OcrMode::default(),
            include_headers: true,
            parse_html: true,
            include_attachments: true,
            include_inline_images: true,
        }
    }
}

/// Create a new pending job and persist it.
pub fn create(conn: &Connection, file_name: Option<String>) -> Result<Job> {
    let job = Job {
        id: Uuid::new_v4(),
        status: JobStatus::Queued,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        file_name,
        error: None,
        total_files: 0,
        processed_files: 0,
        entities_found: 0,
        findings_created: 0,
    };

    conn.execute(
        "INSERT INTO jobs (id, status, created_at, updated_at, file_name, error,
                            total_files, processed_files, entities_found, findings_created)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0, 0, 0)",
        params![
            job.id.to_string(),
            job.status.as_str(),
            job.created_at.to_rfc3339(),
            job.updated_at.to_rfc3339(),
            job.file_name,
            job.error,
        ],
    )?;
    Ok(job)
}

/// Fetch a job by id.
pub fn get(conn: &Connection, id: Uuid) -> Result<Option<Job>> {
    conn.query_row(
        "SELECT id, status, created_at, updated_at, file_name, error,
                total_files, processed_files, entities_found, findings_created
         FROM jobs WHERE id = ?1",
        params![id.to_string()],
        row_to_job,
    )
    .optional()
    .map_err(Into::into)
}

/// List all jobs, most recently created first.
pub fn list_jobs(conn: &Connection) -> Result<Vec<Job>> {
    let mut stmt = conn.prepare(
        "SELECT id, status, created_at, updated_at, file_name, error,
                total_files, processed_files, entities_found, findings_created
         FROM jobs ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map([], row_to_job)?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Transition a job's status. Updating a job that no longer exists is a
/// no-op rather than an error, since a job may be deleted concurrently
/// with a worker finishing it. Once a job has reached a terminal status
/// (`completed`/`skipped`/`failed`) further status updates are ignored —
/// the state machine only moves forward.
pub fn update_status(
    conn: &Connection,
    id: Uuid,
    status: JobStatus,
    error: Option<String>,
) -> Result<()> {
    conn.execute(
        "UPDATE jobs SET status = ?1, error = ?2, updated_at = ?3
         WHERE id = ?4 AND status NOT IN ('completed', 'skipped', 'failed')",
        params![status.as_str(), error, Utc::now().to_rfc3339(), id.to_string()],
    )?;
    Ok(())
}

/// Add to a job's running counters.
pub fn update_counts(
    conn: &Connection,
    id: Uuid,
    total_files_delta: i64,
    processed_files_delta: i64,
    entities_found_delta: i64,
    findings_created_delta: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE jobs SET
            total_files = total_files + ?1,
            processed_files = processed_files + ?2,
            entities_found = entities_found + ?3,
            findings_created = findings_created + ?4,
            updated_at = ?5
         WHERE id = ?6",
        params![
            total_files_delta,
            processed_files_delta,
            entities_found_delta,
            findings_created_delta,
            Utc::now().to_rfc3339(),
            id.to_string(),
        ],
    )?;
    Ok(())
}

fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<Job> {
    let id: String = row.get(0)?;
    let status: String = row.get(1)?;
    let created_at: String = row.get(2)?;
    let updated_at: String = row.get(3)?;
    Ok(Job {
        id: id.parse().unwrap_or_default(),
        status: JobStatus::parse(&status),
        created_at: created_at.parse().unwrap_or_else(|_| Utc::now()),
        updated_at: updated_at.parse().unwrap_or_else(|_| Utc::now()),
        file_name: row.get(4)?,
        error: row.get(5)?,
        total_files: row.get::<_, i64>(6)? as u64,
        processed_files: row.get::<_, i64>(7)? as u64,
        entities_found: row.get::<_, i64>(8)? as u64,
        findings_created: row.get::<_, i64>(9)? as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_transition_job() {
        let conn = crate::db::open(":memory:").unwrap();
        let job = create(&conn, Some("archive.zip".to_string())).unwrap();
        assert_eq!(job.status, JobStatus::Queued);

        update_status(&conn, job.id, JobStatus::Running, None).unwrap();
        update_counts(&conn, job.id, 3, 1, 2, 1).unwrap();

        let fetched = get(&conn, job.id).unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Running);
        assert_eq!(fetched.total_files, 3);
        assert_eq!(fetched.entities_found, 2);
    }

    #[test]
    fn scan_options_reject_unknown_fields() {
        let json = r#"{"entities": ["SSN"], "bogus": true}"#;
        let parsed: std::result::Result<ScanOptions, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn scan_options_defaults() {
        let parsed: ScanOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.language, "en");
        assert_eq!(parsed.ocr_mode, OcrMode::Auto);
        assert!(parsed.include_headers);
        assert!(parsed.parse_html);
        assert!(parsed.include_attachments);
        assert!(parsed.include_inline_images);
    }
}
