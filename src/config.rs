//! Process-wide settings, loaded from environment variables.
//!
//! Every variable is prefixed `PRESIDIO_SIT_` per the external configuration
//! contract. Tests build a `Settings` directly instead of touching the
//! process environment.

use std::env;
use std::path::PathBuf;

const ENV_PREFIX: &str = "PRESIDIO_SIT_";

/// Application settings. Defaults match the external interface contract.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub redis_url: String,
    pub storage_path: PathBuf,
    pub scan_root: PathBuf,
    pub max_archive_depth: u32,
    pub max_archive_files: u64,
    pub max_archive_bytes: u64,
    pub max_file_size_mb: u64,
    pub max_email_attachments: u32,
    pub max_email_bytes: u64,
    pub ocr_max_pages: u32,
    pub ocr_concurrency: u32,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./dlp_scan.db".to_string(),
            redis_url: "redis://redis:6379/0".to_string(),
            storage_path: PathBuf::from("/data/uploads"),
            scan_root: PathBuf::from("/data/uploads"),
            max_archive_depth: 3,
            max_archive_files: 1000,
            max_archive_bytes: 1024 * 1024 * 1024,
            max_file_size_mb: 250,
            max_email_attachments: 50,
            max_email_bytes: 50 * 1024 * 1024,
            ocr_max_pages: 20,
            ocr_concurrency: 2,
            log_level: "INFO".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the environment, falling back to defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Some(v) = env_var("DATABASE_URL") {
            settings.database_url = v;
        }
        if let Some(v) = env_var("REDIS_URL") {
            settings.redis_url = v;
        }
        if let Some(v) = env_var("STORAGE_PATH") {
            settings.storage_path = PathBuf::from(v);
        }
        if let Some(v) = env_var("SCAN_ROOT") {
            settings.scan_root = PathBuf::from(v);
        }
        set_parsed(&mut settings.max_archive_depth, "MAX_ARCHIVE_DEPTH");
        set_parsed(&mut settings.max_archive_files, "MAX_ARCHIVE_FILES");
        set_parsed(&mut settings.max_archive_bytes, "MAX_ARCHIVE_BYTES");
        set_parsed(&mut settings.max_file_size_mb, "MAX_FILE_SIZE_MB");
        set_parsed(&mut settings.max_email_attachments, "MAX_EMAIL_ATTACHMENTS");
        set_parsed(&mut settings.max_email_bytes, "MAX_EMAIL_BYTES");
        set_parsed(&mut settings.ocr_max_pages, "OCR_MAX_PAGES");
        set_parsed(&mut settings.ocr_concurrency, "OCR_CONCURRENCY");
        if let Some(v) = env_var("LOG_LEVEL") {
            settings.log_level = v;
        }

        settings
    }

    /// Maximum file size in bytes, derived from `max_file_size_mb`.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

fn env_var(suffix: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}{suffix}")).ok()
}

fn set_parsed<T: std::str::FromStr>(target: &mut T, suffix: &str) {
    if let Some(raw) = env_var(suffix) {
        if let Ok(parsed) = raw.parse() {
            *target = parsed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let settings = Settings::default();
        assert_eq!(settings.max_archive_depth, 3);
        assert_eq!(settings.max_archive_files, 1000);
        assert_eq!(settings.max_file_size_mb, 250);
        assert_eq!(settings.ocr_max_pages, 20);
        assert_eq!(settings.ocr_concurrency, 2);
        assert_eq!(settings.max_file_size_bytes(), 250 * 1024 * 1024);
    }
}
