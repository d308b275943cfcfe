//! Error types and exit codes for dlp-scan

use std::process::ExitCode;
use thiserror::Error;

/// Main error type for dlp-scan operations
#[derive(Error, Debug)]
pub enum DlpError {
    #[error("archive extraction failed: {message}")]
    ArchiveExtraction { message: String },

    #[error("email extraction failed: {message}")]
    EmailExtraction { message: String },

    #[error("unsupported file type: {path}")]
    UnsupportedType { path: String },

    #[error("export validation failed: {message}")]
    ExportValidation { message: String },

    #[error("invalid job option: {message}")]
    InvalidOption { message: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DlpError {
    pub fn archive(message: impl Into<String>) -> Self {
        Self::ArchiveExtraction {
            message: message.into(),
        }
    }

    pub fn email(message: impl Into<String>) -> Self {
        Self::EmailExtraction {
            message: message.into(),
        }
    }

    pub fn export(message: impl Into<String>) -> Self {
        Self::ExportValidation {
            message: message.into(),
        }
    }

    /// Convert error to a process exit code for the CLI binary:
    /// - 0: Success
    /// - 1: IO / database error
    /// - 2: Archive or email extraction failure
    /// - 3: Export validation failure
    /// - 4: Invalid job option / unsupported type
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::ArchiveExtraction { .. } => ExitCode::from(2),
            Self::EmailExtraction { .. } => ExitCode::from(2),
            Self::ExportValidation { .. } => ExitCode::from(3),
            Self::InvalidOption { .. } => ExitCode::from(4),
            Self::UnsupportedType { .. } => ExitCode::from(4),
            Self::Database(_) => ExitCode::from(1),
            Self::Io(_) => ExitCode::from(1),
        }
    }
}

/// Result type alias for dlp-scan operations
pub type Result<T> = std::result::Result<T, DlpError>;
