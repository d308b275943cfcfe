//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// DLP scanning pipeline: ingestion, PII detection, findings, and Purview
/// rulepack export.
#[derive(Parser, Debug)]
#[command(name = "dlp-scan")]
#[command(about = "Scan files for sensitive data and manage Purview rulepack exports")]
#[command(version)]
pub struct Cli {
    /// Path to the SQLite database file (use ":memory:" for an ephemeral run)
    #[arg(long, global = true, env = "PRESIDIO_SIT_DATABASE_PATH", default_value = "dlp_scan.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a file or directory and record findings
    Scan(ScanArgs),
    /// List or inspect jobs
    Jobs(JobsArgs),
    /// Manage Sensitive Information Types
    Sit(SitArgs),
    /// Manage keyword lists
    KeywordList(KeywordListArgs),
    /// Manage rulepacks and export them to Purview-compatible XML
    Rulepack(RulepackArgs),
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// File or directory to scan
    pub path: PathBuf,

    /// Entity types to look for (defaults to all supported types)
    #[arg(long)]
    pub entities: Vec<String>,

    /// Language hint passed to the recognizer
    #[arg(long, default_value = "en")]
    pub language: String,

    /// Minimum confidence score to keep a finding
    #[arg(long, default_value_t = 0.5)]
    pub score_threshold: f32,

    /// OCR behavior: auto, force, or off
    #[arg(long, default_value = "auto")]
    pub ocr_mode: String,

    /// Include email headers (From/To/Cc/Subject/Date) in extracted text
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub include_headers: bool,

    /// Render HTML email bodies to text when no plain-text part is present
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub parse_html: bool,

    /// Recurse into email attachments
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub include_attachments: bool,

    /// Recurse into inline images embedded in email bodies
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub include_inline_images: bool,
}

#[derive(Args, Debug)]
pub struct JobsArgs {
    #[command(subcommand)]
    pub command: JobsCommand,
}

#[derive(Subcommand, Debug)]
pub enum JobsCommand {
    List,
    Get { id: String },
}

#[derive(Args, Debug)]
pub struct SitArgs {
    #[command(subcommand)]
    pub command: SitCommand,
}

#[derive(Subcommand, Debug)]
pub enum SitCommand {
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    CreateVersion {
        sit_id: String,
        #[arg(long)]
        entity_type: Option<String>,
        #[arg(long)]
        primary_regex: Option<String>,
        #[arg(long)]
        primary_keyword: Option<String>,
        #[arg(long, default_value = "ANY")]
        supporting_mode: String,
        #[arg(long)]
        min_n: Option<u32>,
    },
}

#[derive(Args, Debug)]
pub struct KeywordListArgs {
    #[command(subcommand)]
    pub command: KeywordListCommand,
}

#[derive(Subcommand, Debug)]
pub enum KeywordListCommand {
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "item")]
        items: Vec<String>,
    },
    List,
}

#[derive(Args, Debug)]
pub struct RulepackArgs {
    #[command(subcommand)]
    pub command: RulepackCommand,
}

#[derive(Subcommand, Debug)]
pub enum RulepackCommand {
    Create {
        name: String,
        version: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        publisher: Option<String>,
        #[arg(long)]
        locale: Option<String>,
    },
    List,
    Select {
        rulepack_id: String,
        #[arg(long = "sit-version")]
        sit_version_ids: Vec<String>,
    },
    Export {
        rulepack_id: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}
