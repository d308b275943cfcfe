//! dlp-scan CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use dlp_scan::cli::{
    Cli, Command, JobsCommand, KeywordListCommand, RulepackCommand, SitCommand,
};
use dlp_scan::error::{DlpError, Result};
use dlp_scan::job::{JobStatus, OcrMode, ScanOptions};
use dlp_scan::pii::{NullOcrEngine, RegexRecognizer};
use dlp_scan::sit::model::{PrimaryElement, SupportingLogic};
use dlp_scan::sit::repository::NewVersion;
use dlp_scan::{config, db, job, processor, rulepack, sit};

fn init_tracing(settings: &config::Settings) {
    let filter = EnvFilter::try_new(&settings.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> ExitCode {
    match run() {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    }
}

fn run() -> Result<String> {
    let cli = Cli::parse();
    let settings = config::Settings::from_env();
    init_tracing(&settings);

    let mut conn = db::open(&cli.database)?;

    match cli.command {
        Command::Scan(args) => run_scan(&mut conn, &settings, args),
        Command::Jobs(args) => run_jobs(&conn, args),
        Command::Sit(args) => run_sit(&mut conn, args),
        Command::KeywordList(args) => run_keyword_list(&mut conn, args),
        Command::Rulepack(args) => run_rulepack(&mut conn, args),
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    raw.parse().map_err(|_| DlpError::InvalidOption {
        message: format!("'{raw}' is not a valid id"),
    })
}

fn run_scan(conn: &mut rusqlite::Connection, settings: &config::Settings, args: dlp_scan::cli::ScanArgs) -> Result<String> {
    let ocr_mode = match args.ocr_mode.to_lowercase().as_str() {
        "force" => OcrMode::Force,
        "off" => OcrMode::Off,
        _ => OcrMode::Auto,
    };
    let options = ScanOptions {
        entities: args.entities,
        language: args.language,
        score_threshold: args.score_threshold,
        ocr_mode,
        include_headers: args.include_headers,
        parse_html: args.parse_html,
        include_attachments: args.include_attachments,
        include_inline_images: args.include_inline_images,
    };

    let file_name = args
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string());
    let created = job::create(conn, file_name)?;
    job::update_status(conn, created.id, JobStatus::Running, None)?;

    let processor = processor::FileProcessor::new(
        settings.clone(),
        Arc::new(RegexRecognizer),
        Arc::new(NullOcrEngine),
    );

    let (outcome, stats) = match processor.process_root(conn, created.id, &args.path, &options) {
        Ok(result) => result,
        Err(e) => {
            job::update_status(conn, created.id, JobStatus::Failed, Some(e.to_string()))?;
            return Err(e);
        }
    };

    let findings = outcome.all_findings();
    for finding in &findings {
        dlp_scan::findings::record_finding(conn, finding)?;
    }

    job::update_counts(
        conn,
        created.id,
        stats.files_processed as i64,
        stats.files_processed as i64,
        stats.entities_found as i64,
        findings.len() as i64,
    )?;
    job::update_status(conn, created.id, JobStatus::Completed, None)?;

    Ok(format!(
        "job {} completed: {} findings across {} scan items\n",
        created.id,
        findings.len(),
        count_scan_items(&outcome)
    ))
}

fn count_scan_items(outcome: &processor::Outcome) -> usize {
    let mut count = if outcome.scan_item.is_some() { 1 } else { 0 };
    for child in &outcome.children {
        count += count_scan_items(child);
    }
    count
}

fn run_jobs(conn: &rusqlite::Connection, args: dlp_scan::cli::JobsArgs) -> Result<String> {
    match args.command {
        JobsCommand::List => {
            let jobs = job::list_jobs(conn)?;
            let mut out = String::new();
            for j in jobs {
                out.push_str(&format!(
                    "{} {} processed={} findings={}\n",
                    j.id,
                    j.status.as_str(),
                    j.processed_files,
                    j.findings_created
                ));
            }
            Ok(out)
        }
        JobsCommand::Get { id } => {
            let id = parse_uuid(&id)?;
            let j = job::get(conn, id)?.ok_or_else(|| DlpError::InvalidOption {
                message: format!("job {id} not found"),
            })?;
            Ok(format!("{j:#?}\n"))
        }
    }
}

fn run_sit(conn: &mut rusqlite::Connection, args: dlp_scan::cli::SitArgs) -> Result<String> {
    match args.command {
        SitCommand::Create { name, description } => {
            let created = sit::repository::create_sit(conn, &name, description.as_deref())?;
            Ok(format!("{}\n", created.id))
        }
        SitCommand::CreateVersion {
            sit_id,
            entity_type,
            primary_regex,
            primary_keyword,
            supporting_mode,
            min_n,
        } => {
            let sit_id = parse_uuid(&sit_id)?;
            let primary_element = match (primary_regex, primary_keyword) {
                (Some(regex), _) => PrimaryElement::Regex(regex),
                (None, Some(keyword)) => PrimaryElement::Keyword(keyword),
                (None, None) => {
                    return Err(DlpError::InvalidOption {
                        message: "one of --primary-regex or --primary-keyword is required".to_string(),
                    })
                }
            };
            let supporting_logic = match supporting_mode.to_uppercase().as_str() {
                "ALL" => SupportingLogic::All,
                "MIN_N" => SupportingLogic::MinN {
                    min_n: min_n.ok_or_else(|| DlpError::InvalidOption {
                        message: "--min-n is required for MIN_N supporting logic".to_string(),
                    })?,
                },
                _ => SupportingLogic::Any,
            };

            let version = sit::repository::create_version(
                conn,
                sit_id,
                NewVersion {
                    entity_type,
                    confidence: None,
                    source: Some("cli".to_string()),
                    primary_element,
                    supporting_logic,
                    supporting_groups: vec![],
                },
            )?;
            Ok(format!("{} v{}\n", version.id, version.version_number))
        }
    }
}

fn run_keyword_list(conn: &mut rusqlite::Connection, args: dlp_scan::cli::KeywordListArgs) -> Result<String> {
    match args.command {
        KeywordListCommand::Create {
            name,
            description,
            items,
        } => {
            let list = sit::repository::create_keyword_list(conn, &name, description.as_deref(), &items)?;
            Ok(format!("{}\n", list.id))
        }
        KeywordListCommand::List => {
            let lists = sit::repository::list_keyword_lists(conn)?;
            let mut out = String::new();
            for list in lists {
                out.push_str(&format!("{} {} ({} items)\n", list.id, list.name, list.items.len()));
            }
            Ok(out)
        }
    }
}

fn run_rulepack(conn: &mut rusqlite::Connection, args: dlp_scan::cli::RulepackArgs) -> Result<String> {
    match args.command {
        RulepackCommand::Create {
            name,
            version,
            description,
            publisher,
            locale,
        } => {
            let created = rulepack::repository::create_rulepack(
                conn,
                rulepack::repository::NewRulepack {
                    name: &name,
                    version: &version,
                    description: description.as_deref(),
                    publisher: publisher.as_deref(),
                    locale: locale.as_deref(),
                },
            )?;
            Ok(format!("{}\n", created.id))
        }
        RulepackCommand::List => {
            let packs = rulepack::repository::list_rulepacks(conn)?;
            let mut out = String::new();
            for pack in packs {
                out.push_str(&format!("{} {} v{}\n", pack.id, pack.name, pack.version));
            }
            Ok(out)
        }
        RulepackCommand::Select {
            rulepack_id,
            sit_version_ids,
        } => {
            let rulepack_id = parse_uuid(&rulepack_id)?;
            let version_ids = sit_version_ids
                .iter()
                .map(|s| parse_uuid(s))
                .collect::<Result<Vec<_>>>()?;
            rulepack::repository::set_selections(conn, rulepack_id, &version_ids)?;
            Ok(format!("selected {} versions\n", version_ids.len()))
        }
        RulepackCommand::Export { rulepack_id, out } => {
            let rulepack_id = parse_uuid(&rulepack_id)?;
            let pack = rulepack::repository::get_rulepack(conn, rulepack_id)?.ok_or_else(|| {
                DlpError::InvalidOption {
                    message: format!("rulepack {rulepack_id} not found"),
                }
            })?;
            let selected_ids = rulepack::repository::list_selections(conn, rulepack_id)?;
            let versions = sit::repository::get_versions_by_ids(conn, &selected_ids)?;
            let xml = rulepack::exporter::build_rule_package(conn, &pack, versions)?;

            if let Some(path) = out {
                std::fs::write(&path, &xml)?;
                Ok(format!("wrote {}\n", path.display()))
            } else {
                Ok(xml)
            }
        }
    }
}
