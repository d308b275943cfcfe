//! File processor: the recursive dispatcher that walks a root path (and any
//! directories/archives/emails nested within it), extracts text, runs PII
//! detection, and records scan items and findings.

use std::path::Path;
use std::sync::Arc;

use rusqlite::Connection;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::error::Result;
use crate::findings::{build_findings, Finding};
use crate::ingestion::{archive, documents, email, FileKind};
use crate::job::{OcrMode, ScanOptions};
use crate::pii::{OcrEngine, PiiRecognizer};
use crate::scan_item::{self, ScanItem};
use crate::vpath;

/// Running counters for a single job's walk, threaded by mutable reference
/// through the whole recursion the same way the original `ProcessingStats`
/// object is passed down through `_process_*` calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessingStats {
    pub files_processed: u64,
    pub entities_found: u64,
}

/// Result of processing a single virtual path: the scan item recorded for
/// it (if any), any non-fatal warnings, and child outcomes produced by
/// recursing into directories, archives, or emails.
#[derive(Debug)]
pub struct Outcome {
    pub scan_item: Option<ScanItem>,
    pub findings: Vec<Finding>,
    pub warnings: Vec<String>,
    pub children: Vec<Outcome>,
}

impl Outcome {
    fn empty() -> Self {
        Self {
            scan_item: None,
            findings: Vec::new(),
            warnings: Vec::new(),
            children: Vec::new(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            warnings: vec![message.into()],
            ..Self::empty()
        }
    }

    /// Flatten this outcome and all descendants' findings into one list.
    pub fn all_findings(&self) -> Vec<Finding> {
        let mut out = self.findings.clone();
        for child in &self.children {
            out.extend(child.all_findings());
        }
        out
    }
}

pub struct FileProcessor {
    pub settings: Settings,
    pub recognizer: Arc<dyn PiiRecognizer>,
    pub ocr_engine: Arc<dyn OcrEngine>,
}

impl FileProcessor {
    pub fn new(
        settings: Settings,
        recognizer: Arc<dyn PiiRecognizer>,
        ocr_engine: Arc<dyn OcrEngine>,
    ) -> Self {
        Self {
            settings,
            recognizer,
            ocr_engine,
        }
    }

    /// Process a path at the root of a job (depth 0). If `path` is a
    /// directory it becomes the root that every descendant's virtual path
    /// is computed relative to; if it is a single file, the virtual path is
    /// its canonical absolute path.
    pub fn process_root(
        &self,
        conn: &Connection,
        job_id: Uuid,
        path: &Path,
        options: &ScanOptions,
    ) -> Result<(Outcome, ProcessingStats)> {
        let mut stats = ProcessingStats::default();
        let root_dir = if path.is_dir() { Some(path) } else { None };
        let virtual_path = if root_dir.is_some() {
            String::new()
        } else {
            path.canonicalize()
                .unwrap_or_else(|_| path.to_path_buf())
                .to_string_lossy()
                .to_string()
        };
        let outcome = self.process_path(
            conn,
            job_id,
            path,
            &virtual_path,
            0,
            root_dir,
            options,
            &mut stats,
        )?;
        Ok((outcome, stats))
    }

    #[allow(clippy::too_many_arguments)]
    fn process_path(
        &self,
        conn: &Connection,
        job_id: Uuid,
        path: &Path,
        virtual_path: &str,
        depth: u32,
        root_dir: Option<&Path>,
        options: &ScanOptions,
        stats: &mut ProcessingStats,
    ) -> Result<Outcome> {
        if depth > self.settings.max_archive_depth {
            debug!(path = %path.display(), depth, "max_archive_depth_exceeded");
            return Ok(Outcome::warning(format!(
                "{virtual_path}: maximum archive nesting depth exceeded, not processed"
            )));
        }

        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to stat path");
                return Ok(Outcome::warning(format!("{virtual_path}: {e}")));
            }
        };

        if metadata.is_dir() {
            return self.process_directory(conn, job_id, path, depth, root_dir, options, stats);
        }

        if metadata.len() > self.settings.max_file_size_bytes() {
            debug!(path = %path.display(), "file_too_large");
            return Ok(Outcome::warning(format!(
                "{virtual_path}: file exceeds maximum size and was skipped"
            )));
        }

        let hash = crate::processed_cache::file_hash(path)?;
        if crate::processed_cache::is_hash_processed(conn, &hash)? {
            debug!(path = %path.display(), "already_processed");
            return Ok(Outcome::empty());
        }

        let virtual_path = self.resolve_virtual_path(path, virtual_path, root_dir);
        stats.files_processed += 1;

        let kind = crate::ingestion::detect::classify(path);
        let outcome = match kind {
            FileKind::Archive => {
                self.process_archive(conn, job_id, path, &virtual_path, depth, options, stats)?
            }
            FileKind::Email => {
                self.process_email(conn, job_id, path, &virtual_path, depth, options, stats)?
            }
            FileKind::Pdf => self.process_pdf(conn, job_id, path, &virtual_path, options, stats)?,
            FileKind::Docx => match documents::extract_docx_text(path) {
                Ok(extraction) => self.process_extraction(
                    conn, job_id, path, &virtual_path, options, stats, extraction,
                    Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
                )?,
                Err(e) => self.record_leaf_error(conn, job_id, path, &virtual_path, e)?,
            },
            FileKind::Pptx => match documents::extract_pptx_text(path) {
                Ok(extraction) => self.process_extraction(
                    conn, job_id, path, &virtual_path, options, stats, extraction,
                    Some("application/vnd.openxmlformats-officedocument.presentationml.presentation"),
                )?,
                Err(e) => self.record_leaf_error(conn, job_id, path, &virtual_path, e)?,
            },
            FileKind::Xlsx => match documents::extract_xlsx_text(path) {
                Ok(extraction) => self.process_extraction(
                    conn, job_id, path, &virtual_path, options, stats, extraction,
                    Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
                )?,
                Err(e) => self.record_leaf_error(conn, job_id, path, &virtual_path, e)?,
            },
            FileKind::Text => {
                match self.process_text_file(conn, job_id, path, &virtual_path, options, stats) {
                    Ok(outcome) => outcome,
                    Err(e) => self.record_leaf_error(conn, job_id, path, &virtual_path, e)?,
                }
            }
            FileKind::Image => {
                self.process_image(conn, job_id, path, &virtual_path, options, stats)?
            }
            FileKind::Unknown => {
                debug!(path = %path.display(), "unsupported_file_type");
                Outcome::empty()
            }
        };

        crate::processed_cache::mark_processed(conn, &hash, &path.to_string_lossy())?;
        Ok(outcome)
    }

    /// Record a per-leaf extraction failure as a warning-carrying scan item
    /// rather than letting it propagate and fail the whole job.
    fn record_leaf_error(
        &self,
        conn: &Connection,
        job_id: Uuid,
        path: &Path,
        virtual_path: &str,
        error: crate::error::DlpError,
    ) -> Result<Outcome> {
        warn!(path = %path.display(), error = %error, "leaf extraction failed");
        let item = scan_item::new_item(
            job_id,
            virtual_path.to_string(),
            Some(path.to_string_lossy().to_string()),
            None,
            "none".to_string(),
            false,
            "",
            vec![format!("{virtual_path}: {error}")],
        );
        scan_item::add_item(conn, &item)?;
        Ok(Outcome {
            scan_item: Some(item),
            findings: Vec::new(),
            warnings: Vec::new(),
            children: Vec::new(),
        })
    }

    /// `root_dir`-relative path when a root directory is tracked, otherwise
    /// the caller-supplied virtual path unchanged (already absolute or
    /// container-joined).
    fn resolve_virtual_path(&self, path: &Path, given: &str, root_dir: Option<&Path>) -> String {
        if let Some(root) = root_dir {
            path.strip_prefix(root)
                .map(|rel| rel.to_string_lossy().replace('\\', "/"))
                .unwrap_or_else(|_| given.to_string())
        } else {
            given.to_string()
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn process_directory(
        &self,
        conn: &Connection,
        job_id: Uuid,
        path: &Path,
        depth: u32,
        root_dir: Option<&Path>,
        options: &ScanOptions,
        stats: &mut ProcessingStats,
    ) -> Result<Outcome> {
        let mut entries: Vec<_> = std::fs::read_dir(path)?.filter_map(|e| e.ok()).collect();
        entries.sort_by_key(|e| e.file_name());

        let mut children = Vec::with_capacity(entries.len());
        for entry in entries {
            let child_path = entry.path();
            let child_vpath = self.resolve_virtual_path(
                &child_path,
                &child_path.to_string_lossy(),
                root_dir,
            );
            let child = self.process_path(
                conn, job_id, &child_path, &child_vpath, depth, root_dir, options, stats,
            )?;
            children.push(child);
        }

        Ok(Outcome {
            scan_item: None,
            findings: Vec::new(),
            warnings: Vec::new(),
            children,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn analyze_and_record(
        &self,
        conn: &Connection,
        job_id: Uuid,
        path: &Path,
        virtual_path: &str,
        text: &str,
        method: &str,
        mime_type: Option<&str>,
        ocr_used: bool,
        options: &ScanOptions,
        warnings: Vec<String>,
        stats: &mut ProcessingStats,
    ) -> Result<Outcome> {
        let hits = self
            .recognizer
            .analyze_text(text, &options.entities, &options.language);
        let hits: Vec<_> = hits
            .into_iter()
            .filter(|h| h.score >= options.score_threshold)
            .collect();
        stats.entities_found += hits.len() as u64;
        let findings = build_findings(job_id, virtual_path, text, &hits);

        let item = scan_item::new_item(
            job_id,
            virtual_path.to_string(),
            Some(path.to_string_lossy().to_string()),
            mime_type.map(str::to_string),
            method.to_string(),
            ocr_used,
            text,
            warnings,
        );
        scan_item::add_item(conn, &item)?;

        Ok(Outcome {
            scan_item: Some(item),
            findings,
            warnings: Vec::new(),
            children: Vec::new(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn process_extraction(
        &self,
        conn: &Connection,
        job_id: Uuid,
        path: &Path,
        virtual_path: &str,
        options: &ScanOptions,
        stats: &mut ProcessingStats,
        extraction: documents::TextExtraction,
        mime_type: Option<&str>,
    ) -> Result<Outcome> {
        self.analyze_and_record(
            conn, job_id, path, virtual_path, &extraction.text, "text", mime_type, false, options,
            Vec::new(), stats,
        )
    }

    fn process_text_file(
        &self,
        conn: &Connection,
        job_id: Uuid,
        path: &Path,
        virtual_path: &str,
        options: &ScanOptions,
        stats: &mut ProcessingStats,
    ) -> Result<Outcome> {
        // Stream the file in ~1MiB chunks rather than loading it whole,
        // preserving only the first three chunks for the scan-item preview.
        const CHUNK_SIZE: usize = 1024 * 1024;
        use std::io::Read;

        let mut file = std::fs::File::open(path)?;
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut preview_chunks: Vec<String> = Vec::new();
        let mut all_text = String::new();
        let mut warnings = Vec::new();
        let mut findings_total = Vec::new();
        let mut chunk_index = 0usize;

        loop {
            let read = file.read(&mut buf)?;
            if read == 0 {
                break;
            }
            let chunk_text = String::from_utf8_lossy(&buf[..read]).to_string();
            if !chunk_text.trim().is_empty() {
                let hits = self.recognizer.analyze_text(
                    &chunk_text,
                    &options.entities,
                    &options.language,
                );
                let hits: Vec<_> = hits
                    .into_iter()
                    .filter(|h| h.score >= options.score_threshold)
                    .collect();
                stats.entities_found += hits.len() as u64;
                findings_total.extend(build_findings(job_id, virtual_path, &chunk_text, &hits));
            }
            if chunk_index < 3 {
                preview_chunks.push(chunk_text.clone());
            }
            all_text.push_str(&chunk_text);
            chunk_index += 1;
        }

        if all_text.is_empty() {
            warnings.push(format!("{virtual_path}: file produced no text"));
        }

        let preview_source = preview_chunks.join("");
        let item = scan_item::new_item(
            job_id,
            virtual_path.to_string(),
            Some(path.to_string_lossy().to_string()),
            Some("text/plain".to_string()),
            "text".to_string(),
            false,
            &preview_source,
            warnings,
        );
        // text_chars must reflect the full stream, not just the preview.
        let item = ScanItem {
            text_chars: all_text.chars().count(),
            ..item
        };
        scan_item::add_item(conn, &item)?;

        Ok(Outcome {
            scan_item: Some(item),
            findings: findings_total,
            warnings: Vec::new(),
            children: Vec::new(),
        })
    }

    /// PDFs are analyzed as text when a text layer exists and OCR is not
    /// forced; otherwise each rendered page recurses as its own `image`
    /// leaf under `"{parent}::page_<n>"`, so every page gets its own
    /// scan-item and findings rather than one blob covering the whole
    /// document.
    fn process_pdf(
        &self,
        conn: &Connection,
        job_id: Uuid,
        path: &Path,
        virtual_path: &str,
        options: &ScanOptions,
        stats: &mut ProcessingStats,
    ) -> Result<Outcome> {
        let extracted_text = documents::extract_pdf_text(path)
            .map(|e| e.text)
            .unwrap_or_default();
        let has_text = !extracted_text.trim().is_empty();

        if options.ocr_mode == OcrMode::Off {
            let warnings = if has_text {
                Vec::new()
            } else {
                vec![format!("{virtual_path}: pdf contains no extractable text")]
            };
            return self.analyze_and_record(
                conn, job_id, path, virtual_path, &extracted_text, "text",
                Some("application/pdf"), false, options, warnings, stats,
            );
        }

        if has_text && options.ocr_mode != OcrMode::Force {
            return self.analyze_and_record(
                conn, job_id, path, virtual_path, &extracted_text, "text",
                Some("application/pdf"), false, options, Vec::new(), stats,
            );
        }

        let temp_dir = std::env::temp_dir().join(format!("dlp-ocr-{}", Uuid::new_v4()));
        let mut children = Vec::new();
        let mut warnings = Vec::new();

        match documents::render_pdf_to_images(path, &temp_dir, self.settings.ocr_max_pages) {
            Ok(pages) => {
                for (index, page) in pages.iter().enumerate() {
                    let page_vpath = vpath::join(virtual_path, &format!("page_{}", index + 1));
                    let ocr_text = self.ocr_engine.recognize_text(page).unwrap_or_default();
                    let page_warnings = if ocr_text.trim().is_empty() {
                        vec![format!("{page_vpath}: OCR produced no text")]
                    } else {
                        Vec::new()
                    };
                    stats.files_processed += 1;
                    let child = self.analyze_and_record(
                        conn, job_id, page, &page_vpath, &ocr_text, "ocr", Some("image"), true,
                        options, page_warnings, stats,
                    )?;
                    children.push(child);
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "pdf rasterization failed");
                warnings.push(format!("{virtual_path}: pdf rasterization failed: {e}"));
            }
        }
        let _ = std::fs::remove_dir_all(&temp_dir);

        let force_hybrid = has_text && options.ocr_mode == OcrMode::Force;
        let method = if force_hybrid { "hybrid" } else { "ocr" };
        let analyzed_text = if force_hybrid { extracted_text.as_str() } else { "" };

        let mut outcome = self.analyze_and_record(
            conn, job_id, path, virtual_path, analyzed_text, method, Some("application/pdf"),
            true, options, warnings, stats,
        )?;
        outcome.children = children;
        Ok(outcome)
    }

    fn process_image(
        &self,
        conn: &Connection,
        job_id: Uuid,
        path: &Path,
        virtual_path: &str,
        options: &ScanOptions,
        stats: &mut ProcessingStats,
    ) -> Result<Outcome> {
        if options.ocr_mode == OcrMode::Off {
            return self.analyze_and_record(
                conn, job_id, path, virtual_path, "", "none", Some("image"), false, options,
                vec!["OCR disabled".to_string()], stats,
            );
        }
        let text = self.ocr_engine.recognize_text(path).unwrap_or_default();
        let warnings = if text.trim().is_empty() {
            vec!["OCR produced no text".to_string()]
        } else {
            Vec::new()
        };
        self.analyze_and_record(
            conn, job_id, path, virtual_path, &text, "ocr", Some("image"), true, options,
            warnings, stats,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn process_archive(
        &self,
        conn: &Connection,
        job_id: Uuid,
        path: &Path,
        virtual_path: &str,
        depth: u32,
        options: &ScanOptions,
        stats: &mut ProcessingStats,
    ) -> Result<Outcome> {
        let destination = std::env::temp_dir().join(format!("dlp-archive-{}", Uuid::new_v4()));
        let result = archive::extract(
            path,
            &destination,
            self.settings.max_archive_files,
            self.settings.max_archive_bytes,
        );

        let extracted = match result {
            Ok(extracted) => extracted,
            Err(e) => {
                let item = scan_item::new_item(
                    job_id,
                    virtual_path.to_string(),
                    Some(path.to_string_lossy().to_string()),
                    None,
                    "container".to_string(),
                    false,
                    "",
                    vec![format!("archive extraction failed: {e}")],
                );
                scan_item::add_item(conn, &item)?;
                return Ok(Outcome {
                    scan_item: Some(item),
                    findings: Vec::new(),
                    warnings: Vec::new(),
                    children: Vec::new(),
                });
            }
        };

        let item = scan_item::new_item(
            job_id,
            virtual_path.to_string(),
            Some(path.to_string_lossy().to_string()),
            None,
            "container".to_string(),
            false,
            "",
            Vec::new(),
        );
        scan_item::add_item(conn, &item)?;

        let mut children = Vec::new();
        for extracted_item in &extracted {
            let child_vpath = vpath::join(virtual_path, &extracted_item.relative_path);
            let child = self.process_path(
                conn, job_id, &extracted_item.path, &child_vpath, depth + 1, None, options, stats,
            )?;
            children.push(child);
        }
        let _ = std::fs::remove_dir_all(&destination);

        Ok(Outcome {
            scan_item: Some(item),
            findings: Vec::new(),
            warnings: Vec::new(),
            children,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn process_email(
        &self,
        conn: &Connection,
        job_id: Uuid,
        path: &Path,
        virtual_path: &str,
        depth: u32,
        options: &ScanOptions,
        stats: &mut ProcessingStats,
    ) -> Result<Outcome> {
        let destination = std::env::temp_dir().join(format!("dlp-email-{}", Uuid::new_v4()));
        let is_msg = path
            .extension()
            .map(|e| e.to_string_lossy().eq_ignore_ascii_case("msg"))
            .unwrap_or(false);

        let extract_options = email::EmailExtractOptions {
            include_headers: options.include_headers,
            parse_html: options.parse_html,
            include_attachments: options.include_attachments,
            include_inline_images: options.include_inline_images,
        };
        let result = if is_msg {
            email::extract_msg(
                path, &destination, &extract_options,
                self.settings.max_email_attachments, self.settings.max_email_bytes,
            )
        } else {
            email::extract_eml(
                path, &destination, &extract_options,
                self.settings.max_email_attachments, self.settings.max_email_bytes,
            )
        };

        let (items, warnings) = match result {
            Ok(ok) => ok,
            Err(e) => {
                let item = scan_item::new_item(
                    job_id,
                    virtual_path.to_string(),
                    Some(path.to_string_lossy().to_string()),
                    None,
                    "container".to_string(),
                    false,
                    "",
                    vec![format!("email extraction failed: {e}")],
                );
                scan_item::add_item(conn, &item)?;
                return Ok(Outcome {
                    scan_item: Some(item),
                    findings: Vec::new(),
                    warnings: Vec::new(),
                    children: Vec::new(),
                });
            }
        };

        let item = scan_item::new_item(
            job_id,
            virtual_path.to_string(),
            Some(path.to_string_lossy().to_string()),
            None,
            "container".to_string(),
            false,
            "",
            warnings,
        );
        scan_item::add_item(conn, &item)?;

        let mut children = Vec::new();
        for extracted_item in &items {
            let child_vpath = vpath::join(virtual_path, &extracted_item.virtual_path);
            let child = self.process_path(
                conn, job_id, &extracted_item.path, &child_vpath, depth + 1, None, options, stats,
            )?;
            children.push(child);
        }
        let _ = std::fs::remove_dir_all(&destination);

        Ok(Outcome {
            scan_item: Some(item),
            findings: Vec::new(),
            warnings: Vec::new(),
            children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pii::{NullOcrEngine, RegexRecognizer};
    use std::io::Write as _;
    use tempfile::tempdir;

    fn processor() -> FileProcessor {
        FileProcessor::new(
            Settings::default(),
            Arc::new(RegexRecognizer),
            Arc::new(NullOcrEngine),
        )
    }

    #[test]
    fn text_file_is_scanned_and_produces_a_finding() {
        let conn = crate::db::open(":memory:").unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "SSN 123-45-6789 on file").unwrap();

        let (outcome, stats) = processor()
            .process_root(&conn, Uuid::new_v4(), &path, &ScanOptions::default())
            .unwrap();

        assert_eq!(stats.files_processed, 1);
        assert_eq!(stats.entities_found, 1);
        assert_eq!(outcome.all_findings().len(), 1);
    }

    #[test]
    fn directory_recurses_into_children() {
        let conn = crate::db::open(":memory:").unwrap();
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("b.txt"), "SSN 123-45-6789").unwrap();

        let (outcome, stats) = processor()
            .process_root(&conn, Uuid::new_v4(), dir.path(), &ScanOptions::default())
            .unwrap();

        assert_eq!(stats.files_processed, 2);
        assert_eq!(outcome.children.len(), 2);
        assert_eq!(outcome.all_findings().len(), 1);
    }

    #[test]
    fn archive_records_a_container_scan_item_and_recurses() {
        let conn = crate::db::open(":memory:").unwrap();
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("bundle.zip");
        {
            let file = std::fs::File::create(&zip_path).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            let options: zip::write::FileOptions<()> = zip::write::FileOptions::default();
            writer.start_file("inner.txt", options).unwrap();
            writer.write_all(b"SSN 123-45-6789").unwrap();
            writer.finish().unwrap();
        }

        let (outcome, stats) = processor()
            .process_root(&conn, Uuid::new_v4(), &zip_path, &ScanOptions::default())
            .unwrap();

        assert_eq!(outcome.scan_item.unwrap().extraction_method, "container");
        assert_eq!(outcome.children.len(), 1);
        assert_eq!(stats.entities_found, 1);
    }

    #[test]
    fn image_with_ocr_off_records_none_with_warning() {
        let conn = crate::db::open(":memory:").unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.png");
        std::fs::write(&path, b"not a real png").unwrap();

        let options = ScanOptions {
            ocr_mode: OcrMode::Off,
            ..ScanOptions::default()
        };
        let (outcome, _) = processor()
            .process_root(&conn, Uuid::new_v4(), &path, &options)
            .unwrap();

        let item = outcome.scan_item.unwrap();
        assert_eq!(item.extraction_method, "none");
        assert!(item.warnings.iter().any(|w| w.contains("OCR disabled")));
    }

    #[test]
    fn already_processed_content_is_skipped_on_second_run() {
        let conn = crate::db::open(":memory:").unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("dup.txt");
        std::fs::write(&path, "hello world").unwrap();

        let (_, stats1) = processor()
            .process_root(&conn, Uuid::new_v4(), &path, &ScanOptions::default())
            .unwrap();
        assert_eq!(stats1.files_processed, 1);

        let (_, stats2) = processor()
            .process_root(&conn, Uuid::new_v4(), &path, &ScanOptions::default())
            .unwrap();
        assert_eq!(stats2.files_processed, 0);
    }
}
