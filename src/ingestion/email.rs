//! `.eml`/`.msg` extraction into virtual-path text and attachment files.

use std::fs;
use std::path::{Path, PathBuf};

use mail_parser::MessageParser;

use crate::error::{DlpError, Result};
use crate::vpath::safe_filename;

/// Knobs that control what an email extraction emits.
#[derive(Debug, Clone, Copy)]
pub struct EmailExtractOptions {
    pub include_headers: bool,
    pub parse_html: bool,
    pub include_attachments: bool,
    pub include_inline_images: bool,
}

impl Default for EmailExtractOptions {
    fn default() -> Self {
        Self {
            include_headers: true,
            parse_html: true,
            include_attachments: true,
            include_inline_images: true,
        }
    }
}

/// One synthetic file produced by email extraction.
#[derive(Debug, Clone)]
pub struct EmailExtractedItem {
    pub path: PathBuf,
    pub virtual_path: String,
}

/// Strip HTML tags and turn block boundaries into line breaks.
pub fn html_to_text(html: &str) -> String {
    const BLOCK_TAGS: &[&str] = &[
        "p", "br", "div", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6",
    ];
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut tag_name = String::new();
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                tag_name.clear();
            }
            '>' => {
                in_tag = false;
                let name = tag_name.trim_start_matches('/').to_lowercase();
                if BLOCK_TAGS.iter().any(|t| name.starts_with(t)) {
                    out.push('\n');
                }
            }
            c if in_tag => tag_name.push(c),
            c => out.push(c),
        }
    }
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_text_file(destination: &Path, name: &str, content: &str) -> Result<PathBuf> {
    fs::create_dir_all(destination)?;
    let target = destination.join(name);
    fs::write(&target, content)?;
    Ok(target)
}

/// Extract a `.eml` message into `destination`, returning the emitted items
/// plus any non-fatal warnings (e.g. attachment caps exceeded).
pub fn extract_eml(
    path: &Path,
    destination: &Path,
    options: &EmailExtractOptions,
    max_attachments: u32,
    max_bytes: u64,
) -> Result<(Vec<EmailExtractedItem>, Vec<String>)> {
    let raw = fs::read(path)?;
    let message = MessageParser::default()
        .parse(&raw)
        .ok_or_else(|| DlpError::email("failed to parse .eml message"))?;

    let mut warnings = Vec::new();
    let mut extracted = Vec::new();
    let mut total_bytes: u64 = 0;

    let header_text = if options.include_headers {
        let mut lines = Vec::new();
        if let Some(subject) = message.subject() {
            lines.push(format!("Subject: {subject}"));
        }
        if let Some(from) = message.from() {
            lines.push(format!("From: {from:?}"));
        }
        if let Some(to) = message.to() {
            lines.push(format!("To: {to:?}"));
        }
        if let Some(cc) = message.cc() {
            lines.push(format!("Cc: {cc:?}"));
        }
        if let Some(date) = message.date() {
            lines.push(format!("Date: {date}"));
        }
        lines.join("\n")
    } else {
        String::new()
    };

    let plain_body = message.body_text(0).map(|c| c.to_string());
    let html_body = message.body_html(0).map(|c| c.to_string());

    let body_text = match (&plain_body, &html_body, options.parse_html) {
        (Some(text), _, _) => Some(text.clone()),
        (None, Some(html), true) => Some(html_to_text(html)),
        _ => None,
    };

    let combined = [header_text.as_str(), body_text.as_deref().unwrap_or("")]
        .iter()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");

    if !combined.trim().is_empty() {
        let body_path = write_text_file(destination, "body.txt", combined.trim())?;
        extracted.push(EmailExtractedItem {
            path: body_path,
            virtual_path: "body.txt".to_string(),
        });
    }

    if let Some(html) = &html_body {
        if options.parse_html {
            let rendered = html_to_text(html);
            let html_path = write_text_file(destination, "body.html.txt", &rendered)?;
            extracted.push(EmailExtractedItem {
                path: html_path,
                virtual_path: "body.html.txt".to_string(),
            });
        }
    }

    if options.include_attachments {
        let attachment_dir = destination.join("attachments");
        let mut attachment_count = 0u32;
        'attachments: for attachment in message.attachments() {
            if attachment.is_message() {
                continue;
            }
            attachment_count += 1;
            if attachment_count > max_attachments {
                warnings.push(
                    "Email contains too many attachments; extra attachments skipped."
                        .to_string(),
                );
                break 'attachments;
            }

            let payload = attachment.contents();
            total_bytes += payload.len() as u64;
            if total_bytes > max_bytes {
                warnings.push(
                    "Email attachments exceed size limit; extra attachments skipped."
                        .to_string(),
                );
                break 'attachments;
            }

            let name = attachment.attachment_name().unwrap_or("attachment");
            let safe_name = safe_filename(name);
            fs::create_dir_all(&attachment_dir)?;
            let target = attachment_dir.join(&safe_name);
            fs::write(&target, payload)?;
            extracted.push(EmailExtractedItem {
                virtual_path: format!("attachments/{safe_name}"),
                path: target,
            });
        }
    }

    if options.include_inline_images {
        let inline_dir = destination.join("inline");
        'inline: for part in message.parts.iter() {
            let is_image = part
                .content_type()
                .map(|ct| ct.c_type.eq_ignore_ascii_case("image"))
                .unwrap_or(false);
            if !is_image {
                continue;
            }
            let is_inline = part.content_id().is_some()
                || part
                    .content_type()
                    .and_then(|ct| ct.c_subtype.as_deref())
                    .map(|s| s.eq_ignore_ascii_case("inline"))
                    .unwrap_or(false);
            if !is_inline {
                continue;
            }

            let payload = part.contents();
            total_bytes += payload.len() as u64;
            if total_bytes > max_bytes {
                warnings.push(
                    "Email inline images exceed size limit; extra images skipped.".to_string(),
                );
                break 'inline;
            }

            let fallback = part
                .content_id()
                .map(|cid| format!("inline_{cid}"))
                .unwrap_or_else(|| "inline_image".to_string());
            let name = part.attachment_name().unwrap_or(&fallback);
            let safe_name = safe_filename(name);
            fs::create_dir_all(&inline_dir)?;
            let target = inline_dir.join(&safe_name);
            fs::write(&target, payload)?;
            extracted.push(EmailExtractedItem {
                virtual_path: format!("inline/{safe_name}"),
                path: target,
            });
        }
    }

    Ok((extracted, warnings))
}

/// Extract a `.msg` message. The richer signature from Open Question (ii) in
/// the specification is implemented: callers always control attachment and
/// inline-image inclusion, matching [`extract_eml`]'s shape. `.msg` is a
/// binary Outlook container; this crate treats it as MIME-shaped by reading
/// it through the same parser, which covers the common case of `.msg` files
/// saved with an embedded RFC 822 stream.
pub fn extract_msg(
    path: &Path,
    destination: &Path,
    options: &EmailExtractOptions,
    max_attachments: u32,
    max_bytes: u64,
) -> Result<(Vec<EmailExtractedItem>, Vec<String>)> {
    extract_eml(path, destination, options, max_attachments, max_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn build_eml() -> Vec<u8> {
        let body = concat!(
            "Subject: Hello\r\n",
            "From: sender@example.com\r\n",
            "To: receiver@example.com\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/mixed; boundary=\"BOUNDARY\"\r\n",
            "\r\n",
            "--BOUNDARY\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "Plain text body\r\n",
            "--BOUNDARY\r\n",
            "Content-Type: application/octet-stream\r\n",
            "Content-Disposition: attachment; filename=\"note.txt\"\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "ZGF0YQ==\r\n",
            "--BOUNDARY--\r\n",
        );
        body.as_bytes().to_vec()
    }

    #[test]
    fn extracts_body_and_attachment() {
        let dir = tempdir().unwrap();
        let eml_path = dir.path().join("sample.eml");
        fs::write(&eml_path, build_eml()).unwrap();

        let (items, warnings) = extract_eml(
            &eml_path,
            &dir.path().join("out"),
            &EmailExtractOptions::default(),
            50,
            1024 * 1024,
        )
        .unwrap();

        let paths: Vec<&str> = items.iter().map(|i| i.virtual_path.as_str()).collect();
        assert!(paths.contains(&"body.txt"));
        assert!(paths.contains(&"attachments/note.txt"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn html_to_text_strips_tags_and_splits_blocks() {
        let html = "<html><body><p>Hello</p><p>World</p></body></html>";
        let text = html_to_text(html);
        assert_eq!(text, "Hello\nWorld");
    }
}
