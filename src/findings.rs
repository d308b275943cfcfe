//! Finding generation: turns raw [`crate::pii::Hit`]s into persisted
//! [`Finding`] records with redacted context and inferred supporting
//! keywords, the material later promoted into SIT primary/supporting rules.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::pii::Hit;

/// Characters of context kept on either side of a match before redaction.
const CONTEXT_WINDOW: usize = 60;
/// Maximum number of supporting keywords kept per finding.
const MAX_SUPPORTING_KEYWORDS: usize = 5;

static STOPWORDS: &[&str] = &["the", "and", "for", "with", "this", "that", "from"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub id: Uuid,
    pub job_id: Uuid,
    pub file_path: String,
    pub entity_type: String,
    pub entity_text: Option<String>,
    pub score: f32,
    pub start: usize,
    pub end: usize,
    pub context: String,
    pub primary_regex: String,
    pub supporting_keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Slice `text` to the `CONTEXT_WINDOW`-bounded window around a hit, in
/// chars rather than bytes so multi-byte text doesn't panic on a split.
fn window(text: &str, hit: &Hit) -> String {
    let chars: Vec<char> = text.chars().collect();
    let char_start = text[..hit.start].chars().count();
    let char_end = text[..hit.end].chars().count();

    let window_start = char_start.saturating_sub(CONTEXT_WINDOW);
    let window_end = (char_end + CONTEXT_WINDOW).min(chars.len());

    chars[window_start..window_end].iter().collect()
}

/// Build a redacted context window around a hit: every occurrence of the
/// matched literal within the window is replaced with `[REDACTED]`, not
/// only the occurrence that triggered the hit.
fn redacted_context(text: &str, hit: &Hit) -> String {
    let window = window(text, hit);
    if hit.text.is_empty() {
        return window;
    }
    window.replace(hit.text.as_str(), "[REDACTED]")
}

/// Pull the most frequent non-stopword tokens around a hit, used to seed a
/// SIT's supporting keyword list. Ties are broken by first occurrence in
/// the window, per the specification.
fn supporting_keywords(text: &str, hit: &Hit) -> Vec<String> {
    let window = window(text, hit);
    let entity_lower = hit.text.to_lowercase();

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut first_seen: HashMap<String, usize> = HashMap::new();
    let mut order = 0usize;
    for word in window.split(|c: char| !c.is_ascii_alphabetic()) {
        if word.len() < 3 {
            continue;
        }
        let lower = word.to_lowercase();
        if STOPWORDS.contains(&lower.as_str()) || entity_lower.contains(&lower) {
            continue;
        }
        *counts.entry(lower.clone()).or_insert(0) += 1;
        first_seen.entry(lower).or_insert_with(|| {
            order += 1;
            order
        });
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| first_seen[&a.0].cmp(&first_seen[&b.0]))
    });
    ranked
        .into_iter()
        .take(MAX_SUPPORTING_KEYWORDS)
        .map(|(word, _)| word)
        .collect()
}

/// Derive a primary regex for an entity type and its matched text. Known
/// entity types get a fixed, hand-tuned pattern; anything else falls back
/// to a character-class generalization of the literal text.
pub fn infer_regex(entity_type: &str, entity_text: &str) -> String {
    match entity_type {
        "SSN" => r"\b\d{3}-\d{2}-\d{4}\b".to_string(),
        "CREDIT_CARD" => r"\b(?:\d[ -]*?){13,19}\b".to_string(),
        "PHONE_NUMBER" => r"\b\+?\d[\d\s().-]{7,}\b".to_string(),
        "EMAIL_ADDRESS" => {
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b".to_string()
        }
        "IP_ADDRESS" => r"\b(?:\d{1,3}\.){3}\d{1,3}\b".to_string(),
        _ => generalize(entity_text),
    }
}

/// digit -> `\d`, ASCII letter -> `[A-Za-z]`, whitespace -> `\s`, anything
/// else is escaped as a literal.
fn generalize(text: &str) -> String {
    let mut out = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() {
            out.push_str(r"\d");
        } else if c.is_ascii_alphabetic() {
            out.push_str("[A-Za-z]");
        } else if c.is_whitespace() {
            out.push_str(r"\s");
        } else {
            out.push_str(&regex::escape(&c.to_string()));
        }
    }
    out
}

/// Generate a [`Finding`] for one detected hit within `text`.
pub fn build_finding(job_id: Uuid, file_path: &str, text: &str, hit: &Hit) -> Finding {
    let primary_regex = infer_regex(&hit.entity_type, &hit.text);

    Finding {
        id: Uuid::new_v4(),
        job_id,
        file_path: file_path.to_string(),
        entity_type: hit.entity_type.clone(),
        entity_text: Some(hit.text.clone()),
        score: hit.score,
        start: hit.start,
        end: hit.end,
        context: redacted_context(text, hit),
        primary_regex,
        supporting_keywords: supporting_keywords(text, hit),
        created_at: Utc::now(),
    }
}

/// Generate findings for every hit detected in `text`.
pub fn build_findings(job_id: Uuid, file_path: &str, text: &str, hits: &[Hit]) -> Vec<Finding> {
    hits.iter()
        .map(|hit| build_finding(job_id, file_path, text, hit))
        .collect()
}

/// Persist a finding to the `scan_findings` table.
pub fn record_finding(conn: &Connection, finding: &Finding) -> Result<()> {
    conn.execute(
        "INSERT INTO scan_findings (
            id, job_id, file_path, entity_type, entity_text, score, start, end,
            context, primary_regex, supporting_keywords, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            finding.id.to_string(),
            finding.job_id.to_string(),
            finding.file_path,
            finding.entity_type,
            finding.entity_text,
            finding.score,
            finding.start as i64,
            finding.end as i64,
            finding.context,
            finding.primary_regex,
            serde_json::to_string(&finding.supporting_keywords).unwrap_or_else(|_| "[]".to_string()),
            finding.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pii::{PiiRecognizer, RegexRecognizer};

    #[test]
    fn redacts_ssn_and_surfaces_supporting_keyword() {
        let text = "Employee social security number is 123-45-6789 on file.";
        let recognizer = RegexRecognizer;
        let hits = recognizer.analyze_text(text, &[], "en");
        assert_eq!(hits.len(), 1);

        let finding = build_finding(Uuid::new_v4(), "report.txt", text, &hits[0]);
        assert!(finding.context.contains("[REDACTED]"));
        assert!(!finding.context.contains("123-45-6789"));
        assert_eq!(finding.primary_regex, r"\b\d{3}-\d{2}-\d{4}\b");
        assert!(finding
            .supporting_keywords
            .iter()
            .any(|k| k == "social" || k == "security"));
    }
}
