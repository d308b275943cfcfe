//! PII detection facade. Recognizer and OCR engines are injectable traits,
//! the same way the `security` pattern database in this codebase's lineage
//! is handed to its callers rather than reached for as a singleton; a
//! production deployment plugs in a real NLP/OCR backend behind these
//! traits, while tests and default runs use the bundled regex backend.

use once_cell::sync::Lazy;
use regex::Regex;

/// A single detected entity span within a piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub score: f32,
}

/// Text-based PII recognition backend.
pub trait PiiRecognizer: Send + Sync {
    fn analyze_text(&self, text: &str, entities: &[String], language: &str) -> Vec<Hit>;
}

/// Image-to-text backend used for OCR over rendered document pages.
pub trait OcrEngine: Send + Sync {
    fn recognize_text(&self, image_path: &std::path::Path) -> crate::error::Result<String>;
}

struct PatternDef {
    entity_type: &'static str,
    pattern: &'static str,
}

const PATTERNS: &[PatternDef] = &[
    PatternDef {
        entity_type: "SSN",
        pattern: r"\b\d{3}-\d{2}-\d{4}\b",
    },
    PatternDef {
        entity_type: "CREDIT_CARD",
        pattern: r"\b(?:\d[ -]?){13,16}\b",
    },
    PatternDef {
        entity_type: "PHONE_NUMBER",
        pattern: r"\b(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]\d{3}[-.\s]\d{4}\b",
    },
    PatternDef {
        entity_type: "EMAIL_ADDRESS",
        pattern: r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
    },
    PatternDef {
        entity_type: "IP_ADDRESS",
        pattern: r"\b(?:(?:25[0-5]|2[0-4]\d|[01]?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|[01]?\d?\d)\b",
    },
];

static COMPILED: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    PATTERNS
        .iter()
        .map(|p| (p.entity_type, Regex::new(p.pattern).expect("static pattern is valid")))
        .collect()
});

/// Default recognizer: a fixed set of regexes covering the entity types
/// named in the specification. Matches are scored uniformly since there is
/// no statistical model behind them.
#[derive(Debug, Default)]
pub struct RegexRecognizer;

impl PiiRecognizer for RegexRecognizer {
    fn analyze_text(&self, text: &str, entities: &[String], _language: &str) -> Vec<Hit> {
        let wanted: Option<Vec<&str>> = if entities.is_empty() {
            None
        } else {
            Some(entities.iter().map(String::as_str).collect())
        };

        let mut hits = Vec::new();
        for (entity_type, regex) in COMPILED.iter() {
            if let Some(wanted) = &wanted {
                if !wanted.contains(entity_type) {
                    continue;
                }
            }
            for m in regex.find_iter(text) {
                hits.push(Hit {
                    entity_type: entity_type.to_string(),
                    start: m.start(),
                    end: m.end(),
                    text: m.as_str().to_string(),
                    score: 0.85,
                });
            }
        }
        hits.sort_by_key(|h| h.start);
        hits
    }
}

/// OCR backend used when no real OCR engine is configured: always returns
/// empty text, so rasterized pages simply contribute no additional hits.
#[derive(Debug, Default)]
pub struct NullOcrEngine;

impl OcrEngine for NullOcrEngine {
    fn recognize_text(&self, _image_path: &std::path::Path) -> crate::error::Result<String> {
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_ssn_and_email() {
        let recognizer = RegexRecognizer;
        let hits = recognizer.analyze_text(
            "Contact me at jane@example.com, SSN 123-45-6789",
            &[],
            "en",
        );
        let types: Vec<&str> = hits.iter().map(|h| h.entity_type.as_str()).collect();
        assert!(types.contains(&"EMAIL_ADDRESS"));
        assert!(types.contains(&"SSN"));
    }

    #[test]
    fn filters_by_requested_entities() {
        let recognizer = RegexRecognizer;
        let hits = recognizer.analyze_text(
            "email a@b.com and ssn 123-45-6789",
            &["SSN".to_string()],
            "en",
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity_type, "SSN");
    }
}
