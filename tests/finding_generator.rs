//! A detected SSN must be redacted in its stored context, and the
//! supporting-keyword extraction must surface the contextual words that
//! corroborate it.

use dlp_scan::findings::build_finding;
use dlp_scan::pii::{PiiRecognizer, RegexRecognizer};
use uuid::Uuid;

#[test]
fn ssn_finding_is_redacted_with_supporting_keywords() {
    let text = "Per HR policy, the employee social security number 123-45-6789 must stay confidential.";
    let recognizer = RegexRecognizer;
    let hits = recognizer.analyze_text(text, &[], "en");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entity_type, "SSN");

    let finding = build_finding(Uuid::new_v4(), "policy.txt", text, &hits[0]);

    assert!(finding.context.contains("[REDACTED]"));
    assert!(!finding.context.contains("123-45-6789"));
    assert_eq!(finding.primary_regex, r"\b\d{3}-\d{2}-\d{4}\b");
    assert!(finding
        .supporting_keywords
        .iter()
        .any(|k| k == "social" || k == "security"));
    assert!(finding.supporting_keywords.len() <= 5);
}
