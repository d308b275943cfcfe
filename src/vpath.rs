//! Virtual-path identity for nested container members.
//!
//! A virtual path survives archive/email expansion using `::` as the
//! separator between container levels, e.g.
//! `inbox.zip::mail.eml::attachments/report.pdf::page_3`.

use std::path::{Component, Path};

/// Join a parent virtual path with a child segment.
pub fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}::{child}")
    }
}

/// Split a virtual path into its `::`-separated segments.
pub fn segments(virtual_path: &str) -> Vec<&str> {
    virtual_path.split("::").collect()
}

/// Restrict a single filename component to `[A-Za-z0-9._-]`, dropping all
/// other characters. Used for every name written to disk by an extractor.
pub fn safe_filename(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|os| os.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string());
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Normalize a relative path, rejecting absolute paths and `..` components,
/// and sanitizing each surviving component with [`safe_filename`].
pub fn safe_relative_path(path: &str) -> Option<std::path::PathBuf> {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        return None;
    }

    let mut parts = Vec::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_string_lossy();
                if part.is_empty() {
                    continue;
                }
                parts.push(safe_filename(&part));
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if parts.is_empty() {
        return None;
    }

    let mut result = std::path::PathBuf::new();
    for part in parts {
        result.push(part);
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_nests_with_double_colon() {
        assert_eq!(join("inbox.zip", "mail.eml"), "inbox.zip::mail.eml");
        assert_eq!(join("", "root.txt"), "root.txt");
    }

    #[test]
    fn safe_filename_drops_unsafe_characters() {
        assert_eq!(safe_filename("../../evil name!.txt"), "evilname.txt");
        assert_eq!(safe_filename("report (final).pdf"), "reportfinal.pdf");
    }

    #[test]
    fn safe_relative_path_rejects_traversal() {
        assert!(safe_relative_path("../evil.txt").is_none());
        assert!(safe_relative_path("/etc/passwd").is_none());
        assert_eq!(
            safe_relative_path("a/b/c.txt").unwrap(),
            std::path::PathBuf::from("a/b/c.txt")
        );
    }
}
