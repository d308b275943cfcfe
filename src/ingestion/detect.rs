//! File type classification by extension.

use std::path::Path;

/// A coarse file classification used to dispatch to the right extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Pdf,
    Docx,
    Pptx,
    Xlsx,
    Text,
    Email,
    Image,
    Archive,
    Unknown,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Pptx => "pptx",
            FileKind::Xlsx => "xlsx",
            FileKind::Text => "text",
            FileKind::Email => "email",
            FileKind::Image => "image",
            FileKind::Archive => "archive",
            FileKind::Unknown => "unknown",
        }
    }
}

/// Classify a path to one of the supported kinds, based purely on its
/// (lowercased) suffix. The tar detector covers both the single-suffix
/// forms (`.tar`, `.tgz`) and the two-suffix form (`.tar.gz`).
pub fn classify(path: &Path) -> FileKind {
    let suffix = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match suffix.as_str() {
        "pdf" => return FileKind::Pdf,
        "docx" => return FileKind::Docx,
        "pptx" => return FileKind::Pptx,
        "xlsx" => return FileKind::Xlsx,
        "txt" | "md" | "csv" => return FileKind::Text,
        "eml" | "msg" => return FileKind::Email,
        "png" | "jpg" | "jpeg" | "tiff" | "gif" | "bmp" => return FileKind::Image,
        "zip" | "rar" | "7z" | "tar" | "tgz" => return FileKind::Archive,
        _ => {}
    }

    if file_name.ends_with(".tar.gz") {
        return FileKind::Archive;
    }

    FileKind::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn classifies_known_suffixes() {
        assert_eq!(classify(&PathBuf::from("a.pdf")), FileKind::Pdf);
        assert_eq!(classify(&PathBuf::from("a.docx")), FileKind::Docx);
        assert_eq!(classify(&PathBuf::from("a.pptx")), FileKind::Pptx);
        assert_eq!(classify(&PathBuf::from("a.xlsx")), FileKind::Xlsx);
        assert_eq!(classify(&PathBuf::from("a.txt")), FileKind::Text);
        assert_eq!(classify(&PathBuf::from("a.CSV")), FileKind::Text);
        assert_eq!(classify(&PathBuf::from("a.eml")), FileKind::Email);
        assert_eq!(classify(&PathBuf::from("a.msg")), FileKind::Email);
        assert_eq!(classify(&PathBuf::from("a.png")), FileKind::Image);
        assert_eq!(classify(&PathBuf::from("a.zip")), FileKind::Archive);
        assert_eq!(classify(&PathBuf::from("a.rar")), FileKind::Archive);
        assert_eq!(classify(&PathBuf::from("a.7z")), FileKind::Archive);
        assert_eq!(classify(&PathBuf::from("a.tar")), FileKind::Archive);
        assert_eq!(classify(&PathBuf::from("a.tgz")), FileKind::Archive);
        assert_eq!(classify(&PathBuf::from("a.tar.gz")), FileKind::Archive);
        assert_eq!(classify(&PathBuf::from("a.exe")), FileKind::Unknown);
    }
}
