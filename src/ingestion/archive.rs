//! Safe archive extraction for zip, rar, 7z, and tar(.gz) containers.
//!
//! Every format funnels through [`safe_join`] so the zip-slip defense and
//! the file-count/byte-count caps are enforced exactly once, regardless of
//! which backend crate handles the container.

use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use crate::error::{DlpError, Result};

/// One file produced by extracting an archive.
#[derive(Debug, Clone)]
pub struct ExtractedItem {
    /// Absolute path on disk where the entry was written.
    pub path: PathBuf,
    /// Path relative to the archive root, using `/` separators.
    pub relative_path: String,
}

/// Resolve `member` against `destination_root` lexically, rejecting any
/// result whose canonical parent chain does not contain the root. This is
/// the zip-slip defense shared by every archive backend.
fn safe_join(destination_root: &Path, member: &str) -> Result<PathBuf> {
    let root = destination_root
        .canonicalize()
        .map_err(|e| DlpError::archive(format!("cannot resolve destination: {e}")))?;

    let mut resolved = root.clone();
    for component in Path::new(member).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() || !resolved.starts_with(&root) {
                    return Err(DlpError::archive(
                        "archive entry resolves outside the extraction directory",
                    ));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(DlpError::archive("archive entry uses an absolute path"));
            }
        }
    }

    if !resolved.starts_with(&root) {
        return Err(DlpError::archive(
            "archive entry resolves outside the extraction directory",
        ));
    }
    Ok(resolved)
}

fn relative_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Unpack `archive_path` into `destination`, enforcing `max_files` and
/// `max_bytes`. Directories are skipped; only regular files are emitted.
pub fn extract(
    archive_path: &Path,
    destination: &Path,
    max_files: u64,
    max_bytes: u64,
) -> Result<Vec<ExtractedItem>> {
    fs::create_dir_all(destination)?;

    let suffix = archive_path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let file_name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match suffix.as_str() {
        "zip" => extract_zip(archive_path, destination, max_files, max_bytes),
        "rar" => extract_rar(archive_path, destination, max_files, max_bytes),
        "7z" => extract_7z(archive_path, destination, max_files, max_bytes),
        "tar" | "tgz" => extract_tar(archive_path, destination, max_files, max_bytes),
        _ if file_name.ends_with(".tar.gz") => {
            extract_tar(archive_path, destination, max_files, max_bytes)
        }
        _ => Err(DlpError::archive(format!(
            "unsupported archive type: {}",
            archive_path.display()
        ))),
    }
}

fn extract_zip(
    archive_path: &Path,
    destination: &Path,
    max_files: u64,
    max_bytes: u64,
) -> Result<Vec<ExtractedItem>> {
    let file = fs::File::open(archive_path)?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| DlpError::archive(e.to_string()))?;

    if zip.len() as u64 > max_files {
        return Err(DlpError::archive("archive contains too many files"));
    }

    let root = destination
        .canonicalize()
        .map_err(|e| DlpError::archive(format!("cannot resolve destination: {e}")))?;
    let mut extracted = Vec::new();
    let mut cumulative_bytes: u64 = 0;

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| DlpError::archive(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }

        let declared_size = entry.size();
        cumulative_bytes += declared_size;
        if cumulative_bytes > max_bytes {
            return Err(DlpError::archive(
                "archive exceeds maximum cumulative extracted bytes",
            ));
        }

        let target = safe_join(destination, entry.name())?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&target)?;
        io::copy(&mut entry, &mut out)?;

        extracted.push(ExtractedItem {
            relative_path: relative_name(&root, &target),
            path: target,
        });
    }

    Ok(extracted)
}

fn extract_tar(
    archive_path: &Path,
    destination: &Path,
    max_files: u64,
    max_bytes: u64,
) -> Result<Vec<ExtractedItem>> {
    let file = fs::File::open(archive_path)?;
    let reader: Box<dyn Read> = if archive_path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .as_deref()
        == Some("tar")
    {
        Box::new(file)
    } else {
        Box::new(flate2::read::GzDecoder::new(file))
    };

    let root = destination
        .canonicalize()
        .map_err(|e| DlpError::archive(format!("cannot resolve destination: {e}")))?;
    let mut archive = tar::Archive::new(reader);
    let mut extracted = Vec::new();
    let mut cumulative_bytes: u64 = 0;
    let mut count: u64 = 0;

    for entry in archive
        .entries()
        .map_err(|e| DlpError::archive(e.to_string()))?
    {
        let mut entry = entry.map_err(|e| DlpError::archive(e.to_string()))?;
        if entry.header().entry_type().is_dir() {
            continue;
        }

        count += 1;
        if count > max_files {
            return Err(DlpError::archive("archive contains too many files"));
        }

        cumulative_bytes += entry.header().size().unwrap_or(0);
        if cumulative_bytes > max_bytes {
            return Err(DlpError::archive(
                "archive exceeds maximum cumulative extracted bytes",
            ));
        }

        let name = entry.path().map_err(|e| DlpError::archive(e.to_string()))?;
        let name = name.to_string_lossy().to_string();
        let target = safe_join(destination, &name)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&target)?;
        io::copy(&mut entry, &mut out)?;

        extracted.push(ExtractedItem {
            relative_path: relative_name(&root, &target),
            path: target,
        });
    }

    Ok(extracted)
}

fn extract_7z(
    archive_path: &Path,
    destination: &Path,
    max_files: u64,
    max_bytes: u64,
) -> Result<Vec<ExtractedItem>> {
    let root = destination
        .canonicalize()
        .map_err(|e| DlpError::archive(format!("cannot resolve destination: {e}")))?;

    let mut reader = sevenz_rust::SevenZReader::open(archive_path, sevenz_rust::Password::empty())
        .map_err(|e| DlpError::archive(e.to_string()))?;

    if reader.archive().files.len() as u64 > max_files {
        return Err(DlpError::archive("archive contains too many files"));
    }

    let mut extracted = Vec::new();
    let mut cumulative_bytes: u64 = 0;

    reader
        .for_each_entries(|entry, contents| {
            if entry.is_directory() {
                return Ok(true);
            }

            cumulative_bytes += entry.size();
            if cumulative_bytes > max_bytes {
                return Ok(false);
            }

            let target = safe_join(destination, entry.name())
                .map_err(|e| sevenz_rust::Error::other(e.to_string()))?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| sevenz_rust::Error::other(e.to_string()))?;
            }
            let mut out = fs::File::create(&target)
                .map_err(|e| sevenz_rust::Error::other(e.to_string()))?;
            io::copy(contents, &mut out).map_err(|e| sevenz_rust::Error::other(e.to_string()))?;

            extracted.push(ExtractedItem {
                relative_path: relative_name(&root, &target),
                path: target,
            });
            Ok(true)
        })
        .map_err(|e| DlpError::archive(e.to_string()))?;

    if cumulative_bytes > max_bytes {
        return Err(DlpError::archive(
            "archive exceeds maximum cumulative extracted bytes",
        ));
    }

    Ok(extracted)
}

fn extract_rar(
    archive_path: &Path,
    destination: &Path,
    max_files: u64,
    max_bytes: u64,
) -> Result<Vec<ExtractedItem>> {
    let root = destination
        .canonicalize()
        .map_err(|e| DlpError::archive(format!("cannot resolve destination: {e}")))?;

    let mut archive = unrar::Archive::new(archive_path)
        .open_for_processing()
        .map_err(|e| DlpError::archive(e.to_string()))?;

    let mut extracted = Vec::new();
    let mut cumulative_bytes: u64 = 0;
    let mut count: u64 = 0;

    while let Some(header) = archive
        .read_header()
        .map_err(|e| DlpError::archive(e.to_string()))?
    {
        let entry = header.entry();
        if entry.is_directory() {
            archive = header
                .skip()
                .map_err(|e| DlpError::archive(e.to_string()))?;
            continue;
        }

        count += 1;
        if count > max_files {
            return Err(DlpError::archive("archive contains too many files"));
        }
        cumulative_bytes += entry.unpacked_size;
        if cumulative_bytes > max_bytes {
            return Err(DlpError::archive(
                "archive exceeds maximum cumulative extracted bytes",
            ));
        }

        let name = entry.filename.to_string_lossy().to_string();
        let target = safe_join(destination, &name)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let (_data, next) = header
            .extract_to(&target)
            .map_err(|e| DlpError::archive(e.to_string()))?;
        archive = next;

        extracted.push(ExtractedItem {
            relative_path: relative_name(&root, &target),
            path: target,
        });
    }

    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options: zip::write::FileOptions<()> = zip::write::FileOptions::default();
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn zip_slip_is_rejected() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("evil.zip");
        write_zip(&zip_path, &[("../evil.txt", b"bad")]);

        let destination = dir.path().join("out");
        let err = extract(&zip_path, &destination, 1000, 10_000).unwrap_err();
        assert!(matches!(err, DlpError::ArchiveExtraction { .. }));
        assert!(!dir.path().join("evil.txt").exists());
    }

    #[test]
    fn archive_byte_cap_is_enforced() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("big.zip");
        write_zip(&zip_path, &[("file.txt", &[b'a'; 10])]);

        let destination = dir.path().join("out");
        let err = extract(&zip_path, &destination, 1000, 5).unwrap_err();
        assert!(matches!(err, DlpError::ArchiveExtraction { .. }));
    }

    #[test]
    fn archive_file_count_cap_is_enforced() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("many.zip");
        write_zip(&zip_path, &[("a.txt", b"1"), ("b.txt", b"2"), ("c.txt", b"3")]);

        let destination = dir.path().join("out");
        let err = extract(&zip_path, &destination, 2, 10_000).unwrap_err();
        assert!(matches!(err, DlpError::ArchiveExtraction { .. }));
    }

    #[test]
    fn extracts_regular_files() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("plain.zip");
        write_zip(&zip_path, &[("notes/report.txt", b"hello")]);

        let destination = dir.path().join("out");
        let items = extract(&zip_path, &destination, 1000, 10_000).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].relative_path, "notes/report.txt");
        assert_eq!(fs::read_to_string(&items[0].path).unwrap(), "hello");
    }
}
