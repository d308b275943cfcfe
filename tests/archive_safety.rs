//! Archive extraction must never write outside its destination directory,
//! and must refuse to extract members whose declared size would exceed the
//! configured byte cap before writing their content.

use std::io::Write;

use dlp_scan::ingestion::archive;
use tempfile::tempdir;
use zip::write::FileOptions;

fn write_zip(path: &std::path::Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options: FileOptions<()> = FileOptions::default();
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
}

#[test]
fn zip_slip_member_is_rejected_and_nothing_escapes() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("evil.zip");
    write_zip(&zip_path, &[("../escaped.txt", b"pwned")]);

    let destination = dir.path().join("out");
    let result = archive::extract(&zip_path, &destination, 100, 10_000_000);
    assert!(result.is_err());

    let escaped_path = dir.path().join("escaped.txt");
    assert!(!escaped_path.exists());
}

#[test]
fn byte_cap_is_enforced_before_writing_full_member() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("big.zip");
    write_zip(&zip_path, &[("payload.bin", &[0u8; 1024])]);

    let destination = dir.path().join("out");
    let result = archive::extract(&zip_path, &destination, 100, 10);
    assert!(result.is_err());
}

#[test]
fn file_count_cap_is_enforced() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("many.zip");
    write_zip(
        &zip_path,
        &[("a.txt", b"a"), ("b.txt", b"b"), ("c.txt", b"c")],
    );

    let destination = dir.path().join("out");
    let result = archive::extract(&zip_path, &destination, 2, 10_000_000);
    assert!(result.is_err());
}

#[test]
fn well_formed_archive_extracts_all_members() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("ok.zip");
    write_zip(
        &zip_path,
        &[("a/one.txt", b"one"), ("two.txt", b"two")],
    );

    let destination = dir.path().join("out");
    let items = archive::extract(&zip_path, &destination, 100, 10_000_000).unwrap();
    assert_eq!(items.len(), 2);
    let names: Vec<&str> = items.iter().map(|i| i.relative_path.as_str()).collect();
    assert!(names.contains(&"a/one.txt"));
    assert!(names.contains(&"two.txt"));
}
