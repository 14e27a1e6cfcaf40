mod common;

use std::collections::BTreeSet;
use std::io::{Cursor, Write};
use std::sync::Arc;

use common::*;
use flate2::Compression;
use flate2::write::DeflateEncoder;
use zip::write::SimpleFileOptions;
use zipsection::{Error, detect_section_size_path, open_section, open_section_path};

fn write_host(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn section_lists_same_entries_as_standalone_archive() {
    let archive = sample_zip();
    let expected: BTreeSet<String> = zip::ZipArchive::new(Cursor::new(archive.clone()))
        .unwrap()
        .file_names()
        .map(str::to_owned)
        .collect();

    let host = concat(&native_prefix(b"MZ", 20_000), &archive);
    let size = host.len() as u64;
    let opened = open_section(Arc::new(host), size).await.unwrap();

    let names: BTreeSet<String> = opened
        .entries()
        .iter()
        .map(|e| e.file_name.clone())
        .collect();
    assert_eq!(names, expected);
    assert_eq!(opened.reader().base(), 20_000);
    assert_eq!(opened.location().start(), 0);
}

#[tokio::test]
async fn extracts_stored_and_deflated_entries() {
    let host = concat(&filler(4096, 11), &sample_zip());
    let size = host.len() as u64;
    let opened = open_section(Arc::new(host), size).await.unwrap();

    let readme = opened.by_name("docs/readme.txt").unwrap();
    assert_eq!(opened.extract_to_memory(readme).await.unwrap(), README);

    let lorem = opened.by_name("lorem.txt").unwrap();
    assert!(lorem.compressed_size < lorem.uncompressed_size);
    assert_eq!(opened.extract_to_memory(lorem).await.unwrap(), LOREM);

    assert!(opened.by_name("docs/").unwrap().is_directory);
}

#[tokio::test]
async fn extracts_from_prefixed_zip64_archive() {
    let host = concat(&native_prefix(b"MZ", 1500), &zip64_archive("big.bin", LOREM));
    let size = host.len() as u64;
    let opened = open_section(Arc::new(host), size).await.unwrap();

    assert!(opened.location().is_zip64());
    let entry = opened.by_name("big.bin").unwrap();
    assert_eq!(opened.extract_to_memory(entry).await.unwrap(), LOREM);
}

#[tokio::test]
async fn path_forms_detect_and_open() {
    let archive = sample_zip();
    let file = write_host(&concat(&native_prefix(b"\x7fELF", 12_345), &archive));

    let size = detect_section_size_path(file.path()).await.unwrap();
    assert_eq!(size, archive.len() as u64);

    let opened = open_section_path(file.path()).await.unwrap();
    assert_eq!(opened.entries().len(), 3);
    let readme = opened.by_name("docs/readme.txt").unwrap();
    assert_eq!(opened.extract_to_memory(readme).await.unwrap(), README);
    drop(opened);

    // handles are released; the file can be removed
    file.close().unwrap();
}

#[tokio::test]
async fn path_forms_report_missing_archive() {
    let file = write_host(&[0u8; 8192]);
    assert!(detect_section_size_path(file.path()).await.unwrap_err().is_format());
    assert!(open_section_path(file.path()).await.unwrap_err().is_format());
}

#[tokio::test]
async fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = detect_section_size_path(dir.path().join("absent.exe"))
        .await
        .unwrap_err();
    assert!(err.is_io());
}

#[tokio::test]
async fn corrupted_entry_data_fails_checksum() {
    let archive = sample_zip();
    let mut host = concat(&filler(64, 8), &archive);
    let at = host
        .windows(README.len())
        .position(|w| w == README)
        .unwrap();
    host[at] ^= 0xFF;

    let size = host.len() as u64;
    let opened = open_section(Arc::new(host), size).await.unwrap();
    let readme = opened.by_name("docs/readme.txt").unwrap();
    let err = opened.extract_to_memory(readme).await.unwrap_err();
    assert!(
        matches!(err, Error::ChecksumMismatch { expected, .. } if expected == crc32(README)),
        "{err}"
    );
}

#[tokio::test]
async fn unknown_method_is_unsupported() {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file(
        "packed.bz2",
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Bzip2),
    )
    .unwrap();
    zip.write_all(LOREM).unwrap();
    let archive = zip.finish().unwrap().into_inner();

    let size = archive.len() as u64;
    let opened = open_section(Arc::new(archive), size).await.unwrap();
    let entry = opened.by_name("packed.bz2").unwrap();
    let err = opened.extract_to_memory(entry).await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedAlgorithm(12)), "{err}");
}

#[tokio::test]
async fn extracts_to_file() {
    let host = concat(&filler(300, 6), &sample_zip());
    let size = host.len() as u64;
    let opened = open_section(Arc::new(host), size).await.unwrap();

    let out = tempfile::tempdir().unwrap();
    let target = out.path().join("nested/dir/readme.txt");
    let readme = opened.by_name("docs/readme.txt").unwrap();
    opened.extract_to_file(readme, &target).await.unwrap();
    assert_eq!(std::fs::read(target).unwrap(), README);
}

#[tokio::test]
async fn absurd_declared_size_is_malformed() {
    for declared in [1u64 << 63, 1 << 40, u64::MAX] {
        let archive = declared_size_archive("huge.bin", 0, README, declared, declared);
        let host = concat(&filler(1000, 12), &archive);
        let size = host.len() as u64;
        let opened = open_section(Arc::new(host), size).await.unwrap();

        let entry = opened.by_name("huge.bin").unwrap();
        assert_eq!(entry.compressed_size, declared);
        let err = opened.extract_to_memory(entry).await.unwrap_err();
        assert!(err.is_format(), "{declared}: {err}");
    }
}

#[tokio::test]
async fn inflated_data_beyond_declared_size_is_malformed() {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(LOREM).unwrap();
    let packed = encoder.finish().unwrap();

    let archive = declared_size_archive("bomb.txt", 8, &packed, packed.len() as u64, 10);
    let size = archive.len() as u64;
    let opened = open_section(Arc::new(archive), size).await.unwrap();
    let entry = opened.by_name("bomb.txt").unwrap();
    let err = opened.extract_to_memory(entry).await.unwrap_err();
    assert!(err.is_format(), "{err}");
}
