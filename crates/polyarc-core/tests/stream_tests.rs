//! Entry state machine behaviour against real archives.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use polyarc_core::ArchiveError;
use polyarc_core::Archiver;
use polyarc_core::formats::ArchiveFormat;
use polyarc_core::formats::CompressionType;
use polyarc_core::test_utils;
use std::path::PathBuf;
use std::time::SystemTime;
use tempfile::TempDir;

const DIRECTORIES: [&str; 4] = ["folder", "subfolder", "permissions", "private_folder"];

const CASES: [(ArchiveFormat, Option<CompressionType>); 7] = [
    (ArchiveFormat::Tar, None),
    (ArchiveFormat::Tar, Some(CompressionType::Gzip)),
    (ArchiveFormat::Zip, None),
    (ArchiveFormat::Jar, None),
    (ArchiveFormat::SevenZ, None),
    (ArchiveFormat::Cpio, None),
    (ArchiveFormat::Ar, None),
];

struct Fixture {
    temp: TempDir,
    archiver: Archiver,
    archive: PathBuf,
}

fn fixture(format: ArchiveFormat, compression: Option<CompressionType>) -> Fixture {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("archive");
    std::fs::create_dir(&source).unwrap();
    test_utils::create_fixture_tree(&source);
    let archiver = Archiver::with_compression(format, compression).unwrap();
    let archive = archiver.create("archive", temp.path(), &[&source]).unwrap();
    Fixture {
        temp,
        archiver,
        archive,
    }
}

fn is_fixture_directory(name: &str) -> bool {
    DIRECTORIES.iter().any(|d| name.ends_with(d))
}

#[test]
fn test_stream_returns_correct_entries() {
    for (format, compression) in CASES {
        let fx = fixture(format, compression);
        let mut stream = fx.archiver.stream(&fx.archive).unwrap();
        let mut names = Vec::new();
        while let Some(entry) = stream.next_entry().unwrap() {
            names.push(entry.name().trim_end_matches('/').to_string());
        }
        stream.close().unwrap();

        let mut expected: Vec<&str> = test_utils::FIXTURE_ENTRIES
            .into_iter()
            .filter(|name| format.supports_directories() || !is_fixture_directory(name))
            .collect();
        expected.sort_unstable();
        names.sort();
        assert_eq!(names, expected, "{format}");
    }
}

#[test]
fn test_entry_is_directory_and_size() {
    for (format, compression) in CASES {
        let fx = fixture(format, compression);
        let mut stream = fx.archiver.stream(&fx.archive).unwrap();
        while let Some(entry) = stream.next_entry().unwrap() {
            let name = entry.name().trim_end_matches('/');
            if is_fixture_directory(name) {
                assert!(entry.is_directory(), "{format}: {name} is a directory");
                assert!(entry.name().ends_with('/'), "{format}: {name}");
                assert_eq!(entry.size(), 0, "{format}: {name}");
            } else {
                assert!(!entry.is_directory(), "{format}: {name} is not a directory");
                assert_ne!(entry.size(), 0, "{format}: {name}");
            }
        }
    }
}

#[test]
fn test_entry_last_modified_is_in_the_past() {
    for (format, compression) in CASES {
        let fx = fixture(format, compression);
        let now = SystemTime::now();
        let mut stream = fx.archiver.stream(&fx.archive).unwrap();
        while let Some(entry) = stream.next_entry().unwrap() {
            let modified = entry
                .last_modified()
                .unwrap_or_else(|| panic!("{format}: {} has no timestamp", entry.name()));
            assert!(modified <= now, "{format}: {} is from the future", entry.name());
        }
    }
}

#[test]
fn test_stream_extract_every_entry() {
    for (format, compression) in CASES {
        let fx = fixture(format, compression);
        let out = fx.temp.path().join("extracted");
        let mut stream = fx.archiver.stream(&fx.archive).unwrap();
        let mut extracted = 0;
        while let Some(entry) = stream.next_entry().unwrap() {
            let path = entry.extract(&out).unwrap();
            assert!(path.starts_with(&out));
            assert!(entry.is_consumed());
            extracted += 1;
        }
        drop(stream);

        let expected = if format.supports_directories() { 12 } else { 8 };
        assert_eq!(extracted, expected, "{format}");
        let content = std::fs::read_to_string(out.join("folder/subfolder/subfolder_file.txt")).unwrap();
        assert_eq!(content, "subfolder_file.txt content\n");
    }
}

#[test]
fn test_extract_passed_entry_fails() {
    for (format, compression) in CASES {
        let fx = fixture(format, compression);
        let mut stream = fx.archiver.stream(&fx.archive).unwrap();
        let first = stream.next_entry().unwrap().unwrap();
        stream.next_entry().unwrap().unwrap();

        let err = first.extract(fx.temp.path().join("out")).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidState { .. }), "{format}");
    }
}

#[test]
fn test_extract_consumed_entry_fails() {
    let fx = fixture(ArchiveFormat::Tar, None);
    let out = fx.temp.path().join("out");
    let mut stream = fx.archiver.stream(&fx.archive).unwrap();
    let entry = stream.next_entry().unwrap().unwrap();
    entry.extract(&out).unwrap();
    assert!(entry.extract(&out).unwrap_err().is_usage_error());

    stream.next_entry().unwrap();
    assert!(entry.extract(&out).unwrap_err().is_usage_error());
}

#[test]
fn test_extract_on_closed_stream_fails() {
    for (format, compression) in CASES {
        let fx = fixture(format, compression);
        let entry = {
            let mut stream = fx.archiver.stream(&fx.archive).unwrap();
            stream.next_entry().unwrap().unwrap()
        };
        let err = entry.extract(fx.temp.path().join("out")).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidState { .. }), "{format}");
    }
}

#[test]
fn test_close_twice_is_harmless() {
    let fx = fixture(ArchiveFormat::Zip, None);
    let mut stream = fx.archiver.stream(&fx.archive).unwrap();
    stream.close().unwrap();
    stream.close().unwrap();
    assert!(stream.is_closed());
    assert!(stream.next_entry().is_err());
}

#[test]
fn test_stream_missing_archive() {
    let archiver = Archiver::new(ArchiveFormat::Tar).unwrap();
    let err = archiver.stream("/definitely/not/here.tar").unwrap_err();
    assert!(matches!(err, ArchiveError::SourceNotFound { .. }));
}

#[test]
fn test_stream_reader_spools_seekable_formats() {
    let fx = fixture(ArchiveFormat::SevenZ, None);
    let file = std::fs::File::open(&fx.archive).unwrap();
    let mut stream = fx.archiver.stream_reader(file).unwrap();
    let mut count = 0;
    while stream.next_entry().unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 12);
}
