//! Format-agnostic archive creation and extraction.

use std::fs;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use crate::ArchiveError;
use crate::Result;
use crate::backend;
use crate::backend::ArchiveInput;
use crate::config::ArchiverConfig;
use crate::creation::walker;
use crate::formats::ArchiveFormat;
use crate::formats::CompressionType;
use crate::formats::FileType;
use crate::mode;
use crate::stream::ArchiveStream;
use crate::stream::EntryInfo;
use crate::types::DestDir;
use crate::types::SourcePath;

/// Creates, extracts and streams archives of one format.
///
/// An `Archiver` carries only its format, optional compression and
/// configuration. It holds no per-call state and can be shared across
/// threads for independent calls.
///
/// # Examples
///
/// ```no_run
/// use polyarc_core::Archiver;
/// use polyarc_core::formats::ArchiveFormat;
/// use polyarc_core::formats::CompressionType;
///
/// # fn main() -> polyarc_core::Result<()> {
/// let archiver = Archiver::with_compression(ArchiveFormat::Tar, Some(CompressionType::Gzip))?;
/// let archive = archiver.create("site", "/backups", &["/srv/www"])?;
/// assert!(archive.ends_with("site.tar.gz"));
///
/// archiver.extract(&archive, "/tmp/restore")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Archiver {
    format: ArchiveFormat,
    compression: Option<CompressionType>,
    config: ArchiverConfig,
}

impl Archiver {
    /// Creates an archiver for an uncompressed format.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` if no backend exists for `format`.
    pub fn new(format: ArchiveFormat) -> Result<Self> {
        Self::with_compression(format, None)
    }

    /// Creates an archiver for `format` wrapped in `compression`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` if no backend exists for `format`, or if
    /// `format` cannot be wrapped in a compression layer.
    pub fn with_compression(
        format: ArchiveFormat,
        compression: Option<CompressionType>,
    ) -> Result<Self> {
        backend::ensure_supported(format, compression)?;
        Ok(Self {
            format,
            compression,
            config: ArchiverConfig::default(),
        })
    }

    /// Creates an archiver from a resolved [`FileType`].
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` if the file type names no archive format.
    pub fn for_file_type(file_type: &FileType) -> Result<Self> {
        let format = file_type.archive_format.ok_or_else(|| {
            ArchiveError::unsupported(if file_type.is_unknown() {
                "unknown archive suffix".to_string()
            } else {
                format!("{} is a compression suffix, not an archive", file_type.suffix)
            })
        })?;
        Self::with_compression(format, file_type.compression_type)
    }

    /// Creates an archiver for the file type implied by `path`.
    ///
    /// Besides the suffix table, a compression suffix stacked on an archive
    /// suffix (`.cpio.gz`, `.ar.xz`) is recognised.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` if the suffix names no archive format.
    pub fn for_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_type = FileType::resolve(path);
        if let (None, Some(compression)) = (file_type.archive_format, file_type.compression_type)
            && let Some(name) = path.file_name().and_then(|n| n.to_str())
        {
            let inner = FileType::resolve_name(&name[..name.len() - file_type.suffix.len()]);
            if let (Some(format), None) = (inner.archive_format, inner.compression_type) {
                return Self::with_compression(format, Some(compression));
            }
        }
        Self::for_file_type(&file_type)
    }

    /// Replaces the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the configuration does not validate.
    pub fn with_config(mut self, config: ArchiverConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Container format.
    #[must_use]
    pub const fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Compression layer, if any.
    #[must_use]
    pub const fn compression(&self) -> Option<CompressionType> {
        self.compression
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ArchiverConfig {
        &self.config
    }

    /// Suffix appended by [`create`](Self::create), such as `.tar.gz`.
    #[must_use]
    pub fn suffix(&self) -> String {
        FileType::of(self.format, self.compression).suffix
    }

    /// Returns `true` if `name` already carries a suffix for this archiver.
    fn has_own_suffix(&self, name: &str) -> bool {
        if name.ends_with(&self.suffix()) {
            return true;
        }
        let file_type = FileType::resolve_name(name);
        file_type.archive_format == Some(self.format)
            && file_type.compression_type == self.compression
    }

    /// Creates an archive named `archive_name` in `destination` from
    /// `sources` and returns its path.
    ///
    /// The archiver's suffix is appended unless the name already has it.
    /// A single directory source contributes its contents; otherwise each
    /// source is stored under its own file name.
    ///
    /// # Errors
    ///
    /// Checked before anything is written, in this order:
    /// - `InvalidArgument` if `destination` is not a writable directory or
    ///   `archive_name` is empty
    /// - `SourceNotFound` / `SourceUnreadable` for any unusable source
    ///
    /// Afterwards, backend and I/O errors are returned unchanged and the
    /// partial archive is removed.
    pub fn create<P: AsRef<Path>>(
        &self,
        archive_name: &str,
        destination: impl AsRef<Path>,
        sources: &[P],
    ) -> Result<PathBuf> {
        let destination = DestDir::new(destination.as_ref())?;
        if archive_name.is_empty() {
            return Err(ArchiveError::invalid_argument("archive name is empty"));
        }
        for source in sources {
            SourcePath::new(source.as_ref())?;
        }

        let file_name = if self.has_own_suffix(archive_name) {
            archive_name.to_string()
        } else {
            format!("{archive_name}{}", self.suffix())
        };
        let archive_path = destination.join(&file_name);
        let entries = walker::collect_entries(sources, &self.config)?;

        tracing::debug!(
            archive = %archive_path.display(),
            format = %self.format,
            compression = ?self.compression,
            entries = entries.len(),
            "creating archive"
        );

        if let Err(e) = self.write_archive(&archive_path, &entries) {
            if let Err(cleanup) = fs::remove_file(&archive_path) {
                tracing::debug!(error = %cleanup, "could not remove partial archive");
            }
            return Err(e);
        }

        tracing::debug!(archive = %archive_path.display(), "archive created");
        Ok(archive_path)
    }

    fn write_archive(&self, path: &Path, entries: &[backend::EntryDescriptor]) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = backend::open_writer(
            self.format,
            self.compression,
            self.config.compression_level,
            file,
        )?;
        for entry in entries {
            if entry.is_directory {
                writer.write_entry(entry, None)?;
            } else {
                // a file that grew since the walk must not overrun its header
                let mut content = File::open(&entry.source)?.take(entry.size);
                writer.write_entry(entry, Some(&mut content))?;
            }
            tracing::trace!(name = %entry.name, "entry written");
        }
        writer.finish()
    }

    /// Extracts every entry of the archive at `archive` into `destination`.
    ///
    /// `destination` is created if missing. Entries are written in archive
    /// order; directory permissions are applied last so that restrictive
    /// directories do not block their own contents.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `destination` exists but is not a writable
    ///   directory
    /// - `SourceNotFound` / `SourceUnreadable` if `archive` is unusable
    /// - `PathTraversal` for entries escaping `destination`
    /// - backend and I/O errors, unchanged
    pub fn extract(&self, archive: impl AsRef<Path>, destination: impl AsRef<Path>) -> Result<()> {
        let destination = destination.as_ref();
        precheck_destination(destination)?;
        let source = SourcePath::new(archive.as_ref())?;
        let destination = DestDir::create_or_validate(destination)?;

        tracing::debug!(
            archive = %source.as_path().display(),
            destination = %destination.as_path().display(),
            "extracting archive"
        );
        let file = File::open(source.as_path())?;
        self.extract_input(ArchiveInput::File(file), &destination)
    }

    /// Extracts an archive read from a byte stream into `destination`.
    ///
    /// Formats that need random access are spooled to a temporary file
    /// first.
    ///
    /// # Errors
    ///
    /// Same as [`extract`](Self::extract), minus the source checks.
    pub fn extract_reader(
        &self,
        reader: impl Read + 'static,
        destination: impl AsRef<Path>,
    ) -> Result<()> {
        let destination = DestDir::create_or_validate(destination.as_ref())?;
        tracing::debug!(destination = %destination.as_path().display(), "extracting archive stream");
        self.extract_input(ArchiveInput::Stream(Box::new(reader)), &destination)
    }

    fn extract_input(&self, input: ArchiveInput, destination: &DestDir) -> Result<()> {
        let mut stream = self.open_stream(input)?;
        let mut directory_modes = Vec::new();
        let mut count = 0usize;

        while let Some(entry) = stream.next_entry()? {
            let path = entry.extract_inner(destination.as_path(), true)?;
            if entry.is_directory()
                && self.config.preserve_permissions
                && let Some(mode) = entry.mode()
            {
                directory_modes.push((path, mode));
            }
            count += 1;
        }
        stream.close()?;

        // deepest first, so a read-only parent is locked after its children
        for (path, mode) in directory_modes.iter().rev() {
            mode::apply_mode(path, *mode)?;
        }
        tracing::debug!(entries = count, "extraction complete");
        Ok(())
    }

    /// Opens the archive at `archive` for manual iteration.
    ///
    /// The caller owns the stream; dropping it closes the backend.
    ///
    /// # Errors
    ///
    /// Returns `SourceNotFound` / `SourceUnreadable` if `archive` is
    /// unusable, or the backend's error if it cannot be opened.
    pub fn stream(&self, archive: impl AsRef<Path>) -> Result<ArchiveStream> {
        let source = SourcePath::new(archive.as_ref())?;
        let file = File::open(source.as_path())?;
        self.open_stream(ArchiveInput::File(file))
    }

    /// Opens an archive read from a byte stream for manual iteration.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the archive cannot be opened.
    pub fn stream_reader(&self, reader: impl Read + 'static) -> Result<ArchiveStream> {
        self.open_stream(ArchiveInput::Stream(Box::new(reader)))
    }

    fn open_stream(&self, input: ArchiveInput) -> Result<ArchiveStream> {
        let reader = backend::open_reader(self.format, self.compression, input)?;
        Ok(ArchiveStream::new(reader, self.config.preserve_permissions))
    }

    /// Lists the entries of the archive at `archive` without extracting.
    ///
    /// # Errors
    ///
    /// Same as [`stream`](Self::stream), plus backend errors while reading
    /// headers.
    pub fn list(&self, archive: impl AsRef<Path>) -> Result<Vec<EntryInfo>> {
        let mut stream = self.stream(archive)?;
        let mut entries = Vec::new();
        while let Some(entry) = stream.next_entry()? {
            entries.push(entry.info());
        }
        stream.close()?;
        Ok(entries)
    }
}

/// Rejects an existing destination that is not a writable directory. A
/// missing destination passes and is created once the source checks pass.
fn precheck_destination(destination: &Path) -> Result<()> {
    if fs::symlink_metadata(destination).is_ok() {
        DestDir::new(destination)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils;
    use tempfile::TempDir;

    #[test]
    fn test_arj_is_unsupported() {
        let err = Archiver::new(ArchiveFormat::Arj).unwrap_err();
        assert!(matches!(err, ArchiveError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_compressed_zip_is_unsupported() {
        let err = Archiver::with_compression(ArchiveFormat::Zip, Some(CompressionType::Xz));
        assert!(matches!(err, Err(ArchiveError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_suffixes() {
        let cases = [
            (ArchiveFormat::Tar, None, ".tar"),
            (ArchiveFormat::Tar, Some(CompressionType::Gzip), ".tar.gz"),
            (ArchiveFormat::Tar, Some(CompressionType::Zstd), ".tar.zst"),
            (ArchiveFormat::Cpio, Some(CompressionType::Bzip2), ".cpio.bz2"),
            (ArchiveFormat::Zip, None, ".zip"),
            (ArchiveFormat::SevenZ, None, ".7z"),
        ];
        for (format, compression, suffix) in cases {
            assert_eq!(
                Archiver::with_compression(format, compression).unwrap().suffix(),
                suffix
            );
        }
    }

    #[test]
    fn test_for_path() {
        let archiver = Archiver::for_path("a/b/site.tgz").unwrap();
        assert_eq!(archiver.format(), ArchiveFormat::Tar);
        assert_eq!(archiver.compression(), Some(CompressionType::Gzip));

        let archiver = Archiver::for_path("initrd.cpio.gz").unwrap();
        assert_eq!(archiver.format(), ArchiveFormat::Cpio);
        assert_eq!(archiver.compression(), Some(CompressionType::Gzip));

        assert!(matches!(
            Archiver::for_path("notes.txt.gz"),
            Err(ArchiveError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            Archiver::for_path("notes.txt"),
            Err(ArchiveError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_with_config_validates() {
        let archiver = Archiver::new(ArchiveFormat::Tar).unwrap();
        let bad = ArchiverConfig::default().with_compression_level(0);
        assert!(archiver.clone().with_config(bad).is_err());
        let good = ArchiverConfig::default().with_compression_level(9);
        assert_eq!(
            archiver.with_config(good).unwrap().config().compression_level,
            Some(9)
        );
    }

    #[test]
    fn test_create_keeps_existing_suffix() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();
        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();

        let archiver = Archiver::with_compression(ArchiveFormat::Tar, Some(CompressionType::Gzip)).unwrap();
        let with = archiver.create("one.tar.gz", &out, &[&src]).unwrap();
        assert_eq!(with.file_name().unwrap(), "one.tar.gz");
        let short = archiver.create("two.tgz", &out, &[&src]).unwrap();
        assert_eq!(short.file_name().unwrap(), "two.tgz");
        let bare = archiver.create("three", &out, &[&src]).unwrap();
        assert_eq!(bare.file_name().unwrap(), "three.tar.gz");
    }

    #[test]
    fn test_create_missing_source_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();
        let archiver = Archiver::new(ArchiveFormat::Zip).unwrap();

        let err = archiver
            .create("archive", &out, &[temp.path().join("missing")])
            .unwrap_err();
        assert!(matches!(err, ArchiveError::SourceNotFound { .. }));
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn test_create_destination_checked_before_sources() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain.txt");
        fs::write(&file, "x").unwrap();
        let archiver = Archiver::new(ArchiveFormat::Tar).unwrap();

        let err = archiver
            .create("archive", &file, &[temp.path().join("missing")])
            .unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidArgument { .. }));
    }

    #[test]
    fn test_extract_into_file_fails() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("a.tar");
        fs::write(&archive, test_utils::create_test_tar(&[("f", b"x")])).unwrap();
        let file = temp.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        let err = Archiver::new(ArchiveFormat::Tar)
            .unwrap()
            .extract(&archive, &file)
            .unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidArgument { .. }));
    }

    #[test]
    fn test_extract_missing_archive_creates_nothing() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("dest");
        let err = Archiver::new(ArchiveFormat::Tar)
            .unwrap()
            .extract(temp.path().join("missing.tar"), &dest)
            .unwrap_err();
        assert!(matches!(err, ArchiveError::SourceNotFound { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn test_extract_creates_destination() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("a.tar");
        fs::write(&archive, test_utils::create_test_tar(&[("d/", b""), ("d/f.txt", b"body")])).unwrap();
        let dest = temp.path().join("new/dest");

        Archiver::new(ArchiveFormat::Tar).unwrap().extract(&archive, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("d/f.txt")).unwrap(), "body");
    }

    #[test]
    fn test_extract_reader_zip() {
        let temp = TempDir::new().unwrap();
        let data = test_utils::create_test_zip(&[("docs/", b""), ("docs/a.txt", b"zip body")]);
        Archiver::new(ArchiveFormat::Zip)
            .unwrap()
            .extract_reader(std::io::Cursor::new(data), temp.path())
            .unwrap();
        assert_eq!(fs::read_to_string(temp.path().join("docs/a.txt")).unwrap(), "zip body");
    }

    #[test]
    fn test_list() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("a.tar");
        fs::write(&archive, test_utils::create_test_tar(&[("d/", b""), ("d/f.txt", b"body")])).unwrap();

        let entries = Archiver::new(ArchiveFormat::Tar).unwrap().list(&archive).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["d/", "d/f.txt"]);
        assert_eq!(entries[1].size, 4);
        assert!(entries[0].is_directory);
    }

    #[test]
    fn test_extract_rejects_traversal() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("evil.tar");
        fs::write(&archive, test_utils::create_test_tar(&[("../evil.txt", b"x")])).unwrap();
        let dest = temp.path().join("dest");

        let err = Archiver::new(ArchiveFormat::Tar)
            .unwrap()
            .extract(&archive, &dest)
            .unwrap_err();
        assert!(matches!(err, ArchiveError::PathTraversal { .. }));
        assert!(!temp.path().join("evil.txt").exists());
    }
}
